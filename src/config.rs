use crate::error::Result;
use crate::store::DatabaseTarget;
use crate::utils::constants::{DEFAULT_DATABASE_URL, DEFAULT_DATA_ROOT, DEFAULT_LOG_FILE, ENV_PREFIX};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Run settings. Sources, lowest precedence first: built-in defaults, an
/// optional TOML file, then `SOUNDING_*` environment variables. CLI flags are
/// applied on top by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct IngestConfig {
    #[validate(length(min = 1))]
    pub database_url: String,

    #[validate(length(min = 1))]
    pub data_root: String,

    /// Empty disables the log file.
    pub log_file: Option<String>,

    /// Delete and recreate the store before a batch.
    pub reset_before_run: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            data_root: DEFAULT_DATA_ROOT.to_string(),
            log_file: Some(DEFAULT_LOG_FILE.to_string()),
            reset_before_run: true,
        }
    }
}

impl IngestConfig {
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(config_file, None)
    }

    /// Like [`IngestConfig::load`], but reads environment variables from
    /// `env` instead of the process environment when it is given.
    pub fn load_with_env(
        config_file: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).source(env));

        let config: IngestConfig = builder.build()?.try_deserialize()?;
        config.check()?;
        Ok(config)
    }

    /// Field validation plus a parse of the database URL.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        self.database_target()?;
        Ok(())
    }

    pub fn database_target(&self) -> Result<DatabaseTarget> {
        DatabaseTarget::from_url(&self.database_url)
    }

    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(&self.data_root)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IngestError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> Option<Map<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = IngestConfig::load_with_env(None, env(&[]))?;

        assert_eq!(config, IngestConfig::default());
        assert_eq!(
            config.database_target()?,
            DatabaseTarget::File(PathBuf::from("database.db"))
        );
        assert_eq!(config.log_file(), Some(PathBuf::from("ingestion.log")));
        assert!(config.reset_before_run);

        Ok(())
    }

    #[test]
    fn test_file_then_environment() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("ingest.toml");
        std::fs::write(
            &path,
            "database_url = \"sqlite:///from_file.db\"\ndata_root = \"/data/soundings\"\nreset_before_run = false\n",
        )?;

        let config = IngestConfig::load_with_env(Some(&path), env(&[]))?;
        assert_eq!(config.database_url, "sqlite:///from_file.db");
        assert_eq!(config.data_root(), PathBuf::from("/data/soundings"));
        assert!(!config.reset_before_run);

        let config = IngestConfig::load_with_env(
            Some(&path),
            env(&[
                ("SOUNDING_DATABASE_URL", "sqlite:///from_env.db"),
                ("SOUNDING_LOG_FILE", ""),
            ]),
        )?;
        assert_eq!(config.database_url, "sqlite:///from_env.db");
        assert_eq!(config.data_root, "/data/soundings");
        assert_eq!(config.log_file(), None);

        Ok(())
    }

    #[test]
    fn test_rejects_non_sqlite_url() {
        let result = IngestConfig::load_with_env(
            None,
            env(&[("SOUNDING_DATABASE_URL", "postgres://localhost/soundings")]),
        );
        assert!(matches!(result, Err(IngestError::InvalidFormat(_))));
    }

    #[test]
    fn test_rejects_empty_data_root() {
        let result = IngestConfig::load_with_env(None, env(&[("SOUNDING_DATA_ROOT", "")]));
        assert!(matches!(result, Err(IngestError::Validation(_))));
    }

    #[test]
    fn test_missing_config_file() {
        let result = IngestConfig::load_with_env(Some(Path::new("/nonexistent/ingest.toml")), env(&[]));
        assert!(matches!(result, Err(IngestError::Config(_))));
    }
}
