use crate::error::{IngestError, Result};
use crate::models::NewLaunch;
use crate::readers::{read_sounding_text, HeaderLocator, TableParser};
use crate::store::LaunchStore;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Terminal state of loading one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    /// Launch written with this many measurements.
    Loaded(usize),
    SkippedDuplicate,
    SkippedMetadata,
    SkippedParse,
    SkippedStorage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    Duplicate,
    Metadata,
    Parse,
    Storage,
}

impl SkipReason {
    pub const ALL: [SkipReason; 4] = [
        SkipReason::Duplicate,
        SkipReason::Metadata,
        SkipReason::Parse,
        SkipReason::Storage,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::Duplicate => "duplicate launch",
            SkipReason::Metadata => "metadata not found",
            SkipReason::Parse => "parse failure",
            SkipReason::Storage => "storage failure",
        }
    }
}

impl LoadOutcome {
    /// Classify a per-file failure. An unreadable file counts as missing
    /// metadata since nothing could be located in it.
    pub fn from_error(err: &IngestError) -> Self {
        match err {
            IngestError::Metadata(_) | IngestError::Io(_) => LoadOutcome::SkippedMetadata,
            IngestError::DuplicateLaunch { .. } => LoadOutcome::SkippedDuplicate,
            IngestError::Table(_) => LoadOutcome::SkippedParse,
            _ => LoadOutcome::SkippedStorage,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            LoadOutcome::Loaded(_) => None,
            LoadOutcome::SkippedDuplicate => Some(SkipReason::Duplicate),
            LoadOutcome::SkippedMetadata => Some(SkipReason::Metadata),
            LoadOutcome::SkippedParse => Some(SkipReason::Parse),
            LoadOutcome::SkippedStorage => Some(SkipReason::Storage),
        }
    }
}

/// Loads one sounding file into the store: locate the metadata, refuse a
/// launch time that is already recorded, parse the table, then write the
/// launch and its rows in a single transaction. No retries.
pub struct LaunchLoader<'a> {
    store: &'a mut LaunchStore,
    locator: HeaderLocator,
    parser: TableParser,
}

impl<'a> LaunchLoader<'a> {
    pub fn new(store: &'a mut LaunchStore) -> Self {
        Self {
            store,
            locator: HeaderLocator::new(),
            parser: TableParser::new(),
        }
    }

    pub fn with_parser(mut self, parser: TableParser) -> Self {
        self.parser = parser;
        self
    }

    /// Load a file, logging and classifying any failure instead of returning it.
    pub fn load(&mut self, path: &Path) -> LoadOutcome {
        let filename = display_name(path);
        debug!(file = %filename, "Processing file");

        match self.try_load(path, &filename) {
            Ok(count) => LoadOutcome::Loaded(count),
            Err(err) => {
                let outcome = LoadOutcome::from_error(&err);
                match outcome {
                    LoadOutcome::SkippedMetadata if matches!(err, IngestError::Io(_)) => {
                        error!(file = %filename, error = %err, "Could not read file. Skipping.")
                    }
                    LoadOutcome::SkippedMetadata | LoadOutcome::SkippedDuplicate => {
                        warn!(file = %filename, reason = %err, "Skipping file")
                    }
                    _ => error!(file = %filename, error = %err, "Failed to load file. Skipping."),
                }
                outcome
            }
        }
    }

    /// Same pipeline as [`LaunchLoader::load`], returning the error.
    pub fn try_load(&mut self, path: &Path, filename: &str) -> Result<usize> {
        let text = read_sounding_text(path)?;
        let metadata = self.locator.locate(&text)?;

        if self.store.find_launch_by_date(&metadata.launch_date)?.is_some() {
            return Err(IngestError::DuplicateLaunch {
                launch_date: metadata.launch_date,
            });
        }

        let table = self.parser.parse_table(&text, metadata.header_line)?;
        if !table.ignored_columns.is_empty() {
            debug!(
                file = %filename,
                columns = ?table.ignored_columns,
                "Ignoring unrecognised columns"
            );
        }

        let count = table.records.len();
        let launch = self.store.insert_launch(
            NewLaunch::new(metadata.launch_date, filename),
            &table.records,
        )?;

        info!(
            file = %filename,
            launch_id = launch.id,
            launch_date = %launch.launch_date,
            measurements = count,
            "Loaded launch"
        );

        Ok(count)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MetadataError, TableError};
    use crate::models::MeasurementField;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SCENARIO: &str = "\
Radiosonde sounding
Station: La Paz
Launch time: 2016-06-24 18:26:10 UTC
Sonde type: RS92

time Height Pscl T RH
0.0 500.0 1000.0 15.2 60.0
1.0 -32768 1000.0 15.1 60.0
";

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_scenario() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(&tmp, "LPB_20160624.tsv", SCENARIO);
        let mut store = LaunchStore::open_in_memory()?;

        let outcome = LaunchLoader::new(&mut store).load(&path);
        assert_eq!(outcome, LoadOutcome::Loaded(2));

        let launches = store.launches()?;
        assert_eq!(launches.len(), 1);
        assert_eq!(
            launches[0].launch_date,
            Utc.with_ymd_and_hms(2016, 6, 24, 18, 26, 10).unwrap()
        );
        assert_eq!(launches[0].filename, "LPB_20160624.tsv");

        let rows = store.measurements_for_launch(launches[0].id)?;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.launch_id == launches[0].id));
        assert_eq!(rows[0].values.height, Some(500.0));
        assert_eq!(rows[1].values.height, None);
        assert_eq!(rows[1].values.t, Some(15.1));

        Ok(())
    }


    #[test]
    fn test_textual_missing_markers_load_as_nulls() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(
            &tmp,
            "LPB_20160625.tsv",
            "Launch time: 2016-06-25 06:00:00 UTC\n\
             time Height Pscl T RH\n\
             0.0 500.0 1000.0 NA 60.0\n\
             1.0 null 999.0 15.1 N/A\n",
        );
        let mut store = LaunchStore::open_in_memory()?;

        let outcome = LaunchLoader::new(&mut store).load(&path);
        assert_eq!(outcome, LoadOutcome::Loaded(2));

        let launch_id = store.launches()?[0].id;
        let rows = store.measurements_for_launch(launch_id)?;
        assert_eq!(rows[0].values.t, None);
        assert_eq!(rows[0].values.rh, Some(60.0));
        assert_eq!(rows[1].values.height, None);
        assert_eq!(rows[1].values.rh, None);
        assert_eq!(rows[1].values.pscl, Some(999.0));

        Ok(())
    }
    #[test]
    fn test_second_load_is_duplicate() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(&tmp, "a.tsv", SCENARIO);
        let copy = write_file(&tmp, "copy_of_a.tsv", SCENARIO);
        let mut store = LaunchStore::open_in_memory()?;

        let mut loader = LaunchLoader::new(&mut store);
        assert_eq!(loader.load(&path), LoadOutcome::Loaded(2));
        assert_eq!(loader.load(&path), LoadOutcome::SkippedDuplicate);
        assert_eq!(loader.load(&copy), LoadOutcome::SkippedDuplicate);

        assert_eq!(store.launch_count()?, 1);
        assert_eq!(store.measurement_count()?, 2);

        Ok(())
    }

    #[test]
    fn test_missing_launch_time() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(
            &tmp,
            "no_time.tsv",
            "Station: La Paz\ntime Height Pscl\n0.0 500.0 1000.0\n",
        );
        let mut store = LaunchStore::open_in_memory()?;
        let mut loader = LaunchLoader::new(&mut store);

        assert_eq!(loader.load(&path), LoadOutcome::SkippedMetadata);
        assert!(matches!(
            loader.try_load(&path, "no_time.tsv"),
            Err(IngestError::Metadata(MetadataError::LaunchTimeNotFound))
        ));
        assert_eq!(store.launch_count()?, 0);

        Ok(())
    }

    #[test]
    fn test_unreadable_file_is_metadata_skip() -> Result<()> {
        let tmp = TempDir::new()?;
        let mut store = LaunchStore::open_in_memory()?;

        let outcome = LaunchLoader::new(&mut store).load(&tmp.path().join("missing.tsv"));
        assert_eq!(outcome, LoadOutcome::SkippedMetadata);

        Ok(())
    }

    #[test]
    fn test_empty_body_is_parse_skip() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(
            &tmp,
            "empty.tsv",
            "Launch time: 2016-06-24 18:26:10 UTC\ntime Height Pscl\n\n",
        );
        let mut store = LaunchStore::open_in_memory()?;
        let mut loader = LaunchLoader::new(&mut store);

        assert_eq!(loader.load(&path), LoadOutcome::SkippedParse);
        assert!(matches!(
            loader.try_load(&path, "empty.tsv"),
            Err(IngestError::Table(TableError::NoRecords))
        ));
        assert_eq!(store.launch_count()?, 0);

        Ok(())
    }

    #[test]
    fn test_storage_failure_leaves_nothing_behind() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(&tmp, "a.tsv", SCENARIO);
        let mut store = LaunchStore::open_in_memory()?;
        store.connection().execute_batch(
            "CREATE TRIGGER block_measurements BEFORE INSERT ON measurements
             BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
        )?;

        assert_eq!(
            LaunchLoader::new(&mut store).load(&path),
            LoadOutcome::SkippedStorage
        );
        assert_eq!(
            store.find_launch_by_date(&Utc.with_ymd_and_hms(2016, 6, 24, 18, 26, 10).unwrap())?,
            None
        );
        assert_eq!(store.launch_count()?, 0);
        assert_eq!(store.measurement_count()?, 0);

        Ok(())
    }

    #[test]
    fn test_unknown_column_loads() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(
            &tmp,
            "extra.tsv",
            "Launch time: 2016-06-24 18:26:10 UTC\ntime Height Pscl Ozone\n0 500 1000 0.03\n",
        );
        let mut store = LaunchStore::open_in_memory()?;

        assert_eq!(LaunchLoader::new(&mut store).load(&path), LoadOutcome::Loaded(1));

        let launch_id = store.launches()?[0].id;
        let rows = store.measurements_for_launch(launch_id)?;
        assert_eq!(rows[0].values.height, Some(500.0));
        assert_eq!(rows[0].values.pscl, Some(1000.0));

        Ok(())
    }

    #[test]
    fn test_restricted_parser() -> Result<()> {
        let tmp = TempDir::new()?;
        let path = write_file(&tmp, "a.tsv", SCENARIO);
        let mut store = LaunchStore::open_in_memory()?;

        let parser = TableParser::with_known_fields(&[MeasurementField::Time]);
        let outcome = LaunchLoader::new(&mut store).with_parser(parser).load(&path);
        assert_eq!(outcome, LoadOutcome::Loaded(2));

        let launch_id = store.launches()?[0].id;
        let rows = store.measurements_for_launch(launch_id)?;
        assert_eq!(rows[0].values.time, Some(0.0));
        assert_eq!(rows[0].values.height, None);

        Ok(())
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(
            LoadOutcome::from_error(&IngestError::Metadata(MetadataError::HeaderNotFound)),
            LoadOutcome::SkippedMetadata
        );
        assert_eq!(
            LoadOutcome::from_error(&IngestError::Table(TableError::NoRecords)),
            LoadOutcome::SkippedParse
        );
        assert_eq!(
            LoadOutcome::from_error(&IngestError::DuplicateLaunch {
                launch_date: Utc.with_ymd_and_hms(2016, 6, 24, 18, 26, 10).unwrap()
            }),
            LoadOutcome::SkippedDuplicate
        );
        assert_eq!(
            LoadOutcome::from_error(&IngestError::Storage(rusqlite::Error::InvalidQuery)),
            LoadOutcome::SkippedStorage
        );
        assert_eq!(LoadOutcome::Loaded(3).skip_reason(), None);
        assert_eq!(
            LoadOutcome::SkippedParse.skip_reason(),
            Some(SkipReason::Parse)
        );
    }
}
