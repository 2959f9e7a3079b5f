use crate::error::Result;
use crate::processors::launch_loader::{LaunchLoader, LoadOutcome, SkipReason};
use crate::store::LaunchStore;
use crate::utils::constants::SOUNDING_FILE_EXTENSION;
use crate::utils::progress::ProgressReporter;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub outcome: LoadOutcome,
}

/// Tally of a batch run plus the outcome of every candidate file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub files_found: usize,
    /// Files whose launch was written.
    pub loaded_count: usize,
    pub measurements_loaded: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new(files_found: usize) -> Self {
        Self {
            files_found,
            loaded_count: 0,
            measurements_loaded: 0,
            skipped_by_reason: SkipReason::ALL.iter().map(|r| (*r, 0)).collect(),
            files: Vec::with_capacity(files_found),
        }
    }

    pub fn record(&mut self, path: PathBuf, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Loaded(count) => {
                self.loaded_count += 1;
                self.measurements_loaded += count;
            }
            other => {
                if let Some(reason) = other.skip_reason() {
                    *self.skipped_by_reason.entry(reason).or_insert(0) += 1;
                }
            }
        }
        self.files.push(FileOutcome { path, outcome });
    }

    pub fn skipped(&self, reason: SkipReason) -> usize {
        self.skipped_by_reason.get(&reason).copied().unwrap_or(0)
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_by_reason.values().sum()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Ingestion Summary:\n  Files found: {}\n  Loaded: {} ({} measurements)\n  Skipped: {}\n",
            self.files_found,
            self.loaded_count,
            self.measurements_loaded,
            self.skipped_count()
        );

        for (reason, count) in &self.skipped_by_reason {
            summary.push_str(&format!("    {}: {}\n", reason.label(), count));
        }

        summary
    }
}

/// Walks a dataset tree and feeds every candidate sounding to the loader,
/// one file at a time.
///
/// Candidates are files ending in `.tsv` (any case) that sit directly in a
/// directory whose own name contains a digit, matching the year/month folder
/// naming of the upstream archive. Other directories are still descended
/// into, only their files are ignored.
pub struct IngestionDriver {
    extension: String,
}

impl IngestionDriver {
    pub fn new() -> Self {
        Self {
            extension: SOUNDING_FILE_EXTENSION.to_string(),
        }
    }

    /// Candidate files under `root` in sorted order. Only an unreadable root
    /// is an error; unreadable sub-directories are logged and skipped.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(std::io::Error::from(err).into()),
                Err(err) => {
                    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                    warn!(path = %path, error = %err, "Cannot read directory entry");
                    continue;
                }
            };

            if entry.depth() == 0 || entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let qualifies = path.parent().map(is_data_directory).unwrap_or(false);
            if qualifies && self.is_sounding_file(path) {
                candidates.push(entry.into_path());
            }
        }

        candidates.sort();
        Ok(candidates)
    }

    /// Discover and load everything under `root`.
    pub fn run_batch(
        &self,
        store: &mut LaunchStore,
        root: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<BatchReport> {
        let files = self.discover(root)?;
        Ok(self.load_files(store, files, progress))
    }

    /// Load the given files in order. A failing file never stops the batch.
    pub fn load_files(
        &self,
        store: &mut LaunchStore,
        files: Vec<PathBuf>,
        progress: Option<&ProgressReporter>,
    ) -> BatchReport {
        info!(files = files.len(), "Found sounding files to process");

        let mut report = BatchReport::new(files.len());
        let mut loader = LaunchLoader::new(store);

        for path in files {
            if let Some(p) = progress {
                p.set_message(&format!("Loading {}", path.display()));
            }

            let outcome = loader.load(&path);
            report.record(path, outcome);

            if let Some(p) = progress {
                p.increment(1);
            }
        }

        if let Some(p) = progress {
            p.finish_with_message(&format!(
                "Loaded {} of {} files",
                report.loaded_count, report.files_found
            ));
        }

        info!(
            files_found = report.files_found,
            loaded = report.loaded_count,
            measurements = report.measurements_loaded,
            skipped_duplicate = report.skipped(SkipReason::Duplicate),
            skipped_metadata = report.skipped(SkipReason::Metadata),
            skipped_parse = report.skipped(SkipReason::Parse),
            skipped_storage = report.skipped(SkipReason::Storage),
            "Batch finished"
        );

        report
    }

    fn is_sounding_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().to_lowercase().ends_with(&self.extension))
            .unwrap_or(false)
    }
}

impl Default for IngestionDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Literal dataset convention: data folders are named after years/months.
fn is_data_directory(dir: &Path) -> bool {
    dir.file_name()
        .map(|name| name.to_string_lossy().chars().any(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
