pub mod ingestion_driver;
pub mod launch_loader;

pub use ingestion_driver::{BatchReport, FileOutcome, IngestionDriver};
pub use launch_loader::{LaunchLoader, LoadOutcome, SkipReason};
