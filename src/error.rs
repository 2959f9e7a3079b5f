use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Launch metadata not found: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Table parse failure: {0}")]
    Table(#[from] TableError),

    #[error("Launch at {launch_date} is already recorded")]
    DuplicateLaunch { launch_date: DateTime<Utc> },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Logging setup error: {0}")]
    Logging(String),
}

/// Why the header scan could not produce a launch time and header line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("no 'Launch time:' line")]
    LaunchTimeNotFound,

    #[error("no data header row containing 'time', 'Height' and 'Pscl'")]
    HeaderNotFound,

    #[error("launch time '{0}' is not a valid UTC date-time")]
    InvalidLaunchTime(String),
}

/// Why the data body under the header line could not be turned into records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("header line {index} is beyond the end of the file ({line_count} lines)")]
    HeaderOutOfRange { index: usize, line_count: usize },

    #[error("header line {index} has no column names")]
    EmptyHeader { index: usize },

    #[error("column '{0}' appears more than once in the header")]
    DuplicateColumn(String),

    #[error("line {line}: expected at most {expected} fields, found {found}")]
    TooManyFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: '{token}' in column {column} is not a number")]
    InvalidNumber {
        line: usize,
        column: String,
        token: String,
    },

    #[error("line {line}: column {column} expects an integer, found {value}")]
    NonIntegral {
        line: usize,
        column: String,
        value: f64,
    },

    #[error("no data rows after the header")]
    NoRecords,
}
