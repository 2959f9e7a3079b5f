/// Marker phrase preceding the launch date-time in a sounding's prose header
pub const LAUNCH_TIME_MARKER: &str = "Launch time:";

/// Column-name substrings that must all appear on the data header row
pub const HEADER_TIME_TOKEN: &str = "time";
pub const HEADER_HEIGHT_TOKEN: &str = "Height";
pub const HEADER_PRESSURE_TOKEN: &str = "Pscl";

/// Instrument code for "no data"
pub const MISSING_VALUE_SENTINEL: f64 = -32768.0;

/// Textual "no data" markers found in exported soundings, matched exactly.
/// NaN spellings are caught by the numeric parse.
pub const MISSING_VALUE_TOKENS: [&str; 14] = [
    "#N/A", "#NA", "-1.#IND", "-1.#QNAN", "1.#IND", "1.#QNAN", "<NA>", "N/A", "NA", "NULL",
    "None", "n/a", "null", "-NaN",
];

/// Sounding file suffix, matched case-insensitively
pub const SOUNDING_FILE_EXTENSION: &str = ".tsv";

/// Configuration defaults
pub const DEFAULT_DATABASE_URL: &str = "sqlite:///database.db";
pub const DEFAULT_DATA_ROOT: &str = ".";
pub const DEFAULT_LOG_FILE: &str = "ingestion.log";
pub const ENV_PREFIX: &str = "SOUNDING";

/// Processing defaults
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
