use crate::error::MetadataError;
use crate::utils::constants::{
    HEADER_HEIGHT_TOKEN, HEADER_PRESSURE_TOKEN, HEADER_TIME_TOKEN, LAUNCH_TIME_MARKER,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static LAUNCH_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"{}\s*(\d{{4}}-\d{{2}}-\d{{2}})\s(\d{{2}}:\d{{2}}:\d{{2}})\sUTC",
        regex::escape(LAUNCH_TIME_MARKER)
    );
    Regex::new(&pattern)
        .unwrap_or_else(|e| panic!("launch time pattern does not compile: {e}"))
});

/// What the header scan found in a sounding file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchMetadata {
    pub launch_date: DateTime<Utc>,
    /// Zero-based index of the column header row, counted over `str::lines`.
    pub header_line: usize,
}

/// Finds the launch time and the column header row in a sounding's free-text
/// preamble.
///
/// Both rules are literal heuristics tied to the upstream file layout:
///
/// * the launch time is taken from the first line matching
///   `Launch time: YYYY-MM-DD HH:MM:SS UTC`;
/// * the header row is the first line that contains `time`, `Height` and
///   `Pscl` as substrings, in any order.
///
/// The scan is a single forward pass that stops once both are known. A header
/// row seen before the launch time does not end the scan; if no launch time
/// ever follows, the whole file is read.
pub struct HeaderLocator {
    required_tokens: [&'static str; 3],
}

impl HeaderLocator {
    pub fn new() -> Self {
        Self {
            required_tokens: [HEADER_TIME_TOKEN, HEADER_HEIGHT_TOKEN, HEADER_PRESSURE_TOKEN],
        }
    }

    pub fn locate(&self, raw_text: &str) -> std::result::Result<LaunchMetadata, MetadataError> {
        let mut launch_time: Option<(String, String)> = None;
        let mut header_line: Option<usize> = None;

        for (index, line) in raw_text.lines().enumerate() {
            if launch_time.is_none() {
                if let Some(caps) = LAUNCH_TIME_RE.captures(line) {
                    launch_time = Some((caps[1].to_string(), caps[2].to_string()));
                }
            }

            if header_line.is_none() && self.is_header_line(line) {
                header_line = Some(index);
            }

            if launch_time.is_some() && header_line.is_some() {
                break;
            }
        }

        let (date, time) = launch_time.ok_or(MetadataError::LaunchTimeNotFound)?;
        let header_line = header_line.ok_or(MetadataError::HeaderNotFound)?;
        let launch_date = parse_launch_time(&date, &time)?;

        Ok(LaunchMetadata {
            launch_date,
            header_line,
        })
    }

    /// A line qualifies when every required token occurs in it as a substring.
    pub fn is_header_line(&self, line: &str) -> bool {
        self.required_tokens.iter().all(|token| line.contains(token))
    }
}

impl Default for HeaderLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_launch_time(date: &str, time: &str) -> std::result::Result<DateTime<Utc>, MetadataError> {
    let stamp = format!("{} {}", date, time);
    NaiveDateTime::parse_from_str(&stamp, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|_| MetadataError::InvalidLaunchTime(stamp))
}
