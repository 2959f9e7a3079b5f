use serde::{Deserialize, Serialize};

/// Best flight of one day within a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPerformance {
    pub day: u32,
    /// Highest `Height` reached, if any row recorded one.
    pub max_altitude: Option<f64>,
    /// Largest `time` value converted to minutes; 0 when no row recorded a time.
    pub ascent_time_minutes: f64,
}

impl DailyPerformance {
    pub fn new(day: u32, max_altitude: Option<f64>, max_time_seconds: Option<f64>) -> Self {
        Self {
            day,
            max_altitude,
            ascent_time_minutes: max_time_seconds.map_or(0.0, |t| t / 60.0),
        }
    }

    /// Whether this flight went higher than `other`. A missing altitude never wins.
    pub fn outperforms(&self, other: &DailyPerformance) -> bool {
        match (self.max_altitude, other.max_altitude) {
            (Some(mine), Some(theirs)) => mine > theirs,
            (Some(_), None) => true,
            _ => false,
        }
    }
}
