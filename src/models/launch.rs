use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored radiosonde flight. `launch_date` is unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Launch {
    pub id: i64,
    pub launch_date: DateTime<Utc>,
    pub filename: String,
}

/// A launch that has not been written yet; the store assigns its `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLaunch {
    pub launch_date: DateTime<Utc>,
    pub filename: String,
}

impl NewLaunch {
    pub fn new(launch_date: DateTime<Utc>, filename: impl Into<String>) -> Self {
        Self {
            launch_date,
            filename: filename.into(),
        }
    }

    pub fn into_launch(self, id: i64) -> Launch {
        Launch {
            id,
            launch_date: self.launch_date,
            filename: self.filename,
        }
    }
}
