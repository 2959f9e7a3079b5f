pub mod launch;
pub mod measurement;
pub mod performance;

pub use launch::{Launch, NewLaunch};
pub use measurement::{Measurement, MeasurementField, MeasurementRow};
pub use performance::DailyPerformance;
