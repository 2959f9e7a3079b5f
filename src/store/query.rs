use super::{quoted_columns, LaunchStore};
use crate::error::{IngestError, Result};
use crate::models::{DailyPerformance, Launch, Measurement, MeasurementField, MeasurementRow};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::BTreeMap;

impl LaunchStore {
    /// All launches, newest first.
    pub fn launches(&self) -> Result<Vec<Launch>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, launch_date, filename FROM launches ORDER BY launch_date DESC")?;
        let launches = stmt
            .query_map([], launch_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(launches)
    }

    pub fn launch(&self, launch_id: i64) -> Result<Option<Launch>> {
        let launch = self
            .conn
            .query_row(
                "SELECT id, launch_date, filename FROM launches WHERE id = ?1",
                params![launch_id],
                launch_from_row,
            )
            .optional()?;
        Ok(launch)
    }

    /// Measurements of one launch ordered by `time`.
    pub fn measurements_for_launch(&self, launch_id: i64) -> Result<Vec<MeasurementRow>> {
        let sql = format!(
            "SELECT id, launch_id, {} FROM measurements WHERE launch_id = ?1 ORDER BY \"time\", id",
            quoted_columns()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![launch_id], measurement_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Highest altitude and ascent time per day of the given month. When a day
    /// has several launches the highest-flying one is reported.
    pub fn monthly_performance(&self, year: i32, month: u32) -> Result<Vec<DailyPerformance>> {
        let (start, end) = month_bounds(year, month)?;

        let mut stmt = self.conn.prepare(
            "SELECT l.launch_date, s.max_altitude, s.max_time
             FROM launches l
             JOIN (
                 SELECT launch_id, MAX(\"Height\") AS max_altitude, MAX(\"time\") AS max_time
                 FROM measurements
                 GROUP BY launch_id
             ) s ON s.launch_id = l.id
             WHERE l.launch_date >= ?1 AND l.launch_date < ?2
             ORDER BY l.launch_date",
        )?;

        let flights = stmt
            .query_map(params![start, end], |row| {
                let launch_date: DateTime<Utc> = row.get(0)?;
                Ok(DailyPerformance::new(
                    launch_date.day(),
                    row.get(1)?,
                    row.get(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut best_per_day: BTreeMap<u32, DailyPerformance> = BTreeMap::new();
        for flight in flights {
            let replace = best_per_day
                .get(&flight.day)
                .map_or(true, |best| flight.outperforms(best));
            if replace {
                best_per_day.insert(flight.day, flight);
            }
        }

        Ok(best_per_day.into_values().collect())
    }
}

fn launch_from_row(row: &Row<'_>) -> rusqlite::Result<Launch> {
    Ok(Launch {
        id: row.get(0)?,
        launch_date: row.get(1)?,
        filename: row.get(2)?,
    })
}

fn measurement_from_row(row: &Row<'_>) -> rusqlite::Result<MeasurementRow> {
    let mut values = Measurement::default();
    for (offset, field) in MeasurementField::ALL.iter().enumerate() {
        let index = offset + 2;
        if field.is_integer() {
            values.set_integer(*field, row.get(index)?);
        } else {
            values.set_real(*field, row.get(index)?);
        }
    }

    Ok(MeasurementRow {
        id: row.get(0)?,
        launch_id: row.get(1)?,
        values,
    })
}

fn month_bounds(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || IngestError::InvalidFormat(format!("Invalid month: {}-{:02}", year, month));

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    let midnight = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    Ok((
        midnight(start).ok_or_else(invalid)?,
        midnight(end).ok_or_else(invalid)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLaunch;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn profile(points: &[(f64, Option<f64>)]) -> Vec<Measurement> {
        points
            .iter()
            .map(|(time, height)| {
                let mut m = Measurement::default();
                m.set_real(MeasurementField::Time, Some(*time));
                m.set_real(MeasurementField::Height, *height);
                m
            })
            .collect()
    }

    fn insert(
        store: &mut LaunchStore,
        y: i32,
        mo: u32,
        d: u32,
        h: u32,
        points: &[(f64, Option<f64>)],
    ) -> Launch {
        let date = Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap();
        let filename = format!("{y}{mo:02}{d:02}{h:02}.tsv");
        store
            .insert_launch(NewLaunch::new(date, filename), &profile(points))
            .unwrap()
    }

    #[test]
    fn test_launches_are_newest_first() -> Result<()> {
        let mut store = LaunchStore::open_in_memory()?;
        let older = insert(&mut store, 2016, 6, 1, 12, &[(0.0, Some(1.0))]);
        let newer = insert(&mut store, 2016, 7, 1, 12, &[(0.0, Some(1.0))]);

        assert_eq!(store.launches()?, vec![newer.clone(), older]);
        assert_eq!(store.launch(newer.id)?, Some(newer));
        assert_eq!(store.launch(9999)?, None);

        Ok(())
    }

    #[test]
    fn test_measurements_ordered_by_time() -> Result<()> {
        let mut store = LaunchStore::open_in_memory()?;
        let launch = insert(
            &mut store,
            2016,
            6,
            24,
            18,
            &[(2.0, Some(30.0)), (0.0, Some(10.0)), (1.0, Some(20.0))],
        );

        let times: Vec<Option<f64>> = store
            .measurements_for_launch(launch.id)?
            .iter()
            .map(|r| r.values.time)
            .collect();
        assert_eq!(times, vec![Some(0.0), Some(1.0), Some(2.0)]);

        Ok(())
    }

    #[test]
    fn test_monthly_performance_keeps_best_flight_per_day() -> Result<()> {
        let mut store = LaunchStore::open_in_memory()?;
        insert(&mut store, 2016, 6, 24, 6, &[(0.0, Some(500.0)), (3000.0, Some(18000.0))]);
        insert(&mut store, 2016, 6, 24, 18, &[(0.0, Some(500.0)), (5400.0, Some(31000.0))]);
        insert(&mut store, 2016, 6, 3, 12, &[(0.0, Some(500.0)), (600.0, None)]);
        // Outside the month
        insert(&mut store, 2016, 7, 1, 0, &[(0.0, Some(99999.0))]);
        insert(&mut store, 2016, 5, 31, 23, &[(0.0, Some(99999.0))]);

        let performance = store.monthly_performance(2016, 6)?;
        assert_eq!(
            performance,
            vec![
                DailyPerformance::new(3, Some(500.0), Some(600.0)),
                DailyPerformance::new(24, Some(31000.0), Some(5400.0)),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_december_rolls_into_next_year() -> Result<()> {
        let mut store = LaunchStore::open_in_memory()?;
        insert(&mut store, 2016, 12, 31, 23, &[(120.0, Some(100.0))]);
        insert(&mut store, 2017, 1, 1, 0, &[(120.0, Some(100.0))]);

        let performance = store.monthly_performance(2016, 12)?;
        assert_eq!(performance.len(), 1);
        assert_eq!(performance[0].day, 31);
        assert_eq!(performance[0].ascent_time_minutes, 2.0);

        Ok(())
    }

    #[test]
    fn test_invalid_month() {
        let store = LaunchStore::open_in_memory().unwrap();
        assert!(store.monthly_performance(2016, 13).is_err());
        assert!(store.monthly_performance(2016, 0).is_err());
    }
}
