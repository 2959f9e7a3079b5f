//! SQLite persistence for launches and their measurements.

use crate::error::{IngestError, Result};
use crate::models::{Launch, Measurement, MeasurementField, NewLaunch};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod query;

static INSERT_MEASUREMENT_SQL: Lazy<String> = Lazy::new(|| {
    let placeholders: Vec<String> = (1..=MeasurementField::ALL.len() + 1)
        .map(|i| format!("?{}", i))
        .collect();
    format!(
        "INSERT INTO measurements (launch_id, {}) VALUES ({})",
        quoted_columns(),
        placeholders.join(", ")
    )
});

fn quoted_columns() -> String {
    MeasurementField::ALL
        .iter()
        .map(|f| format!("\"{}\"", f.column_name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the store lives, parsed from a `sqlite:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    File(PathBuf),
    Memory,
}

impl DatabaseTarget {
    /// Accepts `sqlite:///relative.db`, `sqlite:////absolute.db`,
    /// `sqlite://` and `sqlite::memory:`.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == "sqlite://" || url == "sqlite::memory:" {
            return Ok(DatabaseTarget::Memory);
        }

        match url.strip_prefix("sqlite:///") {
            Some("") | Some(":memory:") => Ok(DatabaseTarget::Memory),
            Some(path) => Ok(DatabaseTarget::File(PathBuf::from(path))),
            None => Err(IngestError::InvalidFormat(format!(
                "Unsupported database URL '{}': expected sqlite:///<path>",
                url
            ))),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            DatabaseTarget::File(path) => Some(path),
            DatabaseTarget::Memory => None,
        }
    }
}

impl std::fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseTarget::File(path) => write!(f, "{}", path.display()),
            DatabaseTarget::Memory => write!(f, ":memory:"),
        }
    }
}

/// The persistence handle. Opened once per run and passed down to whoever
/// needs it; every launch is written in its own transaction.
#[derive(Debug)]
pub struct LaunchStore {
    conn: Connection,
    target: DatabaseTarget,
}

impl LaunchStore {
    /// Open (creating if needed) the store and make sure the schema exists.
    pub fn open(target: &DatabaseTarget) -> Result<Self> {
        let conn = match target {
            DatabaseTarget::File(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
            DatabaseTarget::Memory => Connection::open_in_memory()?,
        };

        conn.execute_batch(include_str!("schema.sql"))?;
        debug!(database = %target, "Opened launch store");

        Ok(Self {
            conn,
            target: target.clone(),
        })
    }

    /// Open a store that must already exist, read-only. Nothing is created:
    /// a missing file or one without the launch schema is an error.
    pub fn open_existing(target: &DatabaseTarget) -> Result<Self> {
        let path = match target {
            DatabaseTarget::File(path) => path,
            DatabaseTarget::Memory => return Self::open(target),
        };

        if !path.is_file() {
            return Err(IngestError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("database '{}' does not exist", path.display()),
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let has_schema: bool = conn.query_row(
            "SELECT COUNT(*) = 2 FROM sqlite_master
             WHERE type = 'table' AND name IN ('launches', 'measurements')",
            [],
            |row| row.get(0),
        )?;
        if !has_schema {
            return Err(IngestError::InvalidFormat(format!(
                "'{}' is not a launch store",
                path.display()
            )));
        }
        debug!(database = %target, "Opened launch store read-only");

        Ok(Self {
            conn,
            target: target.clone(),
        })
    }

    pub fn open_url(url: &str) -> Result<Self> {
        Self::open(&DatabaseTarget::from_url(url)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&DatabaseTarget::Memory)
    }

    /// Administrative reset: delete the database file and start from an
    /// empty schema.
    pub fn reset(target: &DatabaseTarget) -> Result<Self> {
        if let Some(path) = target.path() {
            if path.exists() {
                std::fs::remove_file(path)?;
                info!(database = %path.display(), "Removed existing database file");
            }
        }
        Self::open(target)
    }

    pub fn target(&self) -> &DatabaseTarget {
        &self.target
    }

    /// Read access for collaborators that query the schema directly.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn find_launch_by_date(&self, launch_date: &DateTime<Utc>) -> Result<Option<Launch>> {
        find_launch_by_date(&self.conn, launch_date)
    }

    /// Write a launch and all of its measurements as one unit of work.
    ///
    /// The duplicate check is repeated inside the transaction so the
    /// uniqueness of `launch_date` holds even if another writer got there
    /// first. Any failure rolls the whole unit back.
    pub fn insert_launch(&mut self, launch: NewLaunch, records: &[Measurement]) -> Result<Launch> {
        let tx = self.conn.transaction()?;

        if find_launch_by_date(&tx, &launch.launch_date)?.is_some() {
            return Err(IngestError::DuplicateLaunch {
                launch_date: launch.launch_date,
            });
        }

        tx.execute(
            "INSERT INTO launches (launch_date, filename) VALUES (?1, ?2)",
            params![launch.launch_date, launch.filename],
        )?;
        let launch_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(&INSERT_MEASUREMENT_SQL)?;
            for record in records {
                let values = std::iter::once(Value::Integer(launch_id)).chain(
                    MeasurementField::ALL
                        .iter()
                        .map(|field| record.sql_value(*field)),
                );
                stmt.execute(params_from_iter(values))?;
            }
        }

        tx.commit()?;
        debug!(launch_id, measurements = records.len(), "Committed launch");

        Ok(launch.into_launch(launch_id))
    }

    /// Delete a launch; its measurements go with it.
    pub fn delete_launch(&mut self, launch_id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM launches WHERE id = ?1", params![launch_id])?;
        Ok(deleted > 0)
    }

    pub fn launch_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM launches", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn measurement_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| IngestError::Storage(err))
    }
}

fn find_launch_by_date(conn: &Connection, launch_date: &DateTime<Utc>) -> Result<Option<Launch>> {
    let launch = conn
        .query_row(
            "SELECT id, launch_date, filename FROM launches WHERE launch_date = ?1",
            params![launch_date],
            |row| {
                Ok(Launch {
                    id: row.get(0)?,
                    launch_date: row.get(1)?,
                    filename: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(launch)
}
