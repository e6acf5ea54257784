//! SQLite-based workout history.
//!
//! Provides persistent storage for:
//! - Finished or abandoned workouts
//! - Workout statistics (daily and all-time)
//! - Key-value store for application state (the CLI's engine)

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::{DatabaseError, Result};
use crate::timer::Settings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: i64,
    pub settings: Settings,
    pub cycles_completed: u32,
    /// False when the run was stopped before the last work phase ended.
    pub completed: bool,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkoutStats {
    pub total_workouts: u64,
    pub completed_workouts: u64,
    pub total_cycles: u64,
    pub total_work_secs: u64,
    pub today_workouts: u64,
}

/// SQLite database for workout history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/hiit/hiit.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("hiit.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS workouts (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                work_secs        INTEGER NOT NULL,
                rest_secs        INTEGER NOT NULL,
                prepare_secs     INTEGER NOT NULL,
                cycles           INTEGER NOT NULL,
                cycles_completed INTEGER NOT NULL,
                completed        INTEGER NOT NULL,
                started_at       TEXT NOT NULL,
                ended_at         TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_workouts_ended_at ON workouts(ended_at);",
        )?;
        Ok(())
    }

    /// Record a finished or abandoned workout. Returns the new row id.
    pub fn record_workout(
        &self,
        settings: &Settings,
        cycles_completed: u32,
        completed: bool,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO workouts
                (work_secs, rest_secs, prepare_secs, cycles, cycles_completed, completed, started_at, ended_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                settings.work_secs,
                settings.rest_secs,
                settings.prepare_secs,
                settings.cycles,
                cycles_completed,
                completed,
                started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent workouts first.
    pub fn recent_workouts(&self, limit: usize) -> Result<Vec<WorkoutRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, work_secs, rest_secs, prepare_secs, cycles, cycles_completed,
                    completed, started_at, ended_at
             FROM workouts
             ORDER BY ended_at DESC, id DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Settings {
                    work_secs: row.get(1)?,
                    rest_secs: row.get(2)?,
                    prepare_secs: row.get(3)?,
                    cycles: row.get(4)?,
                },
                row.get::<_, u32>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, String>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, settings, cycles_completed, completed, started, ended) = row?;
            records.push(WorkoutRecord {
                id,
                settings,
                cycles_completed,
                completed,
                started_at: parse_timestamp(&started)?,
                ended_at: parse_timestamp(&ended)?,
            });
        }
        Ok(records)
    }

    pub fn stats(&self) -> Result<WorkoutStats> {
        let (total, completed, cycles, work_secs) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(completed), 0),
                    COALESCE(SUM(cycles_completed), 0),
                    COALESCE(SUM(cycles_completed * work_secs), 0)
             FROM workouts",
            [],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                    row.get::<_, u64>(3)?,
                ))
            },
        )?;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let today_workouts = self.conn.query_row(
            "SELECT COUNT(*) FROM workouts WHERE ended_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| row.get::<_, u64>(0),
        )?;

        Ok(WorkoutStats {
            total_workouts: total,
            completed_workouts: completed,
            total_cycles: cycles,
            total_work_secs: work_secs,
            today_workouts,
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            DatabaseError::CorruptRow {
                table: "workouts".into(),
                message: format!("bad timestamp '{raw}': {e}"),
            }
            .into()
        })
}
