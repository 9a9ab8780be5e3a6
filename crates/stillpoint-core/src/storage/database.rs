//! SQLite-based local storage.
//!
//! Provides persistent storage for:
//! - Completed practice records and statistics
//! - Key-value store for application state (the draft slot lives here)

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeRecord {
    pub session_id: String,
    pub variant_id: String,
    pub duration_secs: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Stats {
    pub total_sessions: u64,
    pub total_secs: u64,
    pub today_sessions: u64,
    pub today_secs: u64,
    pub by_variant: BTreeMap<String, u64>,
}

/// SQLite database for local state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/stillpoint/stillpoint.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(&data_dir()?.join("stillpoint.db"))
    }

    /// Open a database file at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS practice_log (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id    TEXT NOT NULL UNIQUE,
                variant_id    TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                started_at    TEXT NOT NULL,
                completed_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_practice_log_completed_at ON practice_log(completed_at);",
        )?;
        Ok(())
    }

    /// Record a completed practice. Recording the same session twice keeps
    /// the first row.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_practice(&self, record: &PracticeRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO practice_log
                (session_id, variant_id, duration_secs, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.session_id,
                record.variant_id,
                record.duration_secs,
                record.started_at.to_rfc3339(),
                record.completed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent records first.
    pub fn recent_practice(&self, limit: usize) -> Result<Vec<PracticeRecord>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, variant_id, duration_secs, started_at, completed_at
             FROM practice_log
             ORDER BY completed_at DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (session_id, variant_id, duration_secs, started, completed) = row?;
            records.push(PracticeRecord {
                session_id,
                variant_id,
                duration_secs,
                started_at: parse_ts(&started)?,
                completed_at: parse_ts(&completed)?,
            });
        }
        Ok(records)
    }

    pub fn stats(&self) -> Result<Stats, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT variant_id, COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM practice_log
             GROUP BY variant_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (variant, count, secs) = row?;
            stats.total_sessions += count;
            stats.total_secs += secs;
            stats.by_variant.insert(variant, count);
        }

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (today_sessions, today_secs) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM practice_log
             WHERE completed_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        stats.today_sessions = today_sessions;
        stats.today_secs = today_secs;
        Ok(stats)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a key from the kv store. Missing keys are not an error.
    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            key: "practice_log".into(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, variant: &str, secs: u64) -> PracticeRecord {
        let now = Utc::now();
        PracticeRecord {
            session_id: id.into(),
            variant_id: variant.into(),
            duration_secs: secs,
            started_at: now,
            completed_at: now,
        }
    }

    #[test]
    fn record_and_query() {
        let db = Database::open_memory().unwrap();
        db.record_practice(&record("a", "4-6-breathing", 300)).unwrap();
        db.record_practice(&record("b", "4-4-4-breathing", 120)).unwrap();
        db.record_practice(&record("c", "4-6-breathing", 60)).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total_sessions, 3);
        assert_eq!(stats.total_secs, 480);
        assert_eq!(stats.today_sessions, 3);
        assert_eq!(stats.by_variant.get("4-6-breathing"), Some(&2));
    }

    #[test]
    fn duplicate_session_is_ignored() {
        let db = Database::open_memory().unwrap();
        db.record_practice(&record("a", "4-6-breathing", 300)).unwrap();
        db.record_practice(&record("a", "4-6-breathing", 999)).unwrap();
        let recent = db.recent_practice(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].duration_secs, 300);
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_delete("test").unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_delete("test").unwrap();
    }
}
