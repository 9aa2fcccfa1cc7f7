//! SQLite checkpoint store
//!
//! Each checkpoint is one row; the `CrawlState` is kept as a JSON blob so the
//! schema does not change when the state grows new fields.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CheckpointStore, StorageError, StorageResult};
use crate::storage::{Checkpoint, CheckpointStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite checkpoint backend
pub struct SqliteCheckpointStore {
    conn: Connection,
}

impl SqliteCheckpointStore {
    /// Opens or creates the checkpoint database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl CheckpointStore for SqliteCheckpointStore {
    fn load(&self, key: &str) -> StorageResult<Option<Checkpoint>> {
        let row: Option<(String, String, String, Option<String>, String)> = self
            .conn
            .query_row(
                "SELECT seeds, state, status, failed_url, updated_at
                 FROM checkpoints WHERE target_key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .optional()?;

        let Some((seeds, state, status, failed_url, updated_at)) = row else {
            return Ok(None);
        };

        let corrupt = |reason: String| StorageError::Corrupt {
            key: key.to_string(),
            reason,
        };

        let status = CheckpointStatus::from_db_string(&status)
            .ok_or_else(|| corrupt(format!("unknown status '{}'", status)))?;
        let updated_at = updated_at
            .parse::<DateTime<Utc>>()
            .map_err(|e| corrupt(format!("bad timestamp: {}", e)))?;

        Ok(Some(Checkpoint {
            seeds: serde_json::from_str(&seeds)?,
            state: serde_json::from_str(&state)?,
            status,
            failed_url,
            updated_at,
        }))
    }

    fn save(&mut self, key: &str, checkpoint: &Checkpoint) -> StorageResult<()> {
        let seeds = serde_json::to_string(&checkpoint.seeds)?;
        let state = serde_json::to_string(&checkpoint.state)?;

        self.conn.execute(
            "INSERT INTO checkpoints (target_key, seeds, state, status, failed_url, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(target_key) DO UPDATE SET
                seeds = excluded.seeds,
                state = excluded.state,
                status = excluded.status,
                failed_url = excluded.failed_url,
                updated_at = excluded.updated_at",
            params![
                key,
                seeds,
                state,
                checkpoint.status.to_db_string(),
                checkpoint.failed_url,
                checkpoint.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn clear(&mut self, key: &str) -> StorageResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM checkpoints WHERE target_key = ?1", params![key])?;
        Ok(removed > 0)
    }
}
