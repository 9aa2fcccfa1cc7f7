//! Storage traits and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::storage::Checkpoint;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt checkpoint for {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Key-value store of crawl checkpoints
///
/// Keys are crawl target identities (see `CrawlTarget::identity`).
pub trait CheckpointStore {
    /// Loads the checkpoint for a target, if one exists
    fn load(&self, key: &str) -> StorageResult<Option<Checkpoint>>;

    /// Inserts or replaces the checkpoint for a target
    fn save(&mut self, key: &str, checkpoint: &Checkpoint) -> StorageResult<()>;

    /// Removes the checkpoint for a target. Returns true if one existed.
    fn clear(&mut self, key: &str) -> StorageResult<bool>;
}
