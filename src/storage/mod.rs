//! Storage module for persisting crawl checkpoints
//!
//! This module handles:
//! - SQLite database initialization and schema management
//! - Saving and loading `CrawlState` keyed by crawl target identity
//! - An in-memory store for tests and throwaway runs

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryCheckpointStore;
pub use sqlite::SqliteCheckpointStore;
pub use traits::{CheckpointStore, StorageError, StorageResult};

use crate::state::CrawlState;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Opens (creating if needed) a checkpoint database
pub fn open_storage(path: &Path) -> StorageResult<SqliteCheckpointStore> {
    SqliteCheckpointStore::new(path)
}

/// Persisted progress of one crawl target
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    /// Seed URLs of the target, for display
    pub seeds: Vec<String>,
    pub state: CrawlState,
    pub status: CheckpointStatus,
    /// URL the crawl failed on, if it ended in `Failed`
    pub failed_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(
        seeds: Vec<String>,
        state: CrawlState,
        status: CheckpointStatus,
        failed_url: Option<String>,
    ) -> Self {
        Self {
            seeds,
            state,
            status,
            failed_url,
            updated_at: Utc::now(),
        }
    }

    /// Returns true if the crawl reached `Done`
    pub fn is_completed(&self) -> bool {
        self.status == CheckpointStatus::Completed
    }
}

/// Completion marker of a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointStatus {
    /// The crawl is in progress, failed, or was cancelled
    Incomplete,
    /// The crawl reached `Done`
    Completed,
}

impl CheckpointStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Completed => "completed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "incomplete" => Some(Self::Incomplete),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_status_roundtrip() {
        for status in [CheckpointStatus::Incomplete, CheckpointStatus::Completed] {
            assert_eq!(
                CheckpointStatus::from_db_string(status.to_db_string()),
                Some(status)
            );
        }
    }

    #[test]
    fn test_checkpoint_status_invalid() {
        assert_eq!(CheckpointStatus::from_db_string("running"), None);
    }

    #[test]
    fn test_is_completed() {
        let done = Checkpoint::new(vec![], CrawlState::new(), CheckpointStatus::Completed, None);
        let failed = Checkpoint::new(
            vec![],
            CrawlState::new(),
            CheckpointStatus::Incomplete,
            Some("https://example.com/reviews".to_string()),
        );
        assert!(done.is_completed());
        assert!(!failed.is_completed());
    }
}
