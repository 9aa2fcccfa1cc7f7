//! In-memory checkpoint store

use crate::storage::traits::{CheckpointStore, StorageResult};
use crate::storage::Checkpoint;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Checkpoint store kept in memory; clones share the same map
///
/// Used by tests and by runs that should not leave state behind.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: Arc<Mutex<HashMap<String, Checkpoint>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkpoints
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self, key: &str) -> StorageResult<Option<Checkpoint>> {
        let checkpoints = self.checkpoints.lock().unwrap_or_else(|e| e.into_inner());
        Ok(checkpoints.get(key).cloned())
    }

    fn save(&mut self, key: &str, checkpoint: &Checkpoint) -> StorageResult<()> {
        let mut checkpoints = self.checkpoints.lock().unwrap_or_else(|e| e.into_inner());
        checkpoints.insert(key.to_string(), checkpoint.clone());
        Ok(())
    }

    fn clear(&mut self, key: &str) -> StorageResult<bool> {
        let mut checkpoints = self.checkpoints.lock().unwrap_or_else(|e| e.into_inner());
        Ok(checkpoints.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::CrawlState;
    use crate::storage::CheckpointStatus;

    #[test]
    fn test_clones_share_checkpoints() {
        let store = MemoryCheckpointStore::new();
        let mut handle = store.clone();

        let checkpoint = Checkpoint::new(
            vec!["https://example.com/reviews".to_string()],
            CrawlState::new(),
            CheckpointStatus::Incomplete,
            None,
        );
        handle.save("target", &checkpoint).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.load("target").unwrap(), Some(checkpoint));
        assert!(handle.clear("target").unwrap());
        assert!(!handle.clear("target").unwrap());
        assert!(store.is_empty());
    }
}
