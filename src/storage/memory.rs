//! In-memory snapshot storage for testing.
//!
//! This module provides a thread-safe in-memory implementation of the
//! SnapshotStore trait, primarily for use in unit tests.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::core::LabelSnapshot;
use crate::error::{Result, SortError};
use crate::storage::SnapshotStore;

/// In-memory snapshot store for testing.
///
/// Thread-safe implementation using `RwLock<HashMap>`.
/// Snapshots are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<String, LabelSnapshot>>,
}

impl MemorySnapshotStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store holding one snapshot.
    pub fn with_snapshot(key: impl Into<String>, snapshot: LabelSnapshot) -> Self {
        let store = Self::new();
        store
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), snapshot);
        store
    }

    /// Get the number of snapshots in the store.
    pub fn len(&self) -> usize {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read(&self, key: &str) -> Result<LabelSnapshot> {
        let snapshots = self.snapshots.read().unwrap_or_else(PoisonError::into_inner);
        snapshots
            .get(key)
            .cloned()
            .ok_or_else(|| SortError::snapshot_not_found(key))
    }

    fn write(&self, key: &str, snapshot: &LabelSnapshot) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        snapshots.insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        snapshots.remove(key);
        Ok(())
    }
}
