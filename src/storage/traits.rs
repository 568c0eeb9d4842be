//! Snapshot storage traits for SortBot.
//!
//! This module defines the `SnapshotStore` trait for label persistence.

use std::sync::Arc;

use crate::core::LabelSnapshot;
use crate::error::{Result, SortError};

/// Trait for snapshot storage backends.
///
/// A store is a key-value map from a snapshot key to a persisted label
/// store. Writes replace the whole value; there is no merging.
pub trait SnapshotStore: Send + Sync {
    /// Retrieve a snapshot by key.
    ///
    /// Fails with `SnapshotNotFound` if nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<LabelSnapshot>;

    /// Save a snapshot, replacing any previous value.
    fn write(&self, key: &str, snapshot: &LabelSnapshot) -> Result<()>;

    /// Remove a snapshot.
    ///
    /// Returns `Ok(())` even if nothing was stored.
    fn clear(&self, key: &str) -> Result<()>;

    /// Check if a snapshot exists.
    fn exists(&self, key: &str) -> Result<bool> {
        match self.read(key) {
            Ok(_) => Ok(true),
            Err(SortError::SnapshotNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Blanket implementation of SnapshotStore for Arc-wrapped stores.
///
/// This allows a test to keep a handle on the store it hands to the game.
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    fn read(&self, key: &str) -> Result<LabelSnapshot> {
        (**self).read(key)
    }

    fn write(&self, key: &str, snapshot: &LabelSnapshot) -> Result<()> {
        (**self).write(key, snapshot)
    }

    fn clear(&self, key: &str) -> Result<()> {
        (**self).clear(key)
    }
}

/// Test utilities for SnapshotStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::{Category, ItemKind, LabelStore};

    /// A snapshot covering every kind.
    pub fn sample_snapshot() -> LabelSnapshot {
        let mut labels = LabelStore::new();
        labels.append(ItemKind::SodaCan, Category::Metal);
        labels.append(ItemKind::SodaCan, Category::Metal);
        labels.append(ItemKind::Note, Category::Paper);
        labels.append(ItemKind::WaterBottle, Category::Plastic);
        labels.to_snapshot()
    }

    /// Test helper to verify SnapshotStore implementations.
    pub fn test_snapshot_store_roundtrip<S: SnapshotStore>(store: &S) {
        let snapshot = sample_snapshot();

        // Initially should not exist
        assert!(!store.exists("training").unwrap());
        assert!(matches!(
            store.read("training"),
            Err(SortError::SnapshotNotFound { .. })
        ));

        store.write("training", &snapshot).unwrap();

        assert!(store.exists("training").unwrap());
        assert_eq!(store.read("training").unwrap(), snapshot);

        // Other keys are independent
        assert!(!store.exists("other").unwrap());

        // Overwrite replaces the value
        let mut smaller = LabelStore::new();
        smaller.append(ItemKind::Note, Category::Paper);
        store.write("training", &smaller.to_snapshot()).unwrap();
        assert_eq!(store.read("training").unwrap(), smaller.to_snapshot());

        store.clear("training").unwrap();
        assert!(!store.exists("training").unwrap());

        // Clear again should succeed
        store.clear("training").unwrap();
    }
}
