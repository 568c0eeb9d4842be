//! File-based snapshot storage for SortBot.
//!
//! Snapshots are stored as JSON files in `~/.sortbot/snapshots/`.
//! Atomic writes are achieved via temp file + rename pattern.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::{snapshots_dir, TrainingConfig};
use crate::core::LabelSnapshot;
use crate::error::{Result, SortError};
use crate::storage::SnapshotStore;

/// File-based snapshot storage.
///
/// Stores one JSON file per key in a configurable directory.
/// Uses atomic writes via temp file + rename pattern.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    /// Directory where snapshot files are stored.
    snapshots_dir: PathBuf,
}

impl FileSnapshotStore {
    /// Create a new file snapshot store with the default directory.
    ///
    /// Uses `~/.sortbot/snapshots/` or `$SORTBOT_HOME/snapshots/`.
    pub fn new() -> Result<Self> {
        let dir = snapshots_dir().ok_or_else(|| {
            SortError::config("Could not determine snapshots directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a new file snapshot store with a custom directory.
    pub fn with_dir(snapshots_dir: impl Into<PathBuf>) -> Result<Self> {
        let snapshots_dir = snapshots_dir.into();

        if !snapshots_dir.exists() {
            fs::create_dir_all(&snapshots_dir)
                .map_err(|e| SortError::storage(&snapshots_dir, e))?;
        }

        Ok(Self { snapshots_dir })
    }

    /// Directory holding the snapshot files.
    pub fn dir(&self) -> &Path {
        &self.snapshots_dir
    }

    /// Get the path for a snapshot file.
    pub fn snapshot_path(&self, key: &str) -> PathBuf {
        self.snapshots_dir.join(format!("{}.json", key))
    }

    /// Reject keys that would resolve outside the snapshots directory.
    fn check_key(key: &str) -> Result<()> {
        if TrainingConfig::is_valid_snapshot_key(key) {
            Ok(())
        } else {
            Err(SortError::config(format!("invalid snapshot key '{}'", key)))
        }
    }

    /// Get the path for a temp file used during atomic writes.
    fn temp_path(&self, key: &str) -> PathBuf {
        self.snapshots_dir.join(format!(".{}.json.tmp", key))
    }

    /// Write a snapshot atomically using temp file + rename.
    fn atomic_write(&self, key: &str, snapshot: &LabelSnapshot) -> Result<()> {
        let final_path = self.snapshot_path(key);
        let temp_path = self.temp_path(key);

        let json = serde_json::to_string_pretty(snapshot)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| SortError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| SortError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| SortError::storage(&temp_path, e))?;
        }

        // Rename temp file to final path (atomic on POSIX)
        fs::rename(&temp_path, &final_path).map_err(|e| SortError::storage(&final_path, e))?;

        Ok(())
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn read(&self, key: &str) -> Result<LabelSnapshot> {
        Self::check_key(key)?;
        let path = self.snapshot_path(key);

        if !path.exists() {
            return Err(SortError::snapshot_not_found(key));
        }

        let content = fs::read_to_string(&path).map_err(|e| SortError::storage(&path, e))?;
        let snapshot: LabelSnapshot = serde_json::from_str(&content)?;

        Ok(snapshot)
    }

    fn write(&self, key: &str, snapshot: &LabelSnapshot) -> Result<()> {
        Self::check_key(key)?;
        self.atomic_write(key, snapshot)?;
        tracing::debug!(key, path = %self.snapshot_path(key).display(), "snapshot written");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        Self::check_key(key)?;
        let path = self.snapshot_path(key);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| SortError::storage(&path, e))?;
        }

        // Also clean up any leftover temp file
        let temp_path = self.temp_path(key);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }
}
