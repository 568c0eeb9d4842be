//! Snapshot storage for SortBot.
//!
//! This module persists trained label stores between runs, with
//! file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;
pub use traits::SnapshotStore;
