//! SortBot - a recycling robot that learns to sort from labelled samples
//!
//! A player labels a handful of items by hand. The robot then picks up a
//! batch of litter one item at a time, guesses each item's category by
//! drawing from the labels it was taught, and drops it in the matching bin.
//! The trial passes only when every item lands in its correct bin.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod host;
pub mod storage;

pub use config::Config;
pub use core::{
    sort_one, Category, Game, ItemKind, LabelStore, Robot, TrainingController, Trial,
    TrialReport,
};
pub use error::{Result, SortError};
pub use storage::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};

// CLI commands
pub use cli::{PlayCommand, ResetCommand, StatusCommand};
