//! Error types for SortBot.
//!
//! Hard failures are reserved for genuine invariant violations
//! (`EmptyDistribution`, `CorruptSnapshot`) and infrastructure problems.
//! Out-of-order workflow calls and an empty population are not errors; they
//! surface as [`crate::core::Refusal`] values instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::ItemKind;

/// The main error type for SortBot operations.
#[derive(Error, Debug)]
pub enum SortError {
    /// No training observations exist for an item kind.
    #[error("no training data for item kind '{kind}'")]
    EmptyDistribution { kind: ItemKind },

    /// A persisted label snapshot is unusable.
    #[error("corrupt training snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    /// No snapshot is stored under the given key.
    #[error("training snapshot not found: {key}")]
    SnapshotNotFound { key: String },

    /// I/O errors from snapshot or config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// State machine violations (invalid transitions, unknown entities).
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// Configuration loading or validation errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// The input provider has no more button presses to give.
    #[error("input closed before training finished")]
    InputClosed,
}

/// A specialized Result type for SortBot operations.
pub type Result<T> = std::result::Result<T, SortError>;

impl SortError {
    /// Create an empty distribution error.
    pub fn empty_distribution(kind: ItemKind) -> Self {
        Self::EmptyDistribution { kind }
    }

    /// Create a corrupt snapshot error.
    pub fn corrupt_snapshot(reason: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            reason: reason.into(),
        }
    }

    /// Create a snapshot not found error.
    pub fn snapshot_not_found(key: impl Into<String>) -> Self {
        Self::SnapshotNotFound { key: key.into() }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error means "no usable training" rather than a crash.
    ///
    /// The orchestrator recovers from these by running fresh training.
    pub fn is_recoverable_snapshot_error(&self) -> bool {
        matches!(
            self,
            Self::CorruptSnapshot { .. }
                | Self::SnapshotNotFound { .. }
                | Self::Serde { .. }
                | Self::Storage { .. }
        )
    }
}

impl From<io::Error> for SortError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SortError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Trait for fail-open error handling.
///
/// Persistence is a convenience: a failed read or write is logged and the
/// game carries on with a fallback value.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the SortBot CLI.
pub mod exit_codes {
    /// Every item was sorted correctly.
    pub const PASSED: i32 = 0;

    /// The trial finished with at least one wrong bin, or did not finish.
    pub const FAILED: i32 = 1;

    /// A command failed.
    pub const ERROR: i32 = 2;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}
