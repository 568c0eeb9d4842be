//! Reset command for SortBot.
//!
//! Forgets stored training so the next play starts from scratch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{exit_codes, FailOpen};
use crate::storage::SnapshotStore;

/// Options for the reset command.
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the reset command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub snapshot_key: String,
    /// Whether something was stored before the reset.
    pub removed: bool,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResetOutput {
    /// Process exit code for this result.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            exit_codes::PASSED
        } else {
            exit_codes::ERROR
        }
    }
}

/// The reset command implementation.
pub struct ResetCommand {
    store: Arc<dyn SnapshotStore>,
    config: Config,
}

impl ResetCommand {
    /// Create a new reset command.
    pub fn new(store: Arc<dyn SnapshotStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the reset command.
    pub fn run(&self, _options: &ResetOptions) -> ResetOutput {
        let key = self.config.training.snapshot_key.clone();

        // A corrupt file still counts as stored and still gets removed.
        let removed = self
            .store
            .exists(&key)
            .fail_open_with("checking stored training", true);

        match self.store.clear(&key) {
            Ok(()) => {
                tracing::info!(key = %key, removed, "training reset");
                ResetOutput {
                    success: true,
                    snapshot_key: key,
                    removed,
                    error: None,
                }
            }
            Err(e) => ResetOutput {
                success: false,
                snapshot_key: key,
                removed: false,
                error: Some(e.to_string()),
            },
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ResetOutput, options: &ResetOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "Reset failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }
        if output.removed {
            format!("Forgot stored training '{}'.\n", output.snapshot_key)
        } else {
            "No stored training to forget.\n".to_string()
        }
    }
}
