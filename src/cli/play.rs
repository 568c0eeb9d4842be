//! Play command for SortBot.
//!
//! Runs a full session: training (or reuse), then a trial driven by the
//! standard pick-classify-deliver loop.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::{sort_one, Game, TraceEvent, TrialReport};
use crate::error::{exit_codes, FailOpen};
use crate::host::{Display, Input, SimWorld};
use crate::storage::SnapshotStore;

/// Options for the play command.
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Label with the ground truth instead of asking.
    pub oracle: bool,
    /// Discard stored training before starting.
    pub retrain: bool,
    /// Seed override.
    pub seed: Option<u64>,
    /// Batch size override.
    pub batch_size: Option<u32>,
}

/// Output format for the play command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayOutput {
    /// Whether the session ran without error.
    pub success: bool,
    /// Whether every item went into its correct bin.
    pub passed: bool,
    /// Whether every item was delivered.
    pub finished: bool,
    pub score: u32,
    pub batch_size: u32,
    pub remaining: usize,
    pub reused_training: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub trace: Vec<TraceEvent>,
    /// Error message if the session failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PlayOutput {
    /// Create an output from a finished session.
    pub fn from_report(report: TrialReport) -> Self {
        Self {
            success: true,
            passed: report.passed(),
            finished: report.outcome.is_some(),
            score: report.score,
            batch_size: report.batch_size,
            remaining: report.remaining,
            reused_training: report.reused_training,
            seed: Some(report.seed),
            trace: report.trace,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            passed: false,
            finished: false,
            score: 0,
            batch_size: 0,
            remaining: 0,
            reused_training: false,
            seed: None,
            trace: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Process exit code for this result.
    pub fn exit_code(&self) -> i32 {
        if !self.success {
            exit_codes::ERROR
        } else if self.passed {
            exit_codes::PASSED
        } else {
            exit_codes::FAILED
        }
    }
}

/// The play command implementation.
pub struct PlayCommand {
    store: Arc<dyn SnapshotStore>,
    config: Config,
}

impl PlayCommand {
    /// Create a new play command.
    pub fn new(store: Arc<dyn SnapshotStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Config with command-line overrides applied.
    fn effective_config(&self, options: &PlayOptions) -> Config {
        let mut config = self.config.clone();
        if let Some(seed) = options.seed {
            config.seed = Some(seed);
        }
        if let Some(batch_size) = options.batch_size {
            config.trial.batch_size = batch_size;
        }
        config
    }

    /// Run the play command against the given collaborators.
    pub fn run(
        &self,
        options: &PlayOptions,
        input: &mut dyn Input,
        display: &mut dyn Display,
    ) -> PlayOutput {
        let config = self.effective_config(options);
        if let Err(e) = config.validate() {
            return PlayOutput::failure(e.to_string());
        }

        if options.retrain {
            self.store
                .clear(&config.training.snapshot_key)
                .fail_open_default("clearing stored training");
        }

        let mut world = SimWorld::new(config.arena.tick_rate, config.arena.contact_radius);
        let mut game = Game::new(Arc::clone(&self.store), config);
        tracing::debug!(seed = game.seed(), "starting session");

        match game.on_agent_run(&mut world, display, input, sort_one) {
            Ok(report) => PlayOutput::from_report(report),
            Err(e) => PlayOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &PlayOutput, options: &PlayOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &PlayOutput) -> String {
        if !output.success {
            return format!(
                "Play failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let mut lines = Vec::new();
        let verdict = if output.passed {
            "PASSED"
        } else if output.finished {
            "FAILED"
        } else {
            "UNFINISHED"
        };
        lines.push(format!(
            "{}: {}/{} sorted correctly",
            verdict, output.score, output.batch_size
        ));
        if !output.finished {
            lines.push(format!("{} item(s) left in the arena", output.remaining));
        }
        if output.reused_training {
            lines.push("Used stored training.".to_string());
        }
        if let Some(seed) = output.seed {
            lines.push(format!("Seed: {}", seed));
        }

        lines.join("\n") + "\n"
    }
}
