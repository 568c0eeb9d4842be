//! Status command for SortBot.
//!
//! Shows what the stored training would make the robot do.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::{Category, ItemKind, LabelStore};
use crate::error::{exit_codes, SortError};
use crate::storage::SnapshotStore;

/// Options for the status command.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Label summary for one item kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KindStatus {
    pub kind: ItemKind,
    /// The correct category for this kind.
    pub expected: Category,
    pub labels: usize,
    /// Chance the robot picks the correct bin.
    pub accuracy: f64,
    /// Category the robot picks most often.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_likely: Option<Category>,
}

/// Output format for the status command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub snapshot_key: String,
    /// Whether anything is stored under the key.
    pub stored: bool,
    /// Whether the stored training would be offered for reuse.
    pub usable: bool,
    /// Why stored training is not usable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    pub kinds: Vec<KindStatus>,
    /// Chance a full batch is sorted without mistakes, assuming an even
    /// kind mix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_chance: Option<f64>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusOutput {
    fn empty(snapshot_key: &str) -> Self {
        Self {
            success: true,
            snapshot_key: snapshot_key.to_string(),
            stored: false,
            usable: false,
            problem: None,
            kinds: Vec::new(),
            pass_chance: None,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(snapshot_key: &str, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::empty(snapshot_key)
        }
    }

    /// Process exit code for this result.
    pub fn exit_code(&self) -> i32 {
        if self.success {
            exit_codes::PASSED
        } else {
            exit_codes::ERROR
        }
    }
}

/// The status command implementation.
pub struct StatusCommand {
    store: Arc<dyn SnapshotStore>,
    config: Config,
}

impl StatusCommand {
    /// Create a new status command.
    pub fn new(store: Arc<dyn SnapshotStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the status command.
    pub fn run(&self, _options: &StatusOptions) -> StatusOutput {
        let key = self.config.training.snapshot_key.as_str();

        let snapshot = match self.store.read(key) {
            Ok(snapshot) => snapshot,
            Err(SortError::SnapshotNotFound { .. }) => return StatusOutput::empty(key),
            Err(e) if e.is_recoverable_snapshot_error() => {
                return StatusOutput {
                    stored: true,
                    problem: Some(e.to_string()),
                    ..StatusOutput::empty(key)
                };
            }
            Err(e) => return StatusOutput::failure(key, e.to_string()),
        };

        let labels = match LabelStore::from_snapshot(&snapshot) {
            Ok(labels) => labels,
            Err(e) => {
                return StatusOutput {
                    stored: true,
                    problem: Some(e.to_string()),
                    ..StatusOutput::empty(key)
                };
            }
        };

        let kinds: Vec<KindStatus> = ItemKind::ALL
            .into_iter()
            .map(|kind| {
                let distribution = labels.distribution(kind);
                let expected = kind.ground_truth();
                KindStatus {
                    kind,
                    expected,
                    labels: labels.count(kind),
                    accuracy: distribution.probability(expected),
                    most_likely: distribution.mode(),
                }
            })
            .collect();

        let mean_accuracy = kinds.iter().map(|k| k.accuracy).sum::<f64>() / kinds.len() as f64;
        let batch_size = i32::try_from(self.config.trial.batch_size).unwrap_or(i32::MAX);
        let pass_chance = mean_accuracy.powi(batch_size);

        StatusOutput {
            stored: true,
            usable: true,
            kinds,
            pass_chance: Some(pass_chance),
            ..StatusOutput::empty(key)
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatusOutput, options: &StatusOptions) -> String {
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
    fn format_human_readable(&self, output: &StatusOutput) -> String {
        if !output.success {
            return format!(
                "Status failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if !output.stored {
            return format!(
                "No stored training under '{}'. Run `sortbot play` to train.\n",
                output.snapshot_key
            );
        }

        if let Some(problem) = &output.problem {
            return format!(
                "Stored training under '{}' is unusable: {}\nIt will be replaced on the next play.\n",
                output.snapshot_key, problem
            );
        }

        let mut lines = vec![format!("Stored training under '{}':", output.snapshot_key)];
        for kind in &output.kinds {
            let guess = kind
                .most_likely
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "  {:<12} {:>2} label(s)  usually -> {:<8} correct {:>5.1}%",
                kind.kind.to_string(),
                kind.labels,
                guess,
                kind.accuracy * 100.0
            ));
        }
        if let Some(chance) = output.pass_chance {
            lines.push(format!("Chance of a perfect trial: {:.1}%", chance * 100.0));
        }

        lines.join("\n") + "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LabelSnapshot;
    use crate::storage::MemorySnapshotStore;
    use std::collections::BTreeMap;

    fn command(store: MemorySnapshotStore) -> StatusCommand {
        StatusCommand::new(Arc::new(store), Config::default())
    }

    #[test]
    fn test_status_without_training() {
        let cmd = command(MemorySnapshotStore::new());

        let output = cmd.run(&StatusOptions::default());

        assert!(output.success);
        assert!(!output.stored);
        assert!(!output.usable);
        assert!(cmd
            .format_output(&output, &StatusOptions::default())
            .contains("No stored training"));
    }

    #[test]
    fn test_status_with_perfect_training() {
        let mut labels = LabelStore::new();
        for kind in ItemKind::ALL {
            labels.append(kind, kind.ground_truth());
            labels.append(kind, kind.ground_truth());
        }
        let cmd = command(MemorySnapshotStore::with_snapshot(
            "training",
            labels.to_snapshot(),
        ));

        let output = cmd.run(&StatusOptions::default());

        assert!(output.usable);
        assert_eq!(output.kinds.len(), 3);
        for kind in &output.kinds {
            assert_eq!(kind.labels, 2);
            assert_eq!(kind.accuracy, 1.0);
            assert_eq!(kind.most_likely, Some(kind.expected));
        }
        assert_eq!(output.pass_chance, Some(1.0));
    }

    #[test]
    fn test_status_with_mixed_training() {
        let mut labels = LabelStore::new();
        labels.append(ItemKind::SodaCan, Category::Metal);
        labels.append(ItemKind::SodaCan, Category::Plastic);
        labels.append(ItemKind::Note, Category::Paper);
        labels.append(ItemKind::WaterBottle, Category::Paper);
        let cmd = command(MemorySnapshotStore::with_snapshot(
            "training",
            labels.to_snapshot(),
        ));

        let output = cmd.run(&StatusOptions::default());

        let soda = &output.kinds[0];
        assert_eq!(soda.kind, ItemKind::SodaCan);
        assert_eq!(soda.accuracy, 0.5);
        let bottle = &output.kinds[2];
        assert_eq!(bottle.accuracy, 0.0);
        assert_eq!(bottle.most_likely, Some(Category::Paper));
        assert_eq!(output.pass_chance, Some(0.5f64.powi(5)));
    }

    #[test]
    fn test_pass_chance_with_huge_batch() {
        let mut labels = LabelStore::new();
        labels.append(ItemKind::SodaCan, Category::Metal);
        labels.append(ItemKind::Note, Category::Paper);
        labels.append(ItemKind::WaterBottle, Category::Plastic);
        let store = MemorySnapshotStore::with_snapshot("training", labels.to_snapshot());
        let mut config = Config::default();
        config.trial.batch_size = u32::MAX;
        let cmd = StatusCommand::new(Arc::new(store), config);

        let perfect = cmd.run(&StatusOptions::default());
        assert_eq!(perfect.pass_chance, Some(1.0));

        labels.append(ItemKind::SodaCan, Category::Paper);
        let store = MemorySnapshotStore::with_snapshot("training", labels.to_snapshot());
        let mut config = Config::default();
        config.trial.batch_size = u32::MAX;
        let cmd = StatusCommand::new(Arc::new(store), config);

        let chance = cmd.run(&StatusOptions::default()).pass_chance.unwrap();
        assert!((0.0..1e-9).contains(&chance));
    }

    #[test]
    fn test_status_reports_partial_snapshot() {
        let mut raw = BTreeMap::new();
        raw.insert("sodaCan".to_string(), vec!["metal".to_string()]);
        let cmd = command(MemorySnapshotStore::with_snapshot(
            "training",
            LabelSnapshot(raw),
        ));

        let output = cmd.run(&StatusOptions::default());

        assert!(output.success);
        assert!(output.stored);
        assert!(!output.usable);
        assert!(output.problem.unwrap().contains("no labels for"));
    }

    #[test]
    fn test_format_output_json() {
        let cmd = command(MemorySnapshotStore::new());
        let options = StatusOptions {
            json: true,
            ..Default::default()
        };
        let output = cmd.run(&options);

        let formatted = cmd.format_output(&output, &options);
        let value: serde_json::Value = serde_json::from_str(&formatted).unwrap();

        assert_eq!(value["stored"], serde_json::json!(false));
        assert_eq!(value["snapshot_key"], serde_json::json!("training"));
    }
}
