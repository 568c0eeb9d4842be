//! Game orchestrator.
//!
//! Runs one full session: restore or collect training, persist it, start a
//! trial, and hand the robot to the embedding loop body until every item
//! has been sorted.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::Config;
use crate::core::labels::LabelStore;
use crate::core::robot::Robot;
use crate::core::state::{TraceEvent, TrialOutcome};
use crate::core::training::TrainingController;
use crate::core::trial::Trial;
use crate::error::{FailOpen, Result, SortError};
use crate::host::{Display, Input, World};
use crate::storage::SnapshotStore;

/// Question asked before reusing persisted training.
pub const REUSE_PROMPT: &str = "Use existing training?";

/// Consecutive loop invocations without a delivery before the session is
/// abandoned.
pub const MAX_STALLED_INVOCATIONS: u32 = 1000;

/// Summary of a finished (or abandoned) session.
#[derive(Debug, Clone, Serialize)]
pub struct TrialReport {
    /// Set when every item was delivered.
    pub outcome: Option<TrialOutcome>,
    pub score: u32,
    pub batch_size: u32,
    /// Items left when the loop stopped.
    pub remaining: usize,
    /// Whether persisted training was reused instead of collected.
    pub reused_training: bool,
    /// Seed the session ran with.
    pub seed: u64,
    pub trace: Vec<TraceEvent>,
}

impl TrialReport {
    fn from_trial(trial: &Trial, reused_training: bool, seed: u64) -> Self {
        Self {
            outcome: trial.outcome(),
            score: trial.score(),
            batch_size: trial.batch_size(),
            remaining: trial.remaining(),
            reused_training,
            seed,
            trace: trial.trace().to_vec(),
        }
    }

    /// True iff the trial finished with every item in its correct bin.
    pub fn passed(&self) -> bool {
        self.outcome.is_some_and(|o| o.passed)
    }
}

/// One game session over a snapshot store.
pub struct Game<S: SnapshotStore> {
    store: S,
    config: Config,
    seed: u64,
    rng: StdRng,
}

impl<S: SnapshotStore> Game<S> {
    /// Create a game. Randomness is seeded from the config, or freshly when
    /// no seed is configured.
    pub fn new(store: S, config: Config) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            store,
            config,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed in use.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load persisted training if it is usable and the user wants it.
    ///
    /// Declining clears the stored snapshot. A missing or unusable snapshot
    /// yields `None` without asking.
    pub fn restore_training(&self, input: &mut dyn Input) -> Option<LabelStore> {
        let key = self.config.training.snapshot_key.as_str();

        let labels = match self
            .store
            .read(key)
            .and_then(|snapshot| LabelStore::from_snapshot(&snapshot))
        {
            Ok(labels) => labels,
            Err(SortError::SnapshotNotFound { .. }) => {
                tracing::debug!(key, "no stored training");
                return None;
            }
            Err(e) => {
                tracing::warn!("stored training unusable: {} (retraining)", e);
                return None;
            }
        };

        if input.confirm(REUSE_PROMPT) {
            tracing::info!(labels = labels.total(), "reusing stored training");
            Some(labels)
        } else {
            self.store
                .clear(key)
                .fail_open_default("clearing stored training");
            tracing::info!("stored training cleared");
            None
        }
    }

    /// Collect a fresh label store from `input`, saving it when configured.
    pub fn train(&mut self, input: &mut dyn Input) -> Result<LabelStore> {
        let mut labels = LabelStore::new();
        let mut controller = TrainingController::new(self.config.training.samples_required);
        controller.run(&mut labels, input, &mut self.rng)?;

        if self.config.training.persist {
            let key = self.config.training.snapshot_key.as_str();
            self.store
                .write(key, &labels.to_snapshot())
                .fail_open_default("saving training");
            tracing::info!(key, "training saved");
        }

        Ok(labels)
    }

    /// Run a full session, invoking `body` until the population is empty.
    ///
    /// Refused steps count as activity, so a body may retry in a different
    /// order on its next invocation. The loop stops early when an invocation
    /// makes no robot call at all, or after [`MAX_STALLED_INVOCATIONS`]
    /// invocations in a row deliver nothing. The report then has no outcome.
    pub fn on_agent_run<F>(
        &mut self,
        world: &mut dyn World,
        display: &mut dyn Display,
        input: &mut dyn Input,
        mut body: F,
    ) -> Result<TrialReport>
    where
        F: FnMut(&mut Robot<'_>) -> Result<()>,
    {
        let (labels, reused_training) = match self.restore_training(input) {
            Some(labels) => (labels, true),
            None => (self.train(input)?, false),
        };

        let mut trial = Trial::start(
            world,
            labels,
            &self.config.arena,
            self.config.trial.batch_size,
            &mut self.rng,
        )?;

        let mut invocations = 0u32;
        let mut stalled = 0u32;
        while trial.recyclables_exist() {
            let remaining = trial.remaining();
            let steps = {
                let mut robot = Robot::new(
                    &mut trial,
                    &mut *world,
                    &mut *display,
                    &self.config.robot,
                    &mut self.rng,
                );
                body(&mut robot)?;
                robot.steps()
            };
            invocations += 1;

            if steps == 0 {
                tracing::warn!(invocations, remaining, "loop body made no robot call, stopping");
                break;
            }

            if trial.remaining() < remaining {
                stalled = 0;
            } else {
                stalled += 1;
                if stalled >= MAX_STALLED_INVOCATIONS {
                    tracing::warn!(
                        invocations,
                        remaining,
                        "no item delivered in {} invocations, stopping",
                        stalled
                    );
                    break;
                }
            }
        }

        Ok(TrialReport::from_trial(&trial, reused_training, self.seed))
    }
}

/// A loop body that sorts one item per invocation.
pub fn sort_one(robot: &mut Robot<'_>) -> Result<()> {
    if robot.recyclables_exist() {
        robot.pick_up_nearest_item();
        robot.classify_held_item()?;
        robot.deliver_to_chosen_bin()?;
    }
    Ok(())
}
