//! Training controller.
//!
//! Shows one sample at a time, records the human's label for it, and stops
//! once enough samples have been collected:
//!
//! ```text
//! Idle --present_next--> Presenting --submit--> Idle ... --> Done
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::catalog::{Category, ItemKind, KindBag};
use crate::core::labels::LabelStore;
use crate::error::{Result, SortError};
use crate::host::Input;

/// Samples collected before training is done.
pub const DEFAULT_SAMPLES_REQUIRED: usize = 10;

/// The sample currently shown to the human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    /// Kind being shown.
    pub kind: ItemKind,
    /// 1-based position of this sample in the session.
    pub index: usize,
}

/// Training phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrainingPhase {
    /// Waiting to show the next sample.
    #[default]
    Idle,
    /// A sample is on screen, waiting for a label.
    Presenting,
    /// Enough samples collected.
    Done,
}

/// Training state machine.
///
/// The counter counts total samples, not per-kind coverage. The fairness bag
/// makes any run of at least `ItemKind::ALL.len()` samples cover the catalog.
#[derive(Debug, Clone)]
pub struct TrainingController {
    bag: KindBag,
    samples_required: usize,
    collected: usize,
    current: Option<TrainingSample>,
}

impl TrainingController {
    /// Create a controller that finishes after `samples_required` labels.
    pub fn new(samples_required: usize) -> Self {
        Self {
            bag: KindBag::new(),
            samples_required,
            collected: 0,
            current: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> TrainingPhase {
        if self.current.is_some() {
            TrainingPhase::Presenting
        } else if self.collected >= self.samples_required {
            TrainingPhase::Done
        } else {
            TrainingPhase::Idle
        }
    }

    /// Check if training is finished.
    pub fn is_done(&self) -> bool {
        self.phase() == TrainingPhase::Done
    }

    /// Labels collected so far.
    pub fn collected(&self) -> usize {
        self.collected
    }

    /// Labels needed in total.
    pub fn samples_required(&self) -> usize {
        self.samples_required
    }

    /// The sample on screen, if any.
    pub fn current(&self) -> Option<&TrainingSample> {
        self.current.as_ref()
    }

    /// Transition: Idle → Presenting
    pub fn present_next(&mut self, rng: &mut impl Rng) -> Result<TrainingSample> {
        if self.phase() != TrainingPhase::Idle {
            return Err(SortError::invalid_state(format!(
                "Cannot present a sample in {:?} phase",
                self.phase()
            )));
        }

        let sample = TrainingSample {
            kind: self.bag.draw(rng),
            index: self.collected + 1,
        };
        self.current = Some(sample);
        tracing::debug!(kind = %sample.kind, index = sample.index, "presenting sample");
        Ok(sample)
    }

    /// Transition: Presenting → Idle, or Presenting → Done on the last sample
    ///
    /// Appends `category` for the presented kind and returns the new phase.
    pub fn submit(&mut self, labels: &mut LabelStore, category: Category) -> Result<TrainingPhase> {
        let Some(sample) = self.current.take() else {
            return Err(SortError::invalid_state(format!(
                "Cannot submit a label in {:?} phase",
                self.phase()
            )));
        };

        labels.append(sample.kind, category);
        self.collected += 1;
        tracing::debug!(
            kind = %sample.kind,
            %category,
            collected = self.collected,
            "label submitted"
        );
        Ok(self.phase())
    }

    /// Drive the controller to Done, reading labels from `input`.
    pub fn run(
        &mut self,
        labels: &mut LabelStore,
        input: &mut dyn Input,
        rng: &mut impl Rng,
    ) -> Result<()> {
        while !self.is_done() {
            let sample = self.present_next(rng)?;
            let button = input.press(&sample)?;
            self.submit(labels, button.category())?;
        }
        tracing::info!(samples = self.collected, "training complete");
        Ok(())
    }
}

impl Default for TrainingController {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES_REQUIRED)
    }
}
