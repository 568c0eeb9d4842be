//! Runtime state types for a trial.
//!
//! These types describe the item population, the bins, the robot's
//! in-flight workflow context, and the trace of what happened.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::catalog::{Category, ItemKind};
use crate::host::EntityId;

/// One sortable item in the current trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecyclableItem {
    /// World entity for this item.
    pub id: EntityId,
    /// What the item is.
    pub kind: ItemKind,
}

/// A sort destination placed in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bin {
    /// World entity for this bin.
    pub id: EntityId,
    /// What the bin accepts.
    pub category: Category,
}

/// The robot's single in-flight workflow context.
///
/// At most one of `target_item` and `held_item` is set; picking an item up
/// resolves the target. `target_bin` is only set while an item is held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotState {
    /// Item the robot is walking toward.
    pub target_item: Option<EntityId>,
    /// Item the robot is carrying.
    pub held_item: Option<EntityId>,
    /// Bin chosen by classification.
    pub target_bin: Option<EntityId>,
    /// Whether the robot is on its way to `target_bin`.
    pub delivering: bool,
}

impl RobotState {
    /// Current workflow phase.
    pub fn phase(&self) -> RobotPhase {
        match (self.held_item, self.target_bin) {
            (Some(_), Some(_)) if self.delivering => RobotPhase::Delivering,
            (Some(_), Some(_)) => RobotPhase::Classified,
            (Some(_), None) => RobotPhase::Holding,
            (None, _) if self.target_item.is_some() => RobotPhase::Seeking,
            (None, _) => RobotPhase::Idle,
        }
    }

    /// Whether the invariants between the references hold.
    pub fn is_consistent(&self) -> bool {
        let target_xor_held = !(self.target_item.is_some() && self.held_item.is_some());
        let bin_needs_held = self.target_bin.is_none() || self.held_item.is_some();
        let delivering_needs_bin = !self.delivering || self.target_bin.is_some();
        target_xor_held && bin_needs_held && delivering_needs_bin
    }

    /// Check if nothing is targeted, held, or chosen.
    pub fn is_empty(&self) -> bool {
        *self == RobotState::default()
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        *self = RobotState::default();
    }
}

/// Workflow phase of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RobotPhase {
    /// Nothing targeted or held.
    #[default]
    Idle,
    /// Walking toward a target item.
    Seeking,
    /// Carrying an unclassified item.
    Holding,
    /// Carrying an item with a bin chosen.
    Classified,
    /// Carrying an item to the chosen bin.
    Delivering,
}

/// Final result of a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// True iff every item went into its correct bin.
    pub passed: bool,
    /// Correct deliveries.
    pub score: u32,
    /// Items spawned.
    pub batch_size: u32,
}

/// What a single delivery produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub item: RecyclableItem,
    pub bin: Bin,
    /// Whether the bin matched the item's ground truth.
    pub correct: bool,
    /// Set when this delivery emptied the population.
    pub outcome: Option<TrialOutcome>,
}

/// Result of a workflow step that may be refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step<T> {
    /// The step ran.
    Done(T),
    /// The step was called out of order or had nothing to do. The robot
    /// state is unchanged and the reason was shown to the user.
    Refused(Refusal),
}

impl<T> Step<T> {
    /// The value of a completed step.
    pub fn done(self) -> Option<T> {
        match self {
            Step::Done(value) => Some(value),
            Step::Refused(_) => None,
        }
    }

    /// Check if the step was refused.
    pub fn is_refused(&self) -> bool {
        matches!(self, Step::Refused(_))
    }
}

/// Why a workflow step did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    /// The population is empty.
    NothingLeft,
    /// Classification was asked for with nothing in hand.
    NoItemHeld,
    /// Delivery was asked for before classification.
    NoBinChosen,
}

impl Refusal {
    /// The robot's line for this refusal.
    pub fn message(self) -> &'static str {
        match self {
            Refusal::NothingLeft => "I can't find any more trash!",
            Refusal::NoItemHeld => "I don't have an item to classify yet!",
            Refusal::NoBinChosen => "I need to classify this before I can go to a bin!",
        }
    }
}

/// Individual trace event for debugging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceEvent {
    /// Type of event.
    pub event_type: EventType,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Optional details.
    pub details: Option<String>,
}

impl TraceEvent {
    /// Create a new trace event.
    pub fn new(event_type: EventType, details: Option<String>) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            details,
        }
    }
}

/// Event type enum for trace events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Bins and items spawned.
    TrialStarted,
    /// Nearest item chosen.
    ItemTargeted,
    /// Robot reached its target.
    ItemPickedUp,
    /// A bin was chosen for the held item.
    ItemClassified,
    /// The held item reached its bin.
    ItemDelivered,
    /// A step was refused.
    StepRefused,
    /// The population ran out.
    TrialFinished,
}
