//! Core types and logic for SortBot.
//!
//! This module contains the item catalog, the label store, the training and
//! trial controllers, the robot workflow state machine, and the game
//! orchestrator that ties them together.

pub mod catalog;
pub mod game;
pub mod labels;
pub mod robot;
pub mod state;
pub mod training;
pub mod trial;

pub use catalog::{Category, ItemKind, KindBag};
pub use game::{sort_one, Game, TrialReport, MAX_STALLED_INVOCATIONS, REUSE_PROMPT};
pub use labels::{CategoryDistribution, LabelSnapshot, LabelStore};
pub use robot::Robot;
pub use state::{
    Bin, Delivery, EventType, RecyclableItem, Refusal, RobotPhase, RobotState, Step, TraceEvent,
    TrialOutcome,
};
pub use training::{TrainingController, TrainingPhase, TrainingSample, DEFAULT_SAMPLES_REQUIRED};
pub use trial::Trial;
