//! Host collaborators.
//!
//! The core consumes four collaborators at its boundary:
//!
//! - **world**: positions, following, overlap, and the frame tick
//! - **display**: robot speech, score counter, game-over screen
//! - **input**: labelling buttons and a yes/no prompt
//! - **storage**: snapshot persistence, see [`crate::storage`]
//!
//! Reference implementations live next to each trait so the game runs from
//! the command line and in tests.

pub mod display;
pub mod input;
pub mod sim;
pub mod terminal;
pub mod wait;
pub mod world;

pub use display::{Display, RecordingDisplay};
pub use input::{Button, Input, OracleInput, ScriptedInput};
pub use sim::SimWorld;
pub use terminal::{TerminalDisplay, TerminalInput};
pub use wait::wait_until;
pub use world::{EntityId, EntityKind, Position, World};
