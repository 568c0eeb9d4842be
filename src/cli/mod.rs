//! CLI commands for SortBot.
//!
//! - **play**: train (or reuse training) and run one trial
//! - **status**: inspect stored training
//! - **reset**: forget stored training

pub mod play;
pub mod reset;
pub mod status;

pub use play::{PlayCommand, PlayOptions, PlayOutput};
pub use reset::{ResetCommand, ResetOptions, ResetOutput};
pub use status::{StatusCommand, StatusOptions, StatusOutput};
