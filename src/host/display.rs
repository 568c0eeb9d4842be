//! Scoring and speech display collaborator.

use serde::Serialize;

/// Visible feedback surface: the robot's speech bubble, the score counter,
/// and the game-over screen.
pub trait Display {
    /// Show a line of robot speech.
    fn say(&mut self, text: &str);

    /// Add `delta` to the visible score.
    fn change_score(&mut self, delta: i32);

    /// Show the final outcome.
    fn game_over(&mut self, passed: bool);
}

/// Display that records everything it is asked to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordingDisplay {
    pub messages: Vec<String>,
    pub score: i32,
    pub game_over: Option<bool>,
}

impl RecordingDisplay {
    /// Create an empty recording display.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Display for RecordingDisplay {
    fn say(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn change_score(&mut self, delta: i32) {
        self.score += delta;
    }

    fn game_over(&mut self, passed: bool) {
        self.game_over = Some(passed);
    }
}
