//! Button input collaborator used during training.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::{Category, TrainingSample};
use crate::error::{Result, SortError};

/// The three labelling buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Left,
    Right,
    Up,
}

impl Button {
    /// Every button.
    pub const ALL: [Button; 3] = [Button::Left, Button::Right, Button::Up];

    /// The category a press submits.
    pub fn category(self) -> Category {
        match self {
            Button::Left => Category::Paper,
            Button::Right => Category::Plastic,
            Button::Up => Category::Metal,
        }
    }

    /// The button that submits `category`.
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Paper => Button::Left,
            Category::Plastic => Button::Right,
            Category::Metal => Button::Up,
        }
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Button::Left => "left",
            Button::Right => "right",
            Button::Up => "up",
        };
        f.write_str(name)
    }
}

impl FromStr for Button {
    type Err = String;

    /// Accepts button names, their first letter, or a category name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "l" => Ok(Button::Left),
            "right" | "r" => Ok(Button::Right),
            "up" | "u" => Ok(Button::Up),
            other => other
                .parse::<Category>()
                .map(Button::for_category)
                .map_err(|_| format!("unknown button '{}'", s.trim())),
        }
    }
}

/// Source of human decisions.
pub trait Input {
    /// Block until a labelling button is pressed for `sample`.
    ///
    /// Fails with `InputClosed` when no more input will ever arrive.
    fn press(&mut self, sample: &TrainingSample) -> Result<Button>;

    /// Ask a yes/no question.
    fn confirm(&mut self, question: &str) -> bool;
}

/// Input that replays a fixed script of presses.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    presses: VecDeque<Button>,
    answer: bool,
    /// Questions asked through [`Input::confirm`], in order.
    pub questions: Vec<String>,
    /// Samples shown through [`Input::press`], in order.
    pub shown: Vec<TrainingSample>,
}

impl ScriptedInput {
    /// Create a script of presses. Confirmations answer `answer`.
    pub fn new(presses: impl IntoIterator<Item = Button>, answer: bool) -> Self {
        Self {
            presses: presses.into_iter().collect(),
            answer,
            questions: Vec::new(),
            shown: Vec::new(),
        }
    }

    /// Presses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.presses.len()
    }
}

impl Input for ScriptedInput {
    fn press(&mut self, sample: &TrainingSample) -> Result<Button> {
        self.shown.push(*sample);
        self.presses.pop_front().ok_or(SortError::InputClosed)
    }

    fn confirm(&mut self, question: &str) -> bool {
        self.questions.push(question.to_string());
        self.answer
    }
}

/// Input that always presses the correct button.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleInput {
    /// Answer given to confirmations.
    pub reuse_training: bool,
}

impl Input for OracleInput {
    fn press(&mut self, sample: &TrainingSample) -> Result<Button> {
        Ok(Button::for_category(sample.kind.ground_truth()))
    }

    fn confirm(&mut self, _question: &str) -> bool {
        self.reuse_training
    }
}
