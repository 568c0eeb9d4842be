//! Line-based terminal host for the CLI.

use std::io::{BufRead, Write};

use crate::core::TrainingSample;
use crate::error::{Result, SortError};
use crate::host::display::Display;
use crate::host::input::{Button, Input};

/// Reads button presses and answers from lines of text.
pub struct TerminalInput<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> TerminalInput<R, W> {
    /// Create a terminal input over a reader and a prompt writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Input for TerminalInput<R, W> {
    fn press(&mut self, sample: &TrainingSample) -> Result<Button> {
        loop {
            write!(
                self.writer,
                "[{}] What is this {}? (left = paper, right = plastic, up = metal): ",
                sample.index, sample.kind
            )?;
            self.writer.flush()?;

            let Some(line) = self.read_line()? else {
                return Err(SortError::InputClosed);
            };
            match line.parse::<Button>() {
                Ok(button) => return Ok(button),
                Err(message) => writeln!(self.writer, "{}", message)?,
            }
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        if write!(self.writer, "{} [y/N]: ", question)
            .and_then(|_| self.writer.flush())
            .is_err()
        {
            return false;
        }
        match self.read_line() {
            Ok(Some(answer)) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }
}

/// Prints robot speech, score changes, and the outcome.
pub struct TerminalDisplay<W: Write> {
    writer: W,
    score: i32,
    quiet: bool,
}

impl<W: Write> TerminalDisplay<W> {
    /// Create a terminal display. A quiet display only tracks the score.
    pub fn new(writer: W, quiet: bool) -> Self {
        Self {
            writer,
            score: 0,
            quiet,
        }
    }

    /// Score shown so far.
    pub fn score(&self) -> i32 {
        self.score
    }

    fn emit(&mut self, line: &str) {
        if self.quiet {
            return;
        }
        if let Err(e) = writeln!(self.writer, "{}", line) {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn say(&mut self, text: &str) {
        self.emit(&format!("robot: \"{}\"", text));
    }

    fn change_score(&mut self, delta: i32) {
        self.score += delta;
        self.emit(&format!("score: {}", self.score));
    }

    fn game_over(&mut self, passed: bool) {
        let line = if passed {
            "GAME OVER: you win, every item was sorted correctly"
        } else {
            "GAME OVER: some items ended up in the wrong bin"
        };
        self.emit(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ItemKind;
    use std::io::Cursor;

    fn sample() -> TrainingSample {
        TrainingSample {
            kind: ItemKind::Note,
            index: 3,
        }
    }

    #[test]
    fn test_press_parses_line() {
        let mut out = Vec::new();
        let mut input = TerminalInput::new(Cursor::new("left\n"), &mut out);

        assert_eq!(input.press(&sample()).unwrap(), Button::Left);
        drop(input);
        let prompt = String::from_utf8(out).unwrap();
        assert!(prompt.contains("[3] What is this note?"));
    }

    #[test]
    fn test_press_retries_on_bad_input() {
        let mut out = Vec::new();
        let mut input = TerminalInput::new(Cursor::new("down\nplastic\n"), &mut out);

        assert_eq!(input.press(&sample()).unwrap(), Button::Right);
        drop(input);
        assert!(String::from_utf8(out).unwrap().contains("unknown button 'down'"));
    }

    #[test]
    fn test_press_eof_is_input_closed() {
        let mut input = TerminalInput::new(Cursor::new(""), Vec::new());
        assert!(matches!(input.press(&sample()), Err(SortError::InputClosed)));
    }

    #[test]
    fn test_confirm() {
        let mut input = TerminalInput::new(Cursor::new("yes\nno\n"), Vec::new());
        assert!(input.confirm("Use existing training?"));
        assert!(!input.confirm("Use existing training?"));
        assert!(!input.confirm("Use existing training?"));
    }

    #[test]
    fn test_display_output() {
        let mut out = Vec::new();
        {
            let mut display = TerminalDisplay::new(&mut out, false);
            display.say("hi");
            display.change_score(1);
            display.game_over(true);
            assert_eq!(display.score(), 1);
        }
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("robot: \"hi\""));
        assert!(text.contains("score: 1"));
        assert!(text.contains("you win"));
    }

    #[test]
    fn test_quiet_display_tracks_score_only() {
        let mut out = Vec::new();
        {
            let mut display = TerminalDisplay::new(&mut out, true);
            display.change_score(1);
            assert_eq!(display.score(), 1);
        }
        assert!(out.is_empty());
    }
}
