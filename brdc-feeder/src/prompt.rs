//! User interaction for the credential setup.
//!
//! `TerminalPrompter` talks to the console; tests drive the same flow with
//! `ScriptedPrompter`.

use std::io::{self, BufRead, Write};

/// Source of user answers and sink for prompt text.
pub trait Prompter {
    /// Show a message to the user.
    fn say(&mut self, text: &str);

    /// Read one line of visible input, without the line ending.
    fn read_line(&mut self) -> io::Result<String>;

    /// Read one line without echoing it.
    fn read_hidden(&mut self) -> io::Result<String>;
}

/// Bounded yes/no gate.
///
/// Reads up to `limit` answers and returns `Some(true)` for "y",
/// `Some(false)` for "n" and `None` when no valid answer was given.
pub fn confirm(prompter: &mut dyn Prompter, limit: usize) -> io::Result<Option<bool>> {
    for _ in 0..limit {
        let answer = prompter.read_line()?;
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" => return Ok(Some(true)),
            "n" => return Ok(Some(false)),
            _ => {}
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn say(&mut self, text: &str) {
        println!("{text}");
    }

    fn read_line(&mut self) -> io::Result<String> {
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn read_hidden(&mut self) -> io::Result<String> {
        io::stdout().flush()?;
        rpassword::read_password()
    }
}

// ---------------------------------------------------------------------------
// Scripted answers
// ---------------------------------------------------------------------------

/// Replays canned answers. Once the script runs out every read returns an
/// empty line, like a closed stdin.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: std::collections::VecDeque<String>,
    pub shown: Vec<String>,
    pub reads: usize,
}

#[cfg(test)]
impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        ScriptedPrompter {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn transcript(&self) -> String {
        self.shown.join("\n")
    }

    fn next(&mut self) -> String {
        self.reads += 1;
        self.answers.pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
impl Prompter for ScriptedPrompter {
    fn say(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }

    fn read_line(&mut self) -> io::Result<String> {
        Ok(self.next())
    }

    fn read_hidden(&mut self) -> io::Result<String> {
        Ok(self.next())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_yes_no() {
        assert_eq!(confirm(&mut ScriptedPrompter::new(&["y"]), 3).unwrap(), Some(true));
        assert_eq!(confirm(&mut ScriptedPrompter::new(&["n"]), 3).unwrap(), Some(false));
        assert_eq!(confirm(&mut ScriptedPrompter::new(&[" Y "]), 3).unwrap(), Some(true));
    }

    #[test]
    fn test_confirm_retries_invalid_answers() {
        let mut p = ScriptedPrompter::new(&["maybe", "", "n"]);
        assert_eq!(confirm(&mut p, 3).unwrap(), Some(false));
        assert_eq!(p.reads, 3);
    }

    #[test]
    fn test_confirm_exhausted() {
        let mut p = ScriptedPrompter::new(&["a", "b", "c", "y"]);
        assert_eq!(confirm(&mut p, 3).unwrap(), None);
        assert_eq!(p.reads, 3);
    }
}
