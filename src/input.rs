//! Player input sources.

use std::io::{BufRead, IsTerminal};

use anyhow::{Context, Result};
use dialoguer::Input;
use tracing::warn;

#[cfg(test)]
pub use scripted::ScriptedInput;

/// Source of one line of free text per phase.
pub trait PlayerInput {
    /// Read the player's action for `phase`. `Ok(None)` means input is closed.
    fn read_action(&mut self, phase: &str) -> Result<Option<String>>;
}

fn action_prompt(phase: &str) -> String {
    format!("What action would you like to take in the {} phase?", phase)
}

/// Read one line of player text from `reader`.
///
/// Bytes that are not UTF-8 are replaced rather than rejected. EOF yields `None`.
fn read_action_line(reader: &mut impl BufRead) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let read = reader
        .read_until(b'\n', &mut buf)
        .context("Failed to read player input")?;
    if read == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(&buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Reads from stdin: a `dialoguer` prompt on a terminal, plain lines otherwise.
pub struct TerminalInput {
    interactive: bool,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerInput for TerminalInput {
    fn read_action(&mut self, phase: &str) -> Result<Option<String>> {
        if !self.interactive {
            println!("{}", action_prompt(phase));
            return read_action_line(&mut std::io::stdin().lock());
        }

        match Input::<String>::new()
            .with_prompt(action_prompt(phase))
            .allow_empty(true)
            .interact_text()
        {
            Ok(text) => Ok(Some(text)),
            Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Ok(None)
            }
            // The line is already consumed; carry on with an empty action
            Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::InvalidData => {
                warn!(phase, error = %e, "Player input was not valid UTF-8");
                Ok(Some(String::new()))
            }
            Err(e) => Err(e).context("Failed to read player input"),
        }
    }
}
