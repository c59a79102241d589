//! Exclusive interaction mode.
//!
//! Exactly one [`Mode`] is active at a time. The dispatcher reads it to decide
//! which commands are eligible; command handlers change it through
//! [`CommandContext::set_mode`](crate::keybindings::CommandContext::set_mode).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// All interaction states a session can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Default state; keys are interpreted as commands
    #[default]
    Command,
    /// Moving a cursor over content
    Cursor,
    /// Extending a selection
    Select,
    /// Text entry; keys are mostly passed through
    Insert,
}

/// Modes a command is eligible in when it declares none.
pub const DEFAULT_MODES: &[Mode] = &[Mode::Command];

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Command, Mode::Cursor, Mode::Select, Mode::Insert];

    pub fn label(&self) -> &'static str {
        match self {
            Mode::Command => "command",
            Mode::Cursor => "cursor",
            Mode::Select => "select",
            Mode::Insert => "insert",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown mode: {s}"))
    }
}

/// Holder of the single active mode.
#[derive(Debug, Default)]
pub struct ModeState {
    current: Mode,
}

impl ModeState {
    pub fn new(initial: Mode) -> Self {
        Self { current: initial }
    }

    pub fn get(&self) -> Mode {
        self.current
    }

    /// Switch to `mode`. Takes effect for the next dispatched key event.
    pub fn set(&mut self, mode: Mode) {
        if self.current != mode {
            tracing::debug!(from = %self.current, to = %mode, "mode transition");
        }
        self.current = mode;
    }
}
