//! Hotkey string parsing.
//!
//! Turns strings like `"ctrl+shift+p"`, `"g g"` or `"<leader>n"` into a
//! [`ParsedHotkey`]. Parsing is total: anything unrecognized becomes a literal
//! key name, so a typo'd hotkey simply never matches.

use std::fmt;

/// Prefix that expands to the configured leader step.
pub const LEADER_TOKEN: &str = "<leader>";

/// Leader used when none is configured.
pub const DEFAULT_LEADER: &str = "ctrl+x";

/// One key press requirement: a key identity plus four modifier flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ParsedStep {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub option: bool,
}

impl ParsedStep {
    /// A step with no modifiers.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn has_modifiers(&self) -> bool {
        self.ctrl || self.meta || self.shift || self.option
    }
}

impl fmt::Display for ParsedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.meta {
            f.write_str("Meta+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        if self.option {
            f.write_str("Option+")?;
        }
        f.write_str(&display_key(&self.key))
    }
}

/// Format a key identity for display.
fn display_key(key: &str) -> String {
    match key {
        " " => "Space".to_string(),
        "up" => "↑".to_string(),
        "down" => "↓".to_string(),
        "left" => "←".to_string(),
        "right" => "→".to_string(),
        k if k.chars().count() <= 1 => k.to_string(),
        k => {
            let mut chars = k.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// An ordered, non-empty list of steps.
///
/// One step is a plain combo; two or more steps form a sequence that must be
/// typed as consecutive key events.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedHotkey {
    steps: Vec<ParsedStep>,
}

impl ParsedHotkey {
    pub fn steps(&self) -> &[ParsedStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn is_sequence(&self) -> bool {
        self.steps.len() > 1
    }

    /// The step of a single-step hotkey.
    pub fn single(&self) -> Option<&ParsedStep> {
        match self.steps.as_slice() {
            [step] => Some(step),
            _ => None,
        }
    }
}

impl fmt::Display for ParsedHotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Parse a hotkey string, expanding `<leader>` to `leader` (or
/// [`DEFAULT_LEADER`] when `None`).
pub fn parse(hotkey: &str, leader: Option<&str>) -> ParsedHotkey {
    if let Some(rest) = hotkey.strip_prefix(LEADER_TOKEN) {
        if !rest.trim().is_empty() {
            let leader = leader.unwrap_or(DEFAULT_LEADER);
            let mut steps = parse_segments(leader);
            steps.extend(parse_segments(rest));
            return ParsedHotkey { steps };
        }
    }

    ParsedHotkey {
        steps: parse_segments(hotkey),
    }
}

/// Whitespace-separated segments, one step each.
fn parse_segments(input: &str) -> Vec<ParsedStep> {
    let steps: Vec<ParsedStep> = input.split_whitespace().map(parse_step).collect();
    if steps.is_empty() {
        // Blank input: one step with an empty key, which no event carries.
        return vec![ParsedStep::key("")];
    }
    steps
}

/// Parse a single `mod+mod+key` segment.
fn parse_step(segment: &str) -> ParsedStep {
    let mut tokens: Vec<&str> = segment.split('+').collect();

    // A trailing `+` names the plus key itself ("+", "ctrl++").
    let key_token = match tokens.pop() {
        Some("") if tokens.last() == Some(&"") => {
            tokens.pop();
            "+"
        }
        Some(token) => token,
        None => segment,
    };

    let mut step = ParsedStep::default();
    for token in tokens {
        match token.to_lowercase().as_str() {
            "ctrl" | "control" => step.ctrl = true,
            "meta" | "alt" => step.meta = true,
            "shift" => step.shift = true,
            "option" => step.option = true,
            // Accepted but not tracked as a modifier.
            "super" => {}
            _ => return ParsedStep::key(segment.to_lowercase()),
        }
    }
    step.key = normalize_key(key_token);
    step
}

/// Case-fold a key name and resolve aliases.
fn normalize_key(token: &str) -> String {
    let key = token.to_lowercase();
    match key.as_str() {
        "esc" => "escape".to_string(),
        "enter" | "cr" => "return".to_string(),
        "del" => "delete".to_string(),
        "space" => " ".to_string(),
        _ => key,
    }
}
