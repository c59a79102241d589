//! Decoded key events and exact step matching.

use super::parser::ParsedStep;
use crossterm::event::{KeyCode, KeyModifiers};

/// One decoded key press, as delivered by the host input layer.
///
/// `consumed` is set by the dispatcher once a command has claimed the event;
/// later listeners should ignore consumed events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub option: bool,
    pub consumed: bool,
}

impl KeyEvent {
    /// A key press with no modifiers.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_option(mut self) -> Self {
        self.option = true;
        self
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    pub fn consume(&mut self) {
        self.consumed = true;
    }
}

/// True iff the key identity and all four modifier flags are equal.
///
/// An event carrying a modifier the step does not name is a non-match, so
/// `ctrl+s` and `ctrl+shift+s` never fire the same command.
pub fn matches(event: &KeyEvent, step: &ParsedStep) -> bool {
    event.key == step.key
        && event.ctrl == step.ctrl
        && event.meta == step.meta
        && event.shift == step.shift
        && event.option == step.option
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(event: crossterm::event::KeyEvent) -> Self {
        let mut shift = event.modifiers.contains(KeyModifiers::SHIFT);
        let key = match event.code {
            KeyCode::Char(c) => {
                // Terminals report Shift+G as 'G', with or without SHIFT. For
                // symbols ('?', '{') the character already carries the shift.
                if c.is_uppercase() {
                    shift = true;
                } else if !c.is_alphabetic() && c != ' ' {
                    shift = false;
                }
                c.to_lowercase().collect()
            }
            KeyCode::Enter => "return".to_string(),
            KeyCode::Esc => "escape".to_string(),
            KeyCode::Backspace => "backspace".to_string(),
            KeyCode::Tab => "tab".to_string(),
            KeyCode::BackTab => {
                shift = true;
                "tab".to_string()
            }
            KeyCode::Delete => "delete".to_string(),
            KeyCode::Insert => "insert".to_string(),
            KeyCode::Up => "up".to_string(),
            KeyCode::Down => "down".to_string(),
            KeyCode::Left => "left".to_string(),
            KeyCode::Right => "right".to_string(),
            KeyCode::Home => "home".to_string(),
            KeyCode::End => "end".to_string(),
            KeyCode::PageUp => "pageup".to_string(),
            KeyCode::PageDown => "pagedown".to_string(),
            KeyCode::F(n) => format!("f{n}"),
            other => format!("{other:?}").to_lowercase(),
        };

        Self {
            key,
            ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
            meta: event.modifiers.contains(KeyModifiers::ALT),
            shift,
            option: event.modifiers.contains(KeyModifiers::META),
            consumed: false,
        }
    }
}
