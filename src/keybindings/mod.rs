//! Command and hotkey dispatch.
//!
//! Hotkey strings are parsed into steps ([`parser`]), key events are matched
//! against steps ([`matcher`]), multi-key sequences are buffered by a
//! [`SequenceTracker`], and the [`Dispatcher`] routes each event to at most
//! one command from the [`CommandRegistry`].

pub mod dispatch;
pub mod help;
pub mod matcher;
pub mod parser;
pub mod registry;
pub mod sequence;

pub use dispatch::{AvailableCommand, CommandContext, ContextProvider, Dispatcher, DispatcherBuilder};
pub use help::{footer_hints, help_lines};
pub use matcher::{matches, KeyEvent};
pub use parser::{parse, ParsedHotkey, ParsedStep, DEFAULT_LEADER, LEADER_TOKEN};
pub use registry::{Command, CommandRegistry, Guard, Handler, Registration};
pub use sequence::{SequenceTracker, DEFAULT_SEQUENCE_TIMEOUT};
