//! keychord - command and hotkey dispatch for terminal applications
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod keybindings;
pub mod mode;
pub mod search;
pub mod tui;
