//! Test utilities and fixtures for keychord tests
#![allow(dead_code)]

use keychord::keybindings::{Command, CommandRegistry, KeyEvent};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared log of fired command ids
pub type FiredLog = Rc<RefCell<Vec<String>>>;

pub fn fired_log() -> FiredLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A command whose handler appends its id to `log`
pub fn recording(log: &FiredLog, id: &str) -> Command {
    let log = Rc::clone(log);
    let name = id.to_string();
    Command::new(id, id, move |_| {
        log.borrow_mut().push(name.clone());
        Ok(())
    })
}

/// A recording command with a display title distinct from its id
pub fn titled(log: &FiredLog, id: &str, title: &str) -> Command {
    let mut command = recording(log, id);
    command.title = title.to_string();
    command
}

/// Register `commands` for the rest of the test
pub fn register_all(registry: &CommandRegistry, commands: Vec<Command>) {
    for command in commands {
        registry.register(command).forget();
    }
}

/// Key press with no modifiers
pub fn key(k: &str) -> KeyEvent {
    KeyEvent::new(k)
}

/// Key press with CTRL
pub fn ctrl(k: &str) -> KeyEvent {
    KeyEvent::new(k).with_ctrl()
}
