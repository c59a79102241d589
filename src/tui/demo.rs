//! Demo command set for the interactive session.

use crate::keybindings::{Command, CommandRegistry, Registration};
use crate::mode::Mode;
use std::cell::Cell;
use std::rc::Rc;

/// Register the demo commands. Returns the guards keeping them mounted.
pub fn register(registry: &CommandRegistry, quit: Rc<Cell<bool>>) -> Vec<Registration> {
    let force_quit = Rc::clone(&quit);
    let commands = vec![
        Command::new("quit", "Quit", move |_| {
            quit.set(true);
            Ok(())
        })
        .hotkey("q")
        .category("Application"),
        Command::new("force-quit", "Force quit", move |_| {
            force_quit.set(true);
            Ok(())
        })
        .hotkey("ctrl+c")
        .modes(Mode::ALL)
        .hidden(true),
        Command::new("help", "Show help", |_| Ok(()))
            .hotkey("?")
            .category("Application"),
        Command::new("palette", "Command palette", |_| Ok(()))
            .hotkey("<leader>p")
            .category("Application"),
        Command::new("save", "Save", |_| Ok(()))
            .hotkey("ctrl+s")
            .category("File"),
        Command::new("go-top", "Go to top", |_| Ok(()))
            .hotkey("g g")
            .modes([Mode::Command, Mode::Cursor])
            .category("Navigation"),
        Command::new("go-bottom", "Go to bottom", |_| Ok(()))
            .hotkey("shift+g")
            .modes([Mode::Command, Mode::Cursor])
            .category("Navigation"),
        Command::new("enter-insert", "Insert mode", |ctx| {
            ctx.set_mode(Mode::Insert);
            Ok(())
        })
        .hotkey("i")
        .category("Modes"),
        Command::new("enter-cursor", "Cursor mode", |ctx| {
            ctx.set_mode(Mode::Cursor);
            Ok(())
        })
        .hotkey("c")
        .category("Modes"),
        Command::new("enter-select", "Select mode", |ctx| {
            ctx.set_mode(Mode::Select);
            Ok(())
        })
        .hotkey("v")
        .modes([Mode::Cursor])
        .category("Modes"),
        Command::new("leave-mode", "Back to command mode", |ctx| {
            ctx.set_mode(Mode::Command);
            Ok(())
        })
        .hotkey("esc")
        .modes([Mode::Cursor, Mode::Select, Mode::Insert])
        .category("Modes"),
    ];

    commands
        .into_iter()
        .map(|command| registry.register(command))
        .collect()
}
