//! Interactive session: reads terminal key events and reports which command
//! each one fires.

mod demo;

use crate::config::Config;
use crate::keybindings::{self, CommandRegistry, Dispatcher, KeyEvent};
use crate::mode::Mode;
use crate::search;
use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use futures::StreamExt;
use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Instant;

pub async fn run(config: Config) -> Result<()> {
    if !std::io::IsTerminal::is_terminal(&io::stdout()) {
        anyhow::bail!("keychord watch requires an interactive terminal");
    }

    let registry = CommandRegistry::new();
    let quit = Rc::new(Cell::new(false));
    let _mounted = demo::register(&registry, Rc::clone(&quit));
    let mut dispatcher = Dispatcher::from_config(&config, registry);
    dispatcher.add_context_provider("session", |mode| {
        serde_json::json!({ "interactive": true, "mode": mode.label() })
    });

    enable_raw_mode()?;
    let result = run_session(&mut dispatcher, &quit).await;
    disable_raw_mode()?;

    result
}

async fn run_session(dispatcher: &mut Dispatcher, quit: &Cell<bool>) -> Result<()> {
    emit(&format!(
        "keychord: {} commands, leader {}, mode {} (q quits)",
        dispatcher.registry().len(),
        dispatcher.leader().unwrap_or(keybindings::DEFAULT_LEADER),
        dispatcher.mode()
    ))?;
    emit(&keybindings::footer_hints(dispatcher, 5))?;

    let mut events = EventStream::new();
    while !quit.get() {
        let deadline = dispatcher.tracker().deadline();
        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    let mut key_event = KeyEvent::from(key);
                    handle_key(dispatcher, &mut key_event)?;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = idle_timer(deadline) => {
                if dispatcher.expire_sequence(Instant::now()) {
                    emit("  (sequence abandoned)")?;
                }
            }
        }
    }
    Ok(())
}

fn handle_key(dispatcher: &mut Dispatcher, event: &mut KeyEvent) -> Result<()> {
    let fired = match dispatcher.dispatch(event) {
        Ok(fired) => fired,
        Err(e) => {
            emit(&format!("  command failed: {e:#}"))?;
            return Ok(());
        }
    };

    match fired.as_deref() {
        Some("help") => {
            for line in keybindings::help_lines(dispatcher) {
                emit(&line)?;
            }
        }
        Some("palette") => {
            for entry in search::search_commands(dispatcher, "") {
                let hotkey = entry.hotkey.unwrap_or_default();
                emit(&format!("  {:14}{}", hotkey, entry.title))?;
            }
        }
        Some(id) => emit(&format!("→ {id} [{}]", dispatcher.mode()))?,
        None if dispatcher.mode() == Mode::Insert => emit(&format!("  typed {:?}", event.key))?,
        None => {}
    }
    Ok(())
}

/// Resolves once the pending sequence's deadline passes; never while idle.
async fn idle_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Print one line in raw mode.
fn emit(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    write!(stdout, "{line}\r\n")?;
    stdout.flush()
}
