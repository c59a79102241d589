//! Integration tests for key event dispatch through the command registry.

mod test_utils;

use keychord::config;
use keychord::keybindings::{Command, CommandRegistry, Dispatcher, KeyEvent};
use keychord::mode::Mode;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use test_utils::*;

fn press(dispatcher: &mut Dispatcher, mut event: KeyEvent) -> (Option<String>, bool) {
    let fired = dispatcher.dispatch(&mut event).unwrap();
    (fired, event.is_consumed())
}

fn editor(log: &FiredLog) -> Dispatcher {
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            recording(log, "save").hotkey("ctrl+s"),
            recording(log, "quit").hotkey("q"),
            recording(log, "go-top").hotkey("g g"),
        ],
    );
    Dispatcher::new(registry)
}

// ============================================================================
// Basic matching
// ============================================================================

#[test]
fn test_single_step_command_fires() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    let (fired, consumed) = press(&mut dispatcher, ctrl("s"));
    assert_eq!(fired.as_deref(), Some("save"));
    assert!(consumed);
    assert_eq!(*log.borrow(), vec!["save"]);
}

#[test]
fn test_sequence_fires_on_second_step() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    assert_eq!(press(&mut dispatcher, key("g")), (None, false));
    let (fired, consumed) = press(&mut dispatcher, key("g"));
    assert_eq!(fired.as_deref(), Some("go-top"));
    assert!(consumed);
    assert_eq!(*log.borrow(), vec!["go-top"]);
}

#[test]
fn test_unbound_key_is_left_unconsumed() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    assert_eq!(press(&mut dispatcher, key("x")), (None, false));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_modifiers_must_match_exactly() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    assert_eq!(press(&mut dispatcher, key("s")).0, None);
    assert_eq!(press(&mut dispatcher, ctrl("s").with_shift()).0, None);
    assert_eq!(press(&mut dispatcher, ctrl("q")).0, None);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_consumed_event_never_fires() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    let mut event = key("q");
    event.consume();
    assert_eq!(dispatcher.dispatch(&mut event).unwrap(), None);
    assert!(log.borrow().is_empty());
}

// ============================================================================
// Sequence timing
// ============================================================================

#[test]
fn test_sequence_times_out() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(&registry, vec![recording(&log, "go-top").hotkey("g g")]);
    let mut dispatcher = Dispatcher::builder()
        .sequence_timeout(Duration::from_millis(20))
        .build(registry);

    press(&mut dispatcher, key("g"));
    std::thread::sleep(Duration::from_millis(40));
    assert_eq!(press(&mut dispatcher, key("g")).0, None);
    assert!(log.borrow().is_empty());
}

#[test]
fn test_idle_timer_discards_pending_step() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    press(&mut dispatcher, key("g"));
    let deadline = dispatcher.tracker().deadline().expect("deadline armed");
    assert!(dispatcher.expire_sequence(deadline));
    assert!(dispatcher.tracker().is_idle());

    assert_eq!(press(&mut dispatcher, key("g")).0, None);
    assert_eq!(press(&mut dispatcher, key("g")).0.as_deref(), Some("go-top"));
}

#[test]
fn test_interrupting_key_restarts_sequence() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    press(&mut dispatcher, key("g"));
    press(&mut dispatcher, key("x"));
    assert_eq!(press(&mut dispatcher, key("g")).0, None);
    assert_eq!(press(&mut dispatcher, key("g")).0.as_deref(), Some("go-top"));
}

// ============================================================================
// Priority
// ============================================================================

#[test]
fn test_sequence_takes_priority_over_single_step() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            recording(&log, "goto").hotkey("g"),
            recording(&log, "go-top").hotkey("g g"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, key("g")).0.as_deref(), Some("goto"));
    // The first g went into the tracker too, so the second completes g g.
    assert_eq!(press(&mut dispatcher, key("g")).0.as_deref(), Some("go-top"));
    assert_eq!(*log.borrow(), vec!["goto", "go-top"]);
}

#[test]
fn test_at_most_one_command_per_event() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            recording(&log, "first").hotkey("k"),
            recording(&log, "second").hotkey("k"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, key("k")).0.as_deref(), Some("first"));
    assert_eq!(*log.borrow(), vec!["first"]);
}

// ============================================================================
// Modes and guards
// ============================================================================

#[test]
fn test_commands_default_to_command_mode() {
    let log = fired_log();
    let mut dispatcher = editor(&log);

    dispatcher.set_mode(Mode::Insert);
    assert_eq!(press(&mut dispatcher, key("q")), (None, false));
    dispatcher.set_mode(Mode::Command);
    assert_eq!(press(&mut dispatcher, key("q")).0.as_deref(), Some("quit"));
}

#[test]
fn test_mode_gating_and_transition() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            Command::new("enter-insert", "Insert", |ctx| {
                ctx.set_mode(Mode::Insert);
                Ok(())
            })
            .hotkey("i"),
            Command::new("leave", "Leave", |ctx| {
                ctx.set_mode(Mode::Command);
                Ok(())
            })
            .hotkey("escape")
            .modes([Mode::Insert]),
            recording(&log, "quit").hotkey("q"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, key("escape")).0, None);
    press(&mut dispatcher, key("i"));
    assert_eq!(dispatcher.mode(), Mode::Insert);

    assert_eq!(press(&mut dispatcher, key("q")).0, None);
    assert_eq!(press(&mut dispatcher, key("escape")).0.as_deref(), Some("leave"));
    assert_eq!(dispatcher.mode(), Mode::Command);
    assert_eq!(press(&mut dispatcher, key("q")).0.as_deref(), Some("quit"));
}

#[test]
fn test_guard_evaluated_per_event() {
    let log = fired_log();
    let enabled = Rc::new(Cell::new(false));
    let registry = CommandRegistry::new();
    let flag = Rc::clone(&enabled);
    register_all(
        &registry,
        vec![recording(&log, "save").hotkey("ctrl+s").guard(move |_| flag.get())],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, ctrl("s")), (None, false));
    enabled.set(true);
    assert_eq!(press(&mut dispatcher, ctrl("s")).0.as_deref(), Some("save"));
}

#[test]
fn test_guard_falls_through_to_next_command() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            recording(&log, "blocked").hotkey("k").guard(|_| false),
            recording(&log, "open").hotkey("k"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, key("k")).0.as_deref(), Some("open"));
}

#[test]
fn test_guard_sees_context_extensions() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![recording(&log, "save")
            .hotkey("ctrl+s")
            .guard(|ctx| ctx.extension("editor") == Some(&json!({ "dirty": true })))],
    );
    let mut dispatcher = Dispatcher::new(registry);
    let dirty = Rc::new(Cell::new(false));
    let state = Rc::clone(&dirty);
    dispatcher.add_context_provider("editor", move |_| json!({ "dirty": state.get() }));

    assert_eq!(press(&mut dispatcher, ctrl("s")).0, None);
    dirty.set(true);
    assert_eq!(press(&mut dispatcher, ctrl("s")).0.as_deref(), Some("save"));
}

// ============================================================================
// Errors and invocation
// ============================================================================

#[test]
fn test_handler_error_leaves_dispatcher_usable() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            Command::new("broken", "Broken", |_| Err(anyhow::anyhow!("disk full"))).hotkey("b"),
            recording(&log, "quit").hotkey("q"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    let mut event = key("b");
    let err = dispatcher.dispatch(&mut event).unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert!(event.is_consumed());

    assert_eq!(press(&mut dispatcher, key("q")).0.as_deref(), Some("quit"));
}

#[test]
fn test_failing_sequence_handler_resets_tracker() {
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            Command::new("broken-top", "Broken", |_| Err(anyhow::anyhow!("no buffer")))
                .hotkey("g g"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, key("g")), (None, false));
    let mut second = key("g");
    assert!(dispatcher.dispatch(&mut second).is_err());
    assert!(second.is_consumed());
    assert!(dispatcher.tracker().is_idle());
    assert!(dispatcher.tracker().deadline().is_none());

    // A lone g afterwards starts a new sequence instead of completing one.
    assert_eq!(press(&mut dispatcher, key("g")), (None, false));
    assert!(dispatcher.dispatch(&mut key("g")).is_err());
}

#[test]
fn test_blank_leader_override_binds_nothing() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(&registry, vec![recording(&log, "go-top").hotkey("g g")]);
    let mut dispatcher = Dispatcher::builder()
        .leader("ctrl+x")
        .bind("go-top", "<leader> ")
        .build(registry);

    press(&mut dispatcher, ctrl("x"));
    assert_eq!(press(&mut dispatcher, key(" ")), (None, false));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_invoke_checks_guard() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            recording(&log, "locked").guard(|_| false),
            recording(&log, "open"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert!(!dispatcher.invoke("locked").unwrap());
    assert!(dispatcher.invoke("open").unwrap());
    assert_eq!(*log.borrow(), vec!["open"]);
}

#[test]
fn test_invoke_ignores_mode() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(&registry, vec![recording(&log, "quit").hotkey("q")]);
    let mut dispatcher = Dispatcher::new(registry);
    dispatcher.set_mode(Mode::Insert);

    assert!(dispatcher.invoke("quit").unwrap());
}

#[test]
fn test_invoke_unknown_command_errors() {
    let mut dispatcher = Dispatcher::new(CommandRegistry::new());
    assert!(dispatcher.invoke("missing").is_err());
}

#[test]
fn test_handler_can_invoke_another_command() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            recording(&log, "save"),
            Command::new("save-quit", "Save and quit", |ctx| {
                ctx.invoke("save")?;
                Ok(())
            })
            .hotkey("ctrl+q"),
        ],
    );
    let mut dispatcher = Dispatcher::new(registry);

    press(&mut dispatcher, ctrl("q"));
    assert_eq!(*log.borrow(), vec!["save"]);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_leader_hotkey() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(&registry, vec![recording(&log, "palette").hotkey("<leader>p")]);
    let mut dispatcher = Dispatcher::builder().leader("space").build(registry);

    assert_eq!(press(&mut dispatcher, key(" ")).0, None);
    assert_eq!(press(&mut dispatcher, key("p")).0.as_deref(), Some("palette"));
}

#[test]
fn test_default_leader_is_ctrl_x() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(&registry, vec![recording(&log, "palette").hotkey("<leader>p")]);
    let mut dispatcher = Dispatcher::new(registry);

    press(&mut dispatcher, ctrl("x"));
    assert_eq!(press(&mut dispatcher, key("p")).0.as_deref(), Some("palette"));
}

#[test]
fn test_keymap_override_replaces_default_hotkey() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(&registry, vec![recording(&log, "save").hotkey("ctrl+s")]);
    let mut dispatcher = Dispatcher::builder().bind("save", "ctrl+w").build(registry);

    assert_eq!(press(&mut dispatcher, ctrl("s")).0, None);
    assert_eq!(press(&mut dispatcher, ctrl("w")).0.as_deref(), Some("save"));
}

#[test]
fn test_from_config() {
    let config = config::parse(
        r#"
leader = "space"
initial_mode = "cursor"

[keymap]
go-top = "<leader>g"
quit = ""
"#,
    )
    .unwrap();

    let log = fired_log();
    let registry = CommandRegistry::new();
    register_all(
        &registry,
        vec![
            recording(&log, "go-top").hotkey("g g").modes([Mode::Cursor]),
            recording(&log, "quit").hotkey("q").modes([Mode::Cursor]),
        ],
    );
    let mut dispatcher = Dispatcher::from_config(&config, registry);

    assert_eq!(dispatcher.mode(), Mode::Cursor);
    assert_eq!(dispatcher.leader(), Some("space"));
    assert_eq!(press(&mut dispatcher, key("q")).0, None);
    press(&mut dispatcher, key(" "));
    assert_eq!(press(&mut dispatcher, key("g")).0.as_deref(), Some("go-top"));
}

// ============================================================================
// Registration lifetime
// ============================================================================

#[test]
fn test_dropped_registration_unbinds_command() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    let registration = registry.register(recording(&log, "quit").hotkey("q"));
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, key("q")).0.as_deref(), Some("quit"));
    drop(registration);
    assert_eq!(press(&mut dispatcher, key("q")).0, None);
}

#[test]
fn test_registering_from_handler() {
    let log = fired_log();
    let registry = CommandRegistry::new();
    let late_log = Rc::clone(&log);
    register_all(
        &registry,
        vec![Command::new("install", "Install", move |ctx| {
            ctx.registry()
                .register(recording(&late_log, "late").hotkey("l"))
                .forget();
            Ok(())
        })
        .hotkey("n")],
    );
    let mut dispatcher = Dispatcher::new(registry);

    assert_eq!(press(&mut dispatcher, key("l")).0, None);
    press(&mut dispatcher, key("n"));
    assert_eq!(press(&mut dispatcher, key("l")).0.as_deref(), Some("late"));
    assert!(dispatcher.registry().contains("late"));
}
