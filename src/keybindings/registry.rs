//! Registry of the commands currently mounted in a session.
//!
//! Commands are added and removed as UI components come and go. Registering
//! returns a [`Registration`] guard that unregisters the command when dropped.
//! Re-registering an identifier replaces the existing command in its slot.

use super::dispatch::CommandContext;
use crate::mode::{Mode, DEFAULT_MODES};
use anyhow::Result;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Command body. Errors propagate to the caller of dispatch/invoke.
pub type Handler = Rc<dyn Fn(&mut CommandContext<'_>) -> Result<()>>;

/// Eligibility predicate, evaluated on every dispatch.
pub type Guard = Rc<dyn Fn(&CommandContext<'_>) -> bool>;

/// A named, invocable action with an optional default hotkey.
#[derive(Clone)]
pub struct Command {
    pub id: String,
    pub title: String,
    /// Default hotkey string; a keymap override takes precedence.
    pub hotkey: Option<String>,
    /// Modes the command is eligible in; `None` means [`DEFAULT_MODES`].
    pub modes: Option<Vec<Mode>>,
    pub category: Option<String>,
    pub icon: Option<String>,
    /// Hidden commands still dispatch but are left out of palettes and help.
    pub hidden: bool,
    handler: Handler,
    guard: Option<Guard>,
}

impl Command {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        handler: impl Fn(&mut CommandContext<'_>) -> Result<()> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            hotkey: None,
            modes: None,
            category: None,
            icon: None,
            hidden: false,
            handler: Rc::new(handler),
            guard: None,
        }
    }

    pub fn hotkey(mut self, hotkey: impl Into<String>) -> Self {
        self.hotkey = Some(hotkey.into());
        self
    }

    pub fn modes(mut self, modes: impl IntoIterator<Item = Mode>) -> Self {
        self.modes = Some(modes.into_iter().collect());
        self
    }

    pub fn guard(mut self, guard: impl Fn(&CommandContext<'_>) -> bool + 'static) -> Self {
        self.guard = Some(Rc::new(guard));
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Whether the command's mode set admits `mode`.
    pub fn is_available_in(&self, mode: Mode) -> bool {
        match &self.modes {
            Some(modes) => modes.contains(&mode),
            None => DEFAULT_MODES.contains(&mode),
        }
    }

    /// Evaluate the guard; commands without one always pass.
    pub fn guard_allows(&self, ctx: &CommandContext<'_>) -> bool {
        self.guard.as_ref().map_or(true, |guard| guard(ctx))
    }

    pub(crate) fn run(&self, ctx: &mut CommandContext<'_>) -> Result<()> {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("hotkey", &self.hotkey)
            .field("modes", &self.modes)
            .field("category", &self.category)
            .field("hidden", &self.hidden)
            .field("guarded", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}

struct Entry {
    command: Rc<Command>,
    generation: u64,
}

#[derive(Default)]
struct Entries {
    entries: Vec<Entry>,
    next_generation: u64,
}

impl Entries {
    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.command.id == id)
    }
}

/// Shared handle to the session's commands.
///
/// Cloning the handle shares the same underlying registry. Accessors return
/// snapshots, so handlers may register or unregister commands while a
/// dispatch is in progress.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    inner: Rc<RefCell<Entries>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `command`, replacing any command with the same id in place.
    pub fn register(&self, command: Command) -> Registration {
        let mut inner = self.inner.borrow_mut();
        let generation = inner.next_generation;
        inner.next_generation += 1;

        let id = command.id.clone();
        let entry = Entry {
            command: Rc::new(command),
            generation,
        };
        match inner.position(&id) {
            Some(index) => {
                tracing::debug!(command = %id, "replacing registered command");
                inner.entries[index] = entry;
            }
            None => inner.entries.push(entry),
        }

        Registration {
            registry: Rc::downgrade(&self.inner),
            id,
            generation,
        }
    }

    /// Remove the command with `id`. Returns false if none was registered.
    pub fn unregister(&self, id: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.position(id) {
            Some(index) => {
                inner.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Rc<Command>> {
        let inner = self.inner.borrow();
        let index = inner.position(id)?;
        Some(Rc::clone(&inner.entries[index].command))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.borrow().position(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }

    /// Snapshot of all commands in registration order.
    pub fn commands(&self) -> Vec<Rc<Command>> {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|e| Rc::clone(&e.command))
            .collect()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.commands().iter().map(|c| &c.id))
            .finish()
    }
}

/// Keeps a command registered for as long as it is alive.
///
/// Dropping the guard unregisters the command, unless it has since been
/// replaced by a newer registration of the same id.
#[must_use = "dropping a Registration unregisters its command"]
pub struct Registration {
    registry: Weak<RefCell<Entries>>,
    id: String,
    generation: u64,
}

impl Registration {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Unregister now.
    pub fn dispose(self) {}

    /// Leave the command registered for the rest of the session.
    pub fn forget(mut self) {
        self.registry = Weak::new();
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let Some(shared) = self.registry.upgrade() else {
            return;
        };
        let Ok(mut inner) = shared.try_borrow_mut() else {
            tracing::warn!(command = %self.id, "registry busy; command left registered");
            return;
        };
        if let Some(index) = inner.position(&self.id) {
            if inner.entries[index].generation == self.generation {
                inner.entries.remove(index);
            }
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(id: &str) -> Command {
        Command::new(id, id.to_uppercase(), |_| Ok(()))
    }

    #[test]
    fn test_drop_unregisters() {
        let registry = CommandRegistry::new();
        let registration = registry.register(noop("save"));
        assert!(registry.contains("save"));
        drop(registration);
        assert!(!registry.contains("save"));
    }

    #[test]
    fn test_forget_keeps_command() {
        let registry = CommandRegistry::new();
        registry.register(noop("save")).forget();
        assert!(registry.contains("save"));
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let registry = CommandRegistry::new();
        registry.register(noop("a")).forget();
        registry.register(noop("b")).forget();
        registry
            .register(Command::new("a", "Replaced", |_| Ok(())))
            .forget();

        let commands = registry.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].id, "a");
        assert_eq!(commands[0].title, "Replaced");
        assert_eq!(commands[1].id, "b");
    }

    #[test]
    fn test_stale_registration_does_not_remove_replacement() {
        let registry = CommandRegistry::new();
        let old = registry.register(noop("a"));
        let new = registry.register(Command::new("a", "Newer", |_| Ok(())));
        old.dispose();
        assert_eq!(registry.get("a").map(|c| c.title.clone()), Some("Newer".to_string()));
        new.dispose();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_registration_outliving_registry_is_harmless() {
        let registry = CommandRegistry::new();
        let registration = registry.register(noop("a"));
        drop(registry);
        drop(registration);
    }

    #[test]
    fn test_default_modes() {
        let command = noop("a");
        assert!(command.is_available_in(Mode::Command));
        assert!(!command.is_available_in(Mode::Insert));

        let insert_only = noop("b").modes([Mode::Insert]);
        assert!(insert_only.is_available_in(Mode::Insert));
        assert!(!insert_only.is_available_in(Mode::Command));
    }
}
