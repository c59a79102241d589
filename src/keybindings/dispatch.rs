//! Dispatch of key events to registered commands.
//!
//! For every key event the dispatcher:
//! 1. skips events another listener already consumed;
//! 2. builds a [`CommandContext`] (mode, registry, provider extensions);
//! 3. keeps commands eligible in the current mode whose guard passes;
//! 4. splits them into single-step and multi-step hotkeys;
//! 5. feeds the event to the shared [`SequenceTracker`] with all multi-step
//!    candidates, firing the first completed sequence;
//! 6. otherwise fires the first single-step command whose step matches;
//! 7. otherwise leaves the event unconsumed.
//!
//! At most one command fires per event.

use super::matcher::{matches, KeyEvent};
use super::parser::{parse, ParsedHotkey};
use super::registry::{Command, CommandRegistry};
use super::sequence::SequenceTracker;
use crate::config::Config;
use crate::mode::{Mode, ModeState};
use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Nested `CommandContext::invoke` calls allowed before bailing out.
const MAX_INVOKE_DEPTH: usize = 16;

/// Contributes one extension value to every context, computed per event.
pub type ContextProvider = Box<dyn Fn(Mode) -> Value>;

/// What a handler or guard sees while a command is evaluated.
pub struct CommandContext<'a> {
    mode: &'a mut ModeState,
    registry: &'a CommandRegistry,
    extensions: Map<String, Value>,
    depth: usize,
}

impl<'a> CommandContext<'a> {
    fn new(mode: &'a mut ModeState, registry: &'a CommandRegistry, extensions: Map<String, Value>) -> Self {
        Self {
            mode,
            registry,
            extensions,
            depth: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    /// Switch modes. The dispatcher sees the new mode on the next event.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode.set(mode);
    }

    pub fn registry(&self) -> &CommandRegistry {
        self.registry
    }

    pub fn commands(&self) -> Vec<Rc<Command>> {
        self.registry.commands()
    }

    /// Value contributed by the context provider registered as `name`.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    pub fn extensions(&self) -> &Map<String, Value> {
        &self.extensions
    }

    /// Run another command by id, subject to its guard.
    ///
    /// Returns `Ok(false)` if the guard rejected it.
    pub fn invoke(&mut self, id: &str) -> Result<bool> {
        if self.depth >= MAX_INVOKE_DEPTH {
            anyhow::bail!("command invocation nested too deeply at {id}");
        }
        let command = self
            .registry
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("unknown command: {id}"))?;
        if !command.guard_allows(self) {
            return Ok(false);
        }
        self.depth += 1;
        let result = command.run(self);
        self.depth -= 1;
        result.map(|()| true)
    }
}

/// A command eligible in the current mode together with its resolved hotkey.
#[derive(Debug, Clone)]
pub struct AvailableCommand {
    pub command: Rc<Command>,
    pub hotkey: Option<Rc<ParsedHotkey>>,
}

/// Hotkey resolution: keymap overrides, leader, and a per-string parse cache.
///
/// The leader is fixed at construction, so caching by hotkey string caches
/// by the (string, leader) pair.
#[derive(Debug, Default)]
struct HotkeyResolver {
    leader: Option<String>,
    keymap: HashMap<String, String>,
    cache: HashMap<String, Rc<ParsedHotkey>>,
}

impl HotkeyResolver {
    fn resolve(&mut self, command: &Command) -> Option<Rc<ParsedHotkey>> {
        let source = match self.keymap.get(&command.id) {
            Some(overridden) => {
                tracing::trace!(command = %command.id, hotkey = %overridden, "keymap override");
                overridden.as_str()
            }
            None => command.hotkey.as_deref()?,
        };
        if source.trim().is_empty() {
            return None;
        }
        if let Some(parsed) = self.cache.get(source) {
            return Some(Rc::clone(parsed));
        }
        let parsed = Rc::new(parse(source, self.leader.as_deref()));
        self.cache.insert(source.to_string(), Rc::clone(&parsed));
        Some(parsed)
    }
}

/// Filter `commands` down to those eligible under `ctx`, resolving hotkeys.
fn collect_available(
    ctx: &CommandContext<'_>,
    commands: Vec<Rc<Command>>,
    resolver: &mut HotkeyResolver,
) -> Vec<AvailableCommand> {
    let mode = ctx.mode();
    commands
        .into_iter()
        .filter(|command| command.is_available_in(mode) && command.guard_allows(ctx))
        .map(|command| {
            let hotkey = resolver.resolve(&command);
            AvailableCommand { command, hotkey }
        })
        .collect()
}

/// Builder for a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    leader: Option<String>,
    keymap: HashMap<String, String>,
    timeout: Option<Duration>,
    initial_mode: Mode,
}

impl DispatcherBuilder {
    pub fn leader(mut self, leader: impl Into<String>) -> Self {
        self.leader = Some(leader.into());
        self
    }

    /// Override the hotkey of `command_id`.
    pub fn bind(mut self, command_id: impl Into<String>, hotkey: impl Into<String>) -> Self {
        self.keymap.insert(command_id.into(), hotkey.into());
        self
    }

    pub fn keymap(mut self, keymap: BTreeMap<String, String>) -> Self {
        self.keymap.extend(keymap);
        self
    }

    pub fn sequence_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn initial_mode(mut self, mode: Mode) -> Self {
        self.initial_mode = mode;
        self
    }

    pub fn build(self, registry: CommandRegistry) -> Dispatcher {
        let tracker = match self.timeout {
            Some(timeout) => SequenceTracker::with_timeout(timeout),
            None => SequenceTracker::new(),
        };
        Dispatcher {
            registry,
            mode: ModeState::new(self.initial_mode),
            tracker,
            resolver: HotkeyResolver {
                leader: self.leader,
                keymap: self.keymap,
                cache: HashMap::new(),
            },
            providers: Vec::new(),
        }
    }
}

/// Owns the mode, the shared sequence tracker and hotkey resolution for one
/// session, and routes key events to commands in a [`CommandRegistry`].
pub struct Dispatcher {
    registry: CommandRegistry,
    mode: ModeState,
    tracker: SequenceTracker,
    resolver: HotkeyResolver,
    providers: Vec<(String, ContextProvider)>,
}

impl Dispatcher {
    /// A dispatcher with the default leader, timeout and mode.
    pub fn new(registry: CommandRegistry) -> Self {
        Self::builder().build(registry)
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn from_config(config: &Config, registry: CommandRegistry) -> Self {
        let mut builder = Self::builder()
            .keymap(config.keymap.clone())
            .sequence_timeout(config.sequence_timeout())
            .initial_mode(config.initial_mode);
        if let Some(leader) = &config.leader {
            builder = builder.leader(leader.clone());
        }
        builder.build(registry)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn mode(&self) -> Mode {
        self.mode.get()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode.set(mode);
    }

    pub fn leader(&self) -> Option<&str> {
        self.resolver.leader.as_deref()
    }

    pub fn tracker(&self) -> &SequenceTracker {
        &self.tracker
    }

    /// Register an extension provider merged into every context under `name`.
    pub fn add_context_provider(
        &mut self,
        name: impl Into<String>,
        provider: impl Fn(Mode) -> Value + 'static,
    ) {
        self.providers.push((name.into(), Box::new(provider)));
    }

    /// The hotkey `command` is bound to, after keymap overrides.
    pub fn resolve_hotkey(&mut self, command: &Command) -> Option<Rc<ParsedHotkey>> {
        self.resolver.resolve(command)
    }

    /// Commands eligible right now, in registration order.
    pub fn available_commands(&mut self) -> Vec<AvailableCommand> {
        let extensions = self.build_extensions();
        let commands = self.registry.commands();
        let ctx = CommandContext::new(&mut self.mode, &self.registry, extensions);
        collect_available(&ctx, commands, &mut self.resolver)
    }

    /// Timer callback for the sequence tracker; see
    /// [`SequenceTracker::expire_if_idle`].
    pub fn expire_sequence(&mut self, now: Instant) -> bool {
        self.tracker.expire_if_idle(now)
    }

    /// Route one key event. Returns the id of the command that fired.
    ///
    /// A handler error is returned as-is; the tracker has already been reset
    /// and no registry borrow is held, so later events dispatch normally.
    pub fn dispatch(&mut self, event: &mut KeyEvent) -> Result<Option<String>> {
        if event.is_consumed() {
            return Ok(None);
        }

        let extensions = self.build_extensions();
        let commands = self.registry.commands();
        let mut ctx = CommandContext::new(&mut self.mode, &self.registry, extensions);
        let available = collect_available(&ctx, commands, &mut self.resolver);

        let (sequences, combos): (Vec<_>, Vec<_>) = available
            .into_iter()
            .filter_map(|entry| entry.hotkey.map(|hotkey| (entry.command, hotkey)))
            .partition(|(_, hotkey)| hotkey.is_sequence());

        if sequences.is_empty() {
            if !self.tracker.is_idle() {
                tracing::trace!("no sequences eligible; discarding pending keys");
                self.tracker.reset();
            }
        } else {
            let candidates: Vec<&ParsedHotkey> =
                sequences.iter().map(|(_, hotkey)| hotkey.as_ref()).collect();
            if let Some(index) = self.tracker.feed(event, &candidates) {
                let (command, hotkey) = &sequences[index];
                event.consume();
                tracing::debug!(command = %command.id, hotkey = %hotkey, mode = %ctx.mode(), "sequence fired");
                command.run(&mut ctx)?;
                return Ok(Some(command.id.clone()));
            }
        }

        for (command, hotkey) in &combos {
            let Some(step) = hotkey.single() else {
                continue;
            };
            if matches(event, step) {
                event.consume();
                tracing::debug!(command = %command.id, hotkey = %hotkey, mode = %ctx.mode(), "command fired");
                command.run(&mut ctx)?;
                return Ok(Some(command.id.clone()));
            }
        }

        Ok(None)
    }

    /// Run a command by id without hotkey matching, subject to its guard.
    ///
    /// Returns `Ok(false)` if the guard rejected it.
    pub fn invoke(&mut self, id: &str) -> Result<bool> {
        let extensions = self.build_extensions();
        let mut ctx = CommandContext::new(&mut self.mode, &self.registry, extensions);
        ctx.invoke(id)
    }

    /// Assemble provider extensions for one dispatch.
    fn build_extensions(&self) -> Map<String, Value> {
        let mode = self.mode.get();
        self.providers
            .iter()
            .map(|(name, provider)| (name.clone(), provider(mode)))
            .collect()
    }
}
