//! Multi-key sequence tracking (`g g`, `<leader>n`) with an idle timeout.
//!
//! The tracker buffers recent key events and tests the buffer's tail against
//! a list of candidate hotkeys. It has two states: idle (empty buffer, no
//! deadline) and accumulating (non-empty buffer, deadline armed). Every
//! `feed` re-arms the deadline, replacing the previous one, so a stale
//! timeout can never clear a buffer that has since grown.
//!
//! The idle timer is a deadline rather than a callback. An event loop calls
//! [`SequenceTracker::expire_if_idle`] when the deadline passes (see
//! [`SequenceTracker::deadline`]); `feed` also applies an overdue reset
//! before buffering, which is what a serialized timer would have done first.

use super::matcher::{matches, KeyEvent};
use super::parser::ParsedHotkey;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Idle window between two steps of a sequence.
pub const DEFAULT_SEQUENCE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct SequenceTracker {
    buffer: VecDeque<KeyEvent>,
    deadline: Option<Instant>,
    timeout: Duration,
}

impl Default for SequenceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceTracker {
    /// Create a tracker with the default timeout of 500 ms.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_SEQUENCE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            buffer: VecDeque::new(),
            deadline: None,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// When the pending sequence will be abandoned, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Number of buffered events.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard the buffer and disarm the timer.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.deadline = None;
    }

    /// Timer callback: reset if the deadline has passed at `now`.
    ///
    /// Returns true if a pending sequence was abandoned.
    pub fn expire_if_idle(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                tracing::trace!(buffered = self.buffer.len(), "key sequence timed out");
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Buffer `event` and test it against `candidates`, in order.
    ///
    /// Returns the index of the first candidate whose steps match the most
    /// recent events. A match resets the tracker.
    pub fn feed(&mut self, event: &KeyEvent, candidates: &[&ParsedHotkey]) -> Option<usize> {
        self.feed_at(event, candidates, Instant::now())
    }

    /// [`feed`](Self::feed) with an explicit clock reading.
    pub fn feed_at(
        &mut self,
        event: &KeyEvent,
        candidates: &[&ParsedHotkey],
        now: Instant,
    ) -> Option<usize> {
        self.expire_if_idle(now);

        let mut buffered = event.clone();
        buffered.consumed = false;
        self.buffer.push_back(buffered);
        self.deadline = Some(now + self.timeout);

        let matched = candidates
            .iter()
            .position(|candidate| self.tail_matches(candidate));
        if let Some(index) = matched {
            self.reset();
            return Some(index);
        }

        let longest = candidates.iter().map(|c| c.len()).max().unwrap_or(0);
        while self.buffer.len() > longest {
            self.buffer.pop_front();
        }
        if self.buffer.is_empty() {
            self.deadline = None;
        }
        None
    }

    /// Do the last `hotkey.len()` buffered events match the hotkey's steps?
    fn tail_matches(&self, hotkey: &ParsedHotkey) -> bool {
        let steps = hotkey.steps();
        if steps.is_empty() || self.buffer.len() < steps.len() {
            return false;
        }
        let start = self.buffer.len() - steps.len();
        self.buffer
            .range(start..)
            .zip(steps)
            .all(|(event, step)| matches(event, step))
    }
}
