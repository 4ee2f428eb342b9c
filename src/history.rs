//! Debounced snapshot history for undo and redo.
//!
//! Every edit notifies the history with the serialized document. Rapid edits
//! supersede each other's pending snapshot, so a burst of typing ends up as
//! a single undo step once the document has been quiet for the debounce
//! window.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

use crate::config::EditorConfig;
use crate::selection::SelectionOffsets;

/// Source of time for the debounce timer.
pub trait Clock {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// One recorded document state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub markup: String,
    pub selection: Option<SelectionOffsets>,
}

impl Snapshot {
    pub fn new(markup: impl Into<String>, selection: Option<SelectionOffsets>) -> Self {
        Self {
            markup: markup.into(),
            selection,
        }
    }
}

#[derive(Debug)]
struct Pending {
    snapshot: Snapshot,
    due: Instant,
}

#[derive(Debug)]
pub struct History {
    current: Snapshot,
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    pending: Option<Pending>,
    last_recorded: Instant,
    window: Duration,
    limit: usize,
}

impl History {
    pub fn new(initial: Snapshot, window: Duration, limit: usize, now: Instant) -> Self {
        Self {
            current: initial,
            undo: Vec::new(),
            redo: Vec::new(),
            pending: None,
            last_recorded: now,
            window,
            limit: limit.max(1),
        }
    }

    pub fn from_config(initial: Snapshot, config: &EditorConfig, now: Instant) -> Self {
        Self::new(initial, config.debounce(), config.history_limit, now)
    }

    /// Schedules a snapshot of `markup`, replacing any snapshot still waiting
    /// for its deadline. A snapshot whose deadline already passed is recorded
    /// first, even if nobody polled in between.
    pub fn notify_edit(
        &mut self,
        markup: impl Into<String>,
        selection: Option<SelectionOffsets>,
        now: Instant,
    ) {
        self.poll(now);
        let superseded = self.pending.is_some();
        self.pending = Some(Pending {
            snapshot: Snapshot::new(markup, selection),
            due: now + self.window,
        });
        tracing::trace!(target: "pure_richtext::history", superseded, "snapshot scheduled");
    }

    /// Records the pending snapshot once its deadline has passed. Returns
    /// whether a new undo step was created.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending.take_if(|pending| pending.due <= now) else {
            return false;
        };
        let quiet = now.saturating_duration_since(self.last_recorded) >= self.window;
        self.last_recorded = now;
        if !quiet {
            tracing::debug!(target: "pure_richtext::history", "snapshot dropped inside debounce window");
            return false;
        }
        self.record(pending.snapshot)
    }

    /// Records the pending snapshot right away, regardless of its deadline.
    pub fn flush(&mut self, now: Instant) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        self.last_recorded = now;
        self.record(pending.snapshot)
    }

    fn record(&mut self, snapshot: Snapshot) -> bool {
        if snapshot.markup == self.current.markup {
            return false;
        }
        let previous = std::mem::replace(&mut self.current, snapshot);
        self.undo.push(previous);
        self.redo.clear();
        while self.undo.len() + 1 > self.limit {
            self.undo.remove(0);
        }
        tracing::debug!(
            target: "pure_richtext::history",
            depth = self.undo_depth(),
            "snapshot recorded"
        );
        true
    }

    /// Steps back one snapshot and returns the state to show.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        let previous = self.undo.pop()?;
        let undone = std::mem::replace(&mut self.current, previous);
        self.redo.push(undone);
        tracing::debug!(target: "pure_richtext::history", depth = self.undo_depth(), "undo");
        Some(&self.current)
    }

    pub fn redo(&mut self) -> Option<&Snapshot> {
        let next = self.redo.pop()?;
        let previous = std::mem::replace(&mut self.current, next);
        self.undo.push(previous);
        tracing::debug!(target: "pure_richtext::history", depth = self.undo_depth(), "redo");
        Some(&self.current)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Top of the undo stack.
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|pending| pending.due)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of entries on the undo stack, including the current state.
    pub fn undo_depth(&self) -> usize {
        self.undo.len() + 1
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
