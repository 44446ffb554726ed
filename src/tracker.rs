//! Tracked field and the dirty/change tracker.
//!
//! DESIGN
//! ======
//! The editor's current value lives in a `tokio::sync::watch` channel. The
//! graph pushes a fresh snapshot into it after every observed mutation, which
//! marks it dirty and wakes subscribers (the change emitter). A programmatic
//! reset swaps the value in place and, unless told to emit, clears the dirty
//! flag without waking anyone. Watch semantics give last-value-wins for free:
//! a subscriber that falls behind only ever sees the newest snapshot.

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tracker_test;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::doc::{Cell, Document};
use crate::graph::GraphListener;

/// Current document plus its dirty flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldState {
    pub document: Document,
    pub dirty: bool,
}

/// Shared handle to the editor's tracked value.
///
/// Clones share the same underlying channel.
#[derive(Debug, Clone)]
pub struct TrackedField {
    tx: Arc<watch::Sender<FieldState>>,
}

impl TrackedField {
    /// Create a clean field holding `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let (tx, _rx) = watch::channel(FieldState { document, dirty: false });
        Self { tx: Arc::new(tx) }
    }

    /// Replace the value after a user edit: marks dirty and notifies subscribers.
    pub fn set(&self, document: Document) {
        self.tx.send_modify(|state| {
            state.document = document;
            state.dirty = true;
        });
    }

    /// Replace the value programmatically.
    ///
    /// With `emit_event = false` the field becomes clean and subscribers are
    /// not woken. With `emit_event = true` the field is marked dirty and
    /// subscribers are notified as for a user edit.
    pub fn reset(&self, document: Document, emit_event: bool) {
        self.tx.send_if_modified(|state| {
            state.document = document;
            state.dirty = emit_event;
            emit_event
        });
    }

    /// Clone of the current document.
    #[must_use]
    pub fn current(&self) -> Document {
        self.tx.borrow().document.clone()
    }

    /// Clone of the current state.
    #[must_use]
    pub fn state(&self) -> FieldState {
        self.tx.borrow().clone()
    }

    /// Whether the value changed since the last quiet reset.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.tx.borrow().dirty
    }

    /// Subscribe to notified updates. The current value counts as already seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FieldState> {
        self.tx.subscribe()
    }
}

/// Graph listener that mirrors every observed mutation into a [`TrackedField`].
pub struct DirtyTracker {
    field: TrackedField,
}

impl DirtyTracker {
    #[must_use]
    pub fn new(field: TrackedField) -> Self {
        Self { field }
    }

    fn record(&self, event: &'static str, cell: &Cell, snapshot: &Document) {
        debug!(event, cell = %cell.id, cells = snapshot.len(), "graph mutated");
        self.field.set(snapshot.clone());
    }
}

impl GraphListener for DirtyTracker {
    fn on_add(&mut self, cell: &Cell, snapshot: &Document) {
        self.record("add", cell, snapshot);
    }

    fn on_change(&mut self, cell: &Cell, snapshot: &Document) {
        self.record("change", cell, snapshot);
    }

    fn on_remove(&mut self, cell: &Cell, snapshot: &Document) {
        self.record("remove", cell, snapshot);
    }
}
