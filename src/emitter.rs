//! Debounced outbound notification of diagram edits.
//!
//! DESIGN
//! ======
//! A background task watches the tracked field. The first notified update
//! arms a quiet-interval timer; every further update inside the window
//! re-arms it. When the timer finally expires the latest value is encoded and
//! sent to the owner as one [`DiagramChanged`]. A burst of N edits therefore
//! produces exactly one event carrying the N-th state.
//!
//! The task is lifecycle-scoped: dropping or shutting down the
//! [`ChangeEmitter`] aborts it, and a pending window is discarded rather than
//! flushed.

#[cfg(test)]
#[path = "emitter_test.rs"]
mod emitter_test;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::codec::{self, EncodedDiagram};
use crate::tracker::FieldState;

/// Outbound event delivered to the editor's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramChanged {
    /// Identifier of the field or record this diagram belongs to.
    pub identifier: String,
    /// Encoded diagram after the edit burst settled.
    #[serde(rename = "encodedDiagram")]
    pub encoded: EncodedDiagram,
}

/// Handle to the running emitter task.
#[derive(Debug)]
pub struct ChangeEmitter {
    handle: JoinHandle<()>,
}

impl ChangeEmitter {
    /// Spawn the emitter on the current tokio runtime.
    ///
    /// With no `identifier`, settled edits are logged at `warn` and dropped.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(
        updates: watch::Receiver<FieldState>,
        identifier: Option<String>,
        quiet: Duration,
        sink: mpsc::Sender<DiagramChanged>,
    ) -> Self {
        let handle = tokio::spawn(run(updates, identifier, quiet, sink));
        Self { handle }
    }

    /// Stop the task. Any pending window is discarded.
    pub fn shutdown(&self) {
        self.handle.abort();
    }

    /// Whether the task has exited (aborted, sink closed, or field dropped).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ChangeEmitter {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run(
    mut updates: watch::Receiver<FieldState>,
    identifier: Option<String>,
    quiet: Duration,
    sink: mpsc::Sender<DiagramChanged>,
) {
    loop {
        if updates.changed().await.is_err() {
            return;
        }
        if !settle(&mut updates, quiet).await {
            return;
        }

        let Some(identifier) = identifier.as_deref() else {
            warn!("no identifier configured; skipping diagram change emission");
            continue;
        };

        let encoded = codec::encode(&updates.borrow_and_update().document);
        let event = DiagramChanged { identifier: identifier.to_owned(), encoded };
        if sink.send(event).await.is_err() {
            debug!(identifier, "change sink closed; stopping emitter");
            return;
        }
    }
}

/// Wait until no update arrives for `quiet`. Returns `false` if the field is gone.
async fn settle(updates: &mut watch::Receiver<FieldState>, quiet: Duration) -> bool {
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
            () = tokio::time::sleep(quiet) => return true,
        }
    }
}
