//! Clipboard bridge: copy the diagram out as text, paste it back in.
//!
//! The clipboard text is exactly the encoded diagram, so a copy from one
//! editor pastes into any other. Both handlers take over the platform's
//! default action by calling [`ClipboardEvent::prevent_default`].

#[cfg(test)]
#[path = "clipboard_test.rs"]
mod clipboard_test;

use std::collections::BTreeMap;

use tracing::debug;

use crate::editor::{Editor, LoadOptions, SurfaceState};

/// MIME type of the plain-text clipboard payload.
pub const TEXT_PLAIN: &str = "text/plain";

/// A copy or paste event as delivered by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipboardEvent {
    data: BTreeMap<String, String>,
    default_prevented: bool,
}

impl ClipboardEvent {
    /// An event with an empty payload, e.g. a copy request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An event carrying `text` as `text/plain`, e.g. a paste.
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut event = Self::new();
        event.set_data(TEXT_PLAIN, text);
        event
    }

    /// Store `value` under `mime`.
    pub fn set_data(&mut self, mime: &str, value: impl Into<String>) {
        self.data.insert(mime.to_owned(), value.into());
    }

    /// Payload stored under `mime`.
    #[must_use]
    pub fn get_data(&self, mime: &str) -> Option<&str> {
        self.data.get(mime).map(String::as_str)
    }

    /// The `text/plain` payload, if present.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.get_data(TEXT_PLAIN)
    }

    /// Suppress the platform's default clipboard action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl Editor {
    /// Write the current tracked document to the clipboard as encoded text.
    pub fn copy_to_clipboard(&self, event: &mut ClipboardEvent) {
        event.prevent_default();
        let encoded = self.encoded_value();
        debug!(bytes = encoded.as_str().len(), "copying diagram to clipboard");
        event.set_data(TEXT_PLAIN, encoded.into_inner());
        self.acknowledge("Diagram copied to clipboard");
    }

    /// Load the clipboard's encoded text and emit it to the owner.
    ///
    /// A missing payload is a no-op load. Any text, even whitespace, is
    /// decoded and recovers like any other bad input. Returns the surface
    /// state after the load.
    pub fn paste_from_clipboard(&mut self, event: &mut ClipboardEvent) -> SurfaceState {
        event.prevent_default();
        let text = event.text().map(str::to_owned);
        if text.is_none() {
            debug!("paste without text payload");
        }

        let state = self.load(text.as_deref(), LoadOptions { emit_event: true });
        if text.is_some() && matches!(state, SurfaceState::Ready | SurfaceState::Loaded) {
            self.acknowledge("Diagram pasted from clipboard");
        }
        state
    }
}
