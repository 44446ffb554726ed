//! The editor component: lifecycle, surface load/reset, and wiring.
//!
//! DESIGN
//! ======
//! `Editor` ties the pieces together the way a UI component would:
//!
//! 1. [`Editor::new`]: configuration, toolbox, panel host, notifier.
//! 2. [`Editor::init`]: subscribe the change emitter to the tracked field.
//! 3. [`Editor::attach_surface`]: build the graph, register the dirty
//!    tracker, and load the initial document.
//! 4. [`Editor::destroy`]: tear down the emitter and the surface.
//!
//! Loading is forgiving: malformed input never reaches the caller as an error.
//! The surface is cleared, the failure is logged, and the editor stays usable.
//! The tracked field is left as it was, so the owner's last value survives
//! until the next successful load or edit.

#[cfg(test)]
#[path = "editor_test.rs"]
mod editor_test;

use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::codec::{self, EncodedDiagram};
use crate::config::EditorConfig;
use crate::consts::NOTIFY_DISMISS_LABEL;
use crate::doc::{CellId, Document};
use crate::emitter::{ChangeEmitter, DiagramChanged};
use crate::graph::{Graph, GraphError};
use crate::notify::Notifier;
use crate::panel::{CellView, PanelDispatcher, PanelHost};
use crate::toolbox::{Toolbox, ToolboxError};
use crate::tracker::{DirtyTracker, TrackedField};

/// Where the rendering surface is in its load/reset lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// No surface yet; loads are ignored.
    Uninitialized,
    /// Surface exists and shows an empty document.
    Ready,
    /// A non-empty document was decoded and applied.
    Loaded,
    /// The last load failed and the surface was cleared.
    ErrorRecovered,
}

/// Options for [`Editor::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Mark the loaded value dirty and route it through the change emitter.
    pub emit_event: bool,
}

/// Error returned by operations that mutate the graph on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditorError {
    #[error("the rendering surface is not attached")]
    SurfaceNotAttached,
    #[error(transparent)]
    Toolbox(#[from] ToolboxError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// A UML diagram editor bound to one tracked value.
pub struct Editor {
    config: EditorConfig,
    toolbox: Toolbox,
    field: TrackedField,
    graph: Option<Graph>,
    state: SurfaceState,
    panels: PanelDispatcher,
    notifier: Box<dyn Notifier>,
    emitter: Option<ChangeEmitter>,
}

impl Editor {
    /// Create an editor with no surface and no emitter.
    #[must_use]
    pub fn new(
        config: EditorConfig,
        toolbox: Toolbox,
        panels: Box<dyn PanelHost>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let panels = PanelDispatcher::new(panels, config.panel_container.clone());
        Self {
            config,
            toolbox,
            field: TrackedField::new(Document::empty()),
            graph: None,
            state: SurfaceState::Uninitialized,
            panels,
            notifier,
            emitter: None,
        }
    }

    // --- Lifecycle ---

    /// Start the change emitter, delivering settled edits to `sink`.
    ///
    /// Calling this again replaces (and stops) the previous emitter.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn init(&mut self, sink: mpsc::Sender<DiagramChanged>) {
        if self.config.identifier.is_none() {
            debug!("editor has no identifier; settled edits will not be emitted");
        }
        self.emitter = Some(ChangeEmitter::spawn(
            self.field.subscribe(),
            self.config.identifier.clone(),
            self.config.debounce,
            sink,
        ));
    }

    /// Build the surface and load the initial document, if any.
    ///
    /// Does nothing when a surface already exists.
    pub fn attach_surface(&mut self) -> SurfaceState {
        if self.graph.is_some() {
            return self.state;
        }

        let mut graph = Graph::new();
        graph.add_listener(Box::new(DirtyTracker::new(self.field.clone())));
        self.graph = Some(graph);
        self.state = SurfaceState::Ready;
        debug!("surface attached");

        let initial = self.config.initial_document.clone();
        self.load(initial.as_deref(), LoadOptions::default())
    }

    /// Stop the emitter, close any panel, and drop the surface.
    ///
    /// Pending debounced edits are discarded.
    pub fn destroy(&mut self) {
        if let Some(emitter) = self.emitter.take() {
            emitter.shutdown();
        }
        self.panels.close();
        self.graph = None;
        self.state = SurfaceState::Uninitialized;
        debug!("editor destroyed");
    }

    // --- Load / reset ---

    /// Decode `value` and replace the surface's contents with it.
    ///
    /// `None`, or a call before the surface exists, is a no-op. A value that
    /// fails to decode or apply clears the surface and moves to
    /// [`SurfaceState::ErrorRecovered`] without touching the tracked field.
    pub fn load(&mut self, value: Option<&str>, options: LoadOptions) -> SurfaceState {
        let Some(value) = value else {
            debug!("load without a value; nothing to do");
            return self.state;
        };
        let Some(graph) = self.graph.as_mut() else {
            debug!("load before the surface is attached; ignoring");
            return self.state;
        };

        let doc = match codec::decode(value) {
            Ok(doc) => doc,
            Err(e) => return self.recover(&e),
        };
        if let Err(e) = graph.reset(&doc) {
            return self.recover(&e);
        }

        self.state = if doc.is_empty() { SurfaceState::Ready } else { SurfaceState::Loaded };
        info!(cells = doc.len(), emit = options.emit_event, "diagram loaded");
        self.field.reset(doc, options.emit_event);
        self.state
    }

    /// Discard local edits by reloading the initial document, or the empty
    /// document when none was supplied.
    pub fn reset(&mut self) -> SurfaceState {
        let value = self
            .config
            .initial_document
            .clone()
            .unwrap_or_else(|| codec::encode(&Document::EMPTY).into_inner());
        self.load(Some(&value), LoadOptions::default())
    }

    fn recover(&mut self, err: &dyn std::error::Error) -> SurfaceState {
        error!(error = %err, "failed to load diagram; clearing surface");
        if let Some(graph) = self.graph.as_mut() {
            graph.clear();
        }
        self.state = SurfaceState::ErrorRecovered;
        self.state
    }

    // --- Toolbox ---

    /// Insert a new element of `cell_type` at a random position.
    ///
    /// # Errors
    ///
    /// Returns [`EditorError::Toolbox`] for an unregistered type and
    /// [`EditorError::SurfaceNotAttached`] before [`Editor::attach_surface`].
    /// The graph is not mutated on error.
    pub fn add_from_toolbox(&mut self, cell_type: &str) -> Result<CellId, EditorError> {
        self.add_from_toolbox_with(cell_type, &mut rand::rng())
    }

    /// [`Editor::add_from_toolbox`] with an explicit random source.
    ///
    /// # Errors
    ///
    /// See [`Editor::add_from_toolbox`].
    pub fn add_from_toolbox_with<R: Rng + ?Sized>(&mut self, cell_type: &str, rng: &mut R) -> Result<CellId, EditorError> {
        let graph = self.graph.as_mut().ok_or(EditorError::SurfaceNotAttached)?;
        let cell = self.toolbox.instantiate(cell_type, self.config.position_bounds, rng)?;
        let id = cell.id;
        graph.add_cell(cell)?;
        debug!(cell = %id, cell_type, "element added from toolbox");
        Ok(id)
    }

    // --- Panels ---

    /// Route a double-click on a rendered cell to the matching panel.
    ///
    /// Returns `true` if a panel was opened.
    pub fn on_cell_double_click(&mut self, view: &CellView) -> bool {
        let Some(model) = self.graph.as_ref().and_then(|g| g.cell(view.cell)).cloned() else {
            debug!(cell = %view.cell, "double-click on unknown cell");
            return false;
        };
        self.panels.dispatch(view, &model)
    }

    /// Hide the open panel, if any.
    pub fn close_panel(&mut self) {
        self.panels.close();
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> SurfaceState {
        self.state
    }

    /// The tracked document.
    #[must_use]
    pub fn value(&self) -> Document {
        self.field.current()
    }

    /// The tracked document, encoded.
    #[must_use]
    pub fn encoded_value(&self) -> EncodedDiagram {
        codec::encode(&self.field.current())
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.field.is_dirty()
    }

    /// The owned graph, once the surface is attached.
    #[must_use]
    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    /// Mutable access for user interactions. Mutations are tracked.
    pub fn graph_mut(&mut self) -> Option<&mut Graph> {
        self.graph.as_mut()
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.config.identifier.as_deref()
    }

    #[must_use]
    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Whether the change emitter is running.
    #[must_use]
    pub fn is_emitting(&self) -> bool {
        self.emitter.as_ref().is_some_and(|e| !e.is_finished())
    }

    pub(crate) fn acknowledge(&self, message: &str) {
        self.notifier.notify(message, NOTIFY_DISMISS_LABEL, self.config.notification_duration);
    }
}
