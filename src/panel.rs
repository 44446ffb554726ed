//! Double-click dispatch to property and link panels.
//!
//! The rendering layer reports a double-clicked cell as a [`CellView`] whose
//! [`ViewCapability`] says what kind of panel, if any, it supports. The
//! dispatcher turns that into a single `hide` + `show` pair on the external
//! [`PanelHost`], so at most one panel is ever open.

#[cfg(test)]
#[path = "panel_test.rs"]
mod panel_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::doc::{Cell, CellId};

/// Name of a property view the panel host knows how to display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PanelDescriptor(String);

impl PanelDescriptor {
    /// Name of the generic link-configuration panel.
    pub const LINK_CONFIG: &'static str = "link-config";

    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The generic link-configuration panel.
    #[must_use]
    pub fn link_config() -> Self {
        Self::new(Self::LINK_CONFIG)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

/// What a rendered cell supports when double-clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCapability {
    /// A generic connector; opens the link-configuration panel.
    Connector,
    /// A node with an attached property view.
    NodeWithPanel(PanelDescriptor),
    /// A node without a property view; double-click does nothing.
    PlainNode,
}

/// A rendered cell as reported by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellView {
    pub cell: CellId,
    pub capability: ViewCapability,
}

impl CellView {
    #[must_use]
    pub fn new(cell: CellId, capability: ViewCapability) -> Self {
        Self { cell, capability }
    }
}

/// Context a panel is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelBinding {
    /// Link panels bind only to the connector's model.
    Link { model: Cell },
    /// Node panels bind to the model and the view that was clicked.
    Node { model: Cell, view: CellView },
}

/// External display service for property panels.
pub trait PanelHost {
    /// Show `descriptor` inside `container`, bound to `binding`.
    fn show(&mut self, container: &str, descriptor: &PanelDescriptor, binding: PanelBinding);
    /// Hide whatever panel is currently shown.
    fn hide(&mut self);
}

/// Routes double-clicks to the panel host.
pub struct PanelDispatcher {
    host: Box<dyn PanelHost>,
    container: String,
    open: Option<CellId>,
}

impl PanelDispatcher {
    #[must_use]
    pub fn new(host: Box<dyn PanelHost>, container: impl Into<String>) -> Self {
        Self { host, container: container.into(), open: None }
    }

    /// Open the panel matching `view`'s capability, bound to `model`.
    ///
    /// Returns `true` if a panel was shown. Plain nodes leave any open panel alone.
    pub fn dispatch(&mut self, view: &CellView, model: &Cell) -> bool {
        let (descriptor, binding) = match &view.capability {
            ViewCapability::Connector => (PanelDescriptor::link_config(), PanelBinding::Link { model: model.clone() }),
            ViewCapability::NodeWithPanel(descriptor) => (
                descriptor.clone(),
                PanelBinding::Node { model: model.clone(), view: view.clone() },
            ),
            ViewCapability::PlainNode => {
                debug!(cell = %view.cell, "double-click on node without property view");
                return false;
            }
        };

        self.host.hide();
        debug!(cell = %view.cell, panel = descriptor.name(), "opening panel");
        self.host.show(&self.container, &descriptor, binding);
        self.open = Some(view.cell);
        true
    }

    /// Hide the open panel, if any.
    pub fn close(&mut self) {
        if self.open.take().is_some() {
            self.host.hide();
        }
    }

    /// The cell whose panel is currently open.
    #[must_use]
    pub fn open_for(&self) -> Option<CellId> {
        self.open
    }
}
