//! Document model: diagram cells, their geometry, and the serializable snapshot.
//!
//! A [`Document`] is the full, ordered snapshot of the editable graph. Each
//! [`Cell`] is either an element (a node with a position and size) or a link
//! (an edge with a source and a target). Library-specific fields that this crate
//! does not interpret, such as a UML class's `attributes` and `methods`, ride
//! along in [`Cell::extra`] so a snapshot survives a round trip untouched.
//!
//! Data flows into this layer from the codec (decoded clipboard/initial input)
//! and from the owned [`crate::graph::Graph`] (snapshots after each mutation).

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique identifier for a diagram cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(Uuid);

impl CellId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for CellId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A point in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height of an element's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 0.0 && self.height >= 0.0
    }
}

/// One end of a link: attached to a cell (optionally a named port) or pinned to a free point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Endpoint {
    /// Attached to another cell.
    Cell {
        id: CellId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<String>,
    },
    /// Pinned to a point on the canvas.
    Point(Point),
}

impl Endpoint {
    /// Endpoint attached to `id` without a port.
    #[must_use]
    pub fn cell(id: CellId) -> Self {
        Self::Cell { id, port: None }
    }

    /// The cell this endpoint is attached to, if any.
    #[must_use]
    pub fn cell_id(&self) -> Option<CellId> {
        match self {
            Self::Cell { id, .. } => Some(*id),
            Self::Point(_) => None,
        }
    }
}

/// Whether a cell is a node or an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// A node with a position and a size.
    Element,
    /// An edge between two endpoints.
    Link,
}

/// Field names owned by [`Cell`] itself; they can never ride along in [`Cell::extra`].
pub const RESERVED_FIELDS: [&str; 10] =
    ["id", "type", "position", "size", "angle", "z", "source", "target", "vertices", "attrs"];

/// A single element or link descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Unique identifier within the document.
    pub id: CellId,
    /// Library type name, e.g. `"uml.Class"` or `"standard.Link"`.
    #[serde(rename = "type")]
    pub cell_type: String,
    /// Top-left corner (elements only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// Bounding-box size (elements only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Clockwise rotation in degrees.
    #[serde(default)]
    pub angle: f64,
    /// Stacking order.
    #[serde(default)]
    pub z: i64,
    /// Link source (links only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Endpoint>,
    /// Link target (links only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Endpoint>,
    /// Intermediate routing points (links only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vertices: Vec<Point>,
    /// Presentation attributes keyed by selector.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    /// Every other field, preserved verbatim. Keys in [`RESERVED_FIELDS`] fail validation.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    /// A new element of `cell_type` at `position` with `size`.
    #[must_use]
    pub fn element(cell_type: impl Into<String>, position: Point, size: Size) -> Self {
        Self {
            id: CellId::random(),
            cell_type: cell_type.into(),
            position: Some(position),
            size: Some(size),
            angle: 0.0,
            z: 0,
            source: None,
            target: None,
            vertices: Vec::new(),
            attrs: Map::new(),
            extra: Map::new(),
        }
    }

    /// A new link of `cell_type` from `source` to `target`.
    #[must_use]
    pub fn link(cell_type: impl Into<String>, source: Endpoint, target: Endpoint) -> Self {
        Self {
            id: CellId::random(),
            cell_type: cell_type.into(),
            position: None,
            size: None,
            angle: 0.0,
            z: 0,
            source: Some(source),
            target: Some(target),
            vertices: Vec::new(),
            attrs: Map::new(),
            extra: Map::new(),
        }
    }

    /// Set an extra library field, returning the cell.
    #[must_use]
    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_owned(), value);
        self
    }

    /// Set a presentation attribute, returning the cell.
    #[must_use]
    pub fn with_attr(mut self, selector: &str, value: Value) -> Self {
        self.attrs.insert(selector.to_owned(), value);
        self
    }

    /// Element or link, decided by the presence of endpoints.
    #[must_use]
    pub fn kind(&self) -> CellKind {
        if self.source.is_some() || self.target.is_some() {
            CellKind::Link
        } else {
            CellKind::Element
        }
    }

    /// Display name stored in the `name` field. Empty string when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        self.extra.get("name").and_then(Value::as_str).unwrap_or("")
    }

    /// Ids of the cells this link is attached to. Empty for elements.
    pub fn attached_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.source
            .iter()
            .chain(self.target.iter())
            .filter_map(Endpoint::cell_id)
    }

    /// Check this cell in isolation: type, geometry, and endpoints.
    ///
    /// References to other cells are checked by [`Document::validate`].
    ///
    /// # Errors
    ///
    /// Returns the first [`DocumentError`] found.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.cell_type.trim().is_empty() {
            return Err(DocumentError::EmptyType(self.id));
        }
        if let Some(key) = self.extra.keys().find(|k| RESERVED_FIELDS.contains(&k.as_str())) {
            return Err(DocumentError::ReservedField(self.id, key.clone()));
        }
        if !self.angle.is_finite() || !self.vertices.iter().all(|p| p.is_finite()) {
            return Err(DocumentError::InvalidGeometry(self.id));
        }

        match self.kind() {
            CellKind::Element => {
                let position = self.position.ok_or(DocumentError::MissingGeometry(self.id, "position"))?;
                let size = self.size.ok_or(DocumentError::MissingGeometry(self.id, "size"))?;
                if !position.is_finite() || !size.is_valid() {
                    return Err(DocumentError::InvalidGeometry(self.id));
                }
            }
            CellKind::Link => {
                let source = self.source.as_ref().ok_or(DocumentError::MissingEndpoint(self.id, "source"))?;
                let target = self.target.as_ref().ok_or(DocumentError::MissingEndpoint(self.id, "target"))?;
                for endpoint in [source, target] {
                    match endpoint {
                        Endpoint::Cell { id, .. } if *id == self.id => {
                            return Err(DocumentError::SelfReference(self.id));
                        }
                        Endpoint::Point(p) if !p.is_finite() => {
                            return Err(DocumentError::InvalidGeometry(self.id));
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }
}

/// Structural problems that make a document unusable by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("duplicate cell id: {0}")]
    DuplicateId(CellId),
    #[error("cell {0} has an empty type")]
    EmptyType(CellId),
    #[error("element {0} is missing its {1}")]
    MissingGeometry(CellId, &'static str),
    #[error("cell {0} has non-finite or negative geometry")]
    InvalidGeometry(CellId),
    #[error("link {0} is missing its {1} endpoint")]
    MissingEndpoint(CellId, &'static str),
    #[error("link {link} references unknown cell {target}")]
    DanglingEndpoint { link: CellId, target: CellId },
    #[error("link {0} references itself")]
    SelfReference(CellId),
    #[error("cell {0} carries extra field {1:?}, which is a built-in field name")]
    ReservedField(CellId, String),
}

/// Serializable snapshot of the full editable graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Cells in insertion order.
    #[serde(default)]
    pub cells: Vec<Cell>,
}

impl Document {
    /// The canonical empty document.
    pub const EMPTY: Document = Document { cells: Vec::new() };

    /// A document holding `cells` in the given order.
    #[must_use]
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// The canonical empty document.
    #[must_use]
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Look up a cell by id.
    #[must_use]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` when the document has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Element cells in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.kind() == CellKind::Element)
    }

    /// Link cells in document order.
    pub fn links(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.kind() == CellKind::Link)
    }

    /// Check that this document is a structurally valid graph snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first [`DocumentError`] found, scanning cells in order.
    pub fn validate(&self) -> Result<(), DocumentError> {
        let mut ids = HashSet::with_capacity(self.cells.len());
        for cell in &self.cells {
            if !ids.insert(cell.id) {
                return Err(DocumentError::DuplicateId(cell.id));
            }
        }

        for cell in &self.cells {
            cell.validate()?;
            if let Some(target) = cell.attached_ids().find(|id| !ids.contains(id)) {
                return Err(DocumentError::DanglingEndpoint { link: cell.id, target });
            }
        }
        Ok(())
    }
}
