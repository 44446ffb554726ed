//! The owned graph instance and its mutation listeners.
//!
//! `Graph` is the single mutable home of the diagram's cells. Every mutation
//! goes through one of four paths: [`Graph::add_cell`], [`Graph::change_cell`],
//! [`Graph::remove_cell`], or a wholesale [`Graph::reset`]/[`Graph::clear`].
//! The first three are observed: after the mutation lands, each registered
//! [`GraphListener`] receives the affected cell plus a full [`Document`]
//! snapshot. Wholesale replacement is not observed, which is what lets a
//! programmatic load avoid marking the document dirty.

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::doc::{Cell, CellId, Document, DocumentError, Endpoint, Point, Size};

/// Observer of structural graph mutations.
///
/// All methods default to no-ops so a listener only implements what it needs.
pub trait GraphListener {
    /// A cell was inserted.
    fn on_add(&mut self, _cell: &Cell, _snapshot: &Document) {}
    /// An existing cell was modified.
    fn on_change(&mut self, _cell: &Cell, _snapshot: &Document) {}
    /// A cell was removed.
    fn on_remove(&mut self, _cell: &Cell, _snapshot: &Document) {}
}

/// Error returned by graph mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("a cell with id {0} already exists")]
    DuplicateId(CellId),
    #[error("no cell with id {0}")]
    NotFound(CellId),
    #[error(transparent)]
    Invalid(#[from] DocumentError),
}

/// Sparse update for a cell. Only present fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Endpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Endpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Point>>,
    /// Attribute selectors to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Map<String, Value>>,
    /// Extra fields to merge or remove (null values delete keys).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<Map<String, Value>>,
}

impl CellPatch {
    /// Patch that only moves an element.
    #[must_use]
    pub fn moved_to(position: Point) -> Self {
        Self { position: Some(position), ..Default::default() }
    }

    fn apply_to(&self, cell: &mut Cell) {
        if let Some(position) = self.position {
            cell.position = Some(position);
        }
        if let Some(size) = self.size {
            cell.size = Some(size);
        }
        if let Some(angle) = self.angle {
            cell.angle = angle;
        }
        if let Some(z) = self.z {
            cell.z = z;
        }
        if let Some(ref source) = self.source {
            cell.source = Some(source.clone());
        }
        if let Some(ref target) = self.target {
            cell.target = Some(target.clone());
        }
        if let Some(ref vertices) = self.vertices {
            cell.vertices.clone_from(vertices);
        }
        if let Some(ref attrs) = self.attrs {
            merge(&mut cell.attrs, attrs);
        }
        if let Some(ref extra) = self.extra {
            merge(&mut cell.extra, extra);
        }
    }
}

fn merge(existing: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (k, v) in incoming {
        if v.is_null() {
            existing.remove(k);
        } else {
            existing.insert(k.clone(), v.clone());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Add,
    Change,
    Remove,
}

/// The mutable diagram graph.
#[derive(Default)]
pub struct Graph {
    cells: Vec<Cell>,
    listeners: Vec<Box<dyn GraphListener>>,
}

impl Graph {
    /// Create an empty graph with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for add/change/remove mutations.
    pub fn add_listener(&mut self, listener: Box<dyn GraphListener>) {
        self.listeners.push(listener);
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Insert a new cell at the top of the cell order.
    ///
    /// # Errors
    ///
    /// Fails without mutating the graph when the id is taken, the cell is
    /// malformed, or a link endpoint names a cell that is not in the graph.
    pub fn add_cell(&mut self, cell: Cell) -> Result<(), GraphError> {
        if self.contains(cell.id) {
            return Err(GraphError::DuplicateId(cell.id));
        }
        self.check(&cell)?;
        self.cells.push(cell.clone());
        self.notify(Mutation::Add, &cell);
        Ok(())
    }

    /// Apply a sparse update to an existing cell.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] for an unknown id, or
    /// [`GraphError::Invalid`] if the patched cell would be malformed. The
    /// graph is left untouched on error.
    pub fn change_cell(&mut self, id: CellId, patch: &CellPatch) -> Result<(), GraphError> {
        let index = self.index_of(id).ok_or(GraphError::NotFound(id))?;
        let mut updated = self.cells[index].clone();
        patch.apply_to(&mut updated);
        self.check(&updated)?;
        self.cells[index] = updated.clone();
        self.notify(Mutation::Change, &updated);
        Ok(())
    }

    /// Remove a cell, along with any links attached to it.
    ///
    /// Links attached to a removed link go too, transitively. Dependents are
    /// removed (and observed) before the cells they hang off, each exactly once.
    pub fn remove_cell(&mut self, id: CellId) -> Option<Cell> {
        self.index_of(id)?;

        let mut doomed = vec![id];
        let mut seen = HashSet::from([id]);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            for cell in &self.cells {
                if cell.attached_ids().any(|a| a == current) && seen.insert(cell.id) {
                    doomed.push(cell.id);
                    pending.push(cell.id);
                }
            }
        }

        let mut removed = None;
        for doomed_id in doomed.into_iter().rev() {
            let Some(index) = self.index_of(doomed_id) else {
                continue;
            };
            let cell = self.cells.remove(index);
            self.notify(Mutation::Remove, &cell);
            if doomed_id == id {
                removed = Some(cell);
            }
        }
        removed
    }

    /// Replace all cells with the contents of `doc`. Listeners are not notified.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Invalid`] and leaves the graph untouched if `doc`
    /// fails validation.
    pub fn reset(&mut self, doc: &Document) -> Result<(), GraphError> {
        doc.validate()?;
        self.cells.clone_from(&doc.cells);
        Ok(())
    }

    /// Remove every cell. Listeners are not notified.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Snapshot the graph as a document.
    #[must_use]
    pub fn to_document(&self) -> Document {
        Document::new(self.cells.clone())
    }

    /// Look up a cell by id.
    #[must_use]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    /// All cells in order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns `true` if a cell with `id` exists.
    #[must_use]
    pub fn contains(&self, id: CellId) -> bool {
        self.index_of(id).is_some()
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if the graph has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn index_of(&self, id: CellId) -> Option<usize> {
        self.cells.iter().position(|c| c.id == id)
    }

    fn check(&self, cell: &Cell) -> Result<(), DocumentError> {
        cell.validate()?;
        if let Some(target) = cell.attached_ids().find(|a| !self.contains(*a)) {
            return Err(DocumentError::DanglingEndpoint { link: cell.id, target });
        }
        Ok(())
    }

    fn notify(&mut self, mutation: Mutation, cell: &Cell) {
        if self.listeners.is_empty() {
            return;
        }
        let snapshot = self.to_document();
        for listener in &mut self.listeners {
            match mutation {
                Mutation::Add => listener.on_add(cell, &snapshot),
                Mutation::Change => listener.on_change(cell, &snapshot),
                Mutation::Remove => listener.on_remove(cell, &snapshot),
            }
        }
    }
}
