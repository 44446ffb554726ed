//! Toolbox: the palette of element prototypes and placement of new elements.
//!
//! The registry is an immutable lookup table handed to the editor at
//! construction. Adding an element clones its prototype, gives it a fresh id,
//! and drops it at a random integer position inside [`PositionBounds`].

#[cfg(test)]
#[path = "toolbox_test.rs"]
mod toolbox_test;

use std::collections::HashMap;

use rand::Rng;
use serde_json::json;

use crate::consts::{POSITION_MAX, POSITION_MIN};
use crate::doc::{Cell, CellId, Point, Size};

/// Error returned by [`Toolbox::instantiate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolboxError {
    #[error("no toolbox element registered for type {0:?}")]
    UnregisteredElementType(String),
}

/// Inclusive range for each coordinate of a newly placed element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionBounds {
    min: i32,
    max: i32,
}

impl PositionBounds {
    /// Bounds covering `min..=max`. Returns `None` when `min > max`.
    #[must_use]
    pub fn new(min: i32, max: i32) -> Option<Self> {
        (min <= max).then_some(Self { min, max })
    }

    #[must_use]
    pub fn min(self) -> i32 {
        self.min
    }

    #[must_use]
    pub fn max(self) -> i32 {
        self.max
    }

    /// Whether `value` lies inside the bounds.
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= f64::from(self.min) && value <= f64::from(self.max)
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> Point {
        let x = rng.random_range(self.min..=self.max);
        let y = rng.random_range(self.min..=self.max);
        Point::new(f64::from(x), f64::from(y))
    }
}

impl Default for PositionBounds {
    fn default() -> Self {
        Self { min: POSITION_MIN, max: POSITION_MAX }
    }
}

/// Registry of element prototypes keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct Toolbox {
    prototypes: Vec<Cell>,
    by_type: HashMap<String, usize>,
}

impl Toolbox {
    /// Build a registry from prototypes. A later prototype with the same type
    /// replaces an earlier one but keeps its palette slot.
    #[must_use]
    pub fn new(prototypes: impl IntoIterator<Item = Cell>) -> Self {
        let mut toolbox = Self::default();
        for prototype in prototypes {
            match toolbox.by_type.get(&prototype.cell_type) {
                Some(&slot) => toolbox.prototypes[slot] = prototype,
                None => {
                    toolbox.by_type.insert(prototype.cell_type.clone(), toolbox.prototypes.len());
                    toolbox.prototypes.push(prototype);
                }
            }
        }
        toolbox
    }

    /// The default UML palette.
    #[must_use]
    pub fn uml() -> Self {
        Self::new([
            uml_class("uml.Class", "Class", 220.0, 110.0),
            uml_class("uml.Abstract", "AbstractClass", 220.0, 110.0),
            uml_class("uml.Interface", "Interface", 220.0, 110.0),
            Cell::element("uml.State", Point::default(), Size::new(160.0, 80.0))
                .with_extra("name", json!("State"))
                .with_extra("events", json!([])),
            Cell::element("uml.StartState", Point::default(), Size::new(30.0, 30.0)),
            Cell::element("uml.EndState", Point::default(), Size::new(30.0, 30.0)),
        ])
    }

    /// Look up a prototype by type name.
    #[must_use]
    pub fn find_by_type(&self, cell_type: &str) -> Option<&Cell> {
        self.by_type.get(cell_type).map(|&slot| &self.prototypes[slot])
    }

    /// Registered type names in palette order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.prototypes.iter().map(|p| p.cell_type.as_str())
    }

    /// Number of registered prototypes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// Clone the prototype for `cell_type` with a fresh id at a random position.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::UnregisteredElementType`] for unknown types.
    pub fn instantiate<R: Rng + ?Sized>(
        &self,
        cell_type: &str,
        bounds: PositionBounds,
        rng: &mut R,
    ) -> Result<Cell, ToolboxError> {
        let prototype = self
            .find_by_type(cell_type)
            .ok_or_else(|| ToolboxError::UnregisteredElementType(cell_type.to_owned()))?;

        let mut cell = prototype.clone();
        cell.id = CellId::random();
        cell.position = Some(bounds.sample(rng));
        Ok(cell)
    }
}

fn uml_class(cell_type: &str, name: &str, width: f64, height: f64) -> Cell {
    Cell::element(cell_type, Point::default(), Size::new(width, height))
        .with_extra("name", json!(name))
        .with_extra("attributes", json!([]))
        .with_extra("methods", json!([]))
}
