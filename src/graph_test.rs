#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use super::*;

// =============================================================
// Helpers
// =============================================================

type EventLog = Rc<RefCell<Vec<(&'static str, CellId, usize)>>>;

struct Recorder {
    log: EventLog,
}

impl GraphListener for Recorder {
    fn on_add(&mut self, cell: &Cell, snapshot: &Document) {
        self.log.borrow_mut().push(("add", cell.id, snapshot.len()));
    }

    fn on_change(&mut self, cell: &Cell, snapshot: &Document) {
        self.log.borrow_mut().push(("change", cell.id, snapshot.len()));
    }

    fn on_remove(&mut self, cell: &Cell, snapshot: &Document) {
        self.log.borrow_mut().push(("remove", cell.id, snapshot.len()));
    }
}

fn recorded_graph() -> (Graph, EventLog) {
    let log = EventLog::default();
    let mut graph = Graph::new();
    graph.add_listener(Box::new(Recorder { log: Rc::clone(&log) }));
    (graph, log)
}

fn class(x: f64) -> Cell {
    Cell::element("uml.Class", Point::new(x, 10.0), Size::new(100.0, 60.0))
}

// =============================================================
// add_cell
// =============================================================

#[test]
fn add_cell_notifies_with_snapshot() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    graph.add_cell(a.clone()).unwrap();
    assert_eq!(graph.len(), 1);
    assert_eq!(*log.borrow(), vec![("add", a.id, 1)]);
}

#[test]
fn add_cell_rejects_duplicate_id() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    graph.add_cell(a.clone()).unwrap();
    let err = graph.add_cell(a.clone()).unwrap_err();
    assert_eq!(err, GraphError::DuplicateId(a.id));
    assert_eq!(graph.len(), 1);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn add_cell_rejects_link_to_missing_cell() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    let ghost = class(50.0);
    graph.add_cell(a.clone()).unwrap();
    let link = Cell::link("uml.Association", Endpoint::cell(a.id), Endpoint::cell(ghost.id));
    let err = graph.add_cell(link).unwrap_err();
    assert!(matches!(err, GraphError::Invalid(DocumentError::DanglingEndpoint { .. })));
    assert_eq!(graph.len(), 1);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn add_cell_rejects_malformed_element() {
    let mut graph = Graph::new();
    let mut a = class(0.0);
    a.position = None;
    assert!(matches!(graph.add_cell(a), Err(GraphError::Invalid(_))));
    assert!(graph.is_empty());
}

// =============================================================
// change_cell
// =============================================================

#[test]
fn change_cell_applies_patch_and_notifies() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    graph.add_cell(a.clone()).unwrap();

    graph.change_cell(a.id, &CellPatch::moved_to(Point::new(77.0, 88.0))).unwrap();

    let moved = graph.cell(a.id).unwrap();
    assert_eq!(moved.position, Some(Point::new(77.0, 88.0)));
    assert_eq!(moved.size, a.size);
    assert_eq!(log.borrow().last(), Some(&("change", a.id, 1)));
}

#[test]
fn change_cell_merges_and_deletes_extra_keys() {
    let mut graph = Graph::new();
    let a = class(0.0).with_extra("name", json!("Old")).with_extra("methods", json!(["a()"]));
    graph.add_cell(a.clone()).unwrap();

    let mut extra = Map::new();
    extra.insert("name".into(), json!("New"));
    extra.insert("methods".into(), Value::Null);
    let patch = CellPatch { extra: Some(extra), ..Default::default() };
    graph.change_cell(a.id, &patch).unwrap();

    let cell = graph.cell(a.id).unwrap();
    assert_eq!(cell.name(), "New");
    assert!(!cell.extra.contains_key("methods"));
}

#[test]
fn change_cell_unknown_id_is_not_found() {
    let mut graph = Graph::new();
    let id = CellId::random();
    assert_eq!(graph.change_cell(id, &CellPatch::default()), Err(GraphError::NotFound(id)));
}

#[test]
fn change_cell_rejects_invalid_result_and_keeps_original() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    graph.add_cell(a.clone()).unwrap();

    let patch = CellPatch { size: Some(Size::new(-5.0, 10.0)), ..Default::default() };
    assert!(graph.change_cell(a.id, &patch).is_err());
    assert_eq!(graph.cell(a.id), Some(&a));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn change_cell_refuses_extra_key_shadowing_a_built_in_field() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    graph.add_cell(a.clone()).unwrap();

    let mut extra = Map::new();
    extra.insert("type".into(), json!("uml.Interface"));
    let patch = CellPatch { extra: Some(extra), ..CellPatch::default() };
    let err = graph.change_cell(a.id, &patch).unwrap_err();

    assert_eq!(err, GraphError::Invalid(DocumentError::ReservedField(a.id, "type".into())));
    assert_eq!(graph.cell(a.id), Some(&a));
    assert_eq!(log.borrow().len(), 1);
}

// =============================================================
// remove_cell
// =============================================================

#[test]
fn remove_cell_cascades_to_attached_links() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    let b = class(200.0);
    let link = Cell::link("uml.Generalization", Endpoint::cell(a.id), Endpoint::cell(b.id));
    graph.add_cell(a.clone()).unwrap();
    graph.add_cell(b.clone()).unwrap();
    graph.add_cell(link.clone()).unwrap();

    let removed = graph.remove_cell(a.id).unwrap();
    assert_eq!(removed.id, a.id);
    assert_eq!(graph.len(), 1);
    assert!(graph.contains(b.id));

    let events = log.borrow();
    assert_eq!(events[3], ("remove", link.id, 2));
    assert_eq!(events[4], ("remove", a.id, 1));
}

#[test]
fn remove_cell_with_mutually_attached_links_terminates() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    let mut l1 = Cell::link("uml.Association", Endpoint::cell(a.id), Endpoint::cell(a.id));
    let l2 = Cell::link("uml.Association", Endpoint::cell(l1.id), Endpoint::cell(a.id));
    l1.target = Some(Endpoint::cell(l2.id));
    let doc = Document::new(vec![a.clone(), l1.clone(), l2.clone()]);
    graph.reset(&doc).unwrap();

    let removed = graph.remove_cell(l1.id).unwrap();
    assert_eq!(removed.id, l1.id);
    assert_eq!(graph.cells(), std::slice::from_ref(&a));
    assert_eq!(*log.borrow(), vec![("remove", l2.id, 2), ("remove", l1.id, 1)]);
}

#[test]
fn remove_cell_cascades_through_links_on_links() {
    let (mut graph, log) = recorded_graph();
    let a = class(0.0);
    let b = class(200.0);
    let first = Cell::link("uml.Association", Endpoint::cell(a.id), Endpoint::cell(b.id));
    let second = Cell::link("uml.Association", Endpoint::cell(first.id), Endpoint::cell(b.id));
    let third = Cell::link("uml.Association", Endpoint::cell(second.id), Endpoint::cell(b.id));
    graph.reset(&Document::new(vec![a.clone(), b.clone(), first.clone(), second.clone(), third.clone()])).unwrap();

    graph.remove_cell(a.id).unwrap();
    assert_eq!(graph.cells(), std::slice::from_ref(&b));
    let order: Vec<CellId> = log.borrow().iter().map(|(_, id, _)| *id).collect();
    assert_eq!(order, vec![third.id, second.id, first.id, a.id]);
}

#[test]
fn change_cell_can_close_a_link_cycle_that_remove_then_clears() {
    let (mut graph, _log) = recorded_graph();
    let a = class(0.0);
    let l1 = Cell::link("uml.Association", Endpoint::cell(a.id), Endpoint::cell(a.id));
    let l2 = Cell::link("uml.Association", Endpoint::cell(l1.id), Endpoint::cell(a.id));
    graph.add_cell(a.clone()).unwrap();
    graph.add_cell(l1.clone()).unwrap();
    graph.add_cell(l2.clone()).unwrap();
    let repoint = CellPatch { target: Some(Endpoint::cell(l2.id)), ..CellPatch::default() };
    graph.change_cell(l1.id, &repoint).unwrap();

    assert!(graph.remove_cell(l2.id).is_some());
    assert_eq!(graph.len(), 1);
    assert!(graph.contains(a.id));
}

#[test]
fn remove_unknown_cell_is_none() {
    let (mut graph, log) = recorded_graph();
    assert!(graph.remove_cell(CellId::random()).is_none());
    assert!(log.borrow().is_empty());
}

// =============================================================
// reset / clear
// =============================================================

#[test]
fn reset_replaces_without_notifying() {
    let (mut graph, log) = recorded_graph();
    graph.add_cell(class(0.0)).unwrap();

    let doc = Document::new(vec![class(1.0), class(2.0)]);
    graph.reset(&doc).unwrap();

    assert_eq!(graph.to_document(), doc);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn reset_with_invalid_document_leaves_graph_untouched() {
    let mut graph = Graph::new();
    let a = class(0.0);
    graph.add_cell(a.clone()).unwrap();

    let dup = Document::new(vec![a.clone(), a.clone()]);
    assert!(matches!(graph.reset(&dup), Err(GraphError::Invalid(DocumentError::DuplicateId(_)))));
    assert_eq!(graph.cells(), std::slice::from_ref(&a));
}

#[test]
fn clear_empties_without_notifying() {
    let (mut graph, log) = recorded_graph();
    graph.add_cell(class(0.0)).unwrap();
    graph.clear();
    assert!(graph.is_empty());
    assert_eq!(graph.to_document(), Document::EMPTY);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn listener_count_tracks_registrations() {
    let (graph, _log) = recorded_graph();
    assert_eq!(graph.listener_count(), 1);
    assert_eq!(Graph::new().listener_count(), 0);
}
