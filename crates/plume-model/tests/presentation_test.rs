//! Integration tests for diagram binding and item transforms.

use std::{cell::RefCell, rc::Rc};

use float_cmp::assert_approx_eq;

use plume_model::{
    ElementFactory, ElementId, ErrorKind, EventKind, EventManager, Metaclass, ModelError,
    ModelEvent,
};

fn setup() -> (ElementFactory, ElementId) {
    let mut factory = ElementFactory::new();
    let diagram = factory.create(Metaclass::Diagram).unwrap();
    (factory, diagram)
}

fn assert_matrix(actual: (f64, f64, f64, f64, f64, f64), expected: (f64, f64, f64, f64, f64, f64)) {
    assert_approx_eq!(f64, actual.0, expected.0);
    assert_approx_eq!(f64, actual.1, expected.1);
    assert_approx_eq!(f64, actual.2, expected.2);
    assert_approx_eq!(f64, actual.3, expected.3);
    assert_approx_eq!(f64, actual.4, expected.4);
    assert_approx_eq!(f64, actual.5, expected.5);
}

#[test]
fn test_presentation_has_its_diagram() {
    let (mut factory, diagram) = setup();

    let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();

    assert_eq!(factory.diagram_of(item), Ok(diagram));
}

#[test]
fn test_reassigning_diagram_fails_and_keeps_binding() {
    let (mut factory, diagram) = setup();
    let other = factory.create(Metaclass::Diagram).unwrap();
    let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();

    let err = factory.set_diagram(item, Some(other)).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::State);
    assert_eq!(
        err,
        ModelError::DiagramReassignment {
            item,
            current: diagram,
            requested: other
        }
    );
    assert_eq!(factory.diagram_of(item), Ok(diagram));
    assert!(factory.items(other).unwrap().is_empty());
}

#[test]
fn test_clearing_diagram_emits_scoped_deletion() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let mut manager = EventManager::new();
    manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    let mut factory = ElementFactory::with_event_manager(manager);
    let diagram = factory.create(Metaclass::Diagram).unwrap();
    let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();
    events.borrow_mut().clear();

    factory.set_diagram(item, None).unwrap();

    let first_deleted = events
        .borrow()
        .iter()
        .find(|event| event.kind() == EventKind::ElementDeleted)
        .cloned();
    assert_eq!(
        first_deleted,
        Some(ModelEvent::ElementDeleted {
            element: item,
            diagram: Some(diagram)
        })
    );
}

#[test]
fn test_matrix_i2c_follows_local_matrix() {
    let (mut factory, diagram) = setup();
    let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();

    factory
        .update_matrix(item, |m| {
            m.translate(1.0, 1.0);
        })
        .unwrap();

    assert_matrix(
        factory.matrix_i2c(item).unwrap().to_tuple(),
        (1.0, 0.0, 0.0, 1.0, 1.0, 1.0),
    );
}

#[test]
fn test_parent_scale_applies_to_child() {
    let (mut factory, diagram) = setup();
    let parent = factory.create_item(Metaclass::PackageItem, diagram, None).unwrap();
    let child = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();

    factory.set_parent(child, Some(parent)).unwrap();
    factory
        .update_matrix(parent, |m| {
            m.scale(2.0, 2.0);
        })
        .unwrap();

    assert_matrix(
        factory.matrix_i2c(child).unwrap().to_tuple(),
        (2.0, 0.0, 0.0, 2.0, 0.0, 0.0),
    );
}

#[test]
fn test_clearing_parent_resets_to_local() {
    let (mut factory, diagram) = setup();
    let parent = factory.create_item(Metaclass::PackageItem, diagram, None).unwrap();
    let child = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();
    factory
        .update_matrix(parent, |m| {
            m.scale(2.0, 2.0);
        })
        .unwrap();

    factory.set_parent(child, Some(parent)).unwrap();
    assert_matrix(
        factory.matrix_i2c(child).unwrap().to_tuple(),
        (2.0, 0.0, 0.0, 2.0, 0.0, 0.0),
    );

    factory.set_parent(child, None).unwrap();
    assert_matrix(
        factory.matrix_i2c(child).unwrap().to_tuple(),
        (1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
    );
    assert!(factory.children(parent).unwrap().is_empty());
}

#[test]
fn test_parent_translation_is_scaled_by_grandparent() {
    let (mut factory, diagram) = setup();
    let outer = factory.create_item(Metaclass::PackageItem, diagram, None).unwrap();
    let inner = factory.create_item(Metaclass::PackageItem, diagram, None).unwrap();
    factory.set_parent(inner, Some(outer)).unwrap();
    factory
        .update_matrix(outer, |m| {
            m.scale(2.0, 2.0);
        })
        .unwrap();

    factory
        .update_matrix(inner, |m| {
            m.translate(5.0, 0.0);
        })
        .unwrap();

    assert_matrix(
        factory.matrix_i2c(inner).unwrap().to_tuple(),
        (2.0, 0.0, 0.0, 2.0, 10.0, 0.0),
    );
}

#[test]
fn test_reparent_keeps_canvas_position() {
    let (mut factory, diagram) = setup();
    let parent = factory.create_item(Metaclass::PackageItem, diagram, None).unwrap();
    let new_parent = factory.create_item(Metaclass::PackageItem, diagram, None).unwrap();
    let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();
    factory
        .update_matrix(parent, |m| {
            m.scale(2.0, 2.0);
        })
        .unwrap();
    factory
        .update_matrix(new_parent, |m| {
            m.translate(2.0, 2.0);
        })
        .unwrap();

    factory.reparent(item, Some(parent)).unwrap();
    assert_matrix(
        factory.matrix_i2c(item).unwrap().to_tuple(),
        (1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
    );

    factory.reparent(item, Some(new_parent)).unwrap();
    assert_matrix(
        factory.matrix_i2c(item).unwrap().to_tuple(),
        (1.0, 0.0, 0.0, 1.0, 0.0, 0.0),
    );
    assert_matrix(
        factory.matrix(item).unwrap().to_tuple(),
        (1.0, 0.0, 0.0, 1.0, -2.0, -2.0),
    );
    assert_eq!(factory.parent(item), Ok(Some(new_parent)));
}

#[test]
fn test_presentation_requires_diagram() {
    let mut factory = ElementFactory::new();

    let err = factory.create(Metaclass::PackageItem).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Type);
    assert!(factory.is_empty());
}
