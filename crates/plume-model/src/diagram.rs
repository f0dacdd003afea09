//! Diagrams and their connection table.
//!
//! A diagram owns its presentation items and keeps a [`Connections`] table
//! recording which line handle is bound to which item, together with the
//! constraints that keep the two in place. Solving the constraints is left
//! to an external geometry service; the table only tracks them.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use log::debug;

use plume_core::identifier::ElementId;

use crate::{
    element::Element,
    error::{ModelError, Result},
    event::Property,
    factory::ElementFactory,
    metaclass::Metaclass,
};

/// One end of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Head,
    Tail,
}

impl Endpoint {
    pub const BOTH: [Endpoint; 2] = [Endpoint::Head, Endpoint::Tail];

    pub fn opposite(self) -> Self {
        match self {
            Endpoint::Head => Endpoint::Tail,
            Endpoint::Tail => Endpoint::Head,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Head => write!(f, "head"),
            Endpoint::Tail => write!(f, "tail"),
        }
    }
}

/// A geometric constraint registered with a diagram.
pub trait Constraint: fmt::Debug {
    /// Returns `true` if the constraint refers to `item`.
    fn involves(&self, item: ElementId) -> bool;
}

/// Keeps a line handle on the outline of the item it is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleConstraint {
    pub line: ElementId,
    pub endpoint: Endpoint,
    pub item: ElementId,
}

impl Constraint for HandleConstraint {
    fn involves(&self, item: ElementId) -> bool {
        self.line == item || self.item == item
    }
}

/// Handle of a constraint in a [`Connections`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(u64);

/// An entry of the connection table.
///
/// Plain constraints attached to an item have no endpoint and no connected
/// item. Handle connections have both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    item: ElementId,
    endpoint: Option<Endpoint>,
    connected: Option<ElementId>,
    constraint: Option<ConstraintId>,
}

impl Connection {
    /// The item owning the entry; for handle connections, the line.
    pub fn item(&self) -> ElementId {
        self.item
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint
    }

    /// The item the handle is bound to.
    pub fn connected(&self) -> Option<ElementId> {
        self.connected
    }

    pub fn constraint(&self) -> Option<ConstraintId> {
        self.constraint
    }
}

/// The connection table of a diagram.
#[derive(Debug, Default)]
pub struct Connections {
    next_constraint: u64,
    constraints: IndexMap<ConstraintId, Box<dyn Constraint>>,
    connections: Vec<Connection>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn register(&mut self, constraint: Box<dyn Constraint>) -> ConstraintId {
        let id = ConstraintId(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.insert(id, constraint);
        id
    }

    /// Associates `constraint` with `item`.
    pub fn add_constraint(
        &mut self,
        item: ElementId,
        constraint: Box<dyn Constraint>,
    ) -> ConstraintId {
        let id = self.register(constraint);
        self.connections.push(Connection {
            item,
            endpoint: None,
            connected: None,
            constraint: Some(id),
        });
        id
    }

    /// Drops a constraint and its table entry. Returns `false` if unknown.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> bool {
        let known = self.constraints.shift_remove(&id).is_some();
        self.connections
            .retain(|connection| connection.constraint != Some(id));
        known
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&dyn Constraint> {
        self.constraints.get(&id).map(|constraint| &**constraint)
    }

    /// The connection bound to `endpoint` of `line`, if any.
    pub fn get_connection(&self, line: ElementId, endpoint: Endpoint) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|connection| connection.item == line && connection.endpoint == Some(endpoint))
    }

    /// Entries filtered by owning item and/or connected item.
    ///
    /// Passing `None` for both yields every entry.
    pub fn get_connections(
        &self,
        item: Option<ElementId>,
        connected: Option<ElementId>,
    ) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |connection| {
            item.is_none_or(|item| connection.item == item)
                && connected.is_none_or(|connected| connection.connected == Some(connected))
        })
    }

    /// Binds `endpoint` of `line` to `connected`, replacing a prior binding.
    pub(crate) fn connect_item(
        &mut self,
        line: ElementId,
        endpoint: Endpoint,
        connected: ElementId,
        constraint: Option<Box<dyn Constraint>>,
    ) {
        self.disconnect_item(line, endpoint);
        let constraint = constraint.map(|constraint| self.register(constraint));
        self.connections.push(Connection {
            item: line,
            endpoint: Some(endpoint),
            connected: Some(connected),
            constraint,
        });
    }

    /// Removes the binding of `endpoint` of `line` and its constraint.
    pub(crate) fn disconnect_item(&mut self, line: ElementId, endpoint: Endpoint) -> Option<Connection> {
        let index = self
            .connections
            .iter()
            .position(|connection| connection.item == line && connection.endpoint == Some(endpoint))?;
        let connection = self.connections.remove(index);
        if let Some(id) = connection.constraint {
            self.constraints.shift_remove(&id);
        }
        Some(connection)
    }

    /// Removes every entry and constraint referring to `item`.
    ///
    /// Returns the removed entries.
    pub(crate) fn remove_item(&mut self, item: ElementId) -> Vec<Connection> {
        let stale: IndexSet<ConstraintId> = self
            .constraints
            .iter()
            .filter(|(_, constraint)| constraint.involves(item))
            .map(|(id, _)| *id)
            .collect();

        let mut removed = Vec::new();
        self.connections.retain(|connection| {
            let keep = connection.item != item
                && connection.connected != Some(item)
                && connection.constraint.is_none_or(|id| !stale.contains(&id));
            if !keep {
                removed.push(connection.clone());
            }
            keep
        });

        self.constraints.retain(|id, _| !stale.contains(id));
        for connection in &removed {
            if let Some(id) = connection.constraint {
                self.constraints.shift_remove(&id);
            }
        }
        removed
    }
}

/// Diagram-specific state of an element.
#[derive(Debug, Default)]
pub struct DiagramData {
    element: Option<ElementId>,
    items: IndexSet<ElementId>,
    connections: Connections,
}

impl DiagramData {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The ambient model element the diagram is drawn for.
    pub fn element(&self) -> Option<ElementId> {
        self.element
    }

    /// Items on the diagram, in creation order.
    pub fn items(&self) -> &IndexSet<ElementId> {
        &self.items
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub(crate) fn set_element(&mut self, element: Option<ElementId>) {
        self.element = element;
    }

    pub(crate) fn items_mut(&mut self) -> &mut IndexSet<ElementId> {
        &mut self.items
    }

    pub(crate) fn connections_mut(&mut self) -> &mut Connections {
        &mut self.connections
    }
}

impl ElementFactory {
    pub(crate) fn diagram_data(&self, id: ElementId) -> Result<&DiagramData> {
        self.element(id)?
            .as_diagram()
            .ok_or(ModelError::NotADiagram(id))
    }

    pub(crate) fn diagram_data_mut(&mut self, id: ElementId) -> Result<&mut DiagramData> {
        self.element_mut(id)?
            .as_diagram_mut()
            .ok_or(ModelError::NotADiagram(id))
    }

    /// Creates a presentation of type `metaclass` on `diagram`, optionally
    /// presenting `subject`.
    ///
    /// The subject is checked before anything is created.
    pub fn create_item(
        &mut self,
        metaclass: Metaclass,
        diagram: ElementId,
        subject: Option<ElementId>,
    ) -> Result<ElementId> {
        if let Some(subject) = subject {
            self.check_subject(metaclass, subject)?;
        }
        let item = self.create_as(metaclass, ElementId::generate(), Some(diagram))?;
        if subject.is_some() {
            self.set_subject(item, subject)?;
        }
        Ok(item)
    }

    /// The ambient element of `diagram`.
    pub fn diagram_element(&self, diagram: ElementId) -> Result<Option<ElementId>> {
        Ok(self.diagram_data(diagram)?.element())
    }

    /// Sets the ambient element of `diagram`.
    ///
    /// # Errors
    ///
    /// [`ModelError::NotAModelElement`] if `element` is a presentation or a
    /// diagram.
    pub fn set_diagram_element(
        &mut self,
        diagram: ElementId,
        element: Option<ElementId>,
    ) -> Result<()> {
        let previous = self.diagram_data(diagram)?.element();
        if let Some(element) = element {
            let metaclass = self.element(element)?.metaclass();
            if metaclass.is_presentation() || metaclass.is_diagram() {
                return Err(ModelError::NotAModelElement(element));
            }
        }
        if previous == element {
            return Ok(());
        }
        self.diagram_data_mut(diagram)?.set_element(element);
        if let Some(previous) = previous {
            self.unindex_ambient(previous, diagram);
        }
        if let Some(element) = element {
            self.index_ambient(element, diagram);
        }
        debug!(diagram:?, element:?; "Diagram element set");
        self.notify(diagram, Property::DiagramElement);
        Ok(())
    }

    /// Items on `diagram`, in creation order.
    pub fn items(&self, diagram: ElementId) -> Result<&IndexSet<ElementId>> {
        Ok(self.diagram_data(diagram)?.items())
    }

    /// The connection table of `diagram`.
    pub fn connections(&self, diagram: ElementId) -> Result<&Connections> {
        Ok(self.diagram_data(diagram)?.connections())
    }

    /// Associates `constraint` with `item` on the item's diagram.
    pub fn add_constraint(
        &mut self,
        item: ElementId,
        constraint: Box<dyn Constraint>,
    ) -> Result<ConstraintId> {
        let diagram = self.diagram_of(item)?;
        let id = self
            .diagram_data_mut(diagram)?
            .connections_mut()
            .add_constraint(item, constraint);
        self.notify(item, Property::Connection);
        Ok(id)
    }

    /// Removes a constraint from `diagram`. Returns `false` if unknown.
    pub fn remove_constraint(&mut self, diagram: ElementId, id: ConstraintId) -> Result<bool> {
        Ok(self
            .diagram_data_mut(diagram)?
            .connections_mut()
            .remove_constraint(id))
    }

    /// Drops every connection and constraint referring to `item`.
    ///
    /// Lines that lose a handle binding get a `Connection` update.
    pub(crate) fn remove_item_connections(&mut self, diagram: ElementId, item: ElementId) {
        let Ok(data) = self.diagram_data_mut(diagram) else {
            return;
        };
        let removed = data.connections_mut().remove_item(item);
        if removed.is_empty() {
            return;
        }
        debug!(diagram:?, item:?, removed = removed.len(); "Removed connections of item");

        let lines: IndexSet<ElementId> = removed
            .iter()
            .filter(|connection| connection.item != item)
            .map(Connection::item)
            .collect();
        for line in lines {
            self.notify(line, Property::Connection);
        }
    }

    /// Diagrams in the registry, in creation order.
    pub fn diagrams(&self) -> impl Iterator<Item = &Element> {
        self.select(Metaclass::Diagram)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Pin(ElementId);

    impl Constraint for Pin {
        fn involves(&self, item: ElementId) -> bool {
            self.0 == item
        }
    }

    #[test]
    fn test_endpoint_opposite() {
        assert_eq!(Endpoint::Head.opposite(), Endpoint::Tail);
        assert_eq!(Endpoint::Tail.opposite(), Endpoint::Head);
        assert_eq!(Endpoint::Head.to_string(), "head");
    }

    #[test]
    fn test_connect_replaces_binding() {
        let mut connections = Connections::new();
        let line = ElementId::new("line");
        let a = ElementId::new("a");
        let b = ElementId::new("b");

        connections.connect_item(line, Endpoint::Head, a, None);
        connections.connect_item(line, Endpoint::Head, b, None);

        assert_eq!(connections.len(), 1);
        assert_eq!(
            connections
                .get_connection(line, Endpoint::Head)
                .and_then(Connection::connected),
            Some(b)
        );
        assert!(connections.get_connection(line, Endpoint::Tail).is_none());
    }

    #[test]
    fn test_get_connections_filters() {
        let mut connections = Connections::new();
        let line = ElementId::new("filter-line");
        let a = ElementId::new("filter-a");
        let b = ElementId::new("filter-b");
        connections.connect_item(line, Endpoint::Head, a, None);
        connections.connect_item(line, Endpoint::Tail, b, None);
        connections.add_constraint(a, Box::new(Pin(a)));

        assert_eq!(connections.get_connections(Some(line), None).count(), 2);
        assert_eq!(connections.get_connections(None, Some(b)).count(), 1);
        assert_eq!(connections.get_connections(Some(a), None).count(), 1);
        assert_eq!(connections.get_connections(None, None).count(), 3);
    }

    #[test]
    fn test_remove_item_drops_constraints_and_bindings() {
        let mut connections = Connections::new();
        let line = ElementId::new("remove-line");
        let a = ElementId::new("remove-a");
        let b = ElementId::new("remove-b");
        connections.connect_item(
            line,
            Endpoint::Head,
            a,
            Some(Box::new(HandleConstraint {
                line,
                endpoint: Endpoint::Head,
                item: a,
            })),
        );
        connections.connect_item(line, Endpoint::Tail, b, None);
        let pin = connections.add_constraint(b, Box::new(Pin(a)));

        let removed = connections.remove_item(a);

        assert_eq!(removed.len(), 2);
        assert!(connections.constraint(pin).is_none());
        assert!(connections.get_connection(line, Endpoint::Head).is_none());
        assert!(connections.get_connection(line, Endpoint::Tail).is_some());
    }

    #[test]
    fn test_unsetting_diagram_removes_constraints() {
        let mut factory = ElementFactory::new();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();
        factory.add_constraint(item, Box::new(Pin(item))).unwrap();
        assert_eq!(
            factory
                .connections(diagram)
                .unwrap()
                .get_connections(Some(item), None)
                .count(),
            1
        );

        factory.set_diagram(item, None).unwrap();

        let connections = factory.connections(diagram).unwrap();
        assert_eq!(connections.get_connections(Some(item), None).count(), 0);
        assert!(!factory.contains(item));
    }

    #[test]
    fn test_diagram_element_cleared_when_element_unlinked() {
        let mut factory = ElementFactory::new();
        let package = factory.create(Metaclass::Package).unwrap();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        factory.set_diagram_element(diagram, Some(package)).unwrap();

        factory.unlink(package);

        assert_eq!(factory.diagram_element(diagram), Ok(None));
    }

    #[test]
    fn test_replaced_diagram_element_is_not_cleared_later() {
        let mut factory = ElementFactory::new();
        let first = factory.create(Metaclass::Package).unwrap();
        let second = factory.create(Metaclass::Package).unwrap();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        factory.set_diagram_element(diagram, Some(first)).unwrap();
        factory.set_diagram_element(diagram, Some(second)).unwrap();

        factory.unlink(first);
        assert_eq!(factory.diagram_element(diagram), Ok(Some(second)));

        factory.unlink(diagram);
        factory.unlink(second);
        assert!(factory.is_empty());
    }

    #[test]
    fn test_diagram_element_must_be_model_element() {
        let mut factory = ElementFactory::new();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();

        assert_eq!(
            factory.set_diagram_element(diagram, Some(item)),
            Err(ModelError::NotAModelElement(item))
        );
    }
}
