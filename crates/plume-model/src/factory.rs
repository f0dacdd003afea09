//! The element factory: creation, registration, lookup and teardown.
//!
//! The factory is the single owner of every element. It keeps an
//! insertion-ordered registry, forwards model events to the
//! [`EventManager`] and the [`ElementDispatcher`], and suppresses that
//! forwarding while an event block is active.
//!
//! # Event ordering
//!
//! - Presentations are constructed inside an event block, then registered,
//!   then announced with `ElementCreated`. Observers never see events about
//!   a half-built item.
//! - Unlinking a presentation first disconnects the lines bound to it, so
//!   connectors can undo their model relations while the item still
//!   resolves.
//! - `unlink` removes the element from the registry and announces
//!   `ElementDeleted` *before* releasing the element's relations and
//!   unlinking the elements it owns. Handlers registered for the element are
//!   dropped even while events are blocked.
//! - `flush` unlinks diagrams first, then everything left, with events
//!   blocked, and finally emits a single `ModelFlushed`.

use std::ops::{Deref, DerefMut};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, trace};

use plume_core::identifier::ElementId;

use crate::{
    diagram::DiagramData,
    dispatcher::{ElementDispatcher, EventWatcher, Handler},
    element::{Element, Facet},
    error::{ModelError, Result},
    event::{EventManager, ModelEvent, Property},
    metaclass::Metaclass,
};

/// A filter for [`ElementFactory::select`].
///
/// Implemented for [`Metaclass`] (subtype match), for [`All`], and for any
/// `Fn(&Element) -> bool` predicate.
pub trait Selector {
    fn matches(&self, element: &Element) -> bool;
}

/// Selects every element.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl Selector for All {
    fn matches(&self, _element: &Element) -> bool {
        true
    }
}

impl Selector for Metaclass {
    fn matches(&self, element: &Element) -> bool {
        element.is_a(*self)
    }
}

impl<F> Selector for F
where
    F: Fn(&Element) -> bool,
{
    fn matches(&self, element: &Element) -> bool {
        self(element)
    }
}

/// Creates, registers and tears down model elements.
///
/// # Examples
///
/// ```
/// use plume_model::{ElementFactory, Metaclass};
///
/// let mut factory = ElementFactory::new();
/// let package = factory.create(Metaclass::Package).unwrap();
///
/// assert_eq!(factory.lookup(package).map(|e| e.id()), Some(package));
///
/// factory.unlink(package);
/// assert!(factory.lookup(package).is_none());
/// assert!(factory.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ElementFactory {
    elements: IndexMap<ElementId, Element>,
    event_manager: Option<EventManager>,
    dispatcher: ElementDispatcher,
    block_events: usize,
    /// Model element -> diagrams drawn for it.
    ambient: IndexMap<ElementId, IndexSet<ElementId>>,
}

impl ElementFactory {
    /// Creates an empty factory without an event manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty factory that forwards events to `event_manager`.
    pub fn with_event_manager(event_manager: EventManager) -> Self {
        Self {
            event_manager: Some(event_manager),
            ..Self::default()
        }
    }

    pub fn event_manager(&self) -> Option<&EventManager> {
        self.event_manager.as_ref()
    }

    pub fn event_manager_mut(&mut self) -> Option<&mut EventManager> {
        self.event_manager.as_mut()
    }

    pub fn dispatcher(&self) -> &ElementDispatcher {
        &self.dispatcher
    }

    /// Creates an element of type `metaclass` with a freshly generated id.
    ///
    /// # Errors
    ///
    /// Same as [`ElementFactory::create_as`]; presentation types always fail
    /// with [`ModelError::DiagramRequired`] since no diagram is given.
    pub fn create(&mut self, metaclass: Metaclass) -> Result<ElementId> {
        self.create_as(metaclass, ElementId::generate(), None)
    }

    /// Creates an element of type `metaclass` with the given id.
    ///
    /// This is the creation path used when loading models. Presentation
    /// types must be given the diagram they are drawn on; other types must
    /// not.
    ///
    /// # Errors
    ///
    /// - [`ModelError::AbstractType`] for `Element` and `Presentation`
    /// - [`ModelError::DiagramRequired`] / [`ModelError::DiagramNotAllowed`]
    ///   for a missing or forbidden diagram argument
    /// - [`ModelError::UnknownElement`] / [`ModelError::NotADiagram`] if the
    ///   diagram argument does not resolve to a diagram
    /// - [`ModelError::DuplicateId`] if `id` is already registered
    pub fn create_as(
        &mut self,
        metaclass: Metaclass,
        id: ElementId,
        diagram: Option<ElementId>,
    ) -> Result<ElementId> {
        if metaclass.is_abstract() {
            return Err(ModelError::AbstractType(metaclass));
        }

        if metaclass.is_presentation() {
            let diagram = diagram.ok_or(ModelError::DiagramRequired(metaclass))?;
            self.diagram_data(diagram)?;
            self.ensure_unused(id)?;

            let element = {
                let mut factory = self.block_events();
                factory.construct_presentation(metaclass, id, diagram)
            };
            self.elements.insert(id, element);
            debug!(element:? = id, metaclass:?, diagram:?; "Presentation created");
            self.handle(ModelEvent::ElementCreated {
                element: id,
                diagram: Some(diagram),
            });
        } else {
            if diagram.is_some() {
                return Err(ModelError::DiagramNotAllowed(metaclass));
            }
            self.ensure_unused(id)?;

            let facet = if metaclass.is_diagram() {
                Facet::Diagram(DiagramData::new())
            } else {
                Facet::Model
            };
            self.elements.insert(id, Element::new(id, metaclass, facet));
            debug!(element:? = id, metaclass:?; "Element created");
            self.handle(ModelEvent::ElementCreated {
                element: id,
                diagram: None,
            });
        }

        Ok(id)
    }

    /// Number of elements in the registry.
    pub fn size(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the registry holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Finds the element with the given id.
    pub fn lookup(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// Ids of all elements, in creation order.
    pub fn keys(&self) -> impl Iterator<Item = ElementId> {
        self.elements.keys().copied()
    }

    /// All elements, in creation order.
    pub fn values(&self) -> impl Iterator<Item = &Element> {
        self.elements.values()
    }

    /// Iterates elements matching `selector`, in creation order.
    ///
    /// Each call walks the registry as it is at that moment.
    ///
    /// # Examples
    ///
    /// ```
    /// use plume_model::{All, Element, ElementFactory, Metaclass};
    ///
    /// let mut factory = ElementFactory::new();
    /// factory.create(Metaclass::Package).unwrap();
    /// factory.create(Metaclass::Class).unwrap();
    ///
    /// assert_eq!(factory.select(All).count(), 2);
    /// assert_eq!(factory.select(Metaclass::Class).count(), 1);
    /// assert_eq!(factory.select(|e: &Element| e.name().is_some()).count(), 0);
    /// ```
    pub fn select<S: Selector>(&self, selector: S) -> impl Iterator<Item = &Element> {
        self.elements
            .values()
            .filter(move |element| selector.matches(element))
    }

    /// Collects the elements matching `selector`.
    pub fn lselect<S: Selector>(&self, selector: S) -> Vec<&Element> {
        self.select(selector).collect()
    }

    /// Returns a watcher for changes of `element`.
    pub fn watcher(&self, element: ElementId, default_handler: Option<Handler>) -> EventWatcher {
        EventWatcher::new(element, self.dispatcher.clone(), default_handler)
    }

    /// Unlinks an element and everything it owns.
    ///
    /// The element leaves the registry and `ElementDeleted` is emitted before
    /// its relations are released. Owned elements, presentations of the
    /// element, items of a diagram and child items are unlinked as well.
    /// Unlinking an id that is not registered does nothing.
    pub fn unlink(&mut self, id: ElementId) {
        let mut removed = Vec::new();
        self.unlink_into(id, &mut removed);
    }

    /// Removes every element: diagrams first, then the rest.
    ///
    /// Events are blocked for the duration; a single `ModelFlushed` is
    /// emitted at the end. Returns the ids in the order they left the
    /// registry.
    pub fn flush(&mut self) -> Vec<ElementId> {
        let mut removed = Vec::new();
        {
            let mut factory = self.block_events();

            let diagrams: Vec<ElementId> =
                factory.select(Metaclass::Diagram).map(Element::id).collect();
            for diagram in diagrams {
                factory.unlink_into(diagram, &mut removed);
            }

            let remaining: Vec<ElementId> = factory.keys().collect();
            for element in remaining {
                factory.unlink_into(element, &mut removed);
            }
        }

        info!(removed = removed.len(); "Model flushed");
        self.handle(ModelEvent::ModelFlushed);
        removed
    }

    /// Flushes the model on service shutdown.
    pub fn shutdown(&mut self) {
        self.flush();
    }

    /// Announces that a complete model has been loaded.
    pub fn model_ready(&mut self) {
        self.handle(ModelEvent::ModelReady);
    }

    /// Suppresses event forwarding until the returned guard is dropped.
    ///
    /// Blocks nest: forwarding resumes when the outermost guard is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use plume_model::ElementFactory;
    ///
    /// let mut factory = ElementFactory::new();
    /// {
    ///     let mut outer = factory.block_events();
    ///     {
    ///         let inner = outer.block_events();
    ///         assert_eq!(inner.block_depth(), 2);
    ///     }
    ///     assert!(outer.events_blocked());
    /// }
    /// assert!(!factory.events_blocked());
    /// ```
    pub fn block_events(&mut self) -> BlockedEvents<'_> {
        self.block_events += 1;
        trace!(depth = self.block_events; "Events blocked");
        BlockedEvents { factory: self }
    }

    pub fn events_blocked(&self) -> bool {
        self.block_events > 0
    }

    pub fn block_depth(&self) -> usize {
        self.block_events
    }

    /// Entry point for element-originated notifications.
    ///
    /// An [`ModelEvent::Unlink`] removes the element from the registry and is
    /// forwarded as `ElementDeleted`; if the element is not registered the
    /// notification is dropped. Other events are forwarded unchanged. Nothing
    /// is forwarded while events are blocked.
    pub fn handle(&mut self, event: ModelEvent) {
        match event {
            ModelEvent::Unlink { element, diagram } => {
                let mut removed = Vec::new();
                self.unlink_scoped(element, diagram, &mut removed);
            }
            event => self.forward(event),
        }
    }

    /// Emits `ElementUpdated` for `property` of `element`.
    pub(crate) fn notify(&mut self, element: ElementId, property: Property) {
        self.forward(ModelEvent::ElementUpdated { element, property });
    }

    fn forward(&mut self, event: ModelEvent) {
        if self.block_events > 0 {
            trace!(event:?, depth = self.block_events; "Event suppressed");
            return;
        }
        trace!(event:?; "Forwarding event");
        self.dispatcher.dispatch(&event);
        if let Some(manager) = self.event_manager.as_mut() {
            manager.handle(&event);
        }
    }

    pub(crate) fn element(&self, id: ElementId) -> Result<&Element> {
        self.elements.get(&id).ok_or(ModelError::UnknownElement(id))
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Result<&mut Element> {
        self.elements
            .get_mut(&id)
            .ok_or(ModelError::UnknownElement(id))
    }

    fn ensure_unused(&self, id: ElementId) -> Result<()> {
        if self.elements.contains_key(&id) {
            return Err(ModelError::DuplicateId(id));
        }
        Ok(())
    }

    pub(crate) fn index_ambient(&mut self, element: ElementId, diagram: ElementId) {
        self.ambient.entry(element).or_default().insert(diagram);
    }

    pub(crate) fn unindex_ambient(&mut self, element: ElementId, diagram: ElementId) {
        if let Some(diagrams) = self.ambient.get_mut(&element) {
            diagrams.shift_remove(&diagram);
            if diagrams.is_empty() {
                self.ambient.shift_remove(&element);
            }
        }
    }

    pub(crate) fn unlink_into(&mut self, id: ElementId, removed: &mut Vec<ElementId>) {
        let diagram = match self.elements.get(&id) {
            Some(element) => element.as_presentation().map(|item| item.diagram()),
            None => {
                trace!(element:? = id; "Element already unlinked");
                return;
            }
        };
        self.unlink_scoped(id, diagram, removed);
    }

    fn unlink_scoped(
        &mut self,
        id: ElementId,
        diagram: Option<ElementId>,
        removed: &mut Vec<ElementId>,
    ) {
        if !self.elements.contains_key(&id) {
            debug!(element:? = id; "Ignoring unlink of unregistered element");
            return;
        }
        if let Some(diagram) = diagram {
            self.detach_lines(diagram, id);
        }
        let Some(element) = self.elements.shift_remove(&id) else {
            return;
        };
        removed.push(id);
        debug!(element:? = id, metaclass:? = element.metaclass(); "Element unlinked");
        self.forward(ModelEvent::ElementDeleted {
            element: id,
            diagram,
        });
        let dropped = self.dispatcher.forget(id);
        if dropped > 0 {
            trace!(element:? = id, dropped; "Dropped handlers of unlinked element");
        }

        self.release(element, removed);
    }

    /// Releases the relations of an element that already left the registry.
    fn release(&mut self, element: Element, removed: &mut Vec<ElementId>) {
        let id = element.id();

        if let Some(owner) = element.owner() {
            if let Some(owner_element) = self.elements.get_mut(&owner) {
                owner_element.owned_elements_mut().shift_remove(&id);
                self.notify(owner, Property::OwnedElement);
            }
        }

        for diagram in self.ambient.shift_remove(&id).unwrap_or_default() {
            if let Some(data) = self
                .elements
                .get_mut(&diagram)
                .and_then(Element::as_diagram_mut)
            {
                data.set_element(None);
                self.notify(diagram, Property::DiagramElement);
            }
        }

        let presentations: Vec<ElementId> = element.presentations().iter().copied().collect();
        let owned: Vec<ElementId> = element.owned_elements().iter().copied().collect();

        match element.facet() {
            Facet::Model => {}
            Facet::Diagram(diagram) => {
                if let Some(ambient) = diagram.element() {
                    self.unindex_ambient(ambient, id);
                }
                let items: Vec<ElementId> = diagram.items().iter().copied().collect();
                for item in items {
                    self.unlink_into(item, removed);
                }
            }
            Facet::Presentation(item) => self.release_presentation(id, item, removed),
        }

        for presentation in presentations {
            self.unlink_into(presentation, removed);
        }
        for child in owned {
            self.unlink_into(child, removed);
        }
    }
}

/// Guard returned by [`ElementFactory::block_events`].
///
/// Dereferences to the factory so work can continue while events are held
/// back.
#[derive(Debug)]
pub struct BlockedEvents<'a> {
    factory: &'a mut ElementFactory,
}

impl Deref for BlockedEvents<'_> {
    type Target = ElementFactory;

    fn deref(&self) -> &Self::Target {
        self.factory
    }
}

impl DerefMut for BlockedEvents<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.factory
    }
}

impl Drop for BlockedEvents<'_> {
    fn drop(&mut self) {
        self.factory.block_events -= 1;
        trace!(depth = self.factory.block_events; "Events unblocked");
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::event::EventKind;

    fn recording_factory() -> (ElementFactory, Rc<RefCell<Vec<ModelEvent>>>) {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut manager = EventManager::new();
        let sink = Rc::clone(&events);
        manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        (ElementFactory::with_event_manager(manager), events)
    }

    #[test]
    fn test_create_registers_and_emits() {
        let (mut factory, events) = recording_factory();

        let id = factory.create(Metaclass::Class).unwrap();

        assert_eq!(factory.lookup(id).map(Element::id), Some(id));
        assert_eq!(factory.size(), 1);
        assert_eq!(
            events.borrow().as_slice(),
            &[ModelEvent::ElementCreated {
                element: id,
                diagram: None
            }]
        );
    }

    #[test]
    fn test_create_abstract_type_fails() {
        let mut factory = ElementFactory::new();

        assert_eq!(
            factory.create(Metaclass::Element),
            Err(ModelError::AbstractType(Metaclass::Element))
        );
        assert!(factory.is_empty());
    }

    #[test]
    fn test_create_presentation_without_diagram_fails() {
        let mut factory = ElementFactory::new();

        let err = factory.create(Metaclass::ClassItem).unwrap_err();

        assert_eq!(err, ModelError::DiagramRequired(Metaclass::ClassItem));
        assert!(factory.is_empty());
    }

    #[test]
    fn test_create_element_with_diagram_fails() {
        let mut factory = ElementFactory::new();
        let diagram = factory.create(Metaclass::Diagram).unwrap();

        let err = factory
            .create_as(Metaclass::Package, ElementId::new("pkg"), Some(diagram))
            .unwrap_err();

        assert_eq!(err, ModelError::DiagramNotAllowed(Metaclass::Package));
        assert_eq!(factory.size(), 1);
    }

    #[test]
    fn test_create_as_duplicate_id_fails() {
        let mut factory = ElementFactory::new();
        let id = ElementId::new("same-id");
        factory.create_as(Metaclass::Package, id, None).unwrap();

        assert_eq!(
            factory.create_as(Metaclass::Class, id, None),
            Err(ModelError::DuplicateId(id))
        );
        assert_eq!(factory.lookup(id).map(Element::metaclass), Some(Metaclass::Package));
    }

    #[test]
    fn test_create_presentation_on_non_diagram_fails() {
        let mut factory = ElementFactory::new();
        let package = factory.create(Metaclass::Package).unwrap();

        let err = factory
            .create_as(Metaclass::PackageItem, ElementId::generate(), Some(package))
            .unwrap_err();

        assert_eq!(err, ModelError::NotADiagram(package));
    }

    #[test]
    fn test_presentation_created_event_follows_registration() {
        let (mut factory, events) = recording_factory();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        events.borrow_mut().clear();

        let item = factory
            .create_as(Metaclass::ClassItem, ElementId::generate(), Some(diagram))
            .unwrap();

        // Construction-time updates of the diagram are suppressed.
        assert_eq!(
            events.borrow().as_slice(),
            &[ModelEvent::ElementCreated {
                element: item,
                diagram: Some(diagram)
            }]
        );
        assert!(!factory.events_blocked());
    }

    #[test]
    fn test_unlink_twice_is_harmless() {
        let (mut factory, events) = recording_factory();
        let id = factory.create(Metaclass::Package).unwrap();
        events.borrow_mut().clear();

        factory.unlink(id);
        factory.unlink(id);
        factory.handle(ModelEvent::Unlink {
            element: id,
            diagram: None,
        });

        assert!(!factory.contains(id));
        assert_eq!(
            events.borrow().as_slice(),
            &[ModelEvent::ElementDeleted {
                element: id,
                diagram: None
            }]
        );
    }

    #[test]
    fn test_handle_unlink_translates_to_deleted() {
        let (mut factory, events) = recording_factory();
        let id = factory.create(Metaclass::Comment).unwrap();
        events.borrow_mut().clear();

        factory.handle(ModelEvent::Unlink {
            element: id,
            diagram: None,
        });

        assert!(factory.lookup(id).is_none());
        let kinds: Vec<EventKind> = events.borrow().iter().map(ModelEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::ElementDeleted]);
    }

    #[test]
    fn test_nested_blocks_are_additive() {
        let (mut factory, events) = recording_factory();
        {
            let mut outer = factory.block_events();
            {
                let mut inner = outer.block_events();
                inner.model_ready();
            }
            assert_eq!(outer.block_depth(), 1);
            outer.model_ready();
        }
        factory.model_ready();

        assert_eq!(events.borrow().as_slice(), &[ModelEvent::ModelReady]);
    }

    #[test]
    fn test_flush_emits_single_event() {
        let (mut factory, events) = recording_factory();
        factory.create(Metaclass::Package).unwrap();
        factory.create(Metaclass::Diagram).unwrap();
        events.borrow_mut().clear();

        let removed = factory.flush();

        assert_eq!(removed.len(), 2);
        assert!(factory.is_empty());
        assert_eq!(events.borrow().as_slice(), &[ModelEvent::ModelFlushed]);
    }

    #[test]
    fn test_select_is_restartable() {
        let mut factory = ElementFactory::new();
        factory.create(Metaclass::Package).unwrap();

        assert_eq!(factory.select(All).count(), 1);
        factory.create(Metaclass::Package).unwrap();
        assert_eq!(factory.select(Metaclass::Package).count(), 2);
        assert_eq!(factory.lselect(Metaclass::Class).len(), 0);
    }

    #[test]
    fn test_keys_preserve_creation_order() {
        let mut factory = ElementFactory::new();
        let ids: Vec<ElementId> = ["a", "b", "c"]
            .into_iter()
            .map(|id| {
                factory
                    .create_as(Metaclass::Class, ElementId::new(id), None)
                    .unwrap()
            })
            .collect();

        factory.unlink(ids[1]);

        assert_eq!(factory.keys().collect::<Vec<_>>(), vec![ids[0], ids[2]]);
    }
}
