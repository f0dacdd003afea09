//! Element-scoped event dispatch.
//!
//! The [`ElementDispatcher`] receives every event the factory forwards and
//! calls the handlers registered for the event's element. Callers do not use
//! the dispatcher directly; they ask the factory for an [`EventWatcher`]
//! bound to one element and declare which properties they care about.

use std::{cell::RefCell, fmt, rc::Rc};

use log::{debug, warn};

use plume_core::identifier::ElementId;

use crate::event::{ModelEvent, Property};

/// A shared event callback.
pub type Handler = Rc<dyn Fn(&ModelEvent)>;

/// Handle of one handler registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

struct Registration {
    id: HandlerId,
    element: ElementId,
    property: Option<Property>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// Routes events to handlers registered per element and property.
///
/// Cloning the dispatcher yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ElementDispatcher {
    registry: Rc<RefCell<Registry>>,
}

impl ElementDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events about `element`.
    ///
    /// With `property` set, only `ElementUpdated` events for that property
    /// match. Without it, every event about the element matches.
    pub fn subscribe(
        &self,
        element: ElementId,
        property: Option<Property>,
        handler: Handler,
    ) -> HandlerId {
        let mut registry = self.registry.borrow_mut();
        let id = HandlerId(registry.next_id);
        registry.next_id += 1;
        registry.registrations.push(Registration {
            id,
            element,
            property,
            handler,
        });
        id
    }

    pub fn unsubscribe(&self, id: HandlerId) {
        self.registry
            .borrow_mut()
            .registrations
            .retain(|registration| registration.id != id);
    }

    pub fn handler_count(&self) -> usize {
        self.registry.borrow().registrations.len()
    }

    /// Drops every registration for `element`. Returns how many were dropped.
    pub(crate) fn forget(&self, element: ElementId) -> usize {
        let mut registry = self.registry.borrow_mut();
        let before = registry.registrations.len();
        registry
            .registrations
            .retain(|registration| registration.element != element);
        before - registry.registrations.len()
    }

    /// Drops every registration.
    pub fn clear(&self) {
        let dropped = {
            let mut registry = self.registry.borrow_mut();
            let dropped = registry.registrations.len();
            registry.registrations.clear();
            dropped
        };
        if dropped > 0 {
            debug!(dropped; "Dropped all handlers");
        }
    }

    /// Calls every handler matching `event`.
    ///
    /// Matching handlers are collected before any is called, so a handler
    /// may subscribe or unsubscribe without invalidating the dispatch.
    /// Registrations of a deleted element are dropped after delivery, and a
    /// flushed model drops them all.
    pub fn dispatch(&self, event: &ModelEvent) {
        if matches!(event, ModelEvent::ModelFlushed) {
            self.clear();
            return;
        }
        let Some(element) = event.element() else {
            return;
        };
        let property = event.property();

        let handlers: Vec<Handler> = self
            .registry
            .borrow()
            .registrations
            .iter()
            .filter(|registration| {
                registration.element == element
                    && (registration.property.is_none() || registration.property == property)
            })
            .map(|registration| Rc::clone(&registration.handler))
            .collect();

        for handler in handlers {
            handler(event);
        }

        if matches!(event, ModelEvent::ElementDeleted { .. }) {
            let dropped = self.forget(element);
            if dropped > 0 {
                debug!(element:?, dropped; "Dropped handlers of deleted element");
            }
        }
    }
}

impl fmt::Debug for ElementDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDispatcher")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

/// Declares interest in changes of a single element.
///
/// Obtained from [`ElementFactory::watcher`](crate::ElementFactory::watcher).
/// Nothing is registered until [`EventWatcher::subscribe_all`] is called.
pub struct EventWatcher {
    element: ElementId,
    dispatcher: ElementDispatcher,
    default_handler: Option<Handler>,
    watched: Vec<(Option<Property>, Handler)>,
    active: Vec<HandlerId>,
}

impl EventWatcher {
    pub(crate) fn new(
        element: ElementId,
        dispatcher: ElementDispatcher,
        default_handler: Option<Handler>,
    ) -> Self {
        Self {
            element,
            dispatcher,
            default_handler,
            watched: Vec::new(),
            active: Vec::new(),
        }
    }

    /// The element this watcher is scoped to.
    pub fn element(&self) -> ElementId {
        self.element
    }

    /// Watches `property`, calling `handler` or the default handler.
    pub fn watch(mut self, property: Property, handler: Option<Handler>) -> Self {
        match handler.or_else(|| self.default_handler.clone()) {
            Some(handler) => self.watched.push((Some(property), handler)),
            None => warn!(element:? = self.element, property:?; "No handler to watch property"),
        }
        self
    }

    /// Watches every event about the element with the default handler.
    pub fn watch_element(mut self) -> Self {
        match self.default_handler.clone() {
            Some(handler) => self.watched.push((None, handler)),
            None => warn!(element:? = self.element; "No default handler to watch element"),
        }
        self
    }

    /// Registers every watched property with the dispatcher.
    pub fn subscribe_all(&mut self) {
        self.unsubscribe_all();
        for (property, handler) in &self.watched {
            let id = self
                .dispatcher
                .subscribe(self.element, *property, Rc::clone(handler));
            self.active.push(id);
        }
    }

    /// Removes every registration made by this watcher.
    pub fn unsubscribe_all(&mut self) {
        for id in self.active.drain(..) {
            self.dispatcher.unsubscribe(id);
        }
    }
}

impl fmt::Debug for EventWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWatcher")
            .field("element", &self.element)
            .field("watched", &self.watched.len())
            .field("active", &self.active.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Rc<RefCell<Vec<ModelEvent>>>, Handler) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let handler: Handler = Rc::new(move |event: &ModelEvent| sink.borrow_mut().push(event.clone()));
        (seen, handler)
    }

    #[test]
    fn test_property_filter() {
        let dispatcher = ElementDispatcher::new();
        let element = ElementId::new("watched");
        let (seen, handler) = counter();
        dispatcher.subscribe(element, Some(Property::Owner), handler);

        dispatcher.dispatch(&ModelEvent::ElementUpdated {
            element,
            property: Property::Name,
        });
        dispatcher.dispatch(&ModelEvent::ElementUpdated {
            element,
            property: Property::Owner,
        });
        dispatcher.dispatch(&ModelEvent::ElementUpdated {
            element: ElementId::new("other"),
            property: Property::Owner,
        });

        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_deleted_element_drops_registrations() {
        let dispatcher = ElementDispatcher::new();
        let element = ElementId::new("doomed");
        let (seen, handler) = counter();
        dispatcher.subscribe(element, None, handler);

        dispatcher.dispatch(&ModelEvent::ElementDeleted {
            element,
            diagram: None,
        });

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(dispatcher.handler_count(), 0);
    }

    #[test]
    fn test_flush_drops_every_registration() {
        let dispatcher = ElementDispatcher::new();
        let (seen, handler) = counter();
        dispatcher.subscribe(ElementId::new("flushed-a"), None, Rc::clone(&handler));
        dispatcher.subscribe(ElementId::new("flushed-b"), Some(Property::Name), handler);

        dispatcher.dispatch(&ModelEvent::ModelFlushed);

        assert_eq!(dispatcher.handler_count(), 0);
        dispatcher.dispatch(&ModelEvent::ElementUpdated {
            element: ElementId::new("flushed-b"),
            property: Property::Name,
        });
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_watcher_subscribe_and_unsubscribe() {
        let dispatcher = ElementDispatcher::new();
        let element = ElementId::new("watcher-element");
        let (seen, handler) = counter();

        let mut watcher = EventWatcher::new(element, dispatcher.clone(), Some(handler))
            .watch(Property::Name, None)
            .watch(Property::Owner, None);
        assert_eq!(dispatcher.handler_count(), 0);

        watcher.subscribe_all();
        assert_eq!(dispatcher.handler_count(), 2);

        dispatcher.dispatch(&ModelEvent::ElementUpdated {
            element,
            property: Property::Name,
        });
        watcher.unsubscribe_all();
        dispatcher.dispatch(&ModelEvent::ElementUpdated {
            element,
            property: Property::Name,
        });

        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(dispatcher.handler_count(), 0);
    }

    #[test]
    fn test_watch_without_any_handler_is_skipped() {
        let dispatcher = ElementDispatcher::new();
        let mut watcher = EventWatcher::new(ElementId::new("bare"), dispatcher.clone(), None)
            .watch(Property::Name, None);

        watcher.subscribe_all();

        assert_eq!(dispatcher.handler_count(), 0);
    }
}
