//! Model events and the event manager that forwards them to subscribers.
//!
//! Elements report their own lifecycle to the factory with
//! [`ModelEvent::Unlink`]. The factory translates that notification into the
//! public [`ModelEvent::ElementDeleted`] before anything reaches the
//! [`EventManager`]; every other event is forwarded as is.

use std::fmt;

use log::trace;

use plume_core::identifier::ElementId;

/// A relationship slot or attribute of an element that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Name,
    Owner,
    OwnedElement,
    Subject,
    Presentation,
    Parent,
    Children,
    Matrix,
    Geometry,
    DiagramElement,
    OwnedPresentation,
    Connection,
}

/// The tag of a [`ModelEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ElementCreated,
    ElementDeleted,
    ElementUpdated,
    ModelFlushed,
    ModelReady,
    Unlink,
}

/// An event emitted by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// A new element was registered. `diagram` is set for presentations.
    ElementCreated {
        element: ElementId,
        diagram: Option<ElementId>,
    },
    /// An element left the registry. `diagram` is the diagram a
    /// presentation was attached to.
    ElementDeleted {
        element: ElementId,
        diagram: Option<ElementId>,
    },
    /// A property of a live element changed.
    ElementUpdated {
        element: ElementId,
        property: Property,
    },
    /// Every element was removed from the factory.
    ModelFlushed,
    /// A complete model has been loaded.
    ModelReady,
    /// Element-originated unlink notification; handled by the factory and
    /// never forwarded in this form.
    Unlink {
        element: ElementId,
        diagram: Option<ElementId>,
    },
}

impl ModelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ModelEvent::ElementCreated { .. } => EventKind::ElementCreated,
            ModelEvent::ElementDeleted { .. } => EventKind::ElementDeleted,
            ModelEvent::ElementUpdated { .. } => EventKind::ElementUpdated,
            ModelEvent::ModelFlushed => EventKind::ModelFlushed,
            ModelEvent::ModelReady => EventKind::ModelReady,
            ModelEvent::Unlink { .. } => EventKind::Unlink,
        }
    }

    /// The element the event is about, if any.
    pub fn element(&self) -> Option<ElementId> {
        match self {
            ModelEvent::ElementCreated { element, .. }
            | ModelEvent::ElementDeleted { element, .. }
            | ModelEvent::ElementUpdated { element, .. }
            | ModelEvent::Unlink { element, .. } => Some(*element),
            ModelEvent::ModelFlushed | ModelEvent::ModelReady => None,
        }
    }

    /// The diagram the event is scoped to, if any.
    pub fn diagram(&self) -> Option<ElementId> {
        match self {
            ModelEvent::ElementCreated { diagram, .. }
            | ModelEvent::ElementDeleted { diagram, .. }
            | ModelEvent::Unlink { diagram, .. } => *diagram,
            _ => None,
        }
    }

    /// The changed property of an `ElementUpdated` event.
    pub fn property(&self) -> Option<Property> {
        match self {
            ModelEvent::ElementUpdated { property, .. } => Some(*property),
            _ => None,
        }
    }
}

/// Handle returned by [`EventManager::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

type Subscriber = Box<dyn FnMut(&ModelEvent)>;

/// Fans forwarded events out to subscribers, in subscription order.
///
/// Undo bookkeeping, tree views and other observers hook in here.
///
/// # Examples
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
/// use plume_model::{EventManager, ModelEvent};
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let mut manager = EventManager::new();
/// let sink = Rc::clone(&seen);
/// manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));
///
/// manager.handle(&ModelEvent::ModelReady);
/// assert_eq!(seen.borrow().as_slice(), &[ModelEvent::ModelReady]);
/// ```
#[derive(Default)]
pub struct EventManager {
    next_id: usize,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber that receives every forwarded event.
    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&ModelEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Delivers an event to every subscriber.
    pub fn handle(&mut self, event: &ModelEvent) {
        trace!(event:?, subscribers = self.subscribers.len(); "Delivering event");
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
