//! Plume Model
//!
//! The model core of the Plume editor:
//!
//! - [`ElementFactory`]: creation, registration, lookup and teardown of
//!   elements, with suppressible event forwarding
//! - the presentation model: items bound to one diagram, with a parent/child
//!   tree and composed item-to-canvas transforms
//! - diagrams and their connection table
//! - the containment connector, which keeps the ownership tree in step with
//!   what is drawn
//!
//! All relations are stored as [`ElementId`]s and always updated on both
//! sides by the factory.
//!
//! # Examples
//!
//! ```
//! use plume_model::{ElementFactory, Endpoint, Metaclass};
//!
//! let mut factory = ElementFactory::new();
//! let diagram = factory.create(Metaclass::Diagram).unwrap();
//! let package = factory.create(Metaclass::Package).unwrap();
//! let class = factory.create(Metaclass::Class).unwrap();
//!
//! let package_item = factory.create_item(Metaclass::PackageItem, diagram, Some(package)).unwrap();
//! let class_item = factory.create_item(Metaclass::ClassItem, diagram, Some(class)).unwrap();
//! let line = factory.create_item(Metaclass::ContainmentItem, diagram, None).unwrap();
//!
//! factory.connect(line, Endpoint::Head, package_item).unwrap();
//! factory.connect(line, Endpoint::Tail, class_item).unwrap();
//!
//! assert_eq!(factory.owner(class).unwrap(), Some(package));
//! ```

mod connector;
mod diagram;
mod dispatcher;
mod element;
mod error;
mod event;
mod factory;
mod metaclass;
mod ownership;
mod presentation;

pub use plume_core::identifier::ElementId;

pub use connector::{Connector, ContainmentConnector, connector_for};
pub use diagram::{
    Connection, Connections, Constraint, ConstraintId, DiagramData, Endpoint, HandleConstraint,
};
pub use dispatcher::{ElementDispatcher, EventWatcher, Handler, HandlerId};
pub use element::{Element, Facet};
pub use error::{ErrorKind, ModelError, Result};
pub use event::{EventKind, EventManager, ModelEvent, Property, SubscriptionId};
pub use factory::{All, BlockedEvents, ElementFactory, Selector};
pub use metaclass::{Capabilities, Metaclass};
pub use presentation::{PresentationData, Shape};
