//! Error types for model operations.
//!
//! Every fallible operation of the factory returns [`ModelError`]. Errors are
//! raised before any mutation takes place, so a failed call leaves the model
//! exactly as it was.

use std::fmt;

use thiserror::Error;

use plume_core::identifier::ElementId;

use crate::{diagram::Endpoint, metaclass::Metaclass};

/// Result alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// The broad class of a [`ModelError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A type mismatch: wrong metaclass, missing or forbidden diagram.
    Type,
    /// The requested transition is illegal in the element's current state.
    State,
    /// An id does not resolve, or resolves to an element that already exists.
    Reference,
    /// A connector refused to bind an item.
    Connection,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Type => write!(f, "type"),
            ErrorKind::State => write!(f, "state"),
            ErrorKind::Reference => write!(f, "reference"),
            ErrorKind::Connection => write!(f, "connection"),
        }
    }
}

/// Errors raised by the element factory and the diagram model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("type `{0}` is abstract and cannot be instantiated")]
    AbstractType(Metaclass),

    #[error("presentation type `{0}` requires a diagram")]
    DiagramRequired(Metaclass),

    #[error("element type `{0}` cannot be created on a diagram")]
    DiagramNotAllowed(Metaclass),

    #[error("element `{0}` is not a diagram")]
    NotADiagram(ElementId),

    #[error("element `{0}` is not a presentation")]
    NotAPresentation(ElementId),

    #[error("element `{0}` is a presentation, not a model element")]
    NotAModelElement(ElementId),

    #[error("element `{0}` cannot own other elements")]
    NotANamespace(ElementId),

    #[error("`{subject_type}` is not a valid subject for `{item_type}`")]
    InvalidSubject {
        item_type: Metaclass,
        subject_type: Metaclass,
    },

    #[error("item `{0}` does not have this kind of geometry")]
    ShapeMismatch(ElementId),

    #[error("element `{0}` is not a connector")]
    NotAConnector(ElementId),

    #[error("an element with id `{0}` already exists")]
    DuplicateId(ElementId),

    #[error("element `{0}` does not exist")]
    UnknownElement(ElementId),

    #[error("presentation `{item}` belongs to diagram `{current}` and cannot move to `{requested}`")]
    DiagramReassignment {
        item: ElementId,
        current: ElementId,
        requested: ElementId,
    },

    #[error("`{parent}` is not on the same diagram as `{item}`")]
    ForeignParent { item: ElementId, parent: ElementId },

    #[error("making `{parent}` the parent of `{item}` would create a cycle")]
    ParentCycle { item: ElementId, parent: ElementId },

    #[error("making `{owner}` the owner of `{element}` would create a cycle")]
    OwnershipCycle { element: ElementId, owner: ElementId },

    #[error("`{item}` cannot be connected to the {endpoint} of `{line}`")]
    ConnectionRefused {
        line: ElementId,
        endpoint: Endpoint,
        item: ElementId,
    },
}

impl ModelError {
    /// Returns the broad class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::AbstractType(_)
            | ModelError::DiagramRequired(_)
            | ModelError::DiagramNotAllowed(_)
            | ModelError::NotADiagram(_)
            | ModelError::NotAPresentation(_)
            | ModelError::NotAModelElement(_)
            | ModelError::NotANamespace(_)
            | ModelError::InvalidSubject { .. }
            | ModelError::ShapeMismatch(_)
            | ModelError::NotAConnector(_) => ErrorKind::Type,
            ModelError::DiagramReassignment { .. }
            | ModelError::ForeignParent { .. }
            | ModelError::ParentCycle { .. }
            | ModelError::OwnershipCycle { .. } => ErrorKind::State,
            ModelError::DuplicateId(_) | ModelError::UnknownElement(_) => ErrorKind::Reference,
            ModelError::ConnectionRefused { .. } => ErrorKind::Connection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let id = ElementId::new("x");
        assert_eq!(ModelError::DiagramRequired(Metaclass::ClassItem).kind(), ErrorKind::Type);
        assert_eq!(
            ModelError::DiagramReassignment {
                item: id,
                current: id,
                requested: id
            }
            .kind(),
            ErrorKind::State
        );
        assert_eq!(ModelError::UnknownElement(id).kind(), ErrorKind::Reference);
        assert_eq!(
            ModelError::ConnectionRefused {
                line: id,
                endpoint: Endpoint::Head,
                item: id
            }
            .kind(),
            ErrorKind::Connection
        );
    }

    #[test]
    fn test_display() {
        let err = ModelError::DiagramNotAllowed(Metaclass::Package);
        assert_eq!(err.to_string(), "element type `Package` cannot be created on a diagram");
    }
}
