//! The element record stored in the factory registry.
//!
//! Relations between elements are kept as ids on both sides (`owner` and
//! `owned_elements`, `subject` and `presentations`, `parent` and `children`).
//! Only the factory mutates them, always updating both sides in the same
//! operation.

use indexmap::IndexSet;

use plume_core::identifier::ElementId;

use crate::{
    diagram::DiagramData,
    metaclass::{Capabilities, Metaclass},
    presentation::PresentationData,
};

/// Type-specific state of an element.
#[derive(Debug)]
pub enum Facet {
    /// A plain model element.
    Model,
    Diagram(DiagramData),
    Presentation(PresentationData),
}

/// A live element.
#[derive(Debug)]
pub struct Element {
    id: ElementId,
    metaclass: Metaclass,
    name: Option<String>,
    owner: Option<ElementId>,
    owned_elements: IndexSet<ElementId>,
    presentations: IndexSet<ElementId>,
    facet: Facet,
}

impl Element {
    pub(crate) fn new(id: ElementId, metaclass: Metaclass, facet: Facet) -> Self {
        Self {
            id,
            metaclass,
            name: None,
            owner: None,
            owned_elements: IndexSet::new(),
            presentations: IndexSet::new(),
            facet,
        }
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn metaclass(&self) -> Metaclass {
        self.metaclass
    }

    /// Returns `true` if this element is of type `metaclass` or a subtype.
    pub fn is_a(&self, metaclass: Metaclass) -> bool {
        self.metaclass.is_a(metaclass)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The namespace owning this element.
    pub fn owner(&self) -> Option<ElementId> {
        self.owner
    }

    /// Elements owned by this element, in insertion order.
    pub fn owned_elements(&self) -> &IndexSet<ElementId> {
        &self.owned_elements
    }

    /// Items presenting this element on diagrams.
    pub fn presentations(&self) -> &IndexSet<ElementId> {
        &self.presentations
    }

    pub fn facet(&self) -> &Facet {
        &self.facet
    }

    pub fn as_diagram(&self) -> Option<&DiagramData> {
        match &self.facet {
            Facet::Diagram(diagram) => Some(diagram),
            _ => None,
        }
    }

    pub fn as_presentation(&self) -> Option<&PresentationData> {
        match &self.facet {
            Facet::Presentation(presentation) => Some(presentation),
            _ => None,
        }
    }

    pub(crate) fn as_diagram_mut(&mut self) -> Option<&mut DiagramData> {
        match &mut self.facet {
            Facet::Diagram(diagram) => Some(diagram),
            _ => None,
        }
    }

    pub(crate) fn as_presentation_mut(&mut self) -> Option<&mut PresentationData> {
        match &mut self.facet {
            Facet::Presentation(presentation) => Some(presentation),
            _ => None,
        }
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ElementId>) {
        self.owner = owner;
    }

    pub(crate) fn owned_elements_mut(&mut self) -> &mut IndexSet<ElementId> {
        &mut self.owned_elements
    }

    pub(crate) fn presentations_mut(&mut self) -> &mut IndexSet<ElementId> {
        &mut self.presentations
    }
}

impl Capabilities for Element {
    fn is_namespace(&self) -> bool {
        self.metaclass.is_namespace()
    }

    fn is_ownable(&self) -> bool {
        self.metaclass.is_ownable()
    }
}
