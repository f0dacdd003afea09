//! Presentation items: diagram binding, subject, parent/child tree and the
//! item-to-canvas transform.
//!
//! Every item keeps a local [`Matrix`] and a derived `matrix_i2c`:
//!
//! ```text
//! matrix_i2c(item) = local(item) · matrix_i2c(parent)
//! ```
//!
//! using the cairo convention where the left operand is applied first. An
//! item without a parent has `matrix_i2c == local`. The derived matrix of an
//! item and all of its descendants is recomputed as soon as a local matrix
//! or a parent changes.

use indexmap::IndexSet;
use log::{debug, warn};

use plume_core::{
    geometry::{Matrix, Point, Size},
    identifier::ElementId,
};

use crate::{
    diagram::Endpoint,
    element::{Element, Facet},
    error::{ModelError, Result},
    event::Property,
    factory::ElementFactory,
    metaclass::Metaclass,
};

/// Geometry of an item in its own coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    /// A box anchored at the local origin.
    Box { size: Size },
    /// A line between two handles.
    Line { head: Point, tail: Point },
}

impl Shape {
    /// Initial geometry for a freshly created item.
    pub fn for_metaclass(metaclass: Metaclass) -> Self {
        match metaclass {
            Metaclass::ContainmentItem => Shape::Line {
                head: Point::new(0.0, 0.0),
                tail: Point::new(10.0, 10.0),
            },
            Metaclass::PackageItem => Shape::Box {
                size: Size::new(160.0, 100.0),
            },
            Metaclass::ClassItem => Shape::Box {
                size: Size::new(120.0, 60.0),
            },
            _ => Shape::Box {
                size: Size::new(100.0, 50.0),
            },
        }
    }

    /// Centre of the shape in local coordinates.
    pub fn center(&self) -> Point {
        match self {
            Shape::Box { size } => size.center(),
            Shape::Line { head, tail } => head.midpoint(*tail),
        }
    }
}

/// Presentation-specific state of an element.
#[derive(Debug)]
pub struct PresentationData {
    diagram: ElementId,
    subject: Option<ElementId>,
    parent: Option<ElementId>,
    children: IndexSet<ElementId>,
    matrix: Matrix,
    matrix_i2c: Matrix,
    shape: Shape,
}

impl PresentationData {
    pub(crate) fn new(metaclass: Metaclass, diagram: ElementId) -> Self {
        Self {
            diagram,
            subject: None,
            parent: None,
            children: IndexSet::new(),
            matrix: Matrix::identity(),
            matrix_i2c: Matrix::identity(),
            shape: Shape::for_metaclass(metaclass),
        }
    }

    /// The diagram this item is drawn on.
    pub fn diagram(&self) -> ElementId {
        self.diagram
    }

    /// The model element this item presents.
    pub fn subject(&self) -> Option<ElementId> {
        self.subject
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &IndexSet<ElementId> {
        &self.children
    }

    /// Local transform, relative to the parent.
    pub fn matrix(&self) -> Matrix {
        self.matrix
    }

    /// Item-to-canvas transform.
    pub fn matrix_i2c(&self) -> Matrix {
        self.matrix_i2c
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn size(&self) -> Option<Size> {
        match self.shape {
            Shape::Box { size } => Some(size),
            Shape::Line { .. } => None,
        }
    }

    /// Position of a line handle in local coordinates.
    pub fn handle(&self, endpoint: Endpoint) -> Option<Point> {
        match (self.shape, endpoint) {
            (Shape::Line { head, .. }, Endpoint::Head) => Some(head),
            (Shape::Line { tail, .. }, Endpoint::Tail) => Some(tail),
            (Shape::Box { .. }, _) => None,
        }
    }
}

impl ElementFactory {
    /// Builds a presentation element and enters it in its diagram.
    ///
    /// Called with events blocked; the caller registers the element.
    pub(crate) fn construct_presentation(
        &mut self,
        metaclass: Metaclass,
        id: ElementId,
        diagram: ElementId,
    ) -> Element {
        if let Ok(data) = self.diagram_data_mut(diagram) {
            data.items_mut().insert(id);
            self.notify(diagram, Property::OwnedPresentation);
        }
        Element::new(
            id,
            metaclass,
            Facet::Presentation(PresentationData::new(metaclass, diagram)),
        )
    }

    pub(crate) fn presentation(&self, id: ElementId) -> Result<&PresentationData> {
        self.element(id)?
            .as_presentation()
            .ok_or(ModelError::NotAPresentation(id))
    }

    fn presentation_mut(&mut self, id: ElementId) -> Result<&mut PresentationData> {
        self.element_mut(id)?
            .as_presentation_mut()
            .ok_or(ModelError::NotAPresentation(id))
    }

    /// The diagram `item` is bound to.
    pub fn diagram_of(&self, item: ElementId) -> Result<ElementId> {
        Ok(self.presentation(item)?.diagram())
    }

    /// Changes the diagram binding of `item`.
    ///
    /// Binding to the current diagram does nothing. Clearing the binding
    /// unlinks the item: lines bound to it are disconnected, its connections
    /// and constraints leave the diagram, and the deletion event is scoped
    /// to the former diagram.
    ///
    /// # Errors
    ///
    /// [`ModelError::DiagramReassignment`] when asked to move the item to a
    /// different diagram. The item stays bound to its diagram.
    pub fn set_diagram(&mut self, item: ElementId, diagram: Option<ElementId>) -> Result<()> {
        let current = self.presentation(item)?.diagram();
        match diagram {
            Some(requested) if requested == current => Ok(()),
            Some(requested) => Err(ModelError::DiagramReassignment {
                item,
                current,
                requested,
            }),
            None => {
                debug!(item:?, diagram:? = current; "Diagram binding cleared");
                self.unlink(item);
                Ok(())
            }
        }
    }

    /// The model element presented by `item`.
    pub fn subject(&self, item: ElementId) -> Result<Option<ElementId>> {
        Ok(self.presentation(item)?.subject())
    }

    /// Sets the model element presented by `item`.
    ///
    /// The subject's presentation set is kept in step.
    ///
    /// # Errors
    ///
    /// [`ModelError::InvalidSubject`] when the item type cannot present the
    /// subject's type.
    pub fn set_subject(&mut self, item: ElementId, subject: Option<ElementId>) -> Result<()> {
        let metaclass = self.element(item)?.metaclass();
        let previous = self.presentation(item)?.subject();
        if let Some(subject) = subject {
            self.check_subject(metaclass, subject)?;
        }
        if previous == subject {
            return Ok(());
        }

        if let Some(previous) = previous {
            if let Ok(element) = self.element_mut(previous) {
                element.presentations_mut().shift_remove(&item);
                self.notify(previous, Property::Presentation);
            }
        }
        if let Some(subject) = subject {
            self.element_mut(subject)?.presentations_mut().insert(item);
            self.notify(subject, Property::Presentation);
        }
        self.presentation_mut(item)?.subject = subject;
        self.notify(item, Property::Subject);
        Ok(())
    }

    pub(crate) fn check_subject(&self, item_type: Metaclass, subject: ElementId) -> Result<()> {
        let subject_type = self.element(subject)?.metaclass();
        match item_type.subject_type() {
            Some(required) if subject_type.is_a(required) => Ok(()),
            _ => Err(ModelError::InvalidSubject {
                item_type,
                subject_type,
            }),
        }
    }

    pub fn parent(&self, item: ElementId) -> Result<Option<ElementId>> {
        Ok(self.presentation(item)?.parent())
    }

    pub fn children(&self, item: ElementId) -> Result<&IndexSet<ElementId>> {
        Ok(self.presentation(item)?.children())
    }

    /// Sets the parent of `item` and recomputes the transforms below it.
    ///
    /// The local matrix is kept, so the item moves with its new parent.
    /// Clearing the parent leaves `matrix_i2c` equal to the local matrix.
    ///
    /// # Errors
    ///
    /// - [`ModelError::ForeignParent`] if `parent` is on another diagram
    /// - [`ModelError::ParentCycle`] if `parent` is `item` or one of its
    ///   descendants
    pub fn set_parent(&mut self, item: ElementId, parent: Option<ElementId>) -> Result<()> {
        let data = self.presentation(item)?;
        let previous = data.parent();
        if let Some(parent) = parent {
            self.check_parent(item, data.diagram(), parent)?;
        }
        if previous == parent {
            return Ok(());
        }

        if let Some(previous) = previous {
            if let Ok(data) = self.presentation_mut(previous) {
                data.children.shift_remove(&item);
                self.notify(previous, Property::Children);
            }
        }
        if let Some(parent) = parent {
            self.presentation_mut(parent)?.children.insert(item);
            self.notify(parent, Property::Children);
        }
        self.presentation_mut(item)?.parent = parent;
        self.notify(item, Property::Parent);
        self.update_matrix_i2c(item);
        Ok(())
    }

    /// Moves `item` under `parent` without moving it on the canvas.
    ///
    /// The local matrix is rewritten so that `matrix_i2c` stays the same.
    /// When the new parent's transform cannot be inverted the local matrix
    /// is kept as it is.
    pub fn reparent(&mut self, item: ElementId, parent: Option<ElementId>) -> Result<()> {
        let canvas = self.presentation(item)?.matrix_i2c();
        let parent_i2c = match parent {
            Some(parent) => self.presentation(parent)?.matrix_i2c(),
            None => Matrix::identity(),
        };

        self.set_parent(item, parent)?;
        match parent_i2c.invert() {
            Some(inverse) => self.set_matrix(item, canvas.multiply(&inverse)),
            None => {
                warn!(item:?, parent:?; "Parent transform is not invertible; keeping local matrix");
                Ok(())
            }
        }
    }

    fn check_parent(&self, item: ElementId, diagram: ElementId, parent: ElementId) -> Result<()> {
        let parent_data = self.presentation(parent)?;
        if parent_data.diagram() != diagram {
            return Err(ModelError::ForeignParent { item, parent });
        }

        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == item {
                return Err(ModelError::ParentCycle { item, parent });
            }
            ancestor = self.presentation(current)?.parent();
        }
        Ok(())
    }

    /// Local matrix of `item`.
    pub fn matrix(&self, item: ElementId) -> Result<Matrix> {
        Ok(self.presentation(item)?.matrix())
    }

    /// Item-to-canvas matrix of `item`.
    pub fn matrix_i2c(&self, item: ElementId) -> Result<Matrix> {
        Ok(self.presentation(item)?.matrix_i2c())
    }

    /// Replaces the local matrix of `item`.
    pub fn set_matrix(&mut self, item: ElementId, matrix: Matrix) -> Result<()> {
        self.presentation_mut(item)?.matrix = matrix;
        self.notify(item, Property::Matrix);
        self.update_matrix_i2c(item);
        Ok(())
    }

    /// Edits the local matrix of `item` in place.
    ///
    /// # Examples
    ///
    /// ```
    /// use plume_model::{ElementFactory, Metaclass};
    ///
    /// let mut factory = ElementFactory::new();
    /// let diagram = factory.create(Metaclass::Diagram).unwrap();
    /// let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();
    ///
    /// factory.update_matrix(item, |m| { m.translate(1.0, 1.0); }).unwrap();
    ///
    /// assert_eq!(
    ///     factory.matrix_i2c(item).unwrap().to_tuple(),
    ///     (1.0, 0.0, 0.0, 1.0, 1.0, 1.0)
    /// );
    /// ```
    pub fn update_matrix<F>(&mut self, item: ElementId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Matrix),
    {
        let mut matrix = self.presentation(item)?.matrix();
        edit(&mut matrix);
        self.set_matrix(item, matrix)
    }

    /// Resizes a box item.
    ///
    /// # Errors
    ///
    /// [`ModelError::ShapeMismatch`] for line items.
    pub fn set_size(&mut self, item: ElementId, size: Size) -> Result<()> {
        let data = self.presentation_mut(item)?;
        match &mut data.shape {
            Shape::Box { size: current } => *current = size,
            Shape::Line { .. } => return Err(ModelError::ShapeMismatch(item)),
        }
        self.notify(item, Property::Geometry);
        Ok(())
    }

    /// Moves a handle of a line item, in the line's local coordinates.
    ///
    /// # Errors
    ///
    /// [`ModelError::ShapeMismatch`] for box items.
    pub fn set_handle_position(
        &mut self,
        item: ElementId,
        endpoint: Endpoint,
        position: Point,
    ) -> Result<()> {
        let data = self.presentation_mut(item)?;
        match (&mut data.shape, endpoint) {
            (Shape::Line { head, .. }, Endpoint::Head) => *head = position,
            (Shape::Line { tail, .. }, Endpoint::Tail) => *tail = position,
            (Shape::Box { .. }, _) => return Err(ModelError::ShapeMismatch(item)),
        }
        self.notify(item, Property::Geometry);
        Ok(())
    }

    /// Recomputes `matrix_i2c` for `item` and its descendants.
    fn update_matrix_i2c(&mut self, item: ElementId) {
        let mut stack = vec![item];
        while let Some(current) = stack.pop() {
            let Ok(data) = self.presentation(current) else {
                continue;
            };
            let parent_i2c = data
                .parent()
                .and_then(|parent| self.presentation(parent).ok())
                .map_or_else(Matrix::identity, PresentationData::matrix_i2c);
            let children: Vec<ElementId> = data.children().iter().copied().collect();

            if let Ok(data) = self.presentation_mut(current) {
                data.matrix_i2c = data.matrix.multiply(&parent_i2c);
            }
            stack.extend(children);
        }
    }

    /// Detaches a presentation that already left the registry.
    pub(crate) fn release_presentation(
        &mut self,
        id: ElementId,
        data: &PresentationData,
        removed: &mut Vec<ElementId>,
    ) {
        if let Some(subject) = data.subject() {
            if let Ok(element) = self.element_mut(subject) {
                element.presentations_mut().shift_remove(&id);
                self.notify(subject, Property::Presentation);
            }
        }

        if let Some(parent) = data.parent() {
            if let Ok(parent_data) = self.presentation_mut(parent) {
                parent_data.children.shift_remove(&id);
                self.notify(parent, Property::Children);
            }
        }

        let diagram = data.diagram();
        self.remove_item_connections(diagram, id);
        if let Ok(diagram_data) = self.diagram_data_mut(diagram) {
            diagram_data.items_mut().shift_remove(&id);
            self.notify(diagram, Property::OwnedPresentation);
        }

        for child in data.children() {
            self.unlink_into(*child, removed);
        }
    }
}
