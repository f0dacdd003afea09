//! The containment connector: the head item's subject owns the tail item's
//! subject.

use log::{debug, warn};

use plume_core::identifier::ElementId;

use crate::{
    connector::Connector,
    diagram::Endpoint,
    error::Result,
    factory::ElementFactory,
    metaclass::Capabilities,
};

/// Connects a namespace (head) to the element it contains (tail).
///
/// Disconnecting the head moves the contained element to the diagram's
/// ambient element. Disconnecting the tail only removes the ownership edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainmentConnector;

impl ContainmentConnector {
    fn subject(factory: &ElementFactory, item: ElementId) -> Option<ElementId> {
        factory.subject(item).ok().flatten()
    }

    /// Returns `true` if `element` is `owner` or one of its owners.
    fn is_ancestor_or_self(factory: &ElementFactory, element: ElementId, owner: ElementId) -> bool {
        let mut current = Some(owner);
        while let Some(candidate) = current {
            if candidate == element {
                return true;
            }
            current = factory.owner(candidate).ok().flatten();
        }
        false
    }
}

impl Connector for ContainmentConnector {
    fn allow(
        &self,
        factory: &ElementFactory,
        _line: ElementId,
        endpoint: Endpoint,
        item: ElementId,
        opposite: Option<ElementId>,
    ) -> bool {
        let Some(subject) = Self::subject(factory, item) else {
            return false;
        };
        let Some(element) = factory.lookup(subject) else {
            return false;
        };
        let capable = match endpoint {
            Endpoint::Head => element.is_namespace(),
            Endpoint::Tail => element.is_ownable(),
        };
        if !capable {
            return false;
        }

        let opposite = opposite.and_then(|other| Self::subject(factory, other));
        match (endpoint, opposite) {
            (_, None) => true,
            (Endpoint::Head, Some(contained)) => !Self::is_ancestor_or_self(factory, contained, subject),
            (Endpoint::Tail, Some(container)) => !Self::is_ancestor_or_self(factory, subject, container),
        }
    }

    fn connect_subjects(
        &self,
        factory: &mut ElementFactory,
        line: ElementId,
        head: ElementId,
        tail: ElementId,
    ) -> Result<()> {
        let (Some(container), Some(contained)) =
            (Self::subject(factory, head), Self::subject(factory, tail))
        else {
            debug!(line:?; "Containment ends without subjects");
            return Ok(());
        };
        factory.set_owner(contained, Some(container))
    }

    fn disconnect_subjects(
        &self,
        factory: &mut ElementFactory,
        line: ElementId,
        endpoint: Endpoint,
        head: ElementId,
        tail: ElementId,
    ) -> Result<()> {
        let (Some(container), Some(contained)) =
            (Self::subject(factory, head), Self::subject(factory, tail))
        else {
            return Ok(());
        };
        if factory.owner(contained).ok().flatten() != Some(container) {
            debug!(line:?, contained:?; "Containment edge already gone");
            return Ok(());
        }

        match endpoint {
            Endpoint::Head => {
                let diagram = factory.diagram_of(line)?;
                let fallback = factory.diagram_element(diagram)?;
                if let Err(err) = factory.set_owner(contained, fallback) {
                    warn!(contained:?, fallback:?, err:%; "Diagram element cannot own element");
                    factory.set_owner(contained, None)?;
                }
            }
            Endpoint::Tail => factory.set_owner(contained, None)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaclass::Metaclass;

    #[test]
    fn test_comment_cannot_be_container() {
        let mut factory = ElementFactory::new();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        let comment = factory.create(Metaclass::Comment).unwrap();
        let item = factory
            .create_item(Metaclass::CommentItem, diagram, Some(comment))
            .unwrap();
        let line = factory
            .create_item(Metaclass::ContainmentItem, diagram, None)
            .unwrap();

        assert!(!factory.glue(line, Endpoint::Head, item));
        assert!(factory.glue(line, Endpoint::Tail, item));
    }

    #[test]
    fn test_item_without_subject_is_refused() {
        let mut factory = ElementFactory::new();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();
        let line = factory
            .create_item(Metaclass::ContainmentItem, diagram, None)
            .unwrap();

        assert!(!factory.glue(line, Endpoint::Head, item));
    }

    #[test]
    fn test_glue_refuses_cycle() {
        let mut factory = ElementFactory::new();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        let outer = factory.create(Metaclass::Package).unwrap();
        let inner = factory.create(Metaclass::Package).unwrap();
        factory.set_owner(inner, Some(outer)).unwrap();
        let outer_item = factory
            .create_item(Metaclass::PackageItem, diagram, Some(outer))
            .unwrap();
        let inner_item = factory
            .create_item(Metaclass::PackageItem, diagram, Some(inner))
            .unwrap();
        let line = factory
            .create_item(Metaclass::ContainmentItem, diagram, None)
            .unwrap();

        factory.connect(line, Endpoint::Tail, outer_item).unwrap();

        assert!(!factory.glue(line, Endpoint::Head, inner_item));
        assert!(!factory.glue(line, Endpoint::Head, outer_item));
    }

    #[test]
    fn test_tail_disconnect_leaves_element_unowned() {
        let mut factory = ElementFactory::new();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        let ambient = factory.create(Metaclass::Package).unwrap();
        factory.set_diagram_element(diagram, Some(ambient)).unwrap();
        let package = factory.create(Metaclass::Package).unwrap();
        let class = factory.create(Metaclass::Class).unwrap();
        let package_item = factory
            .create_item(Metaclass::PackageItem, diagram, Some(package))
            .unwrap();
        let class_item = factory
            .create_item(Metaclass::ClassItem, diagram, Some(class))
            .unwrap();
        let line = factory
            .create_item(Metaclass::ContainmentItem, diagram, None)
            .unwrap();
        factory.connect(line, Endpoint::Head, package_item).unwrap();
        factory.connect(line, Endpoint::Tail, class_item).unwrap();

        factory.disconnect(line, Endpoint::Tail).unwrap();

        assert_eq!(factory.owner(class), Ok(None));
        assert!(factory.lookup(ambient).unwrap().owned_elements().is_empty());
    }
}
