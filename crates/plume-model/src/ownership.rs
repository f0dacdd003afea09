//! Names and the `owner` / `owned_elements` relation.

use log::debug;

use plume_core::identifier::ElementId;

use crate::{
    error::{ModelError, Result},
    event::Property,
    factory::ElementFactory,
    metaclass::Capabilities,
};

impl ElementFactory {
    /// Renames an element.
    pub fn set_name(&mut self, element: ElementId, name: Option<String>) -> Result<()> {
        let target = self.element_mut(element)?;
        if target.name() == name.as_deref() {
            return Ok(());
        }
        target.set_name(name);
        self.notify(element, Property::Name);
        Ok(())
    }

    /// The namespace owning `element`.
    pub fn owner(&self, element: ElementId) -> Result<Option<ElementId>> {
        Ok(self.element(element)?.owner())
    }

    /// Moves `element` into `owner`, or out of any namespace with `None`.
    ///
    /// The element leaves its previous owner's `owned_elements` in the same
    /// call, so an element never has more than one owner.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotAModelElement`] if `element` cannot be owned
    /// - [`ModelError::NotANamespace`] if `owner` cannot own elements
    /// - [`ModelError::OwnershipCycle`] if `owner` is `element` or is owned
    ///   by it, directly or transitively
    pub fn set_owner(&mut self, element: ElementId, owner: Option<ElementId>) -> Result<()> {
        let target = self.element(element)?;
        if !target.is_ownable() {
            return Err(ModelError::NotAModelElement(element));
        }
        let previous = target.owner();

        if let Some(owner) = owner {
            if !self.element(owner)?.is_namespace() {
                return Err(ModelError::NotANamespace(owner));
            }
            let mut ancestor = Some(owner);
            while let Some(current) = ancestor {
                if current == element {
                    return Err(ModelError::OwnershipCycle { element, owner });
                }
                ancestor = self.element(current)?.owner();
            }
        }

        if previous == owner {
            return Ok(());
        }

        if let Some(previous) = previous {
            if let Ok(previous_owner) = self.element_mut(previous) {
                previous_owner.owned_elements_mut().shift_remove(&element);
                self.notify(previous, Property::OwnedElement);
            }
        }
        if let Some(owner) = owner {
            self.element_mut(owner)?.owned_elements_mut().insert(element);
            self.notify(owner, Property::OwnedElement);
        }
        self.element_mut(element)?.set_owner(owner);
        debug!(element:?, owner:?, previous:?; "Owner changed");
        self.notify(element, Property::Owner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaclass::Metaclass;

    #[test]
    fn test_single_owner() {
        let mut factory = ElementFactory::new();
        let first = factory.create(Metaclass::Package).unwrap();
        let second = factory.create(Metaclass::Package).unwrap();
        let class = factory.create(Metaclass::Class).unwrap();

        factory.set_owner(class, Some(first)).unwrap();
        factory.set_owner(class, Some(second)).unwrap();

        assert!(factory.lookup(first).unwrap().owned_elements().is_empty());
        assert!(factory.lookup(second).unwrap().owned_elements().contains(&class));
        assert_eq!(factory.owner(class), Ok(Some(second)));
    }

    #[test]
    fn test_comment_is_not_a_namespace() {
        let mut factory = ElementFactory::new();
        let comment = factory.create(Metaclass::Comment).unwrap();
        let class = factory.create(Metaclass::Class).unwrap();

        assert_eq!(
            factory.set_owner(class, Some(comment)),
            Err(ModelError::NotANamespace(comment))
        );
    }

    #[test]
    fn test_ownership_cycle_rejected() {
        let mut factory = ElementFactory::new();
        let outer = factory.create(Metaclass::Package).unwrap();
        let inner = factory.create(Metaclass::Package).unwrap();
        factory.set_owner(inner, Some(outer)).unwrap();

        assert_eq!(
            factory.set_owner(outer, Some(inner)),
            Err(ModelError::OwnershipCycle {
                element: outer,
                owner: inner
            })
        );
        assert_eq!(factory.owner(outer), Ok(None));
    }

    #[test]
    fn test_presentation_cannot_be_owned() {
        let mut factory = ElementFactory::new();
        let package = factory.create(Metaclass::Package).unwrap();
        let diagram = factory.create(Metaclass::Diagram).unwrap();
        let item = factory.create_item(Metaclass::ClassItem, diagram, None).unwrap();

        assert_eq!(
            factory.set_owner(item, Some(package)),
            Err(ModelError::NotAModelElement(item))
        );
    }

    #[test]
    fn test_unlinking_owner_unlinks_owned() {
        let mut factory = ElementFactory::new();
        let package = factory.create(Metaclass::Package).unwrap();
        let class = factory.create(Metaclass::Class).unwrap();
        factory.set_owner(class, Some(package)).unwrap();

        factory.unlink(package);

        assert!(factory.is_empty());
    }

    #[test]
    fn test_unlinking_owned_detaches_from_owner() {
        let mut factory = ElementFactory::new();
        let package = factory.create(Metaclass::Package).unwrap();
        let class = factory.create(Metaclass::Class).unwrap();
        factory.set_owner(class, Some(package)).unwrap();

        factory.unlink(class);

        assert!(factory.lookup(package).unwrap().owned_elements().is_empty());
    }

    #[test]
    fn test_set_name() {
        let mut factory = ElementFactory::new();
        let class = factory.create(Metaclass::Class).unwrap();

        factory.set_name(class, Some("Order".to_string())).unwrap();

        assert_eq!(factory.lookup(class).unwrap().name(), Some("Order"));
    }
}
