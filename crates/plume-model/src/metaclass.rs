//! Metaclasses of the modeling language and their structural capabilities.
//!
//! Metaclasses are split into two families:
//! - **model elements** (`Package`, `Class`, `Comment`, `Diagram`) live in
//!   the semantic ownership tree;
//! - **presentations** (`PackageItem`, `ClassItem`, `CommentItem`,
//!   `ContainmentItem`) are visual items bound to a diagram.
//!
//! `Element` and `Presentation` are the abstract roots of the two families and
//! cannot be instantiated.

use std::{fmt, str::FromStr};

/// A model or presentation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metaclass {
    Element,
    Package,
    Class,
    Comment,
    Diagram,
    Presentation,
    PackageItem,
    ClassItem,
    CommentItem,
    ContainmentItem,
}

impl Metaclass {
    /// Every metaclass, abstract ones included.
    pub const ALL: [Metaclass; 10] = [
        Metaclass::Element,
        Metaclass::Package,
        Metaclass::Class,
        Metaclass::Comment,
        Metaclass::Diagram,
        Metaclass::Presentation,
        Metaclass::PackageItem,
        Metaclass::ClassItem,
        Metaclass::CommentItem,
        Metaclass::ContainmentItem,
    ];

    /// Returns the metaclass name as used in model documents.
    pub fn name(self) -> &'static str {
        match self {
            Metaclass::Element => "Element",
            Metaclass::Package => "Package",
            Metaclass::Class => "Class",
            Metaclass::Comment => "Comment",
            Metaclass::Diagram => "Diagram",
            Metaclass::Presentation => "Presentation",
            Metaclass::PackageItem => "PackageItem",
            Metaclass::ClassItem => "ClassItem",
            Metaclass::CommentItem => "CommentItem",
            Metaclass::ContainmentItem => "ContainmentItem",
        }
    }

    /// Returns `true` for types that cannot be instantiated.
    pub fn is_abstract(self) -> bool {
        matches!(self, Metaclass::Element | Metaclass::Presentation)
    }

    /// Returns `true` for visual item types.
    pub fn is_presentation(self) -> bool {
        matches!(
            self,
            Metaclass::Presentation
                | Metaclass::PackageItem
                | Metaclass::ClassItem
                | Metaclass::CommentItem
                | Metaclass::ContainmentItem
        )
    }

    pub fn is_diagram(self) -> bool {
        self == Metaclass::Diagram
    }

    /// Returns `true` for items drawn as a line between two handles.
    pub fn is_line(self) -> bool {
        self == Metaclass::ContainmentItem
    }

    /// Subtype test: every type is an `Element`, every item is a `Presentation`.
    ///
    /// # Examples
    ///
    /// ```
    /// use plume_model::Metaclass;
    ///
    /// assert!(Metaclass::ClassItem.is_a(Metaclass::Presentation));
    /// assert!(Metaclass::Diagram.is_a(Metaclass::Element));
    /// assert!(!Metaclass::Package.is_a(Metaclass::Class));
    /// ```
    pub fn is_a(self, other: Metaclass) -> bool {
        self == other
            || other == Metaclass::Element
            || (other == Metaclass::Presentation && self.is_presentation())
    }

    /// The metaclass an item of this type presents, if it presents anything.
    pub fn subject_type(self) -> Option<Metaclass> {
        match self {
            Metaclass::PackageItem => Some(Metaclass::Package),
            Metaclass::ClassItem => Some(Metaclass::Class),
            Metaclass::CommentItem => Some(Metaclass::Comment),
            _ => None,
        }
    }

    /// Icon name derived from the type name, in kebab case (`ClassItem` → `class-item`).
    pub fn icon_name(self) -> String {
        let mut icon = String::new();
        for (idx, ch) in self.name().char_indices() {
            if ch.is_ascii_uppercase() && idx > 0 {
                icon.push('-');
            }
            icon.push(ch.to_ascii_lowercase());
        }
        icon
    }
}

impl fmt::Display for Metaclass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metaclass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metaclass::ALL
            .into_iter()
            .find(|metaclass| metaclass.name() == s)
            .ok_or_else(|| format!("unknown metaclass `{s}`"))
    }
}

/// Structural capabilities a type may provide.
///
/// The containment protocol asks for [`Capabilities::is_namespace`] instead
/// of matching on concrete types, so new container types only need to report
/// the capability.
pub trait Capabilities {
    /// Instances carry the `owner`/`ownedElement` slot pair and can own
    /// other elements.
    fn is_namespace(&self) -> bool;

    /// Instances take part in the semantic ownership tree as owned elements.
    fn is_ownable(&self) -> bool;
}

impl Capabilities for Metaclass {
    fn is_namespace(&self) -> bool {
        matches!(self, Metaclass::Package | Metaclass::Class)
    }

    fn is_ownable(&self) -> bool {
        !self.is_presentation() && !self.is_abstract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        for metaclass in Metaclass::ALL {
            assert_eq!(metaclass.name().parse::<Metaclass>(), Ok(metaclass));
        }
        assert!("Actor".parse::<Metaclass>().is_err());
    }

    #[test]
    fn test_icon_name() {
        assert_eq!(Metaclass::ClassItem.icon_name(), "class-item");
        assert_eq!(Metaclass::Package.icon_name(), "package");
        assert_eq!(Metaclass::ContainmentItem.icon_name(), "containment-item");
    }

    #[test]
    fn test_namespace_capability() {
        assert!(Metaclass::Package.is_namespace());
        assert!(Metaclass::Class.is_namespace());
        assert!(!Metaclass::Comment.is_namespace());
        assert!(!Metaclass::Diagram.is_namespace());
        assert!(!Metaclass::PackageItem.is_namespace());
    }

    #[test]
    fn test_subject_types() {
        assert_eq!(Metaclass::PackageItem.subject_type(), Some(Metaclass::Package));
        assert_eq!(Metaclass::ContainmentItem.subject_type(), None);
        assert_eq!(Metaclass::Package.subject_type(), None);
    }

    #[test]
    fn test_abstract_roots() {
        assert!(Metaclass::Element.is_abstract());
        assert!(Metaclass::Presentation.is_abstract());
        assert!(!Metaclass::Diagram.is_abstract());
    }
}
