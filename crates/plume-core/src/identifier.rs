//! Element identifiers backed by string interning.
//!
//! Model documents carry arbitrary string ids and freshly created elements
//! get a time-ordered UUID. Both end up as an [`ElementId`], a `Copy` handle
//! into a process-wide string interner, so ids are cheap to store in the
//! many inverse relations of the model.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Global string interner for identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut interner)
}

/// Unique identifier of a model element.
///
/// # Examples
///
/// ```
/// use plume_core::identifier::ElementId;
///
/// let loaded = ElementId::new("3f1c9a52-root");
/// assert_eq!(loaded, "3f1c9a52-root");
///
/// let fresh = ElementId::generate();
/// assert_ne!(fresh, loaded);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(DefaultSymbol);

impl ElementId {
    /// Creates an `ElementId` from its string form.
    pub fn new(id: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(id)))
    }

    /// Creates a new identifier from a time-ordered (v7) UUID.
    pub fn generate() -> Self {
        Self::new(&uuid::Uuid::now_v7().to_string())
    }

    /// Returns the identifier as an owned string.
    pub fn as_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_interner(|interner| match interner.resolve(self.0) {
            Some(id) => f.write_str(id),
            None => f.write_str("<unresolved>"),
        })
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElementId({self})")
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl std::str::FromStr for ElementId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl PartialEq<str> for ElementId {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for ElementId {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for ElementId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let id = String::deserialize(deserializer)?;
        Ok(Self::new(&id))
    }
}
