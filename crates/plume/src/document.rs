//! TOML model documents.
//!
//! A document lists `[[element]]` entries and `[[connection]]` entries:
//!
//! ```toml
//! [[element]]
//! id = "root"
//! type = "Package"
//! name = "Model"
//!
//! [[element]]
//! id = "main"
//! type = "Diagram"
//! element = "root"
//!
//! [[element]]
//! id = "root-item"
//! type = "PackageItem"
//! diagram = "main"
//! subject = "root"
//! matrix = [1.0, 0.0, 0.0, 1.0, 40.0, 40.0]
//! ```
//!
//! Loading goes through [`ElementFactory::create_as`] with events blocked:
//! model elements and diagrams are created first, then presentations. The
//! attributes follow (names, owners, ambient elements, subjects, matrices,
//! sizes, handles, parents), then the connections. Finally `ModelReady` is
//! emitted.
//!
//! A connection restores the line's bindings as saved. The `owner` field is
//! authoritative: a containment line only sets the owner of its tail's
//! subject when the document states none. Lines without saved `handles`
//! have them snapped to their items.

use indexmap::IndexSet;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use plume_core::geometry::{Matrix, Point, Size};
use plume_model::{ElementFactory, ElementId, Endpoint, Facet, Metaclass, ModelError, Shape};

/// Errors raised while reading, applying or writing a model document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid model document: {0}")]
    Syntax(#[from] toml::de::Error),

    #[error("cannot write model document: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("element `{id}` has unknown type `{type_name}`")]
    UnknownType { id: ElementId, type_name: String },

    #[error("`{field}` of `{id}` refers to `{target}`, which is not in the document")]
    DanglingReference {
        id: ElementId,
        field: &'static str,
        target: ElementId,
    },

    #[error("cannot apply `{id}`: {source}")]
    Model {
        id: ElementId,
        #[source]
        source: ModelError,
    },
}

/// One `[[element]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementEntry {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ElementId>,
    /// Ambient element of a diagram.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<ElementId>,
    /// Diagram a presentation is drawn on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<ElementId>,
    /// Local matrix as `[xx, yx, xy, yy, x0, y0]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<[f64; 6]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ElementId>,
    /// `[width, height]` of a box item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f64; 2]>,
    /// `[[head x, head y], [tail x, tail y]]` of a line item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handles: Option<[[f64; 2]; 2]>,
}

impl ElementEntry {
    /// Creates an entry with only `id` and `type` set.
    pub fn new(id: ElementId, metaclass: Metaclass) -> Self {
        Self {
            id,
            type_name: metaclass.name().to_string(),
            name: None,
            owner: None,
            element: None,
            diagram: None,
            subject: None,
            matrix: None,
            parent: None,
            size: None,
            handles: None,
        }
    }

    fn metaclass(&self) -> Result<Metaclass, DocumentError> {
        self.type_name
            .parse::<Metaclass>()
            .map_err(|_| DocumentError::UnknownType {
                id: self.id,
                type_name: self.type_name.clone(),
            })
    }
}

/// One `[[connection]]` entry: the items bound to the ends of a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionEntry {
    pub line: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tail: Option<ElementId>,
}

/// A serialized model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default, rename = "element", skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ElementEntry>,
    #[serde(default, rename = "connection", skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionEntry>,
}

impl ModelDocument {
    /// Parses a document from TOML source.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Syntax`] if the source is not a valid document.
    pub fn from_toml(source: &str) -> Result<Self, DocumentError> {
        let document: Self = toml::from_str(source)?;
        debug!(
            elements = document.elements.len(),
            connections = document.connections.len();
            "Model document parsed"
        );
        Ok(document)
    }

    /// Serializes the document to TOML.
    ///
    /// # Errors
    ///
    /// [`DocumentError::Serialize`] if TOML serialization fails.
    pub fn to_toml(&self) -> Result<String, DocumentError> {
        Ok(toml::to_string(self)?)
    }

    /// Captures every element and connection of `factory`, in registry
    /// order.
    pub fn from_factory(factory: &ElementFactory) -> Self {
        let mut document = Self::default();

        for element in factory.values() {
            let mut entry = ElementEntry::new(element.id(), element.metaclass());
            entry.name = element.name().map(str::to_string);
            entry.owner = element.owner();

            match element.facet() {
                Facet::Model => {}
                Facet::Diagram(data) => {
                    entry.element = data.element();
                    for &line in data.items() {
                        let head = data.connections().get_connection(line, Endpoint::Head);
                        let tail = data.connections().get_connection(line, Endpoint::Tail);
                        if head.is_none() && tail.is_none() {
                            continue;
                        }
                        document.connections.push(ConnectionEntry {
                            line,
                            head: head.and_then(|connection| connection.connected()),
                            tail: tail.and_then(|connection| connection.connected()),
                        });
                    }
                }
                Facet::Presentation(data) => {
                    entry.diagram = Some(data.diagram());
                    entry.subject = data.subject();
                    entry.parent = data.parent();
                    if !data.matrix().is_identity() {
                        entry.matrix = Some(data.matrix().into());
                    }
                    match *data.shape() {
                        Shape::Box { size } => entry.size = Some([size.width(), size.height()]),
                        Shape::Line { head, tail } => {
                            entry.handles = Some([[head.x(), head.y()], [tail.x(), tail.y()]]);
                        }
                    }
                }
            }
            document.elements.push(entry);
        }

        document
    }

    /// Creates the document's elements in `factory` and applies their
    /// attributes and connections.
    ///
    /// Events are blocked while loading; `ModelReady` is emitted once the
    /// whole document has been applied.
    ///
    /// Returns the ids of the loaded elements, in document order.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::UnknownType`] for a `type` that is not a metaclass
    /// - [`DocumentError::DanglingReference`] for a reference to an id that
    ///   is neither in the document nor in the factory
    /// - [`DocumentError::Model`] when the factory rejects an entry
    ///
    /// Elements created before the error stay in the factory.
    pub fn load_into(&self, factory: &mut ElementFactory) -> Result<Vec<ElementId>, DocumentError> {
        let typed = self
            .elements
            .iter()
            .map(|entry| Ok((entry, entry.metaclass()?)))
            .collect::<Result<Vec<_>, DocumentError>>()?;

        {
            let mut factory = factory.block_events();
            create_elements(&mut factory, &typed)?;
            for (entry, metaclass) in &typed {
                apply_attributes(&mut factory, entry, *metaclass)?;
            }
            let stated_owners: IndexSet<ElementId> = self
                .elements
                .iter()
                .filter(|entry| entry.owner.is_some())
                .map(|entry| entry.id)
                .collect();
            let placed_lines: IndexSet<ElementId> = self
                .elements
                .iter()
                .filter(|entry| entry.handles.is_some())
                .map(|entry| entry.id)
                .collect();
            for connection in &self.connections {
                apply_connection(&mut factory, connection, &stated_owners, &placed_lines)?;
            }
        }

        info!(
            elements = self.elements.len(),
            connections = self.connections.len();
            "Model document loaded"
        );
        factory.model_ready();
        Ok(self.elements.iter().map(|entry| entry.id).collect())
    }
}

fn model_error(id: ElementId) -> impl FnOnce(ModelError) -> DocumentError {
    move |source| DocumentError::Model { id, source }
}

/// Returns `target` if it resolves in `factory`.
fn resolve(
    factory: &ElementFactory,
    id: ElementId,
    field: &'static str,
    target: Option<ElementId>,
) -> Result<Option<ElementId>, DocumentError> {
    match target {
        Some(target) if !factory.contains(target) => Err(DocumentError::DanglingReference {
            id,
            field,
            target,
        }),
        target => Ok(target),
    }
}

fn create_elements(
    factory: &mut ElementFactory,
    typed: &[(&ElementEntry, Metaclass)],
) -> Result<(), DocumentError> {
    for (entry, metaclass) in typed.iter().filter(|(_, m)| !m.is_presentation()) {
        factory
            .create_as(*metaclass, entry.id, entry.diagram)
            .map_err(model_error(entry.id))?;
        trace!(id:? = entry.id, metaclass:?; "Loaded element");
    }
    for (entry, metaclass) in typed.iter().filter(|(_, m)| m.is_presentation()) {
        let diagram = resolve(factory, entry.id, "diagram", entry.diagram)?;
        factory
            .create_as(*metaclass, entry.id, diagram)
            .map_err(model_error(entry.id))?;
        trace!(id:? = entry.id, metaclass:?; "Loaded presentation");
    }
    Ok(())
}

fn apply_attributes(
    factory: &mut ElementFactory,
    entry: &ElementEntry,
    metaclass: Metaclass,
) -> Result<(), DocumentError> {
    let id = entry.id;

    if entry.name.is_some() {
        factory
            .set_name(id, entry.name.clone())
            .map_err(model_error(id))?;
    }
    if let Some(owner) = resolve(factory, id, "owner", entry.owner)? {
        factory.set_owner(id, Some(owner)).map_err(model_error(id))?;
    }
    if let Some(element) = resolve(factory, id, "element", entry.element)? {
        factory
            .set_diagram_element(id, Some(element))
            .map_err(model_error(id))?;
    }

    if !metaclass.is_presentation() {
        return Ok(());
    }

    if let Some(subject) = resolve(factory, id, "subject", entry.subject)? {
        factory
            .set_subject(id, Some(subject))
            .map_err(model_error(id))?;
    }
    if let Some(matrix) = entry.matrix {
        factory
            .set_matrix(id, Matrix::from(matrix))
            .map_err(model_error(id))?;
    }
    if let Some([width, height]) = entry.size {
        factory
            .set_size(id, Size::new(width, height))
            .map_err(model_error(id))?;
    }
    if let Some([[hx, hy], [tx, ty]]) = entry.handles {
        factory
            .set_handle_position(id, Endpoint::Head, Point::new(hx, hy))
            .map_err(model_error(id))?;
        factory
            .set_handle_position(id, Endpoint::Tail, Point::new(tx, ty))
            .map_err(model_error(id))?;
    }
    if let Some(parent) = resolve(factory, id, "parent", entry.parent)? {
        factory
            .set_parent(id, Some(parent))
            .map_err(model_error(id))?;
    }
    Ok(())
}

fn apply_connection(
    factory: &mut ElementFactory,
    connection: &ConnectionEntry,
    stated_owners: &IndexSet<ElementId>,
    placed_lines: &IndexSet<ElementId>,
) -> Result<(), DocumentError> {
    let line = connection.line;
    resolve(factory, line, "line", Some(line))?;
    let head = resolve(factory, line, "head", connection.head)?;
    let tail = resolve(factory, line, "tail", connection.tail)?;
    factory
        .restore_connection(line, head, tail)
        .map_err(model_error(line))?;

    let contained = tail.and_then(|tail| factory.subject(tail).ok().flatten());
    if contained.is_some_and(|subject| !stated_owners.contains(&subject)) {
        factory.connect_subjects(line).map_err(model_error(line))?;
    }
    if !placed_lines.contains(&line) {
        factory.snap_handles(line).map_err(model_error(line))?;
    }
    Ok(())
}
