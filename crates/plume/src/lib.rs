//! Plume - a UML model core with diagram painting.
//!
//! The model itself lives in [`plume_model`]; this crate adds TOML model
//! documents, configuration and an SVG painter on top of it, and exposes a
//! small builder API over the three.

pub mod config;
pub mod document;
pub mod painter;

mod error;

pub use plume_core::{color, geometry, identifier};
pub use plume_model as model;

pub use error::PlumeError;

use std::{fs, path::Path};

use log::{debug, info, trace};

use plume_model::{ElementFactory, ElementId, Metaclass};

use config::AppConfig;
use document::ModelDocument;
use painter::{ItemPainter, Selection, StyleSheet, SvgRenderer};

/// Builder for loading, painting and saving Plume models.
///
/// # Examples
///
/// ```
/// use plume::{Workspace, config::AppConfig};
///
/// let source = r#"
/// [[element]]
/// id = "main"
/// type = "Diagram"
///
/// [[element]]
/// id = "order"
/// type = "Class"
/// name = "Order"
///
/// [[element]]
/// id = "order-item"
/// type = "ClassItem"
/// diagram = "main"
/// subject = "order"
/// "#;
///
/// let workspace = Workspace::new(AppConfig::default());
/// let factory = workspace.load(source).unwrap();
///
/// let svg = workspace.render_svg(&factory, None).unwrap();
/// assert!(svg.contains("Order"));
/// ```
#[derive(Debug, Default)]
pub struct Workspace {
    config: AppConfig,
}

impl Workspace {
    /// Create a new workspace with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including style and render settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Load a model document into a fresh [`ElementFactory`].
    ///
    /// # Errors
    ///
    /// Returns `PlumeError::Document` for syntax errors, unknown element
    /// types, dangling references or elements the factory rejects.
    pub fn load(&self, source: &str) -> Result<ElementFactory, PlumeError> {
        info!("Loading model");

        let document = ModelDocument::from_toml(source)?;
        let mut factory = ElementFactory::new();
        document.load_into(&mut factory)?;

        debug!(elements = factory.size(); "Model loaded successfully");
        Ok(factory)
    }

    /// Read and load a model document from `path`.
    ///
    /// # Errors
    ///
    /// Returns `PlumeError::Io` if the file cannot be read, otherwise the
    /// errors of [`Workspace::load`].
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ElementFactory, PlumeError> {
        let path = path.as_ref();
        debug!(path:?; "Reading model document");
        let source = fs::read_to_string(path)?;
        self.load(&source)
    }

    /// Serialize the model held by `factory` to a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `PlumeError::Document` if serialization fails.
    pub fn save(&self, factory: &ElementFactory) -> Result<String, PlumeError> {
        let document = ModelDocument::from_factory(factory);
        info!(elements = document.elements.len(); "Saving model");
        Ok(document.to_toml()?)
    }

    /// Paint a diagram to an SVG string.
    ///
    /// With `diagram` set to `None`, the first diagram of the model is
    /// painted.
    ///
    /// # Errors
    ///
    /// - `PlumeError::Config` if the style configuration holds an invalid color
    /// - `PlumeError::UnknownDiagram` if `diagram` is not a diagram of the model
    /// - `PlumeError::NoDiagram` if the model has no diagram at all
    pub fn render_svg(
        &self,
        factory: &ElementFactory,
        diagram: Option<ElementId>,
    ) -> Result<String, PlumeError> {
        self.render_svg_with(factory, diagram, &Selection::new())
    }

    /// Paint a diagram to an SVG string with the given view state.
    ///
    /// # Errors
    ///
    /// Same as [`Workspace::render_svg`].
    pub fn render_svg_with(
        &self,
        factory: &ElementFactory,
        diagram: Option<ElementId>,
        selection: &Selection,
    ) -> Result<String, PlumeError> {
        let diagram = match diagram {
            Some(diagram) => {
                if !factory
                    .lookup(diagram)
                    .is_some_and(|element| element.is_a(Metaclass::Diagram))
                {
                    return Err(PlumeError::UnknownDiagram(diagram));
                }
                diagram
            }
            None => factory
                .diagrams()
                .next()
                .map(|element| element.id())
                .ok_or(PlumeError::NoDiagram)?,
        };

        let style_sheet = StyleSheet::from_config(self.config.style()).map_err(PlumeError::Config)?;
        let painter = ItemPainter::new(&style_sheet, selection);
        let mut renderer = SvgRenderer::new(self.config.render().tolerance());

        info!(diagram:?; "Painting diagram");
        let items = factory.items(diagram)?;
        let painted = painter.paint(factory, items.iter().copied(), &mut renderer);
        debug!(painted; "Items painted");

        let document = renderer.finish(self.config.render().padding());
        let svg = document.to_string();
        trace!(bytes = svg.len(); "SVG document built");

        info!("SVG rendered successfully");
        Ok(svg)
    }
}
