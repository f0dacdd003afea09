//! Plume CLI library
//!
//! This module contains the core CLI logic for the Plume model painter.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;
pub use error_adapter::ErrorAdapter;

use std::fs;

use log::info;

use plume::{PlumeError, Workspace};
use plume_model::{Capabilities, Element, ElementFactory, ElementId};

/// Run the Plume CLI application
///
/// This function loads the model document, logs its ownership tree, paints
/// the selected diagram and writes the resulting SVG to the output file.
///
/// # Errors
///
/// Returns `PlumeError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Model document errors
/// - A missing or unknown diagram
pub fn run(args: &Args) -> Result<(), PlumeError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing model"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let workspace = Workspace::new(app_config);
    let factory = workspace.load_file(&args.input)?;
    log_ownership_tree(&factory);

    let diagram = args.diagram.as_deref().map(ElementId::new);
    let svg = workspace.render_svg(&factory, diagram)?;

    fs::write(&args.output, svg)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}

/// Logs the semantic ownership tree, one line per element.
fn log_ownership_tree(factory: &ElementFactory) {
    let roots: Vec<&Element> = factory
        .values()
        .filter(|element| element.is_ownable() && element.owner().is_none())
        .collect();
    info!(roots = roots.len(); "Ownership tree");

    let mut stack: Vec<(ElementId, usize)> = roots
        .iter()
        .rev()
        .map(|element| (element.id(), 0))
        .collect();
    while let Some((id, depth)) = stack.pop() {
        let Some(element) = factory.lookup(id) else {
            continue;
        };
        info!(
            "{:indent$}{} {} ({})",
            "",
            element.metaclass(),
            element.name().unwrap_or("<unnamed>"),
            id,
            indent = depth * 2
        );
        stack.extend(
            element
                .owned_elements()
                .iter()
                .rev()
                .map(|&owned| (owned, depth + 1)),
        );
    }
}
