//! Error types for Plume operations.
//!
//! [`PlumeError`] wraps everything that can fail between reading a model
//! document and writing the painted diagram.

use std::io;

use thiserror::Error;

use plume_model::{ElementId, ModelError};

use crate::document::DocumentError;

/// The main error type for Plume operations.
#[derive(Debug, Error)]
pub enum PlumeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("diagram `{0}` does not exist")]
    UnknownDiagram(ElementId),

    #[error("the model has no diagram to paint")]
    NoDiagram,
}
