//! Error adapter for converting PlumeError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI. Every error gets
//! a stable code such as `plume::io` or `plume::model::type`.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan};

use plume::{PlumeError, document::DocumentError};
use plume_model::{ErrorKind, ModelError};

/// Adapter for [`PlumeError`].
pub struct ErrorAdapter<'a>(pub &'a PlumeError);

impl ErrorAdapter<'_> {
    /// The stable diagnostic code of the wrapped error.
    pub fn code_str(&self) -> String {
        match self.0 {
            PlumeError::Io(_) => "plume::io".to_string(),
            PlumeError::Config(_) => "plume::config".to_string(),
            PlumeError::Document(err) => match err {
                DocumentError::Syntax(_) => "plume::document::syntax".to_string(),
                DocumentError::Serialize(_) => "plume::document::serialize".to_string(),
                DocumentError::UnknownType { .. } => "plume::document::type".to_string(),
                DocumentError::DanglingReference { .. } => {
                    "plume::document::reference".to_string()
                }
                DocumentError::Model { source, .. } => model_code(source),
            },
            PlumeError::Model(err) => model_code(err),
            PlumeError::Export(_) => "plume::export".to_string(),
            PlumeError::UnknownDiagram(_) | PlumeError::NoDiagram => "plume::diagram".to_string(),
        }
    }

    fn help_str(&self) -> Option<&'static str> {
        match self.0 {
            PlumeError::Config(_) => {
                Some("check the configuration file; colors must be valid CSS colors")
            }
            PlumeError::Document(DocumentError::UnknownType { .. }) => Some(
                "valid types are Package, Class, Comment, Diagram, PackageItem, ClassItem, CommentItem and ContainmentItem",
            ),
            PlumeError::Document(DocumentError::DanglingReference { .. }) => {
                Some("every referenced id must be declared as an [[element]]")
            }
            PlumeError::Document(DocumentError::Model { source, .. }) | PlumeError::Model(source) => {
                model_help(source)
            }
            PlumeError::UnknownDiagram(_) => Some("pass the id of a Diagram element with --diagram"),
            PlumeError::NoDiagram => Some("add an element with type = \"Diagram\" to the document"),
            _ => None,
        }
    }
}

fn model_code(err: &ModelError) -> String {
    format!("plume::model::{}", err.kind())
}

fn model_help(err: &ModelError) -> Option<&'static str> {
    match err {
        ModelError::DiagramRequired(_) => Some("presentation elements need a `diagram` field"),
        ModelError::DiagramNotAllowed(_) => {
            Some("only presentation elements may have a `diagram` field")
        }
        ModelError::DuplicateId(_) => Some("element ids must be unique within a document"),
        _ => match err.kind() {
            ErrorKind::Connection => {
                Some("containment lines connect a namespace at the head to an ownable element at the tail")
            }
            ErrorKind::State => {
                Some("items stay on their diagram; parents and owners must not form cycles")
            }
            ErrorKind::Type | ErrorKind::Reference => None,
        },
    }
}

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code_str()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help_str()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        None
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        None
    }
}
