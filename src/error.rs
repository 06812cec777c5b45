use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::syntax::SourceLocation;

/// Main error type for moddef operations
#[derive(Error, Diagnostic, Debug)]
pub enum DefError {
    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(moddef::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Parse error at {location}: {message}")]
    #[diagnostic(code(moddef::parse))]
    Parse {
        location: SourceLocation,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Unresolved reference '@{path}' at {location}: {message}")]
    #[diagnostic(code(moddef::reference))]
    Reference {
        location: SourceLocation,
        path: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Registry '{category}' ran out of free ids: {added} new name(s) but only {free} free slot(s)")]
    #[diagnostic(
        code(moddef::registry::underflow),
        help("Rename an existing entry instead of adding one, or switch slot_policy to `grow`")
    )]
    SlotUnderflow {
        category: String,
        added: usize,
        free: usize,
    },

    #[error("Failed to build {category} definition '{name}': {message}")]
    #[diagnostic(code(moddef::registry::definition))]
    Definition {
        category: String,
        name: String,
        message: String,
    },

    #[error("Manifest error: {message}")]
    #[diagnostic(code(moddef::manifest))]
    Manifest {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Nothing defined at '{path}'")]
    #[diagnostic(
        code(moddef::not_found),
        help("Paths are dotted from the document root, e.g. `soldier.hp` or `unit:soldier.hp`")
    )]
    NotFound { path: String },

    #[error("Check failed with {errors} error(s)")]
    #[diagnostic(code(moddef::check))]
    Check { errors: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Value(#[from] ValueError),
}

impl DefError {
    /// Shorthand for a parse error without help text.
    pub fn parse(location: SourceLocation, message: impl Into<String>) -> Self {
        DefError::Parse {
            location,
            message: message.into(),
            help: None,
        }
    }

    /// Attach help text to a parse or reference error. Other variants are
    /// returned unchanged.
    pub fn with_help(mut self, text: impl Into<String>) -> Self {
        match &mut self {
            DefError::Parse { help, .. }
            | DefError::Reference { help, .. }
            | DefError::Manifest { help, .. } => *help = Some(text.into()),
            _ => {}
        }
        self
    }
}

/// The typed interpretation a value accessor asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
    Colour,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int => write!(f, "integer"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::Colour => write!(f, "colour"),
        }
    }
}

/// Failure of a typed value accessor.
///
/// Kept apart from lookup misses: a missing property is never a `ValueError`.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("property '{property}' has no computed {kind} values")]
    #[diagnostic(
        code(moddef::value::not_computed),
        help("Call `Property::recompute` after mutating a property's values")
    )]
    NotComputed { property: String, kind: ValueKind },

    #[error("value {index} of property '{property}' ('{value}') is not a valid {kind}")]
    #[diagnostic(code(moddef::value::unparseable))]
    Unparseable {
        property: String,
        index: usize,
        value: String,
        kind: ValueKind,
    },

    #[error("property '{property}' has no value at index {index}")]
    #[diagnostic(code(moddef::value::missing))]
    Missing { property: String, index: usize },
}

pub type Result<T> = std::result::Result<T, DefError>;
