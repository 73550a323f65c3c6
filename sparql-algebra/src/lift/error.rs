//! Lifting error types.

use crate::rewrite::RewriteError;
use thiserror::Error;

/// Error that can occur while lifting algebra back to an AST.
#[derive(Debug, Error)]
pub enum LiftError {
    /// Operation in a position no lifting rule accepts
    #[error("Unexpected {kind} operation")]
    UnexpectedOperation { kind: &'static str },

    /// Well-formed algebra with no SPARQL surface form
    #[error("Cannot express algebra as SPARQL: {message}")]
    UnsupportedShape { message: String },

    /// A rewrite pass failed
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl LiftError {
    pub fn unexpected(kind: &'static str) -> Self {
        Self::UnexpectedOperation { kind }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            message: message.into(),
        }
    }
}

/// Result type for lifting operations.
pub type Result<T> = std::result::Result<T, LiftError>;
