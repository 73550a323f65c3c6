//! Lowering error types.

use crate::rewrite::RewriteError;
use crate::span::SourceSpan;
use std::sync::Arc;
use thiserror::Error;

/// Error that can occur during lowering.
#[derive(Debug, Error)]
pub enum LowerError {
    /// Prefix used but not declared
    #[error("Unknown prefix: {prefix}")]
    UnknownPrefix { prefix: Arc<str>, span: SourceSpan },

    /// Relative IRI with no BASE in effect
    #[error("Cannot resolve relative IRI {iri} because no base IRI was set.")]
    RelativeIriWithoutBase { iri: Arc<str>, span: SourceSpan },

    /// INSERT/DELETE lowered without quad mode
    #[error("INSERT/DELETE operations are only supported with quads option enabled")]
    QuadsRequired { span: SourceSpan },

    /// AST node in a position no translation rule accepts
    #[error("Unexpected {kind} node at position {}", span.start)]
    UnexpectedNode { kind: &'static str, span: SourceSpan },

    /// Malformed property path
    #[error("Invalid property path: {message}")]
    InvalidPath { message: String, span: SourceSpan },

    /// A rewrite pass failed
    #[error(transparent)]
    Rewrite(#[from] RewriteError),
}

impl LowerError {
    /// Create an unknown prefix error.
    pub fn unknown_prefix(prefix: impl Into<Arc<str>>, span: SourceSpan) -> Self {
        Self::UnknownPrefix {
            prefix: prefix.into(),
            span,
        }
    }

    /// Create a relative IRI error.
    pub fn relative_iri(iri: impl Into<Arc<str>>, span: SourceSpan) -> Self {
        Self::RelativeIriWithoutBase {
            iri: iri.into(),
            span,
        }
    }

    /// Create an unexpected node error.
    pub fn unexpected(kind: &'static str, span: SourceSpan) -> Self {
        Self::UnexpectedNode { kind, span }
    }

    /// Create an invalid property path error.
    pub fn invalid_path(message: impl Into<String>, span: SourceSpan) -> Self {
        Self::InvalidPath {
            message: message.into(),
            span,
        }
    }

    /// Source position of the failure; `None` for synthesized nodes.
    pub fn span(&self) -> Option<SourceSpan> {
        let span = match self {
            Self::UnknownPrefix { span, .. }
            | Self::RelativeIriWithoutBase { span, .. }
            | Self::UnexpectedNode { span, .. }
            | Self::InvalidPath { span, .. }
            | Self::QuadsRequired { span } => *span,
            Self::Rewrite(_) => return None,
        };
        (!span.is_synthetic()).then_some(span)
    }
}

/// Result type for lowering operations.
pub type Result<T> = std::result::Result<T, LowerError>;
