//! Surface terms. IRIs stay as written (prefixed or relative) until lowering
//! resolves them against the prologue.

use crate::span::SourceSpan;
use std::sync::Arc;

/// `?name` or `$name`; `name` excludes the sigil.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Var {
    pub name: Arc<str>,
    pub span: SourceSpan,
}

impl Var {
    pub fn new(name: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Iri {
    pub value: IriValue,
    pub span: SourceSpan,
}

impl Iri {
    /// `<...>`, possibly relative.
    pub fn full(iri: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            value: IriValue::Full(Arc::from(iri.as_ref())),
            span,
        }
    }

    /// `prefix:local`; the default prefix is the empty string.
    pub fn prefixed(prefix: impl AsRef<str>, local: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            value: IriValue::Prefixed {
                prefix: Arc::from(prefix.as_ref()),
                local: Arc::from(local.as_ref()),
            },
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IriValue {
    Full(Arc<str>),
    Prefixed { prefix: Arc<str>, local: Arc<str> },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlankNode {
    pub value: BlankNodeValue,
    pub span: SourceSpan,
}

impl BlankNode {
    pub fn labeled(label: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            value: BlankNodeValue::Labeled(Arc::from(label.as_ref())),
            span,
        }
    }

    /// `[]`
    pub fn anon(span: SourceSpan) -> Self {
        Self {
            value: BlankNodeValue::Anon,
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BlankNodeValue {
    Labeled(Arc<str>),
    /// Gets a fresh label during lowering.
    Anon,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: SourceSpan,
}

impl Literal {
    fn with_value(value: LiteralValue, span: SourceSpan) -> Self {
        Self { value, span }
    }

    pub fn string(value: impl AsRef<str>, span: SourceSpan) -> Self {
        Self::with_value(LiteralValue::Simple(Arc::from(value.as_ref())), span)
    }

    pub fn lang_string(value: impl AsRef<str>, lang: impl AsRef<str>, span: SourceSpan) -> Self {
        Self::with_value(
            LiteralValue::LangTagged {
                value: Arc::from(value.as_ref()),
                lang: Arc::from(lang.as_ref()),
            },
            span,
        )
    }

    pub fn typed(value: impl AsRef<str>, datatype: Iri, span: SourceSpan) -> Self {
        Self::with_value(
            LiteralValue::Typed {
                value: Arc::from(value.as_ref()),
                datatype: Box::new(datatype),
            },
            span,
        )
    }

    pub fn integer(value: i64, span: SourceSpan) -> Self {
        Self::with_value(LiteralValue::Integer(value), span)
    }

    pub fn decimal(value: impl AsRef<str>, span: SourceSpan) -> Self {
        Self::with_value(LiteralValue::Decimal(Arc::from(value.as_ref())), span)
    }

    pub fn boolean(value: bool, span: SourceSpan) -> Self {
        Self::with_value(LiteralValue::Boolean(value), span)
    }
}

/// Literal forms as written. The numeric and boolean shorthands lower to
/// their `xsd` datatypes.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
    Simple(Arc<str>),
    LangTagged { value: Arc<str>, lang: Arc<str> },
    Typed { value: Arc<str>, datatype: Box<Iri> },
    Integer(i64),
    /// Lexical form, kept verbatim
    Decimal(Arc<str>),
    Double(f64),
    Boolean(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Var(Var),
    Iri(Iri),
    Literal(Literal),
    BlankNode(BlankNode),
    /// `<< s p o >>`
    QuotedTriple(Box<QuotedTriple>),
}

/// RDF-star quoted triple. Paths are not allowed as its predicate.
#[derive(Clone, Debug, PartialEq)]
pub struct QuotedTriple {
    pub subject: Term,
    pub predicate: VarOrIri,
    pub object: Term,
    pub span: SourceSpan,
}

impl QuotedTriple {
    pub fn new(subject: Term, predicate: VarOrIri, object: Term, span: SourceSpan) -> Self {
        Self {
            subject,
            predicate,
            object,
            span,
        }
    }
}

/// Graph names, service endpoints, DESCRIBE targets and simple verbs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VarOrIri {
    Var(Var),
    Iri(Iri),
}
