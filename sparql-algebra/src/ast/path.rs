//! Property paths in predicate position.
//!
//! `a` is kept as its own variant instead of a pre-expanded `rdf:type` IRI so
//! that lifted queries can print it back as written.

use super::term::Iri;
use crate::span::SourceSpan;

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyPath {
    Iri(Iri),
    /// The `a` keyword
    A { span: SourceSpan },
    /// `^path`
    Inverse {
        path: Box<PropertyPath>,
        span: SourceSpan,
    },
    /// `left/right`
    Sequence {
        left: Box<PropertyPath>,
        right: Box<PropertyPath>,
        span: SourceSpan,
    },
    /// `left|right`
    Alternative {
        left: Box<PropertyPath>,
        right: Box<PropertyPath>,
        span: SourceSpan,
    },
    ZeroOrMore {
        path: Box<PropertyPath>,
        span: SourceSpan,
    },
    OneOrMore {
        path: Box<PropertyPath>,
        span: SourceSpan,
    },
    ZeroOrOne {
        path: Box<PropertyPath>,
        span: SourceSpan,
    },
    /// `!iri` or `!(iri|^iri|...)`
    NegatedSet {
        iris: Vec<NegatedPredicate>,
        span: SourceSpan,
    },
    /// `(path)`
    Group {
        path: Box<PropertyPath>,
        span: SourceSpan,
    },
}

impl PropertyPath {
    pub fn span(&self) -> SourceSpan {
        match self {
            PropertyPath::Iri(iri) => iri.span,
            PropertyPath::A { span }
            | PropertyPath::Inverse { span, .. }
            | PropertyPath::Sequence { span, .. }
            | PropertyPath::Alternative { span, .. }
            | PropertyPath::ZeroOrMore { span, .. }
            | PropertyPath::OneOrMore { span, .. }
            | PropertyPath::ZeroOrOne { span, .. }
            | PropertyPath::NegatedSet { span, .. }
            | PropertyPath::Group { span, .. } => *span,
        }
    }

    /// A single predicate, which lowers to a plain pattern.
    pub fn is_simple(&self) -> bool {
        matches!(self.unwrap_group(), PropertyPath::Iri(_) | PropertyPath::A { .. })
    }

    pub fn unwrap_group(&self) -> &PropertyPath {
        let mut path = self;
        while let PropertyPath::Group { path: inner, .. } = path {
            path = inner;
        }
        path
    }

    pub fn iri(iri: Iri) -> Self {
        PropertyPath::Iri(iri)
    }

    pub fn inverse(path: PropertyPath, span: SourceSpan) -> Self {
        PropertyPath::Inverse {
            path: Box::new(path),
            span,
        }
    }

    pub fn sequence(left: PropertyPath, right: PropertyPath, span: SourceSpan) -> Self {
        PropertyPath::Sequence {
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    pub fn alternative(left: PropertyPath, right: PropertyPath, span: SourceSpan) -> Self {
        PropertyPath::Alternative {
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    pub fn zero_or_more(path: PropertyPath, span: SourceSpan) -> Self {
        PropertyPath::ZeroOrMore {
            path: Box::new(path),
            span,
        }
    }

    pub fn one_or_more(path: PropertyPath, span: SourceSpan) -> Self {
        PropertyPath::OneOrMore {
            path: Box::new(path),
            span,
        }
    }

    pub fn zero_or_one(path: PropertyPath, span: SourceSpan) -> Self {
        PropertyPath::ZeroOrOne {
            path: Box::new(path),
            span,
        }
    }

    pub fn negated(iris: Vec<NegatedPredicate>, span: SourceSpan) -> Self {
        PropertyPath::NegatedSet { iris, span }
    }
}

/// A member of a negated property set.
#[derive(Clone, Debug, PartialEq)]
pub enum NegatedPredicate {
    Forward(Iri),
    ForwardA { span: SourceSpan },
    Inverse(Iri),
    InverseA { span: SourceSpan },
}

impl NegatedPredicate {
    pub fn is_inverse(&self) -> bool {
        matches!(
            self,
            NegatedPredicate::Inverse(_) | NegatedPredicate::InverseA { .. }
        )
    }

    /// The member's IRI; `a` becomes `rdf:type`.
    pub fn to_iri(&self) -> Iri {
        match self {
            NegatedPredicate::Forward(iri) | NegatedPredicate::Inverse(iri) => iri.clone(),
            NegatedPredicate::ForwardA { span } | NegatedPredicate::InverseA { span } => {
                Iri::full(sparql_vocab::rdf::TYPE, *span)
            }
        }
    }
}
