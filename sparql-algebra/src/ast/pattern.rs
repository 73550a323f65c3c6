//! SPARQL graph pattern types.
//!
//! A WHERE clause is a tree of [`GraphPattern`]s. Triples are kept in their
//! surface form: subjects and objects may be RDF collections or blank-node
//! property lists, and the verb may be a property path. Lowering expands all
//! of these.

use super::expr::Expression;
use super::path::PropertyPath;
use super::query::SelectQuery;
use super::term::{Term, Var, VarOrIri};
use crate::span::SourceSpan;

/// Subject or object of a triple.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphNode {
    Term(Term),
    /// RDF collection `( item ... )`
    Collection { items: Vec<GraphNode>, span: SourceSpan },
    /// Blank-node property list `[ verb object, ... ; ... ]`
    BlankNodePropertyList {
        properties: Vec<PropertyListEntry>,
        span: SourceSpan,
    },
}

impl From<Term> for GraphNode {
    fn from(term: Term) -> Self {
        GraphNode::Term(term)
    }
}

/// One `verb object` pair of a blank-node property list.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyListEntry {
    pub verb: Verb,
    pub object: GraphNode,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Verb {
    Simple(VarOrIri),
    Path(PropertyPath),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TriplePattern {
    pub subject: GraphNode,
    pub predicate: Verb,
    pub object: GraphNode,
    pub span: SourceSpan,
}

impl TriplePattern {
    pub fn new(subject: Term, predicate: VarOrIri, object: Term, span: SourceSpan) -> Self {
        Self {
            subject: GraphNode::Term(subject),
            predicate: Verb::Simple(predicate),
            object: GraphNode::Term(object),
            span,
        }
    }

    pub fn with_path(subject: Term, path: PropertyPath, object: Term, span: SourceSpan) -> Self {
        Self {
            subject: GraphNode::Term(subject),
            predicate: Verb::Path(path),
            object: GraphNode::Term(object),
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GraphPattern {
    Bgp {
        patterns: Vec<TriplePattern>,
        span: SourceSpan,
    },

    Group {
        patterns: Vec<GraphPattern>,
        span: SourceSpan,
    },

    /// `OPTIONAL { ... }`
    Optional {
        pattern: Box<GraphPattern>,
        span: SourceSpan,
    },

    /// `MINUS { ... }`
    Minus {
        pattern: Box<GraphPattern>,
        span: SourceSpan,
    },

    Union {
        left: Box<GraphPattern>,
        right: Box<GraphPattern>,
        span: SourceSpan,
    },

    /// `FILTER(expr)`
    Filter { expr: Expression, span: SourceSpan },

    /// `BIND(expr AS ?var)`
    Bind {
        expr: Expression,
        var: Var,
        span: SourceSpan,
    },

    /// Inline `VALUES`; `None` cells are UNDEF
    Values {
        vars: Vec<Var>,
        data: Vec<Vec<Option<Term>>>,
        span: SourceSpan,
    },

    /// `GRAPH name { ... }`
    Graph {
        name: VarOrIri,
        pattern: Box<GraphPattern>,
        span: SourceSpan,
    },

    /// `SERVICE [SILENT] endpoint { ... }`
    Service {
        silent: bool,
        endpoint: VarOrIri,
        pattern: Box<GraphPattern>,
        span: SourceSpan,
    },

    /// `{ SELECT ... }`
    SubSelect {
        query: Box<SelectQuery>,
        span: SourceSpan,
    },
}

impl GraphPattern {
    pub fn span(&self) -> SourceSpan {
        match self {
            GraphPattern::Bgp { span, .. }
            | GraphPattern::Group { span, .. }
            | GraphPattern::Optional { span, .. }
            | GraphPattern::Minus { span, .. }
            | GraphPattern::Union { span, .. }
            | GraphPattern::Filter { span, .. }
            | GraphPattern::Bind { span, .. }
            | GraphPattern::Values { span, .. }
            | GraphPattern::Graph { span, .. }
            | GraphPattern::Service { span, .. }
            | GraphPattern::SubSelect { span, .. } => *span,
        }
    }

    pub fn empty_bgp(span: SourceSpan) -> Self {
        GraphPattern::Bgp {
            patterns: Vec::new(),
            span,
        }
    }

    pub fn group(patterns: Vec<GraphPattern>, span: SourceSpan) -> Self {
        GraphPattern::Group { patterns, span }
    }

    pub fn bgp(patterns: Vec<TriplePattern>, span: SourceSpan) -> Self {
        GraphPattern::Bgp { patterns, span }
    }

    /// Name used in `UnexpectedNode` errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            GraphPattern::Bgp { .. } => "bgp",
            GraphPattern::Group { .. } => "group",
            GraphPattern::Optional { .. } => "optional",
            GraphPattern::Minus { .. } => "minus",
            GraphPattern::Union { .. } => "union",
            GraphPattern::Filter { .. } => "filter",
            GraphPattern::Bind { .. } => "bind",
            GraphPattern::Values { .. } => "values",
            GraphPattern::Graph { .. } => "graph",
            GraphPattern::Service { .. } => "service",
            GraphPattern::SubSelect { .. } => "query",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::term::Iri;

    fn test_span() -> SourceSpan {
        SourceSpan::new(0, 10)
    }

    #[test]
    fn test_path_triple_keeps_path_verb() {
        let t = TriplePattern::with_path(
            Term::Var(Var::new("s", test_span())),
            PropertyPath::zero_or_more(
                PropertyPath::iri(Iri::prefixed("ex", "knows", test_span())),
                test_span(),
            ),
            Term::Var(Var::new("o", test_span())),
            test_span(),
        );
        assert!(matches!(t.predicate, Verb::Path(PropertyPath::ZeroOrMore { .. })));
    }

    #[test]
    fn test_plain_triple_wraps_terms() {
        let t = TriplePattern::new(
            Term::Var(Var::new("s", test_span())),
            VarOrIri::Iri(Iri::prefixed("ex", "p", test_span())),
            Term::Var(Var::new("o", test_span())),
            test_span(),
        );
        assert!(matches!(t.predicate, Verb::Simple(VarOrIri::Iri(_))));
        assert!(matches!(t.subject, GraphNode::Term(Term::Var(_))));
    }

    #[test]
    fn test_pattern_kind_names() {
        let p = GraphPattern::group(vec![GraphPattern::empty_bgp(test_span())], test_span());
        assert_eq!(p.span(), test_span());
        assert_eq!(p.kind_name(), "group");
        let optional = GraphPattern::Optional {
            pattern: Box::new(p),
            span: SourceSpan::new(3, 4),
        };
        assert_eq!(optional.kind_name(), "optional");
        assert_eq!(optional.span(), SourceSpan::new(3, 4));
    }
}
