//! RDF term model.
//!
//! Terms are immutable values compared structurally:
//! - `NamedNode` - an absolute IRI
//! - `BlankNode` - a labeled blank node (label without `_:`)
//! - `Literal` - lexical value with optional language tag and a datatype
//! - `Variable` - a query variable (name without `?`)
//! - `DefaultGraph` - the default graph marker used in the graph slot of patterns
//! - `Quad` - a quoted triple nested as a term (RDF-star)
//!
//! Construction goes through a [`TermFactory`] so that callers can control how
//! terms are minted (label normalization, interning, and so on). [`DataFactory`]
//! is the plain default.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sparql_vocab::{rdf, xsd};
use std::fmt;
use std::sync::Arc;

/// An IRI term
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedNode {
    pub value: Arc<str>,
}

impl NamedNode {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// A blank node term
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlankNode {
    /// Label without the `_:` prefix
    pub value: Arc<str>,
}

impl BlankNode {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

/// A query variable
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    /// Name without the `?` or `$` sigil
    pub value: Arc<str>,
}

impl Variable {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.value)
    }
}

/// A literal term
///
/// The datatype is always present: `rdf:langString` for language-tagged
/// literals and `xsd:string` for simple ones.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub value: Arc<str>,
    pub language: Option<Arc<str>>,
    pub datatype: NamedNode,
}

impl Literal {
    /// Simple literal (`xsd:string`)
    pub fn simple(value: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype: NamedNode::new(xsd::STRING),
        }
    }

    /// Language-tagged literal (`rdf:langString`)
    pub fn lang_tagged(value: impl Into<Arc<str>>, language: impl Into<Arc<str>>) -> Self {
        Self {
            value: value.into(),
            language: Some(language.into()),
            datatype: NamedNode::new(rdf::LANG_STRING),
        }
    }

    /// Typed literal
    pub fn typed(value: impl Into<Arc<str>>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            language: None,
            datatype,
        }
    }

    /// Whether the datatype is the implicit `xsd:string` of a simple literal
    pub fn is_simple(&self) -> bool {
        self.language.is_none() && self.datatype.as_str() == xsd::STRING
    }
}

/// A quoted triple used as a term, or a quad-shaped pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

/// Discriminant of a [`Term`], matching the RDF/JS `termType` names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermType {
    NamedNode,
    BlankNode,
    Literal,
    Variable,
    DefaultGraph,
    Quad,
}

impl TermType {
    pub fn as_str(self) -> &'static str {
        match self {
            TermType::NamedNode => "NamedNode",
            TermType::BlankNode => "BlankNode",
            TermType::Literal => "Literal",
            TermType::Variable => "Variable",
            TermType::DefaultGraph => "DefaultGraph",
            TermType::Quad => "Quad",
        }
    }
}

/// An RDF term
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Variable(Variable),
    DefaultGraph,
    Quad(Box<Quad>),
}

impl Term {
    pub fn term_type(&self) -> TermType {
        match self {
            Term::NamedNode(_) => TermType::NamedNode,
            Term::BlankNode(_) => TermType::BlankNode,
            Term::Literal(_) => TermType::Literal,
            Term::Variable(_) => TermType::Variable,
            Term::DefaultGraph => TermType::DefaultGraph,
            Term::Quad(_) => TermType::Quad,
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_default_graph(&self) -> bool {
        matches!(self, Term::DefaultGraph)
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Term::Variable(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Term::NamedNode(n) => Some(n),
            _ => None,
        }
    }

    /// Lexical value; empty for the default graph and quads.
    pub fn value(&self) -> &str {
        match self {
            Term::NamedNode(n) => n.as_str(),
            Term::BlankNode(b) => b.as_str(),
            Term::Literal(l) => &l.value,
            Term::Variable(v) => v.as_str(),
            Term::DefaultGraph | Term::Quad(_) => "",
        }
    }

    /// Apply `f` to this term and, for quoted triples, to every nested term.
    ///
    /// Nested terms are rewritten first, then `f` sees the rebuilt quad.
    pub fn map_nested(self, f: &mut dyn FnMut(Term) -> Term) -> Term {
        match self {
            Term::Quad(quad) => {
                let Quad {
                    subject,
                    predicate,
                    object,
                    graph,
                } = *quad;
                let rebuilt = Term::Quad(Box::new(Quad {
                    subject: subject.map_nested(f),
                    predicate: predicate.map_nested(f),
                    object: object.map_nested(f),
                    graph: graph.map_nested(f),
                }));
                f(rebuilt)
            }
            other => f(other),
        }
    }

    /// Visit this term and every term nested inside quoted triples.
    pub fn for_each_nested<'a>(&'a self, f: &mut dyn FnMut(&'a Term)) {
        if let Term::Quad(quad) = self {
            quad.subject.for_each_nested(f);
            quad.predicate.for_each_nested(f);
            quad.object.for_each_nested(f);
            quad.graph.for_each_nested(f);
        }
        f(self);
    }
}

impl Default for Term {
    fn default() -> Self {
        Term::DefaultGraph
    }
}

impl From<NamedNode> for Term {
    fn from(n: NamedNode) -> Self {
        Term::NamedNode(n)
    }
}

impl From<BlankNode> for Term {
    fn from(b: BlankNode) -> Self {
        Term::BlankNode(b)
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Term::Literal(l)
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Variable(v)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(n) => write!(f, "<{}>", n.value),
            Term::BlankNode(b) => write!(f, "_:{}", b.value),
            Term::Literal(l) => match &l.language {
                Some(lang) => write!(f, "\"{}\"@{}", l.value, lang),
                None if l.is_simple() => write!(f, "\"{}\"", l.value),
                None => write!(f, "\"{}\"^^<{}>", l.value, l.datatype.value),
            },
            Term::Variable(v) => write!(f, "{v}"),
            Term::DefaultGraph => f.write_str("DEFAULT"),
            Term::Quad(q) => write!(
                f,
                "<< {} {} {} {} >>",
                q.subject, q.predicate, q.object, q.graph
            ),
        }
    }
}

// JSON shape: {termType, value, language?, datatype?}; quads nest their four terms.

impl Serialize for NamedNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("termType", TermType::NamedNode.as_str())?;
        map.serialize_entry("value", self.as_str())?;
        map.end()
    }
}

impl Serialize for BlankNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("termType", TermType::BlankNode.as_str())?;
        map.serialize_entry("value", self.as_str())?;
        map.end()
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("termType", TermType::Variable.as_str())?;
        map.serialize_entry("value", self.as_str())?;
        map.end()
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("termType", TermType::Literal.as_str())?;
        map.serialize_entry("value", &*self.value)?;
        if let Some(lang) = &self.language {
            map.serialize_entry("language", &**lang)?;
        }
        map.serialize_entry("datatype", &self.datatype)?;
        map.end()
    }
}

impl Serialize for Quad {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("termType", TermType::Quad.as_str())?;
        map.serialize_entry("subject", &self.subject)?;
        map.serialize_entry("predicate", &self.predicate)?;
        map.serialize_entry("object", &self.object)?;
        map.serialize_entry("graph", &self.graph)?;
        map.end()
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Term::NamedNode(n) => n.serialize(serializer),
            Term::BlankNode(b) => b.serialize(serializer),
            Term::Literal(l) => l.serialize(serializer),
            Term::Variable(v) => v.serialize(serializer),
            Term::DefaultGraph => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("termType", TermType::DefaultGraph.as_str())?;
                map.serialize_entry("value", "")?;
                map.end()
            }
            Term::Quad(q) => q.serialize(serializer),
        }
    }
}

/// Injectable term construction.
///
/// Lowering never builds terms directly; every term it emits comes from a
/// factory. Implementations must be deterministic for equal inputs.
pub trait TermFactory {
    /// Create an IRI term
    fn named_node(&self, iri: &str) -> NamedNode;

    /// Create a blank node from its label (without `_:`)
    fn blank_node(&self, label: &str) -> BlankNode;

    /// Create a variable from its name (without `?`)
    fn variable(&self, name: &str) -> Variable;

    /// Create a literal; `datatype` defaults to `xsd:string` or
    /// `rdf:langString` depending on `language`.
    fn literal(&self, value: &str, language: Option<&str>, datatype: Option<NamedNode>) -> Literal;

    /// The default graph marker
    fn default_graph(&self) -> Term {
        Term::DefaultGraph
    }

    /// Create a quoted triple / quad term
    fn quad(&self, subject: Term, predicate: Term, object: Term, graph: Term) -> Quad {
        Quad {
            subject,
            predicate,
            object,
            graph,
        }
    }
}

/// The default [`TermFactory`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DataFactory;

impl TermFactory for DataFactory {
    fn named_node(&self, iri: &str) -> NamedNode {
        NamedNode::new(iri)
    }

    fn blank_node(&self, label: &str) -> BlankNode {
        BlankNode::new(label)
    }

    fn variable(&self, name: &str) -> Variable {
        Variable::new(name)
    }

    fn literal(&self, value: &str, language: Option<&str>, datatype: Option<NamedNode>) -> Literal {
        match (language, datatype) {
            (Some(lang), _) if !lang.is_empty() => Literal::lang_tagged(value, lang),
            (_, Some(dt)) => Literal::typed(value, dt),
            _ => Literal::simple(value),
        }
    }
}
