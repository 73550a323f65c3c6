//! SPARQL algebra intermediate representation.
//!
//! The algebra is a tree of [`Operation`]s. Operations own their children
//! directly; the only non-tree edges live in the optional [`Metadata`] side
//! channel, which addresses other nodes by relative position ([`NodeRef`])
//! rather than by pointer, so copying a tree can never loop.
//!
//! ## Submodules
//!
//! - [`node`] - uniform node views and child slots used by the rewriter
//! - [`scope`] - in-scope variable computation

pub mod node;
pub mod scope;

use crate::term::{NamedNode, Term, Variable};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;

pub use node::{Node, NodeKind, NodeMut, NodeView};
pub use scope::in_scope_variables;

/// An algebra operation together with its optional metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Operation {
    #[serde(flatten)]
    pub node: Op,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Box<Metadata>>,
}

/// The operation variants.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Op {
    // Leaves
    Bgp {
        patterns: Vec<Pattern>,
    },
    Values {
        variables: Vec<Variable>,
        #[serde(serialize_with = "serialize_bindings")]
        bindings: Vec<BTreeMap<Variable, Term>>,
    },
    Nop,

    // Single input
    Project {
        input: Box<Operation>,
        variables: Vec<Variable>,
    },
    Filter {
        input: Box<Operation>,
        expression: Expression,
    },
    Extend {
        input: Box<Operation>,
        variable: Variable,
        expression: Expression,
    },
    Graph {
        input: Box<Operation>,
        name: Term,
    },
    Service {
        input: Box<Operation>,
        name: Term,
        silent: bool,
    },
    Group {
        input: Box<Operation>,
        variables: Vec<Variable>,
        aggregates: Vec<BoundAggregate>,
    },
    OrderBy {
        input: Box<Operation>,
        expressions: Vec<Expression>,
    },
    Distinct {
        input: Box<Operation>,
    },
    Reduced {
        input: Box<Operation>,
    },
    Slice {
        input: Box<Operation>,
        start: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        length: Option<u64>,
    },
    From {
        input: Box<Operation>,
        default: Vec<NamedNode>,
        named: Vec<NamedNode>,
    },
    Ask {
        input: Box<Operation>,
    },
    Describe {
        input: Box<Operation>,
        terms: Vec<Term>,
    },
    Construct {
        input: Box<Operation>,
        template: Vec<Pattern>,
    },

    // Multiple inputs
    Join {
        input: Vec<Operation>,
    },
    LeftJoin {
        left: Box<Operation>,
        right: Box<Operation>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expression: Option<Expression>,
    },
    Minus {
        left: Box<Operation>,
        right: Box<Operation>,
    },
    Union {
        input: Vec<Operation>,
    },

    // Property paths
    Path {
        subject: Term,
        predicate: PathSymbol,
        object: Term,
        graph: Term,
    },

    // Updates
    DeleteInsert {
        #[serde(skip_serializing_if = "Option::is_none")]
        delete: Option<Vec<Pattern>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        insert: Option<Vec<Pattern>>,
        #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
        where_op: Option<Box<Operation>>,
    },
    Load {
        source: NamedNode,
        #[serde(skip_serializing_if = "Option::is_none")]
        destination: Option<NamedNode>,
        silent: bool,
    },
    Clear {
        source: GraphTarget,
        silent: bool,
    },
    Drop {
        source: GraphTarget,
        silent: bool,
    },
    Create {
        source: NamedNode,
        silent: bool,
    },
    Add {
        source: GraphTarget,
        destination: GraphTarget,
        silent: bool,
    },
    Move {
        source: GraphTarget,
        destination: GraphTarget,
        silent: bool,
    },
    Copy {
        source: GraphTarget,
        destination: GraphTarget,
        silent: bool,
    },
    CompositeUpdate {
        updates: Vec<Operation>,
    },
}

impl Op {
    /// The serialized `type` tag of this operation.
    pub fn type_name(&self) -> &'static str {
        match self {
            Op::Bgp { .. } => "bgp",
            Op::Values { .. } => "values",
            Op::Nop => "nop",
            Op::Project { .. } => "project",
            Op::Filter { .. } => "filter",
            Op::Extend { .. } => "extend",
            Op::Graph { .. } => "graph",
            Op::Service { .. } => "service",
            Op::Group { .. } => "group",
            Op::OrderBy { .. } => "orderby",
            Op::Distinct { .. } => "distinct",
            Op::Reduced { .. } => "reduced",
            Op::Slice { .. } => "slice",
            Op::From { .. } => "from",
            Op::Ask { .. } => "ask",
            Op::Describe { .. } => "describe",
            Op::Construct { .. } => "construct",
            Op::Join { .. } => "join",
            Op::LeftJoin { .. } => "leftjoin",
            Op::Minus { .. } => "minus",
            Op::Union { .. } => "union",
            Op::Path { .. } => "path",
            Op::DeleteInsert { .. } => "deleteinsert",
            Op::Load { .. } => "load",
            Op::Clear { .. } => "clear",
            Op::Drop { .. } => "drop",
            Op::Create { .. } => "create",
            Op::Add { .. } => "add",
            Op::Move { .. } => "move",
            Op::Copy { .. } => "copy",
            Op::CompositeUpdate { .. } => "compositeupdate",
        }
    }

    /// Whether this is an update operation (including `Nop`).
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            Op::DeleteInsert { .. }
                | Op::Load { .. }
                | Op::Clear { .. }
                | Op::Drop { .. }
                | Op::Create { .. }
                | Op::Add { .. }
                | Op::Move { .. }
                | Op::Copy { .. }
                | Op::CompositeUpdate { .. }
                | Op::Nop
        )
    }
}

impl From<Op> for Operation {
    fn from(node: Op) -> Self {
        Operation {
            node,
            metadata: None,
        }
    }
}

impl Default for Operation {
    fn default() -> Self {
        Operation::nop()
    }
}

impl Operation {
    pub fn type_name(&self) -> &'static str {
        self.node.type_name()
    }

    /// Attach metadata to this operation.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(Box::new(metadata));
        self
    }

    pub fn nop() -> Self {
        Op::Nop.into()
    }

    pub fn bgp(patterns: Vec<Pattern>) -> Self {
        Op::Bgp { patterns }.into()
    }

    pub fn values(variables: Vec<Variable>, bindings: Vec<BTreeMap<Variable, Term>>) -> Self {
        Op::Values {
            variables,
            bindings,
        }
        .into()
    }

    pub fn project(input: Operation, variables: Vec<Variable>) -> Self {
        Op::Project {
            input: Box::new(input),
            variables,
        }
        .into()
    }

    pub fn filter(input: Operation, expression: Expression) -> Self {
        Op::Filter {
            input: Box::new(input),
            expression,
        }
        .into()
    }

    pub fn extend(input: Operation, variable: Variable, expression: Expression) -> Self {
        Op::Extend {
            input: Box::new(input),
            variable,
            expression,
        }
        .into()
    }

    pub fn graph(input: Operation, name: Term) -> Self {
        Op::Graph {
            input: Box::new(input),
            name,
        }
        .into()
    }

    pub fn service(input: Operation, name: Term, silent: bool) -> Self {
        Op::Service {
            input: Box::new(input),
            name,
            silent,
        }
        .into()
    }

    pub fn group(
        input: Operation,
        variables: Vec<Variable>,
        aggregates: Vec<BoundAggregate>,
    ) -> Self {
        Op::Group {
            input: Box::new(input),
            variables,
            aggregates,
        }
        .into()
    }

    pub fn order_by(input: Operation, expressions: Vec<Expression>) -> Self {
        Op::OrderBy {
            input: Box::new(input),
            expressions,
        }
        .into()
    }

    pub fn distinct(input: Operation) -> Self {
        Op::Distinct {
            input: Box::new(input),
        }
        .into()
    }

    pub fn reduced(input: Operation) -> Self {
        Op::Reduced {
            input: Box::new(input),
        }
        .into()
    }

    pub fn slice(input: Operation, start: u64, length: Option<u64>) -> Self {
        Op::Slice {
            input: Box::new(input),
            start,
            length,
        }
        .into()
    }

    pub fn from_dataset(input: Operation, default: Vec<NamedNode>, named: Vec<NamedNode>) -> Self {
        Op::From {
            input: Box::new(input),
            default,
            named,
        }
        .into()
    }

    pub fn ask(input: Operation) -> Self {
        Op::Ask {
            input: Box::new(input),
        }
        .into()
    }

    pub fn describe(input: Operation, terms: Vec<Term>) -> Self {
        Op::Describe {
            input: Box::new(input),
            terms,
        }
        .into()
    }

    pub fn construct(input: Operation, template: Vec<Pattern>) -> Self {
        Op::Construct {
            input: Box::new(input),
            template,
        }
        .into()
    }

    /// N-ary join; nested joins without metadata are flattened into this one.
    pub fn join(inputs: Vec<Operation>) -> Self {
        Op::Join {
            input: flatten_children(inputs, |op| match op.node {
                Op::Join { input } if op.metadata.is_none() => Ok(input),
                node => Err(Operation {
                    node,
                    metadata: op.metadata,
                }),
            }),
        }
        .into()
    }

    /// N-ary union; nested unions without metadata are flattened into this one.
    pub fn union(inputs: Vec<Operation>) -> Self {
        Op::Union {
            input: flatten_children(inputs, |op| match op.node {
                Op::Union { input } if op.metadata.is_none() => Ok(input),
                node => Err(Operation {
                    node,
                    metadata: op.metadata,
                }),
            }),
        }
        .into()
    }

    pub fn left_join(left: Operation, right: Operation, expression: Option<Expression>) -> Self {
        Op::LeftJoin {
            left: Box::new(left),
            right: Box::new(right),
            expression,
        }
        .into()
    }

    pub fn minus(left: Operation, right: Operation) -> Self {
        Op::Minus {
            left: Box::new(left),
            right: Box::new(right),
        }
        .into()
    }

    pub fn path(subject: Term, predicate: PathSymbol, object: Term, graph: Term) -> Self {
        Op::Path {
            subject,
            predicate,
            object,
            graph,
        }
        .into()
    }

    pub fn delete_insert(
        delete: Option<Vec<Pattern>>,
        insert: Option<Vec<Pattern>>,
        where_op: Option<Operation>,
    ) -> Self {
        Op::DeleteInsert {
            delete,
            insert,
            where_op: where_op.map(Box::new),
        }
        .into()
    }

    pub fn load(source: NamedNode, destination: Option<NamedNode>, silent: bool) -> Self {
        Op::Load {
            source,
            destination,
            silent,
        }
        .into()
    }

    pub fn clear(source: GraphTarget, silent: bool) -> Self {
        Op::Clear { source, silent }.into()
    }

    pub fn drop_graph(source: GraphTarget, silent: bool) -> Self {
        Op::Drop { source, silent }.into()
    }

    pub fn create(source: NamedNode, silent: bool) -> Self {
        Op::Create { source, silent }.into()
    }

    pub fn add_graph(source: GraphTarget, destination: GraphTarget, silent: bool) -> Self {
        Op::Add {
            source,
            destination,
            silent,
        }
        .into()
    }

    pub fn move_graph(source: GraphTarget, destination: GraphTarget, silent: bool) -> Self {
        Op::Move {
            source,
            destination,
            silent,
        }
        .into()
    }

    pub fn copy_graph(source: GraphTarget, destination: GraphTarget, silent: bool) -> Self {
        Op::Copy {
            source,
            destination,
            silent,
        }
        .into()
    }

    pub fn composite_update(updates: Vec<Operation>) -> Self {
        Op::CompositeUpdate { updates }.into()
    }

    /// Whether this is a `Bgp` with no patterns.
    pub fn is_empty_bgp(&self) -> bool {
        matches!(&self.node, Op::Bgp { patterns } if patterns.is_empty())
    }
}

fn flatten_children<F>(inputs: Vec<Operation>, mut unwrap_same: F) -> Vec<Operation>
where
    F: FnMut(Operation) -> std::result::Result<Vec<Operation>, Operation>,
{
    let mut out = Vec::with_capacity(inputs.len());
    for op in inputs {
        match unwrap_same(op) {
            Ok(children) => out.extend(children),
            Err(op) => out.push(op),
        }
    }
    out
}

/// A triple/quad pattern. `graph` is `Term::DefaultGraph` outside quad mode.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Pattern {
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph,
        }
    }

    /// Visit every term of the pattern, descending into quoted triples.
    pub fn for_each_term<'a>(&'a self, f: &mut dyn FnMut(&'a Term)) {
        self.subject.for_each_nested(f);
        self.predicate.for_each_nested(f);
        self.object.for_each_nested(f);
        self.graph.for_each_nested(f);
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("type", "pattern")?;
        map.serialize_entry("termType", "Quad")?;
        map.serialize_entry("subject", &self.subject)?;
        map.serialize_entry("predicate", &self.predicate)?;
        map.serialize_entry("object", &self.object)?;
        map.serialize_entry("graph", &self.graph)?;
        map.end()
    }
}

/// Property path symbols.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum PathSymbol {
    #[serde(rename = "link")]
    Link { iri: NamedNode },
    #[serde(rename = "inv")]
    Inv { path: Box<PathSymbol> },
    #[serde(rename = "seq")]
    Seq { input: Vec<PathSymbol> },
    #[serde(rename = "alt")]
    Alt { input: Vec<PathSymbol> },
    #[serde(rename = "ZeroOrMorePath")]
    ZeroOrMore { path: Box<PathSymbol> },
    #[serde(rename = "OneOrMorePath")]
    OneOrMore { path: Box<PathSymbol> },
    #[serde(rename = "ZeroOrOnePath")]
    ZeroOrOne { path: Box<PathSymbol> },
    #[serde(rename = "nps")]
    Nps { iris: Vec<NamedNode> },
}

impl PathSymbol {
    pub fn link(iri: NamedNode) -> Self {
        PathSymbol::Link { iri }
    }

    pub fn inv(path: PathSymbol) -> Self {
        PathSymbol::Inv {
            path: Box::new(path),
        }
    }

    /// Sequence; nested sequences are flattened.
    pub fn seq(items: Vec<PathSymbol>) -> Self {
        let mut input = Vec::with_capacity(items.len());
        for item in items {
            match item {
                PathSymbol::Seq { input: nested } => input.extend(nested),
                other => input.push(other),
            }
        }
        PathSymbol::Seq { input }
    }

    /// Alternative; nested alternatives are flattened.
    pub fn alt(items: Vec<PathSymbol>) -> Self {
        let mut input = Vec::with_capacity(items.len());
        for item in items {
            match item {
                PathSymbol::Alt { input: nested } => input.extend(nested),
                other => input.push(other),
            }
        }
        PathSymbol::Alt { input }
    }

    pub fn zero_or_more(path: PathSymbol) -> Self {
        PathSymbol::ZeroOrMore {
            path: Box::new(path),
        }
    }

    pub fn one_or_more(path: PathSymbol) -> Self {
        PathSymbol::OneOrMore {
            path: Box::new(path),
        }
    }

    pub fn zero_or_one(path: PathSymbol) -> Self {
        PathSymbol::ZeroOrOne {
            path: Box::new(path),
        }
    }

    pub fn nps(iris: Vec<NamedNode>) -> Self {
        PathSymbol::Nps { iris }
    }
}

/// Algebra expressions.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "expressionType", rename_all = "lowercase")]
pub enum Expression {
    Term {
        term: Term,
    },
    /// Built-in operator or function; `operator` is the lowercase keyword
    /// or symbol (`&&`, `=`, `bound`, `regex`, `UMINUS`, ...).
    Operator {
        operator: Arc<str>,
        args: Vec<Expression>,
    },
    /// Call of an IRI-named function
    Named {
        name: NamedNode,
        args: Vec<Expression>,
    },
    Aggregate {
        aggregator: Arc<str>,
        expression: Box<Expression>,
        distinct: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        separator: Option<Arc<str>>,
    },
    Existence {
        not: bool,
        input: Box<Operation>,
    },
    Wildcard,
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Wildcard
    }
}

impl Expression {
    pub fn term(term: impl Into<Term>) -> Self {
        Expression::Term { term: term.into() }
    }

    pub fn variable(name: impl Into<Arc<str>>) -> Self {
        Expression::Term {
            term: Term::Variable(Variable::new(name)),
        }
    }

    pub fn operator(operator: impl Into<Arc<str>>, args: Vec<Expression>) -> Self {
        Expression::Operator {
            operator: operator.into(),
            args,
        }
    }

    pub fn named(name: NamedNode, args: Vec<Expression>) -> Self {
        Expression::Named { name, args }
    }

    pub fn aggregate(
        aggregator: impl Into<Arc<str>>,
        expression: Expression,
        distinct: bool,
        separator: Option<Arc<str>>,
    ) -> Self {
        Expression::Aggregate {
            aggregator: aggregator.into(),
            expression: Box::new(expression),
            distinct,
            separator,
        }
    }

    pub fn existence(not: bool, input: Operation) -> Self {
        Expression::Existence {
            not,
            input: Box::new(input),
        }
    }

    pub fn as_variable(&self) -> Option<&Variable> {
        match self {
            Expression::Term { term } => term.as_variable(),
            _ => None,
        }
    }
}

/// An aggregate bound to the variable that carries its value out of a `Group`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoundAggregate {
    pub variable: Variable,
    /// Always an `Expression::Aggregate`
    pub expression: Expression,
}

/// Graph reference used by graph-management updates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GraphTarget {
    Default,
    Named,
    All,
    Graph(NamedNode),
}

impl Serialize for GraphTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GraphTarget::Default => serializer.serialize_str("DEFAULT"),
            GraphTarget::Named => serializer.serialize_str("NAMED"),
            GraphTarget::All => serializer.serialize_str("ALL"),
            GraphTarget::Graph(iri) => iri.serialize(serializer),
        }
    }
}

/// Relative reference from the node owning a [`Metadata`] to another node.
///
/// Walk `up` ancestors, then follow `down` child indices (in [`Node`] child
/// order). `NodeRef::this()` points at the owner itself. Because references
/// are positional they stay valid when a tree is copied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct NodeRef {
    pub up: usize,
    pub down: Vec<usize>,
}

impl NodeRef {
    pub fn this() -> Self {
        Self::default()
    }

    pub fn ancestor(up: usize) -> Self {
        Self { up, down: Vec::new() }
    }

    /// Resolve this reference given the absolute child path of the owner.
    ///
    /// Returns the absolute child path of the target, or `None` when the
    /// reference climbs above the root.
    pub fn absolute(&self, owner_path: &[usize]) -> Option<Vec<usize>> {
        let keep = owner_path.len().checked_sub(self.up)?;
        let mut path = owner_path[..keep].to_vec();
        path.extend_from_slice(&self.down);
        Some(path)
    }
}

/// Out-of-tree information attached to an operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub data: serde_json::Map<String, serde_json::Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, NodeRef>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    pub fn with_link(mut self, key: impl Into<String>, target: NodeRef) -> Self {
        self.links.insert(key.into(), target);
        self
    }
}

fn serialize_bindings<S: Serializer>(
    bindings: &[BTreeMap<Variable, Term>],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;

    struct Row<'a>(&'a BTreeMap<Variable, Term>);

    impl Serialize for Row<'_> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let mut map = serializer.serialize_map(Some(self.0.len()))?;
            for (var, term) in self.0 {
                map.serialize_entry(&var.to_string(), term)?;
            }
            map.end()
        }
    }

    let mut seq = serializer.serialize_seq(Some(bindings.len()))?;
    for row in bindings {
        seq.serialize_element(&Row(row))?;
    }
    seq.end()
}

/// Serialize an operation to its JSON form.
pub fn to_json(op: &Operation) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(op)
}

/// Serialize an operation to pretty-printed JSON text.
pub fn to_json_pretty(op: &Operation) -> serde_json::Result<String> {
    serde_json::to_string_pretty(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn var(name: &str) -> Term {
        Term::Variable(Variable::new(name))
    }

    fn iri(value: &str) -> NamedNode {
        NamedNode::new(value)
    }

    #[test]
    fn test_join_flattens_nested_joins() {
        let a = Operation::bgp(vec![]);
        let inner = Operation::join(vec![Operation::nop(), Operation::nop()]);
        let joined = Operation::join(vec![a, inner]);
        let Op::Join { input } = &joined.node else {
            panic!("expected join");
        };
        assert_eq!(input.len(), 3);
    }

    #[test]
    fn test_join_keeps_annotated_child() {
        let inner = Operation::join(vec![Operation::nop(), Operation::nop()])
            .with_metadata(Metadata::new().with_data("source", json!("x")));
        let joined = Operation::join(vec![Operation::nop(), inner]);
        let Op::Join { input } = &joined.node else {
            panic!("expected join");
        };
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn test_seq_and_alt_flatten() {
        let p = PathSymbol::link(iri("http://ex.org/p"));
        let seq = PathSymbol::seq(vec![p.clone(), PathSymbol::seq(vec![p.clone(), p.clone()])]);
        assert!(matches!(&seq, PathSymbol::Seq { input } if input.len() == 3));
        let alt = PathSymbol::alt(vec![PathSymbol::alt(vec![p.clone(), p.clone()]), p]);
        assert!(matches!(&alt, PathSymbol::Alt { input } if input.len() == 3));
    }

    #[test]
    fn test_operation_json_shape() {
        let op = Operation::project(
            Operation::bgp(vec![Pattern::new(
                var("s"),
                Term::NamedNode(iri("http://ex.org/p")),
                var("o"),
                Term::DefaultGraph,
            )]),
            vec![Variable::new("s")],
        );
        let v = to_json(&op).unwrap();
        assert_eq!(v["type"], "project");
        assert_eq!(v["input"]["type"], "bgp");
        assert_eq!(v["input"]["patterns"][0]["type"], "pattern");
        assert_eq!(v["input"]["patterns"][0]["termType"], "Quad");
        assert_eq!(v["variables"][0], json!({"termType": "Variable", "value": "s"}));
        assert!(v.get("metadata").is_none());
    }

    #[test]
    fn test_values_bindings_keyed_by_variable() {
        let mut row = BTreeMap::new();
        row.insert(Variable::new("x"), Term::NamedNode(iri("http://ex.org/a")));
        let op = Operation::values(vec![Variable::new("x")], vec![row]);
        let v = to_json(&op).unwrap();
        assert_eq!(v["bindings"][0]["?x"]["value"], "http://ex.org/a");
    }

    #[test]
    fn test_expression_and_path_tags() {
        let expr = Expression::operator("&&", vec![Expression::variable("a"), Expression::Wildcard]);
        let v = serde_json::to_value(&expr).unwrap();
        assert_eq!(v["expressionType"], "operator");
        assert_eq!(v["args"][1]["expressionType"], "wildcard");

        let path = PathSymbol::zero_or_more(PathSymbol::link(iri("http://ex.org/p")));
        let v = serde_json::to_value(&path).unwrap();
        assert_eq!(v["type"], "ZeroOrMorePath");
        assert_eq!(v["path"]["type"], "link");
    }

    #[test]
    fn test_node_ref_absolute() {
        assert_eq!(NodeRef::this().absolute(&[0, 1]), Some(vec![0, 1]));
        let r = NodeRef {
            up: 1,
            down: vec![2],
        };
        assert_eq!(r.absolute(&[0, 1]), Some(vec![0, 2]));
        assert_eq!(NodeRef::ancestor(3).absolute(&[0]), None);
    }

    #[test]
    fn test_update_classification() {
        assert!(Operation::nop().node.is_update());
        assert!(Operation::clear(GraphTarget::All, true).node.is_update());
        assert!(!Operation::bgp(vec![]).node.is_update());
        assert!(Operation::bgp(vec![]).is_empty_bgp());
    }
}
