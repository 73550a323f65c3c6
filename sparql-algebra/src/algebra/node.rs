//! Uniform access to algebra nodes.
//!
//! The rewriter treats four node families alike: operations, patterns,
//! expressions and path symbols. This module fixes, for every variant, which
//! fields are structural children and in which order:
//!
//! | Node | Children |
//! |------|----------|
//! | `bgp` | patterns |
//! | `filter`, `extend` | input, expression |
//! | `group` | input, aggregate expressions |
//! | `orderby` | input, expressions |
//! | `construct` | input, template patterns |
//! | `join`, `union` | inputs |
//! | `leftjoin` | left, right, expression? |
//! | `minus` | left, right |
//! | `path` | predicate path |
//! | `deleteinsert` | delete patterns, insert patterns, where? |
//! | `compositeupdate` | updates |
//! | other single-input operations | input |
//! | operator / named expressions | args |
//! | aggregate expression | expression |
//! | existence expression | input |
//! | `inv`, `*`, `+`, `?` paths | path |
//! | `seq`, `alt` paths | input |
//!
//! Terms are never children; they are "own" fields reachable through
//! [`Node::map_own_terms`].

use super::{Expression, Op, Operation, PathSymbol, Pattern};
use crate::term::{Term, Variable};
use std::collections::BTreeMap;
use std::mem;

/// An owned algebra node of any family.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Operation(Operation),
    Pattern(Pattern),
    Expression(Expression),
    Path(PathSymbol),
}

/// A borrowed algebra node of any family.
#[derive(Clone, Copy, Debug)]
pub enum NodeView<'a> {
    Operation(&'a Operation),
    Pattern(&'a Pattern),
    Expression(&'a Expression),
    Path(&'a PathSymbol),
}

/// A mutable child slot inside a parent node.
#[derive(Debug)]
pub enum NodeMut<'a> {
    Operation(&'a mut Operation),
    Pattern(&'a mut Pattern),
    Expression(&'a mut Expression),
    Path(&'a mut PathSymbol),
}

/// Fine-grained node type tag, used to key rewrite tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Bgp,
    Values,
    Nop,
    Project,
    Filter,
    Extend,
    Graph,
    Service,
    Group,
    OrderBy,
    Distinct,
    Reduced,
    Slice,
    From,
    Ask,
    Describe,
    Construct,
    Join,
    LeftJoin,
    Minus,
    Union,
    Path,
    DeleteInsert,
    Load,
    Clear,
    Drop,
    Create,
    Add,
    Move,
    Copy,
    CompositeUpdate,
    Pattern,
    TermExpression,
    OperatorExpression,
    NamedExpression,
    AggregateExpression,
    ExistenceExpression,
    WildcardExpression,
    LinkPath,
    InvPath,
    SeqPath,
    AltPath,
    ZeroOrMorePath,
    OneOrMorePath,
    ZeroOrOnePath,
    NpsPath,
}

fn op_kind(op: &Op) -> NodeKind {
    match op {
        Op::Bgp { .. } => NodeKind::Bgp,
        Op::Values { .. } => NodeKind::Values,
        Op::Nop => NodeKind::Nop,
        Op::Project { .. } => NodeKind::Project,
        Op::Filter { .. } => NodeKind::Filter,
        Op::Extend { .. } => NodeKind::Extend,
        Op::Graph { .. } => NodeKind::Graph,
        Op::Service { .. } => NodeKind::Service,
        Op::Group { .. } => NodeKind::Group,
        Op::OrderBy { .. } => NodeKind::OrderBy,
        Op::Distinct { .. } => NodeKind::Distinct,
        Op::Reduced { .. } => NodeKind::Reduced,
        Op::Slice { .. } => NodeKind::Slice,
        Op::From { .. } => NodeKind::From,
        Op::Ask { .. } => NodeKind::Ask,
        Op::Describe { .. } => NodeKind::Describe,
        Op::Construct { .. } => NodeKind::Construct,
        Op::Join { .. } => NodeKind::Join,
        Op::LeftJoin { .. } => NodeKind::LeftJoin,
        Op::Minus { .. } => NodeKind::Minus,
        Op::Union { .. } => NodeKind::Union,
        Op::Path { .. } => NodeKind::Path,
        Op::DeleteInsert { .. } => NodeKind::DeleteInsert,
        Op::Load { .. } => NodeKind::Load,
        Op::Clear { .. } => NodeKind::Clear,
        Op::Drop { .. } => NodeKind::Drop,
        Op::Create { .. } => NodeKind::Create,
        Op::Add { .. } => NodeKind::Add,
        Op::Move { .. } => NodeKind::Move,
        Op::Copy { .. } => NodeKind::Copy,
        Op::CompositeUpdate { .. } => NodeKind::CompositeUpdate,
    }
}

fn expression_kind(expr: &Expression) -> NodeKind {
    match expr {
        Expression::Term { .. } => NodeKind::TermExpression,
        Expression::Operator { .. } => NodeKind::OperatorExpression,
        Expression::Named { .. } => NodeKind::NamedExpression,
        Expression::Aggregate { .. } => NodeKind::AggregateExpression,
        Expression::Existence { .. } => NodeKind::ExistenceExpression,
        Expression::Wildcard => NodeKind::WildcardExpression,
    }
}

fn path_kind(path: &PathSymbol) -> NodeKind {
    match path {
        PathSymbol::Link { .. } => NodeKind::LinkPath,
        PathSymbol::Inv { .. } => NodeKind::InvPath,
        PathSymbol::Seq { .. } => NodeKind::SeqPath,
        PathSymbol::Alt { .. } => NodeKind::AltPath,
        PathSymbol::ZeroOrMore { .. } => NodeKind::ZeroOrMorePath,
        PathSymbol::OneOrMore { .. } => NodeKind::OneOrMorePath,
        PathSymbol::ZeroOrOne { .. } => NodeKind::ZeroOrOnePath,
        PathSymbol::Nps { .. } => NodeKind::NpsPath,
    }
}

impl<'a> NodeView<'a> {
    pub fn kind(self) -> NodeKind {
        match self {
            NodeView::Operation(op) => op_kind(&op.node),
            NodeView::Pattern(_) => NodeKind::Pattern,
            NodeView::Expression(expr) => expression_kind(expr),
            NodeView::Path(path) => path_kind(path),
        }
    }

    /// Structural children in canonical order.
    pub fn children(self) -> Vec<NodeView<'a>> {
        let mut out = Vec::new();
        match self {
            NodeView::Operation(op) => match &op.node {
                Op::Bgp { patterns } => out.extend(patterns.iter().map(NodeView::Pattern)),
                Op::Project { input, .. }
                | Op::Graph { input, .. }
                | Op::Service { input, .. }
                | Op::Distinct { input }
                | Op::Reduced { input }
                | Op::Slice { input, .. }
                | Op::From { input, .. }
                | Op::Ask { input }
                | Op::Describe { input, .. } => out.push(NodeView::Operation(input)),
                Op::Filter { input, expression } | Op::Extend { input, expression, .. } => {
                    out.push(NodeView::Operation(input));
                    out.push(NodeView::Expression(expression));
                }
                Op::Group {
                    input, aggregates, ..
                } => {
                    out.push(NodeView::Operation(input));
                    out.extend(
                        aggregates
                            .iter()
                            .map(|agg| NodeView::Expression(&agg.expression)),
                    );
                }
                Op::OrderBy { input, expressions } => {
                    out.push(NodeView::Operation(input));
                    out.extend(expressions.iter().map(NodeView::Expression));
                }
                Op::Construct { input, template } => {
                    out.push(NodeView::Operation(input));
                    out.extend(template.iter().map(NodeView::Pattern));
                }
                Op::Join { input } | Op::Union { input } => {
                    out.extend(input.iter().map(NodeView::Operation))
                }
                Op::LeftJoin {
                    left,
                    right,
                    expression,
                } => {
                    out.push(NodeView::Operation(left));
                    out.push(NodeView::Operation(right));
                    if let Some(expr) = expression {
                        out.push(NodeView::Expression(expr));
                    }
                }
                Op::Minus { left, right } => {
                    out.push(NodeView::Operation(left));
                    out.push(NodeView::Operation(right));
                }
                Op::Path { predicate, .. } => out.push(NodeView::Path(predicate)),
                Op::DeleteInsert {
                    delete,
                    insert,
                    where_op,
                } => {
                    out.extend(delete.iter().flatten().map(NodeView::Pattern));
                    out.extend(insert.iter().flatten().map(NodeView::Pattern));
                    if let Some(w) = where_op {
                        out.push(NodeView::Operation(w));
                    }
                }
                Op::CompositeUpdate { updates } => {
                    out.extend(updates.iter().map(NodeView::Operation))
                }
                Op::Values { .. }
                | Op::Nop
                | Op::Load { .. }
                | Op::Clear { .. }
                | Op::Drop { .. }
                | Op::Create { .. }
                | Op::Add { .. }
                | Op::Move { .. }
                | Op::Copy { .. } => {}
            },
            NodeView::Pattern(_) => {}
            NodeView::Expression(expr) => match expr {
                Expression::Operator { args, .. } | Expression::Named { args, .. } => {
                    out.extend(args.iter().map(NodeView::Expression))
                }
                Expression::Aggregate { expression, .. } => {
                    out.push(NodeView::Expression(expression))
                }
                Expression::Existence { input, .. } => out.push(NodeView::Operation(input)),
                Expression::Term { .. } | Expression::Wildcard => {}
            },
            NodeView::Path(path) => match path {
                PathSymbol::Inv { path }
                | PathSymbol::ZeroOrMore { path }
                | PathSymbol::OneOrMore { path }
                | PathSymbol::ZeroOrOne { path } => out.push(NodeView::Path(path)),
                PathSymbol::Seq { input } | PathSymbol::Alt { input } => {
                    out.extend(input.iter().map(NodeView::Path))
                }
                PathSymbol::Link { .. } | PathSymbol::Nps { .. } => {}
            },
        }
        out
    }

    /// Follow a path of child indices starting at this node.
    pub fn descendant(self, path: &[usize]) -> Option<NodeView<'a>> {
        let mut current = self;
        for &index in path {
            current = current.children().into_iter().nth(index)?;
        }
        Some(current)
    }

    pub fn to_owned_node(self) -> Node {
        match self {
            NodeView::Operation(op) => Node::Operation(op.clone()),
            NodeView::Pattern(p) => Node::Pattern(p.clone()),
            NodeView::Expression(e) => Node::Expression(e.clone()),
            NodeView::Path(p) => Node::Path(p.clone()),
        }
    }
}

impl NodeMut<'_> {
    /// Move the child out of its slot, leaving a cheap placeholder.
    pub fn take(self) -> Node {
        match self {
            NodeMut::Operation(slot) => Node::Operation(mem::take(slot)),
            NodeMut::Pattern(slot) => Node::Pattern(mem::take(slot)),
            NodeMut::Expression(slot) => Node::Expression(mem::take(slot)),
            NodeMut::Path(slot) => {
                Node::Path(mem::replace(slot, PathSymbol::Nps { iris: Vec::new() }))
            }
        }
    }

    /// Store a node into this slot; returns the node back if the family differs.
    pub fn put(self, node: Node) -> Result<(), Node> {
        match (self, node) {
            (NodeMut::Operation(slot), Node::Operation(op)) => *slot = op,
            (NodeMut::Pattern(slot), Node::Pattern(p)) => *slot = p,
            (NodeMut::Expression(slot), Node::Expression(e)) => *slot = e,
            (NodeMut::Path(slot), Node::Path(p)) => *slot = p,
            (_, node) => return Err(node),
        }
        Ok(())
    }
}

impl Node {
    pub fn view(&self) -> NodeView<'_> {
        match self {
            Node::Operation(op) => NodeView::Operation(op),
            Node::Pattern(p) => NodeView::Pattern(p),
            Node::Expression(e) => NodeView::Expression(e),
            Node::Path(p) => NodeView::Path(p),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.view().kind()
    }

    /// Mutable child slots, in the same order as [`NodeView::children`].
    pub fn slots_mut(&mut self) -> Vec<NodeMut<'_>> {
        let mut out = Vec::new();
        match self {
            Node::Operation(op) => match &mut op.node {
                Op::Bgp { patterns } => out.extend(patterns.iter_mut().map(NodeMut::Pattern)),
                Op::Project { input, .. }
                | Op::Graph { input, .. }
                | Op::Service { input, .. }
                | Op::Distinct { input }
                | Op::Reduced { input }
                | Op::Slice { input, .. }
                | Op::From { input, .. }
                | Op::Ask { input }
                | Op::Describe { input, .. } => out.push(NodeMut::Operation(input)),
                Op::Filter { input, expression } | Op::Extend { input, expression, .. } => {
                    out.push(NodeMut::Operation(input));
                    out.push(NodeMut::Expression(expression));
                }
                Op::Group {
                    input, aggregates, ..
                } => {
                    out.push(NodeMut::Operation(input));
                    out.extend(
                        aggregates
                            .iter_mut()
                            .map(|agg| NodeMut::Expression(&mut agg.expression)),
                    );
                }
                Op::OrderBy { input, expressions } => {
                    out.push(NodeMut::Operation(input));
                    out.extend(expressions.iter_mut().map(NodeMut::Expression));
                }
                Op::Construct { input, template } => {
                    out.push(NodeMut::Operation(input));
                    out.extend(template.iter_mut().map(NodeMut::Pattern));
                }
                Op::Join { input } | Op::Union { input } => {
                    out.extend(input.iter_mut().map(NodeMut::Operation))
                }
                Op::LeftJoin {
                    left,
                    right,
                    expression,
                } => {
                    out.push(NodeMut::Operation(left));
                    out.push(NodeMut::Operation(right));
                    if let Some(expr) = expression {
                        out.push(NodeMut::Expression(expr));
                    }
                }
                Op::Minus { left, right } => {
                    out.push(NodeMut::Operation(left));
                    out.push(NodeMut::Operation(right));
                }
                Op::Path { predicate, .. } => out.push(NodeMut::Path(predicate)),
                Op::DeleteInsert {
                    delete,
                    insert,
                    where_op,
                } => {
                    out.extend(delete.iter_mut().flatten().map(NodeMut::Pattern));
                    out.extend(insert.iter_mut().flatten().map(NodeMut::Pattern));
                    if let Some(w) = where_op {
                        out.push(NodeMut::Operation(w));
                    }
                }
                Op::CompositeUpdate { updates } => {
                    out.extend(updates.iter_mut().map(NodeMut::Operation))
                }
                Op::Values { .. }
                | Op::Nop
                | Op::Load { .. }
                | Op::Clear { .. }
                | Op::Drop { .. }
                | Op::Create { .. }
                | Op::Add { .. }
                | Op::Move { .. }
                | Op::Copy { .. } => {}
            },
            Node::Pattern(_) => {}
            Node::Expression(expr) => match expr {
                Expression::Operator { args, .. } | Expression::Named { args, .. } => {
                    out.extend(args.iter_mut().map(NodeMut::Expression))
                }
                Expression::Aggregate { expression, .. } => {
                    out.push(NodeMut::Expression(expression))
                }
                Expression::Existence { input, .. } => out.push(NodeMut::Operation(input)),
                Expression::Term { .. } | Expression::Wildcard => {}
            },
            Node::Path(path) => match path {
                PathSymbol::Inv { path }
                | PathSymbol::ZeroOrMore { path }
                | PathSymbol::OneOrMore { path }
                | PathSymbol::ZeroOrOne { path } => out.push(NodeMut::Path(path)),
                PathSymbol::Seq { input } | PathSymbol::Alt { input } => {
                    out.extend(input.iter_mut().map(NodeMut::Path))
                }
                PathSymbol::Link { .. } | PathSymbol::Nps { .. } => {}
            },
        }
        out
    }

    /// Move all children out, leaving placeholders in their slots.
    pub fn take_children(&mut self) -> Vec<Node> {
        self.slots_mut().into_iter().map(NodeMut::take).collect()
    }

    /// Refill the slots emptied by [`Node::take_children`].
    ///
    /// Fails with the first child whose family does not match its slot, or
    /// with `None` if the number of children differs.
    pub fn put_children(&mut self, children: Vec<Node>) -> Result<(), Option<Node>> {
        let slots = self.slots_mut();
        if slots.len() != children.len() {
            return Err(None);
        }
        for (slot, child) in slots.into_iter().zip(children) {
            slot.put(child).map_err(Some)?;
        }
        Ok(())
    }

    /// Rewrite the node's own (non-child) term fields.
    ///
    /// Variable-typed fields are offered as `Term::Variable`; if `f` maps one
    /// to a non-variable the field keeps its old value. Quoted triples are
    /// passed whole, so `f` decides whether to descend with
    /// [`Term::map_nested`].
    pub fn map_own_terms(&mut self, f: &mut dyn FnMut(Term) -> Term) {
        fn map_var(var: &mut Variable, f: &mut dyn FnMut(Term) -> Term) {
            let old = mem::replace(var, Variable::new(""));
            *var = match f(Term::Variable(old.clone())) {
                Term::Variable(v) => v,
                _ => old,
            };
        }
        fn map_term(term: &mut Term, f: &mut dyn FnMut(Term) -> Term) {
            *term = f(mem::take(term));
        }

        match self {
            Node::Operation(op) => match &mut op.node {
                Op::Project { variables, .. } => {
                    variables.iter_mut().for_each(|v| map_var(v, f))
                }
                Op::Extend { variable, .. } => map_var(variable, f),
                Op::Graph { name, .. } | Op::Service { name, .. } => map_term(name, f),
                Op::Group {
                    variables,
                    aggregates,
                    ..
                } => {
                    variables.iter_mut().for_each(|v| map_var(v, f));
                    aggregates
                        .iter_mut()
                        .for_each(|agg| map_var(&mut agg.variable, f));
                }
                Op::Describe { terms, .. } => terms.iter_mut().for_each(|t| map_term(t, f)),
                Op::Values {
                    variables,
                    bindings,
                } => {
                    variables.iter_mut().for_each(|v| map_var(v, f));
                    for row in bindings.iter_mut() {
                        let old = mem::take(row);
                        let mut rebuilt = BTreeMap::new();
                        for (mut var, mut term) in old {
                            map_var(&mut var, f);
                            map_term(&mut term, f);
                            rebuilt.insert(var, term);
                        }
                        *row = rebuilt;
                    }
                }
                Op::Path {
                    subject,
                    object,
                    graph,
                    ..
                } => {
                    map_term(subject, f);
                    map_term(object, f);
                    map_term(graph, f);
                }
                _ => {}
            },
            Node::Pattern(p) => {
                map_term(&mut p.subject, f);
                map_term(&mut p.predicate, f);
                map_term(&mut p.object, f);
                map_term(&mut p.graph, f);
            }
            Node::Expression(Expression::Term { term }) => map_term(term, f),
            Node::Expression(_) | Node::Path(_) => {}
        }
    }

    pub fn into_operation(self) -> Option<Operation> {
        match self {
            Node::Operation(op) => Some(op),
            _ => None,
        }
    }

    pub fn into_expression(self) -> Option<Expression> {
        match self {
            Node::Expression(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Operation> for Node {
    fn from(op: Operation) -> Self {
        Node::Operation(op)
    }
}

impl From<Expression> for Node {
    fn from(expr: Expression) -> Self {
        Node::Expression(expr)
    }
}

impl From<Pattern> for Node {
    fn from(p: Pattern) -> Self {
        Node::Pattern(p)
    }
}

impl From<PathSymbol> for Node {
    fn from(p: PathSymbol) -> Self {
        Node::Path(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::NamedNode;

    fn pattern(s: &str) -> Pattern {
        Pattern::new(
            Term::Variable(Variable::new(s)),
            Term::NamedNode(NamedNode::new("http://ex.org/p")),
            Term::Variable(Variable::new("o")),
            Term::DefaultGraph,
        )
    }

    #[test]
    fn test_children_order_leftjoin() {
        let op = Operation::left_join(
            Operation::bgp(vec![pattern("a")]),
            Operation::bgp(vec![]),
            Some(Expression::variable("x")),
        );
        let kinds: Vec<_> = NodeView::Operation(&op)
            .children()
            .into_iter()
            .map(NodeView::kind)
            .collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Bgp, NodeKind::Bgp, NodeKind::TermExpression]
        );
    }

    #[test]
    fn test_take_and_put_children() {
        let mut node = Node::Operation(Operation::filter(
            Operation::bgp(vec![pattern("a")]),
            Expression::variable("x"),
        ));
        let original = node.clone();
        let children = node.take_children();
        assert_eq!(children.len(), 2);
        assert_ne!(node, original);
        node.put_children(children).unwrap();
        assert_eq!(node, original);
    }

    #[test]
    fn test_put_children_rejects_wrong_family() {
        let mut node = Node::Operation(Operation::distinct(Operation::nop()));
        let _ = node.take_children();
        let err = node
            .put_children(vec![Node::Pattern(pattern("a"))])
            .unwrap_err();
        assert!(matches!(err, Some(Node::Pattern(_))));
        assert_eq!(node.put_children(vec![]), Err(None));
    }

    #[test]
    fn test_descendant_lookup() {
        let op = Operation::project(Operation::bgp(vec![pattern("a"), pattern("b")]), vec![]);
        let found = NodeView::Operation(&op).descendant(&[0, 1]).unwrap();
        let NodeView::Pattern(p) = found else {
            panic!("expected pattern");
        };
        assert_eq!(p.subject, Term::Variable(Variable::new("b")));
        assert!(NodeView::Operation(&op).descendant(&[3]).is_none());
    }

    #[test]
    fn test_map_own_terms_values_rows() {
        let mut row = BTreeMap::new();
        row.insert(
            Variable::new("x"),
            Term::BlankNode(crate::term::BlankNode::new("b")),
        );
        let mut node = Node::Operation(Operation::values(vec![Variable::new("x")], vec![row]));
        node.map_own_terms(&mut |t| match t {
            Term::Variable(v) => Term::Variable(Variable::new(format!("{}2", v.value))),
            Term::BlankNode(_) => Term::NamedNode(NamedNode::new("http://ex.org/b")),
            other => other,
        });
        let Node::Operation(Operation {
            node: Op::Values { variables, bindings },
            ..
        }) = node
        else {
            panic!("expected values");
        };
        assert_eq!(variables, vec![Variable::new("x2")]);
        assert_eq!(
            bindings[0].get(&Variable::new("x2")),
            Some(&Term::NamedNode(NamedNode::new("http://ex.org/b")))
        );
    }
}
