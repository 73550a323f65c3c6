//! Terse AST construction for tests.
//!
//! Spans are irrelevant to translation, so every builder uses
//! `SourceSpan::default()`.

use sparql_algebra::ast::*;
use sparql_algebra::SourceSpan;

pub const EX: &str = "http://example.org/";

pub fn sp() -> SourceSpan {
    SourceSpan::default()
}

pub fn v(name: &str) -> Var {
    Var::new(name, sp())
}

pub fn var(name: &str) -> Term {
    Term::Var(v(name))
}

/// IRI under `http://example.org/`.
pub fn ex(local: &str) -> Iri {
    Iri::full(format!("{EX}{local}"), sp())
}

pub fn iri(local: &str) -> Term {
    Term::Iri(ex(local))
}

pub fn pred(local: &str) -> VarOrIri {
    VarOrIri::Iri(ex(local))
}

pub fn pvar(name: &str) -> VarOrIri {
    VarOrIri::Var(v(name))
}

pub fn lit(value: &str) -> Term {
    Term::Literal(Literal::string(value, sp()))
}

pub fn int(value: i64) -> Term {
    Term::Literal(Literal::integer(value, sp()))
}

pub fn blank(label: &str) -> Term {
    Term::BlankNode(BlankNode::labeled(label, sp()))
}

pub fn triple(s: Term, p: VarOrIri, o: Term) -> TriplePattern {
    TriplePattern::new(s, p, o, sp())
}

pub fn path_triple(s: Term, path: PropertyPath, o: Term) -> TriplePattern {
    TriplePattern::with_path(s, path, o, sp())
}

pub fn path(local: &str) -> PropertyPath {
    PropertyPath::iri(ex(local))
}

pub fn bgp(triples: Vec<TriplePattern>) -> GraphPattern {
    GraphPattern::bgp(triples, sp())
}

pub fn group(patterns: Vec<GraphPattern>) -> GraphPattern {
    GraphPattern::group(patterns, sp())
}

pub fn optional(pattern: GraphPattern) -> GraphPattern {
    GraphPattern::Optional {
        pattern: Box::new(pattern),
        span: sp(),
    }
}

pub fn minus(pattern: GraphPattern) -> GraphPattern {
    GraphPattern::Minus {
        pattern: Box::new(pattern),
        span: sp(),
    }
}

pub fn union(left: GraphPattern, right: GraphPattern) -> GraphPattern {
    GraphPattern::Union {
        left: Box::new(left),
        right: Box::new(right),
        span: sp(),
    }
}

pub fn filter(expr: Expression) -> GraphPattern {
    GraphPattern::Filter { expr, span: sp() }
}

pub fn bind(expr: Expression, name: &str) -> GraphPattern {
    GraphPattern::Bind {
        expr,
        var: v(name),
        span: sp(),
    }
}

pub fn graph(name: VarOrIri, pattern: GraphPattern) -> GraphPattern {
    GraphPattern::Graph {
        name,
        pattern: Box::new(pattern),
        span: sp(),
    }
}

pub fn values(vars: &[&str], rows: Vec<Vec<Option<Term>>>) -> GraphPattern {
    GraphPattern::Values {
        vars: vars.iter().map(|n| v(n)).collect(),
        data: rows,
        span: sp(),
    }
}

pub fn evar(name: &str) -> Expression {
    Expression::var(v(name))
}

pub fn eint(value: i64) -> Expression {
    Expression::literal(Literal::integer(value, sp()))
}

pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::binary(op, left, right, sp())
}

pub fn call(name: impl Into<FunctionName>, args: Vec<Expression>) -> Expression {
    Expression::function_call(name.into(), args, sp())
}

pub fn aggregate(function: AggregateFunction, expr: Option<Expression>) -> Expression {
    Expression::Aggregate {
        function,
        expr: expr.map(Box::new),
        distinct: false,
        separator: None,
        span: sp(),
    }
}

pub fn where_clause(patterns: Vec<GraphPattern>) -> WhereClause {
    WhereClause::new(group(patterns), true, sp())
}

pub fn select_star(patterns: Vec<GraphPattern>) -> SelectQuery {
    SelectQuery::new(
        SelectClause::star(sp()),
        where_clause(patterns),
        SolutionModifiers::new(),
        sp(),
    )
}

pub fn select(vars: Vec<SelectVariable>, patterns: Vec<GraphPattern>) -> SelectQuery {
    SelectQuery::new(
        SelectClause::variables(vars, sp()),
        where_clause(patterns),
        SolutionModifiers::new(),
        sp(),
    )
}

pub fn sel(name: &str) -> SelectVariable {
    SelectVariable::Var(v(name))
}

pub fn sel_as(expr: Expression, name: &str) -> SelectVariable {
    SelectVariable::Expr {
        expr,
        alias: v(name),
        span: sp(),
    }
}

pub fn order(expr: Expression, direction: OrderDirection) -> OrderCondition {
    let expr = match expr {
        Expression::Var(var) => OrderExpr::Var(var),
        other => OrderExpr::Expr(other),
    };
    OrderCondition {
        expr,
        direction,
        span: sp(),
    }
}

pub fn query(body: QueryBody) -> SparqlAst {
    SparqlAst::new(Prologue::new(), body, sp())
}

pub fn select_ast(query_: SelectQuery) -> SparqlAst {
    query(QueryBody::Select(query_))
}

pub fn update(operations: Vec<UpdateOperation>) -> SparqlAst {
    let units = operations.into_iter().map(UpdateUnit::new).collect();
    query(QueryBody::Update(UpdateRequest::new(units, sp())))
}

pub fn quads(graph: Option<VarOrIri>, triples: Vec<TriplePattern>) -> Quads {
    Quads {
        graph,
        triples,
        span: sp(),
    }
}

pub fn quad_pattern(blocks: Vec<Quads>) -> QuadPattern {
    QuadPattern::new(blocks, sp())
}
