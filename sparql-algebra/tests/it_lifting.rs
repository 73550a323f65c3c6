//! Integration tests for algebra to AST lifting.

mod support;

use sparql_algebra::algebra::{BoundAggregate, GraphTarget, Pattern};
use sparql_algebra::ast::*;
use sparql_algebra::term::{NamedNode, Term as RdfTerm, Variable};
use sparql_algebra::{lift, Expression as AlgebraExpr, LiftError, Operation};

const EX: &str = "http://example.org/";

fn v(name: &str) -> RdfTerm {
    RdfTerm::Variable(Variable::new(name))
}

fn nn(local: &str) -> NamedNode {
    NamedNode::new(format!("{EX}{local}"))
}

fn spo(s: &str, p: &str, o: &str) -> Pattern {
    Pattern::new(v(s), RdfTerm::NamedNode(nn(p)), v(o), RdfTerm::DefaultGraph)
}

fn select_of(op: &Operation) -> SelectQuery {
    match lift(op).expect("lift").body {
        QueryBody::Select(query) => query,
        other => panic!("expected SELECT, got {other:?}"),
    }
}

fn where_patterns(query: &SelectQuery) -> &[GraphPattern] {
    match &query.where_clause.pattern {
        GraphPattern::Group { patterns, .. } => patterns,
        other => panic!("expected group, got {other:?}"),
    }
}

#[test]
fn test_projection_of_all_variables_is_star() {
    let op = Operation::project(
        Operation::bgp(vec![spo("s", "p", "o")]),
        vec![Variable::new("o"), Variable::new("s")],
    );
    let query = select_of(&op);
    assert_eq!(query.select.variables, SelectVariables::Star);
}

#[test]
fn test_partial_projection_lists_variables() {
    let op = Operation::project(
        Operation::bgp(vec![spo("s", "p", "o")]),
        vec![Variable::new("s")],
    );
    let query = select_of(&op);
    let SelectVariables::Explicit(items) = &query.select.variables else {
        panic!("expected explicit projection");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].var().name.as_ref(), "s");
}

#[test]
fn test_grouped_aggregate_becomes_select_expression_and_having() {
    let count = AlgebraExpr::aggregate("count", AlgebraExpr::variable("o"), false, None);
    let grouped = Operation::group(
        Operation::bgp(vec![spo("s", "p", "o")]),
        vec![Variable::new("s")],
        vec![BoundAggregate {
            variable: Variable::new("var0"),
            expression: count,
        }],
    );
    let having = Operation::filter(
        grouped,
        AlgebraExpr::operator(">", vec![AlgebraExpr::variable("var0"), AlgebraExpr::variable("min")]),
    );
    let extended = Operation::extend(having, Variable::new("n"), AlgebraExpr::variable("var0"));
    let op = Operation::project(extended, vec![Variable::new("s"), Variable::new("n")]);

    let query = select_of(&op);
    let SelectVariables::Explicit(items) = &query.select.variables else {
        panic!("expected explicit projection");
    };
    assert!(matches!(&items[0], SelectVariable::Var(var) if var.name.as_ref() == "s"));
    let SelectVariable::Expr { expr, alias, .. } = &items[1] else {
        panic!("expected (expr AS ?n)");
    };
    assert_eq!(alias.name.as_ref(), "n");
    assert!(matches!(
        expr,
        Expression::Aggregate {
            function: AggregateFunction::Count,
            ..
        }
    ));

    let group_by = query.modifiers.group_by.as_ref().expect("group by");
    assert!(matches!(&group_by.conditions[0], GroupCondition::Var(var) if var.name.as_ref() == "s"));
    let having = query.modifiers.having.as_ref().expect("having");
    let Expression::Binary { left, .. } = &having.conditions[0] else {
        panic!("expected comparison");
    };
    assert!(matches!(**left, Expression::Aggregate { .. }));
}

#[test]
fn test_slice_distinct_and_order() {
    let ordered = Operation::order_by(
        Operation::bgp(vec![spo("s", "p", "o")]),
        vec![
            AlgebraExpr::operator("desc", vec![AlgebraExpr::variable("o")]),
            AlgebraExpr::variable("s"),
        ],
    );
    let projected = Operation::project(ordered, vec![Variable::new("s")]);
    let op = Operation::slice(Operation::distinct(projected), 0, Some(5));

    let query = select_of(&op);
    assert_eq!(query.select.modifier, Some(SelectModifier::Distinct));
    assert_eq!(query.modifiers.limit.as_ref().map(|l| l.value), Some(5));
    assert!(query.modifiers.offset.is_none());

    let order = &query.modifiers.order_by.as_ref().expect("order by").conditions;
    assert_eq!(order[0].direction, OrderDirection::Desc);
    assert!(matches!(&order[0].expr, OrderExpr::Var(var) if var.name.as_ref() == "o"));
    assert_eq!(order[1].direction, OrderDirection::Asc);
}

#[test]
fn test_optional_union_minus_shapes() {
    let left = Operation::bgp(vec![spo("s", "p", "o")]);
    let optional = Operation::left_join(
        left,
        Operation::bgp(vec![spo("s", "q", "x")]),
        Some(AlgebraExpr::variable("x")),
    );
    let union = Operation::union(vec![
        Operation::bgp(vec![spo("s", "a", "y")]),
        Operation::bgp(vec![spo("s", "b", "y")]),
    ]);
    let minus = Operation::minus(
        Operation::join(vec![optional, union]),
        Operation::bgp(vec![spo("s", "c", "z")]),
    );
    let op = Operation::project(minus, vec![Variable::new("s")]);

    let query = select_of(&op);
    let patterns = where_patterns(&query);
    assert!(matches!(patterns[0], GraphPattern::Bgp { .. }));
    let GraphPattern::Optional { pattern, .. } = &patterns[1] else {
        panic!("expected OPTIONAL, got {:?}", patterns[1]);
    };
    let GraphPattern::Group { patterns: inner, .. } = &**pattern else {
        panic!("expected group inside OPTIONAL");
    };
    assert!(matches!(inner.last(), Some(GraphPattern::Filter { .. })));
    assert!(matches!(patterns[2], GraphPattern::Union { .. }));
    assert!(matches!(patterns[3], GraphPattern::Minus { .. }));
}

#[test]
fn test_quad_embedded_graph_lifts_to_graph_block() {
    let quad = Pattern::new(v("s"), RdfTerm::NamedNode(nn("p")), v("o"), v("g"));
    let op = Operation::project(
        Operation::graph(Operation::bgp(vec![quad]), v("g")),
        vec![Variable::new("s")],
    );

    let query = select_of(&op);
    let patterns = where_patterns(&query);
    let GraphPattern::Graph { name, pattern, .. } = &patterns[0] else {
        panic!("expected GRAPH, got {:?}", patterns[0]);
    };
    assert!(matches!(name, VarOrIri::Var(var) if var.name.as_ref() == "g"));
    let GraphPattern::Group { patterns: inner, .. } = &**pattern else {
        panic!("expected group inside GRAPH");
    };
    assert!(matches!(inner[0], GraphPattern::Bgp { .. }));
}

#[test]
fn test_pattern_without_query_form_lifts_as_select_star() {
    let op = Operation::bgp(vec![spo("s", "p", "o")]);
    let query = select_of(&op);
    assert_eq!(query.select.variables, SelectVariables::Star);
}

#[test]
fn test_subquery_lifts_to_subselect() {
    let inner = Operation::project(Operation::bgp(vec![spo("s", "p", "o")]), vec![Variable::new("s")]);
    let outer = Operation::join(vec![inner, Operation::bgp(vec![spo("s", "q", "x")])]);
    let op = Operation::project(outer, vec![Variable::new("s"), Variable::new("x")]);

    let query = select_of(&op);
    let patterns = where_patterns(&query);
    assert!(matches!(patterns[0], GraphPattern::SubSelect { .. }));
}

#[test]
fn test_construct_and_ask() {
    let op = Operation::construct(
        Operation::bgp(vec![spo("s", "p", "o")]),
        vec![spo("o", "inverse", "s")],
    );
    let QueryBody::Construct(construct) = lift(&op).unwrap().body else {
        panic!("expected CONSTRUCT");
    };
    assert_eq!(construct.template.expect("template").triples.len(), 1);

    let op = Operation::ask(Operation::bgp(vec![spo("s", "p", "o")]));
    assert!(matches!(lift(&op).unwrap().body, QueryBody::Ask(_)));
}

#[test]
fn test_updates_lift_to_request() {
    let insert = Operation::delete_insert(None, Some(vec![spo("s", "p", "o")]), Some(Operation::bgp(vec![spo("s", "q", "o")])));
    let op = Operation::composite_update(vec![
        insert,
        Operation::drop_graph(GraphTarget::All, true),
        Operation::load(nn("data"), Some(nn("g")), false),
    ]);

    let QueryBody::Update(request) = lift(&op).unwrap().body else {
        panic!("expected update");
    };
    assert_eq!(request.operations.len(), 3);
    assert!(matches!(request.operations[0].operation, UpdateOperation::Modify(_)));
    let UpdateOperation::Drop(drop) = &request.operations[1].operation else {
        panic!("expected DROP");
    };
    assert!(drop.silent);
    assert_eq!(drop.target, GraphRefAll::All);
    assert!(matches!(request.operations[2].operation, UpdateOperation::Load(_)));
}

#[test]
fn test_update_inside_query_is_rejected() {
    let op = Operation::project(
        Operation::join(vec![
            Operation::bgp(vec![spo("s", "p", "o")]),
            Operation::clear(GraphTarget::Default, false),
        ]),
        vec![Variable::new("s")],
    );
    let err = lift(&op).unwrap_err();
    assert!(matches!(err, LiftError::UnexpectedOperation { kind: "clear" }));
}
