//! Algebra to AST lifting.
//!
//! Lifting is not a structural mirror of lowering. Walking down from the
//! root, the operations that lowering stacks on top of a WHERE pattern
//! (`Extend`, `Group`, `OrderBy`) are collected in a [`LiftingContext`] and
//! only turned into SELECT expressions, GROUP BY, HAVING and ORDER BY once
//! the enclosing query form (`Project`, `Construct`, `Ask`, `Describe`) has
//! lifted its whole input.
//!
//! Before any of that, graph names embedded into patterns in quad mode are
//! removed again (see [`quads`]).
//!
//! The result has no prologue: every IRI is written in full, and every span
//! is [`SourceSpan::default`].

mod error;
mod expression;
mod path;
mod pattern;
mod query;
pub mod quads;
mod term;
mod update;

pub use error::{LiftError, Result};

use crate::algebra::{BoundAggregate, Expression, Operation};
use crate::ast::{Prologue, QueryBody, SparqlAst};
use crate::span::SourceSpan;
use crate::term::Variable;
use tracing::{debug, debug_span};

/// Lift an algebra tree to a query or update AST.
///
/// Update operations (and `Nop`) become an update request. Anything else is
/// lifted as a query; a tree without a query form on top becomes
/// `SELECT * WHERE { ... }`.
///
/// # Example
///
/// ```
/// use sparql_algebra::algebra::{Operation, Pattern};
/// use sparql_algebra::ast::QueryBody;
/// use sparql_algebra::lift::lift;
/// use sparql_algebra::term::{NamedNode, Term, Variable};
///
/// let bgp = Operation::bgp(vec![Pattern::new(
///     Term::Variable(Variable::new("s")),
///     Term::NamedNode(NamedNode::new("http://example.org/name")),
///     Term::Variable(Variable::new("name")),
///     Term::DefaultGraph,
/// )]);
/// let op = Operation::project(bgp, vec![Variable::new("name")]);
///
/// let ast = lift(&op).unwrap();
/// assert!(matches!(ast.body, QueryBody::Select(_)));
/// ```
pub fn lift(op: &Operation) -> Result<SparqlAst> {
    let span = debug_span!("sparql_lift", op = op.type_name());
    let _guard = span.enter();

    let op = quads::remove_quads(op.clone())?;
    let mut ctx = LiftingContext::default();
    let body = if op.node.is_update() {
        QueryBody::Update(ctx.lift_update_request(&op)?)
    } else {
        ctx.lift_query(&op)?
    };

    debug!(form = form_name(&body), "lifting complete");
    Ok(SparqlAst::new(Prologue::new(), body, no_span()))
}

fn form_name(body: &QueryBody) -> &'static str {
    match body {
        QueryBody::Select(_) => "select",
        QueryBody::Construct(_) => "construct",
        QueryBody::Ask(_) => "ask",
        QueryBody::Describe(_) => "describe",
        QueryBody::Update(_) => "update",
    }
}

/// Lifted ASTs carry no source positions.
pub(crate) fn no_span() -> SourceSpan {
    SourceSpan::default()
}

/// State collected while walking down to a query form's WHERE pattern.
///
/// A query form saves the outer state, lifts its input with a fresh one and
/// restores the outer state afterwards, so subqueries never see the
/// accumulators of the query around them.
#[derive(Debug, Default)]
pub(crate) struct LiftingContext {
    /// Inside a query form, with only `Extend`/`OrderBy`/`Graph` passed since
    project: bool,
    /// `Extend`s met while `project` was set, outermost first
    extends: Vec<(Variable, Expression)>,
    /// GROUP BY variables
    groups: Vec<Variable>,
    aggregates: Vec<BoundAggregate>,
    /// Order keys; descending keys are wrapped in `desc`
    order: Vec<Expression>,
}
