//! Operation lifting.
//!
//! Every operation lifts either to the elements of a group graph pattern or
//! to a complete query (from a query form and the modifiers around it).
//! Queries only fit into a pattern as a `SELECT` subquery.

use crate::algebra::{Op, Operation};
use crate::ast::pattern::{GraphPattern, TriplePattern};
use crate::ast::query::{DatasetClause, LimitClause, OffsetClause, QueryBody, SelectModifier, SolutionModifiers};

use super::path::lift_path;
use super::term::{lift_iri, lift_pattern, lift_term, lift_var, lift_var_or_iri};
use super::{no_span, LiftError, LiftingContext, Result};

/// What one operation lifts to.
#[derive(Debug)]
pub(super) enum Lifted {
    /// Elements of a group pattern
    Patterns(Vec<GraphPattern>),
    /// A query; never an update
    Query(QueryBody),
}

impl LiftingContext {
    pub(super) fn lift_operation(&mut self, op: &Operation) -> Result<Lifted> {
        if !matches!(op.node, Op::Extend { .. } | Op::OrderBy { .. } | Op::Graph { .. }) {
            self.project = false;
        }

        let patterns = match &op.node {
            Op::Bgp { patterns } => {
                if patterns.is_empty() {
                    Vec::new()
                } else {
                    let triples = patterns.iter().map(lift_pattern).collect::<Result<Vec<_>>>()?;
                    vec![GraphPattern::bgp(triples, no_span())]
                }
            }
            Op::Path {
                subject,
                predicate,
                object,
                graph,
            } => {
                if !graph.is_default_graph() {
                    return Err(LiftError::unsupported(format!(
                        "path in graph {graph} outside a GRAPH block"
                    )));
                }
                let triple = TriplePattern::with_path(
                    lift_term(subject)?,
                    lift_path(predicate)?,
                    lift_term(object)?,
                    no_span(),
                );
                vec![GraphPattern::bgp(vec![triple], no_span())]
            }
            Op::Join { input } => {
                let mut out = Vec::new();
                for child in input {
                    out.extend(self.lift_patterns(child)?);
                }
                merge_bgps(out)
            }
            Op::LeftJoin {
                left,
                right,
                expression,
            } => {
                let mut out = self.lift_patterns(left)?;
                let mut optional = self.lift_patterns(right)?;
                if let Some(expr) = expression {
                    optional.push(GraphPattern::Filter {
                        expr: self.lift_expression(expr)?,
                        span: no_span(),
                    });
                }
                // A lone FILTER group stays nested, or it would re-lower as
                // the join condition
                out.push(GraphPattern::Optional {
                    pattern: Box::new(GraphPattern::group(optional, no_span())),
                    span: no_span(),
                });
                out
            }
            Op::Minus { left, right } => {
                let mut out = self.lift_patterns(left)?;
                let right = self.lift_patterns(right)?;
                out.push(GraphPattern::Minus {
                    pattern: Box::new(group_of(right)),
                    span: no_span(),
                });
                out
            }
            Op::Filter { input, expression } => {
                let mut inner = self.lift_patterns(input)?;
                inner.push(GraphPattern::Filter {
                    expr: self.lift_expression(expression)?,
                    span: no_span(),
                });
                vec![GraphPattern::group(inner, no_span())]
            }
            Op::Graph { input, name } => {
                let name = lift_var_or_iri(name)?;
                let inner = self.lift_patterns(input)?;
                vec![GraphPattern::Graph {
                    name,
                    pattern: Box::new(group_of(inner)),
                    span: no_span(),
                }]
            }
            Op::Service {
                input,
                name,
                silent,
            } => {
                let endpoint = lift_var_or_iri(name)?;
                let inner = self.lift_patterns(input)?;
                vec![GraphPattern::Service {
                    silent: *silent,
                    endpoint,
                    pattern: Box::new(group_of(inner)),
                    span: no_span(),
                }]
            }
            Op::Union { input } => {
                let mut branches = Vec::with_capacity(input.len());
                for child in input {
                    branches.push(group_of(self.lift_patterns(child)?));
                }
                let mut branches = branches.into_iter();
                match branches.next() {
                    None => Vec::new(),
                    Some(first) => vec![branches.fold(first, |left, right| GraphPattern::Union {
                        left: Box::new(left),
                        right: Box::new(right),
                        span: no_span(),
                    })],
                }
            }
            Op::Values {
                variables,
                bindings,
            } => {
                let mut data = Vec::with_capacity(bindings.len());
                for row in bindings {
                    data.push(
                        variables
                            .iter()
                            .map(|var| row.get(var).map(lift_term).transpose())
                            .collect::<Result<Vec<_>>>()?,
                    );
                }
                vec![GraphPattern::Values {
                    vars: variables.iter().map(lift_var).collect(),
                    data,
                    span: no_span(),
                }]
            }
            Op::Extend {
                input,
                variable,
                expression,
            } => {
                if self.project {
                    self.extends.push((variable.clone(), expression.clone()));
                    return self.lift_operation(input);
                }
                let mut out = self.lift_patterns(input)?;
                out.push(GraphPattern::Bind {
                    expr: self.lift_expression(expression)?,
                    var: lift_var(variable),
                    span: no_span(),
                });
                out
            }
            Op::Group {
                input,
                variables,
                aggregates,
            } => {
                self.groups.extend(variables.iter().cloned());
                self.aggregates.extend(aggregates.iter().cloned());
                return self.lift_operation(input);
            }
            Op::OrderBy { input, expressions } => {
                self.order.extend(expressions.iter().cloned());
                return self.lift_operation(input);
            }
            Op::Nop => Vec::new(),

            Op::Project { input, variables } => return self.lift_select(input, variables).map(Lifted::Query),
            Op::Ask { input } => return self.lift_ask(input).map(Lifted::Query),
            Op::Describe { input, terms } => return self.lift_describe(input, terms).map(Lifted::Query),
            Op::Construct { input, template } => {
                return self.lift_construct(input, template).map(Lifted::Query)
            }

            Op::Distinct { input } | Op::Reduced { input } => {
                let modifier = if matches!(op.node, Op::Distinct { .. }) {
                    SelectModifier::Distinct
                } else {
                    SelectModifier::Reduced
                };
                let mut query = self.lift_query_form(input, op.type_name())?;
                match &mut query {
                    QueryBody::Select(select) => select.select.modifier = Some(modifier),
                    _ => {
                        return Err(LiftError::unsupported(format!(
                            "{} over a non-SELECT query",
                            op.type_name()
                        )))
                    }
                }
                return Ok(Lifted::Query(query));
            }
            Op::Slice {
                input,
                start,
                length,
            } => {
                let mut query = self.lift_query_form(input, op.type_name())?;
                let modifiers = modifiers_mut(&mut query)?;
                if *start != 0 {
                    modifiers.offset = Some(OffsetClause::new(*start, no_span()));
                }
                if let Some(length) = length {
                    modifiers.limit = Some(LimitClause::new(*length, no_span()));
                }
                return Ok(Lifted::Query(query));
            }
            Op::From {
                input,
                default,
                named,
            } => {
                let mut query = self.lift_query_form(input, op.type_name())?;
                let dataset = Some(DatasetClause {
                    default_graphs: default.iter().map(lift_iri).collect(),
                    named_graphs: named.iter().map(lift_iri).collect(),
                    span: no_span(),
                });
                match &mut query {
                    QueryBody::Select(q) => q.dataset = dataset,
                    QueryBody::Construct(q) => q.dataset = dataset,
                    QueryBody::Ask(q) => q.dataset = dataset,
                    QueryBody::Describe(q) => q.dataset = dataset,
                    QueryBody::Update(_) => return Err(LiftError::unexpected(op.type_name())),
                }
                return Ok(Lifted::Query(query));
            }

            Op::DeleteInsert { .. }
            | Op::Load { .. }
            | Op::Clear { .. }
            | Op::Drop { .. }
            | Op::Create { .. }
            | Op::Add { .. }
            | Op::Move { .. }
            | Op::Copy { .. }
            | Op::CompositeUpdate { .. } => return Err(LiftError::unexpected(op.type_name())),
        };
        Ok(Lifted::Patterns(patterns))
    }

    /// Lift an operation that must end up inside a group pattern.
    pub(super) fn lift_patterns(&mut self, op: &Operation) -> Result<Vec<GraphPattern>> {
        match self.lift_operation(op)? {
            Lifted::Patterns(patterns) => Ok(patterns),
            Lifted::Query(QueryBody::Select(query)) => Ok(vec![GraphPattern::SubSelect {
                query: Box::new(query),
                span: no_span(),
            }]),
            Lifted::Query(_) => Err(LiftError::unsupported(
                "only SELECT queries can be nested in a pattern",
            )),
        }
    }

    /// Lift the input of a solution modifier, which must be a query form.
    fn lift_query_form(&mut self, input: &Operation, modifier: &'static str) -> Result<QueryBody> {
        match self.lift_operation(input)? {
            Lifted::Query(query) => Ok(query),
            Lifted::Patterns(_) => Err(LiftError::unsupported(format!(
                "{modifier} without a query form below it"
            ))),
        }
    }
}

fn modifiers_mut(query: &mut QueryBody) -> Result<&mut SolutionModifiers> {
    match query {
        QueryBody::Select(q) => Ok(&mut q.modifiers),
        QueryBody::Construct(q) => Ok(&mut q.modifiers),
        QueryBody::Ask(q) => Ok(&mut q.modifiers),
        QueryBody::Describe(q) => Ok(&mut q.modifiers),
        QueryBody::Update(_) => Err(LiftError::unexpected("slice")),
    }
}

/// Group pattern of `patterns`; a lone group is used as is.
pub(super) fn group_of(mut patterns: Vec<GraphPattern>) -> GraphPattern {
    if patterns.len() == 1 && matches!(patterns[0], GraphPattern::Group { .. }) {
        if let Some(group) = patterns.pop() {
            return group;
        }
    }
    GraphPattern::group(patterns, no_span())
}

/// Concatenate adjacent basic graph patterns.
fn merge_bgps(patterns: Vec<GraphPattern>) -> Vec<GraphPattern> {
    let mut out: Vec<GraphPattern> = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        match (out.last_mut(), pattern) {
            (
                Some(GraphPattern::Bgp { patterns: last, .. }),
                GraphPattern::Bgp { patterns: next, .. },
            ) => last.extend(next),
            (_, pattern) => out.push(pattern),
        }
    }
    out
}
