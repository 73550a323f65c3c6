//! Query forms and solution modifiers.
//!
//! A query form lifts its input with fresh accumulators, then turns what was
//! collected into clauses:
//!
//! 1. aggregates become the expressions their variables stand for;
//! 2. extends (innermost first) become SELECT expressions, or GROUP BY
//!    aliases when they bind a grouping variable, or trailing BINDs;
//! 3. FILTERs of the WHERE group that mention an aggregate become HAVING;
//! 4. order keys become ORDER BY, `desc(e)` as `DESC(e)`.

use crate::algebra::{in_scope_variables, Expression, Operation, Pattern};
use crate::ast::expr::Expression as SparqlExpr;
use crate::ast::pattern::GraphPattern;
use crate::ast::query::{
    AskQuery, ConstructQuery, ConstructTemplate, DescribeQuery, DescribeTarget, GroupByClause,
    GroupCondition, HavingClause, OrderByClause, OrderCondition, OrderDirection, OrderExpr,
    QueryBody, SelectClause, SelectQuery, SelectVariable, SolutionModifiers, WhereClause,
};
use crate::term::{Term, Variable};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::trace;

use super::expression::{extract_having, substitute_variables};
use super::pattern::{group_of, Lifted};
use super::term::{lift_triple, lift_var, lift_var_or_iri};
use super::{no_span, LiftError, LiftingContext, Result};

/// A lifted query scope, before the form-specific parts are added.
struct Scope {
    patterns: Vec<GraphPattern>,
    /// Extends not used by GROUP BY, innermost first
    extensions: Vec<(Variable, SparqlExpr)>,
    /// Aggregate variable -> aggregate expression
    aggregates: FxHashMap<Arc<str>, SparqlExpr>,
    modifiers: SolutionModifiers,
}

impl Scope {
    fn take_extension(&mut self, var: &Variable) -> Option<SparqlExpr> {
        let pos = self.extensions.iter().position(|(v, _)| v == var)?;
        Some(self.extensions.remove(pos).1)
    }

    /// Leftover extensions become BINDs at the end of the WHERE group.
    fn into_where(mut self) -> (WhereClause, SolutionModifiers) {
        for (var, expr) in self.extensions {
            self.patterns.push(GraphPattern::Bind {
                expr,
                var: lift_var(&var),
                span: no_span(),
            });
        }
        let where_clause = WhereClause::new(group_of(self.patterns), true, no_span());
        (where_clause, self.modifiers)
    }
}

impl LiftingContext {
    /// Lift a root that is not an update.
    pub(super) fn lift_query(&mut self, op: &Operation) -> Result<QueryBody> {
        match self.lift_operation(op)? {
            Lifted::Query(query) => Ok(query),
            Lifted::Patterns(patterns) => {
                trace!("no query form on top, lifting as SELECT *");
                let where_clause = WhereClause::new(group_of(patterns), true, no_span());
                Ok(QueryBody::Select(SelectQuery::new(
                    SelectClause::star(no_span()),
                    where_clause,
                    SolutionModifiers::new(),
                    no_span(),
                )))
            }
        }
    }

    pub(super) fn lift_select(&mut self, input: &Operation, variables: &[Variable]) -> Result<QueryBody> {
        let mut scope = self.lift_scope(input)?;

        let grouped = scope.modifiers.group_by.is_some() || !scope.aggregates.is_empty();
        let mut items = Vec::with_capacity(variables.len());
        let mut computed = false;
        for var in variables {
            let expr = match scope.take_extension(var) {
                Some(expr) => Some(expr),
                None => scope.aggregates.get(var.as_str()).cloned(),
            };
            match expr {
                Some(expr) => {
                    computed = true;
                    items.push(SelectVariable::Expr {
                        expr,
                        alias: lift_var(var),
                        span: no_span(),
                    });
                }
                None => items.push(SelectVariable::Var(lift_var(var))),
            }
        }

        let star = !computed && !grouped && is_star(input, variables);
        let select = if star {
            SelectClause::star(no_span())
        } else {
            SelectClause::variables(items, no_span())
        };
        let (where_clause, modifiers) = scope.into_where();
        Ok(QueryBody::Select(SelectQuery::new(
            select,
            where_clause,
            modifiers,
            no_span(),
        )))
    }

    pub(super) fn lift_ask(&mut self, input: &Operation) -> Result<QueryBody> {
        let scope = self.lift_scope(input)?;
        let (where_clause, modifiers) = scope.into_where();
        let mut query = AskQuery::new(where_clause, no_span());
        query.modifiers = modifiers;
        Ok(QueryBody::Ask(query))
    }

    pub(super) fn lift_describe(&mut self, input: &Operation, terms: &[Term]) -> Result<QueryBody> {
        let scope = self.lift_scope(input)?;

        let all_variables = terms
            .iter()
            .map(Term::as_variable)
            .collect::<Option<Vec<_>>>()
            .map(|vars| vars.into_iter().cloned().collect::<Vec<_>>());
        let target = match all_variables {
            Some(vars) if is_star(input, &vars) => DescribeTarget::Star,
            _ => DescribeTarget::Resources(
                terms
                    .iter()
                    .map(lift_var_or_iri)
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        let empty = scope.patterns.is_empty() && scope.extensions.is_empty();
        let (where_clause, modifiers) = scope.into_where();
        let mut query = DescribeQuery::new(target, no_span());
        query.where_clause = (!empty).then_some(where_clause);
        query.modifiers = modifiers;
        Ok(QueryBody::Describe(query))
    }

    pub(super) fn lift_construct(&mut self, input: &Operation, template: &[Pattern]) -> Result<QueryBody> {
        let scope = self.lift_scope(input)?;
        let triples = template
            .iter()
            .map(|pattern| {
                if pattern.graph.is_default_graph() {
                    lift_triple(pattern)
                } else {
                    Err(LiftError::unsupported("CONSTRUCT template pattern in a named graph"))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        let (where_clause, modifiers) = scope.into_where();
        Ok(QueryBody::Construct(ConstructQuery::new(
            Some(ConstructTemplate::new(triples, no_span())),
            where_clause,
            modifiers,
            no_span(),
        )))
    }

    /// Lift a query form's input with fresh accumulators.
    fn lift_scope(&mut self, input: &Operation) -> Result<Scope> {
        let outer = std::mem::take(self);
        self.project = true;
        let scope = self.collect_scope(input);
        *self = outer;
        scope
    }

    fn collect_scope(&mut self, input: &Operation) -> Result<Scope> {
        let patterns = self.lift_patterns(input)?;

        let bound = std::mem::take(&mut self.aggregates);
        let mut aggregates = FxHashMap::default();
        for aggregate in &bound {
            let expr = self.lift_expression(&aggregate.expression)?;
            aggregates.insert(aggregate.variable.value.clone(), expr);
        }

        let extends = std::mem::take(&mut self.extends);
        let mut extensions = Vec::with_capacity(extends.len());
        for (var, expr) in extends.iter().rev() {
            let expr = self.lift_substituted(expr, &aggregates)?;
            extensions.push((var.clone(), expr));
        }

        let mut scope = Scope {
            patterns: Vec::new(),
            extensions,
            aggregates,
            modifiers: SolutionModifiers::new(),
        };

        let groups = std::mem::take(&mut self.groups);
        if !groups.is_empty() {
            let conditions = groups
                .iter()
                .map(|var| match scope.take_extension(var) {
                    Some(expr) => GroupCondition::Expr {
                        expr,
                        alias: Some(lift_var(var)),
                        span: no_span(),
                    },
                    None => GroupCondition::Var(lift_var(var)),
                })
                .collect();
            scope.modifiers.group_by = Some(GroupByClause {
                conditions,
                span: no_span(),
            });
        }

        let mut having = Vec::new();
        let patterns = if scope.aggregates.is_empty() {
            patterns
        } else {
            extract_having(patterns, &scope.aggregates, &mut having)
        };
        if !having.is_empty() {
            scope.modifiers.having = Some(HavingClause {
                conditions: having,
                span: no_span(),
            });
        }
        scope.patterns = match group_of(patterns) {
            GraphPattern::Group { patterns, .. } => patterns,
            other => vec![other],
        };

        let order = std::mem::take(&mut self.order);
        if !order.is_empty() {
            let mut conditions = Vec::with_capacity(order.len());
            for key in &order {
                let (expr, direction) = match key {
                    Expression::Operator { operator, args } if &**operator == "desc" && args.len() == 1 => {
                        (&args[0], OrderDirection::Desc)
                    }
                    other => (other, OrderDirection::Asc),
                };
                let expr = match self.lift_substituted(expr, &scope.aggregates)? {
                    SparqlExpr::Var(var) => OrderExpr::Var(var),
                    other => OrderExpr::Expr(other),
                };
                conditions.push(OrderCondition {
                    expr,
                    direction,
                    span: no_span(),
                });
            }
            scope.modifiers.order_by = Some(OrderByClause {
                conditions,
                span: no_span(),
            });
        }

        trace!(
            extensions = scope.extensions.len(),
            aggregates = scope.aggregates.len(),
            "collected query scope"
        );
        Ok(scope)
    }

    fn lift_substituted(
        &mut self,
        expr: &Expression,
        aggregates: &FxHashMap<Arc<str>, SparqlExpr>,
    ) -> Result<SparqlExpr> {
        let lifted = self.lift_expression(expr)?;
        let mut replaced = false;
        Ok(substitute_variables(lifted, aggregates, &mut replaced))
    }
}

/// Whether `variables` are exactly the variables in scope in `input`, so the
/// projection can be written as `*`.
fn is_star(input: &Operation, variables: &[Variable]) -> bool {
    let listed: FxHashSet<&Variable> = variables.iter().collect();
    let in_scope = in_scope_variables(input);
    listed.len() == variables.len()
        && in_scope.len() == listed.len()
        && in_scope.iter().all(|v| listed.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::BoundAggregate;
    use crate::term::NamedNode;

    fn var(name: &str) -> Term {
        Term::Variable(Variable::new(name))
    }

    fn pattern(s: &str, o: &str) -> Pattern {
        Pattern::new(
            var(s),
            Term::NamedNode(NamedNode::new("http://ex.org/p")),
            var(o),
            Term::DefaultGraph,
        )
    }

    fn lift(op: &Operation) -> QueryBody {
        LiftingContext::default().lift_query(op).unwrap()
    }

    #[test]
    fn test_full_projection_is_star() {
        let op = Operation::project(
            Operation::bgp(vec![pattern("s", "o")]),
            vec![Variable::new("o"), Variable::new("s")],
        );
        let QueryBody::Select(query) = lift(&op) else {
            panic!("expected select");
        };
        assert_eq!(query.select.variables, crate::ast::SelectVariables::Star);
    }

    #[test]
    fn test_aggregate_alias_and_having() {
        // SELECT ?s (COUNT(?o) AS ?n) WHERE { ?s :p ?o } GROUP BY ?s HAVING (COUNT(?o) > 1)
        let count = Expression::aggregate("count", Expression::variable("o"), false, None);
        let grouped = Operation::group(
            Operation::bgp(vec![pattern("s", "o")]),
            vec![Variable::new("s")],
            vec![BoundAggregate {
                variable: Variable::new("var0"),
                expression: count,
            }],
        );
        let having = Operation::filter(
            grouped,
            Expression::operator(">", vec![Expression::variable("var0"), Expression::variable("one")]),
        );
        let extended = Operation::extend(having, Variable::new("n"), Expression::variable("var0"));
        let op = Operation::project(extended, vec![Variable::new("s"), Variable::new("n")]);

        let QueryBody::Select(query) = lift(&op) else {
            panic!("expected select");
        };
        let crate::ast::SelectVariables::Explicit(items) = &query.select.variables else {
            panic!("expected explicit projection");
        };
        assert!(matches!(items[0], SelectVariable::Var(_)));
        match &items[1] {
            SelectVariable::Expr { expr, alias, .. } => {
                assert_eq!(&*alias.name, "n");
                assert!(matches!(expr, SparqlExpr::Aggregate { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(query.modifiers.group_by.is_some());
        let having = query.modifiers.having.expect("having clause");
        assert_eq!(having.conditions.len(), 1);
        match &query.where_clause.pattern {
            GraphPattern::Group { patterns, .. } => {
                assert!(patterns.iter().all(|p| !matches!(p, GraphPattern::Filter { .. })))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_order_desc_and_slice() {
        let ordered = Operation::order_by(
            Operation::bgp(vec![pattern("s", "o")]),
            vec![Expression::operator("desc", vec![Expression::variable("o")])],
        );
        let op = Operation::slice(
            Operation::distinct(Operation::project(ordered, vec![Variable::new("s")])),
            0,
            Some(10),
        );
        let QueryBody::Select(query) = lift(&op) else {
            panic!("expected select");
        };
        assert_eq!(query.select.modifier, Some(crate::ast::SelectModifier::Distinct));
        assert_eq!(query.modifiers.limit.map(|l| l.value), Some(10));
        assert!(query.modifiers.offset.is_none());
        let order = query.modifiers.order_by.expect("order by");
        assert_eq!(order.conditions[0].direction, OrderDirection::Desc);
    }

    #[test]
    fn test_construct_keeps_template_blank_nodes() {
        let template = vec![Pattern::new(
            Term::BlankNode(crate::term::BlankNode::new("b")),
            Term::NamedNode(NamedNode::new("http://ex.org/p")),
            var("o"),
            Term::DefaultGraph,
        )];
        let op = Operation::construct(Operation::bgp(vec![pattern("s", "o")]), template);
        let QueryBody::Construct(query) = lift(&op) else {
            panic!("expected construct");
        };
        let template = query.template.expect("template");
        assert_eq!(template.triples.len(), 1);
    }

    #[test]
    fn test_plain_pattern_becomes_select_star() {
        let op = Operation::bgp(vec![pattern("s", "o")]);
        let QueryBody::Select(query) = lift(&op) else {
            panic!("expected select");
        };
        assert_eq!(query.select.variables, crate::ast::SelectVariables::Star);
    }

    #[test]
    fn test_describe_without_where() {
        let op = Operation::describe(
            Operation::bgp(Vec::new()),
            vec![Term::NamedNode(NamedNode::new("http://ex.org/x"))],
        );
        let QueryBody::Describe(query) = lift(&op) else {
            panic!("expected describe");
        };
        assert!(query.where_clause.is_none());
        assert!(matches!(query.target, DescribeTarget::Resources(ref r) if r.len() == 1));
    }
}
