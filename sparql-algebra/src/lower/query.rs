//! Query forms and solution modifiers.
//!
//! After the WHERE pattern is lowered, the remaining clauses are applied
//! bottom-up in a fixed order:
//!
//! 1. aggregates in SELECT, HAVING and ORDER BY are replaced by fresh variables
//! 2. `Group` (with `Extend`s for GROUP BY expressions)
//! 3. one `Filter` per HAVING condition
//! 4. trailing VALUES joined in
//! 5. `Extend` per SELECT expression
//! 6. `OrderBy`
//! 7. `Project` (SELECT only)
//! 8. `Distinct` / `Reduced`
//! 9. `Construct`, `Ask` or `Describe`
//! 10. `Slice`
//! 11. `From`

use crate::algebra::{BoundAggregate, Expression, Operation, Pattern};
use crate::ast::pattern::{GraphPattern, TriplePattern};
use crate::ast::query::{
    AskQuery, ConstructQuery, DatasetClause, DescribeQuery, DescribeTarget, GroupCondition,
    OrderDirection, OrderExpr, SelectModifier, SelectQuery, SelectVariable, SelectVariables,
    SolutionModifiers,
};
use crate::term::{Term, TermFactory, Variable};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

use super::pattern::FlatPredicate;
use super::scope::in_scope_variables;
use super::{LowerError, LoweringContext, Result};

/// The query form being wrapped around the solution sequence.
enum QueryForm<'q> {
    Select(&'q SelectQuery),
    Construct(&'q ConstructQuery),
    Ask,
    Describe(&'q DescribeQuery),
}

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    pub(super) fn lower_select(&mut self, query: &SelectQuery) -> Result<Operation> {
        let pattern = &query.where_clause.pattern;
        let input = self.lower_graph_pattern(pattern)?;
        self.lower_modifiers(
            QueryForm::Select(query),
            Some(pattern),
            &query.modifiers,
            query.dataset.as_ref(),
            input,
        )
    }

    pub(super) fn lower_construct(&mut self, query: &ConstructQuery) -> Result<Operation> {
        let pattern = &query.where_clause.pattern;
        let input = self.lower_graph_pattern(pattern)?;
        self.lower_modifiers(
            QueryForm::Construct(query),
            Some(pattern),
            &query.modifiers,
            query.dataset.as_ref(),
            input,
        )
    }

    pub(super) fn lower_ask(&mut self, query: &AskQuery) -> Result<Operation> {
        let pattern = &query.where_clause.pattern;
        let input = self.lower_graph_pattern(pattern)?;
        self.lower_modifiers(
            QueryForm::Ask,
            Some(pattern),
            &query.modifiers,
            query.dataset.as_ref(),
            input,
        )
    }

    pub(super) fn lower_describe(&mut self, query: &DescribeQuery) -> Result<Operation> {
        let pattern = query.where_clause.as_ref().map(|w| &w.pattern);
        let input = match pattern {
            Some(p) => self.lower_graph_pattern(p)?,
            None => Operation::bgp(Vec::new()),
        };
        self.lower_modifiers(
            QueryForm::Describe(query),
            pattern,
            &query.modifiers,
            query.dataset.as_ref(),
            input,
        )
    }

    fn lower_modifiers(
        &mut self,
        form: QueryForm<'_>,
        pattern: Option<&GraphPattern>,
        modifiers: &SolutionModifiers,
        dataset: Option<&DatasetClause>,
        mut res: Operation,
    ) -> Result<Operation> {
        let mut aggregates: Vec<BoundAggregate> = Vec::new();

        let mut selected: Vec<(Variable, Option<Expression>)> = Vec::new();
        if let QueryForm::Select(query) = &form {
            if let SelectVariables::Explicit(items) = &query.select.variables {
                for item in items {
                    match item {
                        SelectVariable::Var(v) => selected.push((self.lower_var(v), None)),
                        SelectVariable::Expr { expr, alias, .. } => {
                            let expr = self.lower_expression(expr)?;
                            let expr = self.extract_aggregates(expr, &mut aggregates)?;
                            selected.push((self.lower_var(alias), Some(expr)));
                        }
                    }
                }
            }
        }

        let mut having = Vec::new();
        if let Some(clause) = &modifiers.having {
            for condition in &clause.conditions {
                let expr = self.lower_expression(condition)?;
                having.push(self.extract_aggregates(expr, &mut aggregates)?);
            }
        }

        let mut order = Vec::new();
        if let Some(clause) = &modifiers.order_by {
            for condition in &clause.conditions {
                let expr = match &condition.expr {
                    OrderExpr::Var(v) => Expression::term(self.lower_var(v)),
                    OrderExpr::Expr(e) => {
                        let expr = self.lower_expression(e)?;
                        self.extract_aggregates(expr, &mut aggregates)?
                    }
                };
                order.push(match condition.direction {
                    OrderDirection::Desc => Expression::operator("desc", vec![expr]),
                    OrderDirection::Asc => expr,
                });
            }
        }

        if modifiers.group_by.is_some() || !aggregates.is_empty() {
            let mut variables = Vec::new();
            for condition in modifiers.group_by.iter().flat_map(|g| &g.conditions) {
                match condition {
                    GroupCondition::Var(v) => variables.push(self.lower_var(v)),
                    GroupCondition::Expr { expr, alias, .. } => {
                        let expr = self.lower_expression(expr)?;
                        let var = match alias {
                            Some(alias) => self.lower_var(alias),
                            None => self.fresh_variable(),
                        };
                        res = Operation::extend(res, var.clone(), expr);
                        variables.push(var);
                    }
                }
            }
            trace!(keys = variables.len(), aggregates = aggregates.len(), "grouping");
            res = Operation::group(res, variables, aggregates);
        }

        for condition in having {
            res = Operation::filter(res, condition);
        }

        if let Some(values) = &modifiers.values {
            let values = self.lower_values(&values.vars, &values.data)?;
            res = Operation::join(vec![res, values]);
        }

        let projection = match &form {
            QueryForm::Select(query) => match &query.select.variables {
                SelectVariables::Star => self.star_variables(pattern, modifiers),
                SelectVariables::Explicit(_) => selected.iter().map(|(v, _)| v.clone()).collect(),
            },
            _ => Vec::new(),
        };
        for (variable, expr) in selected {
            if let Some(expr) = expr {
                res = Operation::extend(res, variable, expr);
            }
        }

        if !order.is_empty() {
            res = Operation::order_by(res, order);
        }

        match form {
            QueryForm::Select(query) => {
                res = Operation::project(res, projection);
                res = match query.select.modifier {
                    Some(SelectModifier::Distinct) => Operation::distinct(res),
                    Some(SelectModifier::Reduced) => Operation::reduced(res),
                    None => res,
                };
            }
            QueryForm::Construct(query) => {
                let template = match &query.template {
                    Some(template) => self.lower_template(&template.triples, None)?,
                    None => {
                        let triples = where_triples(&query.where_clause.pattern);
                        self.lower_template(triples, None)?
                    }
                };
                res = Operation::construct(res, template);
            }
            QueryForm::Ask => res = Operation::ask(res),
            QueryForm::Describe(query) => {
                let terms = match &query.target {
                    DescribeTarget::Star => self
                        .star_variables(pattern, modifiers)
                        .into_iter()
                        .map(Term::Variable)
                        .collect(),
                    DescribeTarget::Resources(resources) => resources
                        .iter()
                        .map(|r| self.lower_var_or_iri(r))
                        .collect::<Result<Vec<_>>>()?,
                };
                res = Operation::describe(res, terms);
            }
        }

        if modifiers.limit.is_some() || modifiers.offset.is_some() {
            res = Operation::slice(
                res,
                modifiers.offset.as_ref().map_or(0, |o| o.value),
                modifiers.limit.as_ref().map(|l| l.value),
            );
        }

        if let Some(dataset) = dataset.filter(|d| !d.is_empty()) {
            let default = dataset
                .default_graphs
                .iter()
                .map(|iri| self.lower_iri(iri))
                .collect::<Result<Vec<_>>>()?;
            let named = dataset
                .named_graphs
                .iter()
                .map(|iri| self.lower_iri(iri))
                .collect::<Result<Vec<_>>>()?;
            res = Operation::from_dataset(res, default, named);
        }

        Ok(res)
    }

    /// Variables of `SELECT *` / `DESCRIBE *`: everything in scope in the
    /// WHERE pattern and the trailing VALUES, in [`star_order`].
    fn star_variables(
        &self,
        pattern: Option<&GraphPattern>,
        modifiers: &SolutionModifiers,
    ) -> Vec<Variable> {
        let mut names: BTreeSet<Arc<str>> = pattern
            .map(in_scope_variables)
            .unwrap_or_default()
            .into_iter()
            .collect();
        if let Some(values) = &modifiers.values {
            names.extend(values.vars.iter().map(|v| v.name.clone()));
        }
        let mut names: Vec<Arc<str>> = names.into_iter().collect();
        names.sort_by(|a, b| star_order(a, b));
        names.iter().map(|name| self.factory.variable(name)).collect()
    }

    /// Lower template triples to patterns in `graph` (or the default graph).
    pub(super) fn lower_template<'p>(
        &mut self,
        triples: impl IntoIterator<Item = &'p TriplePattern>,
        graph: Option<&Term>,
    ) -> Result<Vec<Pattern>> {
        let mut flat = Vec::new();
        for triple in triples {
            self.flatten_triple(triple, &mut flat)?;
        }
        let graph = graph.cloned().unwrap_or_else(|| self.factory.default_graph());
        flat.into_iter()
            .map(|triple| match triple.predicate {
                FlatPredicate::Term(predicate) => Ok(Pattern::new(
                    triple.subject,
                    predicate,
                    triple.object,
                    graph.clone(),
                )),
                FlatPredicate::Path(path) => Err(LowerError::invalid_path(
                    "property paths are not allowed in templates",
                    path.span(),
                )),
            })
            .collect()
    }
}

/// Triples of a `CONSTRUCT WHERE` pattern, which doubles as the template.
fn where_triples(pattern: &GraphPattern) -> Vec<&TriplePattern> {
    match pattern {
        GraphPattern::Bgp { patterns, .. } => patterns.iter().collect(),
        GraphPattern::Group { patterns, .. } => patterns.iter().flat_map(where_triples).collect(),
        _ => Vec::new(),
    }
}

/// Case-insensitive name order; among names equal up to case, lowercase
/// sorts first.
pub(super) fn star_order(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<String>();
    folded(a).cmp(&folded(b)).then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use crate::algebra::{Expression, Op};
    use crate::ast::*;
    use crate::lower::lower;
    use crate::options::LowerOptions;
    use crate::span::SourceSpan;

    fn span() -> SourceSpan {
        SourceSpan::default()
    }

    fn var(name: &str) -> Var {
        Var::new(name, span())
    }

    fn where_clause() -> WhereClause {
        let triple = TriplePattern::new(
            Term::Var(var("s")),
            VarOrIri::Iri(Iri::full("http://ex.org/p", span())),
            Term::Var(var("o")),
            span(),
        );
        WhereClause::new(
            GraphPattern::group(vec![GraphPattern::bgp(vec![triple], span())], span()),
            true,
            span(),
        )
    }

    fn select(select: SelectClause, modifiers: SolutionModifiers) -> SparqlAst {
        let query = SelectQuery::new(select, where_clause(), modifiers, span());
        SparqlAst::new(Prologue::new(), QueryBody::Select(query), span())
    }

    #[test]
    fn test_select_star_projects_sorted_scope() {
        let ast = select(SelectClause::star(span()), SolutionModifiers::new());
        let op = lower(&ast, &LowerOptions::default()).unwrap();
        match op.node {
            Op::Project { variables, .. } => {
                let names: Vec<&str> = variables.iter().map(|v| v.as_str()).collect();
                assert_eq!(names, vec!["o", "s"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_star_order_ignores_case() {
        let mut names = vec!["b", "B", "a", "C", "z"];
        names.sort_by(|a, b| super::star_order(a, b));
        assert_eq!(names, vec!["a", "b", "B", "C", "z"]);
    }

    #[test]
    fn test_select_star_mixed_case_order() {
        let triple = TriplePattern::new(
            Term::Var(var("b")),
            VarOrIri::Iri(Iri::full("http://ex.org/p", span())),
            Term::Var(var("Age")),
            span(),
        );
        let where_clause = WhereClause::new(
            GraphPattern::group(vec![GraphPattern::bgp(vec![triple], span())], span()),
            true,
            span(),
        );
        let query = SelectQuery::new(
            SelectClause::star(span()),
            where_clause,
            SolutionModifiers::new(),
            span(),
        );
        let ast = SparqlAst::new(Prologue::new(), QueryBody::Select(query), span());
        let op = lower(&ast, &LowerOptions::default()).unwrap();
        let Op::Project { variables, .. } = op.node else {
            panic!("expected project");
        };
        let names: Vec<&str> = variables.iter().map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["Age", "b"]);
    }

    #[test]
    fn test_limit_offset_slice() {
        let ast = select(
            SelectClause::star(span()),
            SolutionModifiers::new()
                .with_limit(LimitClause::new(10, span()))
                .with_offset(OffsetClause::new(5, span())),
        );
        let op = lower(&ast, &LowerOptions::default()).unwrap();
        match op.node {
            Op::Slice { start, length, .. } => {
                assert_eq!(start, 5);
                assert_eq!(length, Some(10));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_count_alias_groups_and_extends() {
        let count = Expression::aggregate("count", Expression::variable("o"), false, None);
        let ast = select(
            SelectClause::variables(
                vec![SelectVariable::Expr {
                    expr: crate::ast::Expression::Aggregate {
                        function: AggregateFunction::Count,
                        expr: Some(Box::new(crate::ast::Expression::var(var("o")))),
                        distinct: false,
                        separator: None,
                        span: span(),
                    },
                    alias: var("n"),
                    span: span(),
                }],
                span(),
            ),
            SolutionModifiers::new(),
        );
        let op = lower(&ast, &LowerOptions::default()).unwrap();
        let Op::Project { input, variables } = op.node else {
            panic!("expected project");
        };
        assert_eq!(variables[0].as_str(), "n");
        let Op::Extend {
            input,
            variable,
            expression,
        } = input.node
        else {
            panic!("expected extend");
        };
        assert_eq!(variable.as_str(), "n");
        assert_eq!(expression, Expression::variable("var0"));
        let Op::Group { aggregates, .. } = input.node else {
            panic!("expected group");
        };
        assert_eq!(aggregates[0].variable.as_str(), "var0");
        assert_eq!(aggregates[0].expression, count);
    }
}
