//! Expression lowering.
//!
//! Operators keep their surface symbol (`&&`, `=`, `+`), built-in calls use
//! the lowercase keyword (`bound`, `regex`), and unary operators use `!`,
//! `UMINUS` and `UPLUS`. IRI-named calls become `Named` expressions.

use crate::algebra::{BoundAggregate, Expression, Node, NodeKind};
use crate::ast::expr::{Expression as SparqlExpr, FunctionName};
use crate::rewrite::{RewriteError, TransformContext, TreeRewriter};
use crate::term::{Term, TermFactory};

use super::{LowerError, LoweringContext, Result};

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    pub(super) fn lower_expression(&mut self, expr: &SparqlExpr) -> Result<Expression> {
        match expr {
            SparqlExpr::Var(v) => Ok(Expression::term(self.lower_var(v))),
            SparqlExpr::Literal(lit) => Ok(Expression::term(self.lower_literal(lit)?)),
            SparqlExpr::Iri(iri) => Ok(Expression::term(self.lower_iri(iri)?)),
            SparqlExpr::Bracketed { inner, .. } => self.lower_expression(inner),

            SparqlExpr::Binary {
                op, left, right, ..
            } => {
                let left = self.lower_expression(left)?;
                let right = self.lower_expression(right)?;
                Ok(Expression::operator(op.operator_name(), vec![left, right]))
            }

            SparqlExpr::Unary { op, operand, .. } => {
                let operand = self.lower_expression(operand)?;
                Ok(Expression::operator(op.operator_name(), vec![operand]))
            }

            SparqlExpr::FunctionCall { name, args, .. } => {
                let args = self.lower_expressions(args)?;
                match name {
                    FunctionName::Builtin(builtin) => {
                        Ok(Expression::operator(builtin.operator_name(), args))
                    }
                    FunctionName::Extension(iri) => {
                        Ok(Expression::named(self.lower_iri(iri)?, args))
                    }
                }
            }

            SparqlExpr::If {
                condition,
                then_expr,
                else_expr,
                ..
            } => Ok(Expression::operator(
                "if",
                vec![
                    self.lower_expression(condition)?,
                    self.lower_expression(then_expr)?,
                    self.lower_expression(else_expr)?,
                ],
            )),

            SparqlExpr::Coalesce { args, .. } => {
                Ok(Expression::operator("coalesce", self.lower_expressions(args)?))
            }

            SparqlExpr::In {
                expr,
                list,
                negated,
                ..
            } => {
                let mut args = Vec::with_capacity(list.len() + 1);
                args.push(self.lower_expression(expr)?);
                args.extend(self.lower_expressions(list)?);
                Ok(Expression::operator(if *negated { "notin" } else { "in" }, args))
            }

            SparqlExpr::Exists { pattern, .. } => {
                Ok(Expression::existence(false, self.lower_graph_pattern(pattern)?))
            }
            SparqlExpr::NotExists { pattern, .. } => {
                Ok(Expression::existence(true, self.lower_graph_pattern(pattern)?))
            }

            SparqlExpr::Aggregate {
                function,
                expr,
                distinct,
                separator,
                ..
            } => {
                let inner = match expr {
                    Some(e) => self.lower_expression(e)?,
                    None => Expression::Wildcard,
                };
                Ok(Expression::aggregate(
                    function.operator_name(),
                    inner,
                    *distinct,
                    separator.clone(),
                ))
            }
        }
    }

    fn lower_expressions(&mut self, exprs: &[SparqlExpr]) -> Result<Vec<Expression>> {
        exprs.iter().map(|e| self.lower_expression(e)).collect()
    }

    /// Replace every aggregate in `expr` with a variable bound in `found`.
    ///
    /// Structurally equal aggregates share one variable. Aggregates inside
    /// EXISTS are left alone.
    pub(super) fn extract_aggregates(
        &mut self,
        expr: Expression,
        found: &mut Vec<BoundAggregate>,
    ) -> Result<Expression> {
        let node = TreeRewriter::new().transform::<LowerError, _, _>(
            Node::Expression(expr),
            |view| match view.kind() {
                NodeKind::AggregateExpression | NodeKind::ExistenceExpression => {
                    TransformContext::skip()
                }
                _ => TransformContext::default(),
            },
            |node| {
                Ok(match node {
                    Node::Expression(agg @ Expression::Aggregate { .. }) => {
                        Node::Expression(self.bind_aggregate(agg, found))
                    }
                    other => other,
                })
            },
        )?;
        match node {
            Node::Expression(expr) => Ok(expr),
            other => Err(RewriteError::RootMismatch { found: other.kind() }.into()),
        }
    }

    fn bind_aggregate(&mut self, aggregate: Expression, found: &mut Vec<BoundAggregate>) -> Expression {
        if let Some(bound) = found.iter().find(|b| b.expression == aggregate) {
            return Expression::term(bound.variable.clone());
        }
        let variable = self.fresh_variable();
        found.push(BoundAggregate {
            variable: variable.clone(),
            expression: aggregate,
        });
        Expression::term(Term::Variable(variable))
    }
}
