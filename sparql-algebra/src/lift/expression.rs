//! Expression lifting.
//!
//! Operator names map back through the same tables lowering uses:
//! [`BinaryOp::from_operator_name`], [`UnaryOp::from_operator_name`] and
//! [`FunctionName::from_operator_name`], plus the special forms `if`, `coalesce`, `in` and
//! `notin`.

use crate::algebra::Expression;
use crate::ast::expr::{AggregateFunction, BinaryOp, Expression as SparqlExpr, FunctionName, UnaryOp};
use crate::ast::pattern::GraphPattern;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use super::pattern::group_of;
use super::term::{lift_expression_term, lift_iri};
use super::{no_span, LiftError, LiftingContext, Result};

impl LiftingContext {
    pub(super) fn lift_expression(&mut self, expr: &Expression) -> Result<SparqlExpr> {
        match expr {
            Expression::Term { term } => lift_expression_term(term),
            Expression::Operator { operator, args } => {
                let args = self.lift_expressions(args)?;
                lift_operator(operator, args)
            }
            Expression::Named { name, args } => Ok(SparqlExpr::function_call(
                FunctionName::Extension(lift_iri(name)),
                self.lift_expressions(args)?,
                no_span(),
            )),
            Expression::Aggregate {
                aggregator,
                expression,
                distinct,
                separator,
            } => {
                let function = AggregateFunction::from_operator_name(aggregator).ok_or_else(|| {
                    LiftError::unsupported(format!("unknown aggregate {aggregator}"))
                })?;
                let expr = match &**expression {
                    Expression::Wildcard => None,
                    inner => Some(Box::new(self.lift_expression(inner)?)),
                };
                Ok(SparqlExpr::Aggregate {
                    function,
                    expr,
                    distinct: *distinct,
                    separator: separator.clone(),
                    span: no_span(),
                })
            }
            Expression::Existence { not, input } => {
                // The pattern is a scope of its own
                self.project = false;
                let pattern = Box::new(group_of(self.lift_patterns(input)?));
                Ok(if *not {
                    SparqlExpr::NotExists {
                        pattern,
                        span: no_span(),
                    }
                } else {
                    SparqlExpr::Exists {
                        pattern,
                        span: no_span(),
                    }
                })
            }
            Expression::Wildcard => Err(LiftError::unsupported("wildcard outside an aggregate")),
        }
    }

    fn lift_expressions(&mut self, exprs: &[Expression]) -> Result<Vec<SparqlExpr>> {
        exprs.iter().map(|e| self.lift_expression(e)).collect()
    }
}

fn lift_operator(name: &str, args: Vec<SparqlExpr>) -> Result<SparqlExpr> {
    let arity = |expected: &str| {
        LiftError::unsupported(format!("operator {name} expects {expected} arguments"))
    };

    if let Some(op) = BinaryOp::from_operator_name(name) {
        let [left, right]: [SparqlExpr; 2] = args.try_into().map_err(|_| arity("2"))?;
        return Ok(SparqlExpr::binary(op, left, right, no_span()));
    }
    if let Some(op) = UnaryOp::from_operator_name(name) {
        let [operand]: [SparqlExpr; 1] = args.try_into().map_err(|_| arity("1"))?;
        return Ok(SparqlExpr::unary(op, operand, no_span()));
    }

    match name {
        "if" => {
            let [condition, then_expr, else_expr]: [SparqlExpr; 3] =
                args.try_into().map_err(|_| arity("3"))?;
            Ok(SparqlExpr::If {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                span: no_span(),
            })
        }
        "coalesce" => Ok(SparqlExpr::Coalesce {
            args,
            span: no_span(),
        }),
        "in" | "notin" => {
            let mut args = args.into_iter();
            let expr = args.next().ok_or_else(|| arity("at least 1"))?;
            Ok(SparqlExpr::In {
                expr: Box::new(expr),
                list: args.collect(),
                negated: name == "notin",
                span: no_span(),
            })
        }
        "desc" => Err(LiftError::unsupported("descending key outside ORDER BY")),
        _ => FunctionName::from_operator_name(name)
            .map(|function| SparqlExpr::function_call(function, args, no_span()))
            .ok_or_else(|| LiftError::unsupported(format!("unknown operator {name}"))),
    }
}

/// Replace variables by expressions, reporting whether any was replaced.
///
/// EXISTS patterns are not entered.
pub(super) fn substitute_variables(
    expr: SparqlExpr,
    replacements: &FxHashMap<Arc<str>, SparqlExpr>,
    replaced: &mut bool,
) -> SparqlExpr {
    if let SparqlExpr::Var(var) = &expr {
        if let Some(replacement) = replacements.get(&var.name) {
            *replaced = true;
            return replacement.clone();
        }
    }

    let mut sub = |e: SparqlExpr| substitute_variables(e, replacements, replaced);
    match expr {
        SparqlExpr::Binary {
            op,
            left,
            right,
            span,
        } => SparqlExpr::Binary {
            op,
            left: Box::new(sub(*left)),
            right: Box::new(sub(*right)),
            span,
        },
        SparqlExpr::Unary { op, operand, span } => SparqlExpr::Unary {
            op,
            operand: Box::new(sub(*operand)),
            span,
        },
        SparqlExpr::FunctionCall {
            name,
            args,
            distinct,
            span,
        } => SparqlExpr::FunctionCall {
            name,
            args: args.into_iter().map(&mut sub).collect(),
            distinct,
            span,
        },
        SparqlExpr::If {
            condition,
            then_expr,
            else_expr,
            span,
        } => SparqlExpr::If {
            condition: Box::new(sub(*condition)),
            then_expr: Box::new(sub(*then_expr)),
            else_expr: Box::new(sub(*else_expr)),
            span,
        },
        SparqlExpr::Coalesce { args, span } => SparqlExpr::Coalesce {
            args: args.into_iter().map(&mut sub).collect(),
            span,
        },
        SparqlExpr::In {
            expr,
            list,
            negated,
            span,
        } => SparqlExpr::In {
            expr: Box::new(sub(*expr)),
            list: list.into_iter().map(&mut sub).collect(),
            negated,
            span,
        },
        SparqlExpr::Bracketed { inner, span } => SparqlExpr::Bracketed {
            inner: Box::new(sub(*inner)),
            span,
        },
        other @ (SparqlExpr::Var(_)
        | SparqlExpr::Literal(_)
        | SparqlExpr::Iri(_)
        | SparqlExpr::Exists { .. }
        | SparqlExpr::NotExists { .. }
        | SparqlExpr::Aggregate { .. }) => other,
    }
}

/// Move every FILTER that mentions one of `replacements` out of `patterns`
/// (and nested groups) into `having`, with the replacements applied.
pub(super) fn extract_having(
    patterns: Vec<GraphPattern>,
    replacements: &FxHashMap<Arc<str>, SparqlExpr>,
    having: &mut Vec<SparqlExpr>,
) -> Vec<GraphPattern> {
    let mut out = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        match pattern {
            GraphPattern::Filter { expr, span } => {
                let mut replaced = false;
                let substituted = substitute_variables(expr.clone(), replacements, &mut replaced);
                if replaced {
                    having.push(substituted);
                } else {
                    out.push(GraphPattern::Filter { expr, span });
                }
            }
            GraphPattern::Group { patterns, span } => out.push(GraphPattern::Group {
                patterns: extract_having(patterns, replacements, having),
                span,
            }),
            other => out.push(other),
        }
    }
    out
}
