//! Path symbols back to property paths.
//!
//! Lowering splits a negated set with both forward and inverse members into
//! `alt(nps(forward), inv(nps(inverse)))`; such alternatives are merged back
//! into a single `!(...)`.

use crate::algebra::PathSymbol;
use crate::ast::path::{NegatedPredicate, PropertyPath};
use crate::span::SourceSpan;

use super::term::lift_iri;
use super::{no_span, LiftError, Result};

pub(super) fn lift_path(path: &PathSymbol) -> Result<PropertyPath> {
    Ok(match path {
        PathSymbol::Link { iri } => PropertyPath::iri(lift_iri(iri)),
        PathSymbol::Inv { path } => match &**path {
            PathSymbol::Nps { iris } => negated(
                iris.iter()
                    .map(|iri| NegatedPredicate::Inverse(lift_iri(iri)))
                    .collect(),
            )?,
            other => PropertyPath::inverse(lift_path(other)?, no_span()),
        },
        PathSymbol::Seq { input } => fold(input, PropertyPath::sequence)?,
        PathSymbol::Alt { input } => match merged_negation(input) {
            Some(members) => negated(members)?,
            None => fold(input, PropertyPath::alternative)?,
        },
        PathSymbol::ZeroOrMore { path } => PropertyPath::zero_or_more(lift_path(path)?, no_span()),
        PathSymbol::OneOrMore { path } => PropertyPath::one_or_more(lift_path(path)?, no_span()),
        PathSymbol::ZeroOrOne { path } => PropertyPath::zero_or_one(lift_path(path)?, no_span()),
        PathSymbol::Nps { iris } => negated(
            iris.iter()
                .map(|iri| NegatedPredicate::Forward(lift_iri(iri)))
                .collect(),
        )?,
    })
}

fn negated(members: Vec<NegatedPredicate>) -> Result<PropertyPath> {
    if members.is_empty() {
        return Err(LiftError::unsupported("empty negated property set"));
    }
    Ok(PropertyPath::negated(members, no_span()))
}

/// Left fold of `seq`/`alt` members into binary path nodes.
fn fold(
    items: &[PathSymbol],
    combine: fn(PropertyPath, PropertyPath, SourceSpan) -> PropertyPath,
) -> Result<PropertyPath> {
    let mut iter = items.iter();
    let first = iter
        .next()
        .ok_or_else(|| LiftError::unsupported("path sequence or alternative without members"))?;
    iter.try_fold(lift_path(first)?, |acc, next| {
        Ok(combine(acc, lift_path(next)?, no_span()))
    })
}

/// Members of one negated set, if every alternative is a negated set.
fn merged_negation(items: &[PathSymbol]) -> Option<Vec<NegatedPredicate>> {
    if items.len() < 2 {
        return None;
    }
    let mut members = Vec::new();
    for item in items {
        match item {
            PathSymbol::Nps { iris } => {
                members.extend(iris.iter().map(|iri| NegatedPredicate::Forward(lift_iri(iri))))
            }
            PathSymbol::Inv { path } => match &**path {
                PathSymbol::Nps { iris } => members
                    .extend(iris.iter().map(|iri| NegatedPredicate::Inverse(lift_iri(iri)))),
                _ => return None,
            },
            _ => return None,
        }
    }
    Some(members)
}
