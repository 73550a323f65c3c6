//! Property path lowering.
//!
//! Converts a path expression in predicate position (e.g., `?s ex:knows/ex:name ?o`)
//! into algebra. Paths that reduce to plain links are rewritten into ordinary
//! patterns: `^p` swaps subject and object, and a sequence chains fresh
//! variables between its steps. Everything else stays a `Path` operation.

use crate::algebra::{Operation, PathSymbol, Pattern};
use crate::ast::path::{NegatedPredicate, PropertyPath};
use crate::term::{Term, TermFactory};
use sparql_vocab::rdf;
use tracing::trace;

use super::{LowerError, LoweringContext, Result};

/// One piece of a lowered path triple.
pub(super) enum PathFragment {
    Pattern(Pattern),
    Path(Operation),
}

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    /// Lower `subject path object` into patterns and path operations.
    pub(super) fn lower_path(
        &mut self,
        subject: Term,
        path: &PropertyPath,
        object: Term,
    ) -> Result<Vec<PathFragment>> {
        let symbol = self.lower_path_symbol(path)?;
        let mut out = Vec::new();
        self.simplify_path(subject, symbol, object, &mut out);
        trace!(fragments = out.len(), "lowered property path");
        Ok(out)
    }

    pub(super) fn lower_path_symbol(&mut self, path: &PropertyPath) -> Result<PathSymbol> {
        Ok(match path {
            PropertyPath::Iri(iri) => PathSymbol::link(self.lower_iri(iri)?),
            PropertyPath::A { .. } => PathSymbol::link(self.rdf(rdf::TYPE)),
            PropertyPath::Group { path, .. } => self.lower_path_symbol(path)?,
            PropertyPath::Inverse { path, .. } => PathSymbol::inv(self.lower_path_symbol(path)?),
            PropertyPath::Sequence { left, right, .. } => PathSymbol::seq(vec![
                self.lower_path_symbol(left)?,
                self.lower_path_symbol(right)?,
            ]),
            PropertyPath::Alternative { left, right, .. } => PathSymbol::alt(vec![
                self.lower_path_symbol(left)?,
                self.lower_path_symbol(right)?,
            ]),
            PropertyPath::ZeroOrMore { path, .. } => {
                PathSymbol::zero_or_more(self.lower_path_symbol(path)?)
            }
            PropertyPath::OneOrMore { path, .. } => {
                PathSymbol::one_or_more(self.lower_path_symbol(path)?)
            }
            PropertyPath::ZeroOrOne { path, .. } => {
                PathSymbol::zero_or_one(self.lower_path_symbol(path)?)
            }
            PropertyPath::NegatedSet { iris, span } => {
                if iris.is_empty() {
                    return Err(LowerError::invalid_path(
                        "negated property set must not be empty",
                        *span,
                    ));
                }
                self.lower_negated_set(iris)?
            }
        })
    }

    /// `!(a|^b)` splits into a forward set and an inverted set.
    fn lower_negated_set(&mut self, members: &[NegatedPredicate]) -> Result<PathSymbol> {
        let mut forward = Vec::new();
        let mut inverse = Vec::new();
        for member in members {
            let iri = self.lower_iri(&member.to_iri())?;
            if member.is_inverse() {
                inverse.push(iri);
            } else {
                forward.push(iri);
            }
        }
        Ok(match (forward.is_empty(), inverse.is_empty()) {
            (false, true) => PathSymbol::nps(forward),
            (true, false) => PathSymbol::inv(PathSymbol::nps(inverse)),
            _ => PathSymbol::alt(vec![
                PathSymbol::nps(forward),
                PathSymbol::inv(PathSymbol::nps(inverse)),
            ]),
        })
    }

    fn simplify_path(
        &mut self,
        subject: Term,
        symbol: PathSymbol,
        object: Term,
        out: &mut Vec<PathFragment>,
    ) {
        match symbol {
            PathSymbol::Link { iri } => out.push(PathFragment::Pattern(Pattern::new(
                subject,
                Term::NamedNode(iri),
                object,
                self.factory.default_graph(),
            ))),
            PathSymbol::Inv { path } => self.simplify_path(object, *path, subject, out),
            PathSymbol::Seq { mut input } => match input.pop() {
                Some(last) => {
                    let mut current = subject;
                    for step in input {
                        let next = Term::Variable(self.fresh_variable());
                        self.simplify_path(current, step, next.clone(), out);
                        current = next;
                    }
                    self.simplify_path(current, last, object, out);
                }
                None => out.push(PathFragment::Path(Operation::path(
                    subject,
                    PathSymbol::Seq { input },
                    object,
                    self.factory.default_graph(),
                ))),
            },
            other => out.push(PathFragment::Path(Operation::path(
                subject,
                other,
                object,
                self.factory.default_graph(),
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Op;
    use crate::ast::term::Iri;
    use crate::options::LowerOptions;
    use crate::span::SourceSpan;
    use crate::term::{DataFactory, NamedNode, Variable};

    fn span() -> SourceSpan {
        SourceSpan::default()
    }

    fn iri(local: &str) -> PropertyPath {
        PropertyPath::iri(Iri::full(format!("http://ex.org/{local}"), span()))
    }

    fn var(name: &str) -> Term {
        Term::Variable(Variable::new(name))
    }

    fn lower(path: &PropertyPath) -> Vec<PathFragment> {
        let options = LowerOptions::default();
        let mut ctx = LoweringContext::new(&DataFactory, &options);
        ctx.lower_path(var("s"), path, var("o")).unwrap()
    }

    #[test]
    fn test_inverse_link_swaps_positions() {
        let fragments = lower(&PropertyPath::inverse(iri("p"), span()));
        assert_eq!(fragments.len(), 1);
        match &fragments[0] {
            PathFragment::Pattern(p) => {
                assert_eq!(p.subject, var("o"));
                assert_eq!(p.object, var("s"));
            }
            PathFragment::Path(_) => panic!("expected a pattern"),
        }
    }

    #[test]
    fn test_sequence_chains_fresh_variables() {
        let path = PropertyPath::sequence(
            iri("a"),
            PropertyPath::sequence(iri("b"), iri("c"), span()),
            span(),
        );
        let fragments = lower(&path);
        let patterns: Vec<&Pattern> = fragments
            .iter()
            .map(|f| match f {
                PathFragment::Pattern(p) => p,
                PathFragment::Path(_) => panic!("expected patterns only"),
            })
            .collect();
        assert_eq!(patterns.len(), 3);
        assert_eq!(patterns[0].subject, var("s"));
        assert_eq!(patterns[0].object, var("var0"));
        assert_eq!(patterns[1].subject, var("var0"));
        assert_eq!(patterns[1].object, var("var1"));
        assert_eq!(patterns[2].subject, var("var1"));
        assert_eq!(patterns[2].object, var("o"));
    }

    #[test]
    fn test_star_stays_a_path() {
        let fragments = lower(&PropertyPath::zero_or_more(iri("p"), span()));
        match &fragments[..] {
            [PathFragment::Path(op)] => match &op.node {
                Op::Path { predicate, .. } => assert_eq!(
                    predicate,
                    &PathSymbol::zero_or_more(PathSymbol::link(NamedNode::new("http://ex.org/p")))
                ),
                other => panic!("unexpected {other:?}"),
            },
            _ => panic!("expected one path operation"),
        }
    }

    #[test]
    fn test_mixed_negated_set() {
        let options = LowerOptions::default();
        let mut ctx = LoweringContext::new(&DataFactory, &options);
        let path = PropertyPath::negated(
            vec![
                NegatedPredicate::Forward(Iri::full("http://ex.org/a", span())),
                NegatedPredicate::InverseA { span: span() },
            ],
            span(),
        );
        let symbol = ctx.lower_path_symbol(&path).unwrap();
        assert_eq!(
            symbol,
            PathSymbol::alt(vec![
                PathSymbol::nps(vec![NamedNode::new("http://ex.org/a")]),
                PathSymbol::inv(PathSymbol::nps(vec![NamedNode::new(rdf::TYPE)])),
            ])
        );
    }

    #[test]
    fn test_empty_negated_set_is_rejected() {
        let options = LowerOptions::default();
        let mut ctx = LoweringContext::new(&DataFactory, &options);
        let err = ctx
            .lower_path_symbol(&PropertyPath::negated(vec![], span()))
            .unwrap_err();
        assert!(matches!(err, LowerError::InvalidPath { .. }));
    }
}
