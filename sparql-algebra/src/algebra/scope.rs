//! In-scope variables of an algebra tree.

use super::{NodeKind, NodeView, Op, Operation};
use crate::rewrite::{TransformContext, TreeRewriter};
use crate::term::{Term, Variable};
use rustc_hash::FxHashSet;

/// Collect the variables an operation can bind, in first-seen order.
///
/// A `Project` contributes only its projected variables; nothing below it is
/// visible. Terms nested in quoted triples count as well.
pub fn in_scope_variables(op: &Operation) -> Vec<Variable> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    let mut add = |var: &Variable| {
        if seen.insert(var.clone()) {
            out.push(var.clone());
        }
    };

    let result = TreeRewriter::default().visit(
        NodeView::Operation(op),
        |node| {
            if node.kind() == NodeKind::Project {
                TransformContext::skip()
            } else {
                TransformContext::default()
            }
        },
        |node| match node {
            NodeView::Pattern(p) => {
                for term in [&p.subject, &p.predicate, &p.object, &p.graph] {
                    add_term_variables(term, &mut add);
                }
            }
            NodeView::Operation(op) => match &op.node {
                Op::Extend { variable, .. } => add(variable),
                Op::Graph { name, .. } | Op::Service { name, .. } => {
                    add_term_variables(name, &mut add)
                }
                Op::Group {
                    variables,
                    aggregates,
                    ..
                } => {
                    variables.iter().for_each(&mut add);
                    aggregates.iter().for_each(|agg| add(&agg.variable));
                }
                Op::Path {
                    subject,
                    object,
                    graph,
                    ..
                } => {
                    for term in [subject, object, graph] {
                        add_term_variables(term, &mut add);
                    }
                }
                Op::Project { variables, .. } | Op::Values { variables, .. } => {
                    variables.iter().for_each(&mut add)
                }
                _ => {}
            },
            NodeView::Expression(_) | NodeView::Path(_) => {}
        },
    );
    // Read-only traversal of a well-formed tree only fails on stack overflow;
    // what was collected up to that point is still a sound prefix.
    if let Err(e) = result {
        tracing::warn!(error = %e, "in-scope variable scan truncated");
    }
    out
}

fn add_term_variables(term: &Term, add: &mut dyn FnMut(&Variable)) {
    term.for_each_nested(&mut |t| {
        if let Term::Variable(v) = t {
            add(v);
        }
    });
}
