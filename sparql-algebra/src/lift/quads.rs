//! Removing graph names embedded into patterns.
//!
//! In quad mode, lowering writes the graph of a `GRAPH` block into every
//! pattern below it and keeps the `Graph` operation. Removal undoes that in
//! two rewrites:
//!
//! 1. Below each `Graph` operation, patterns and paths whose graph is the
//!    block's name go back to the default graph. Nested `Graph` operations
//!    are handled on their own.
//! 2. Patterns and paths still carrying a graph (for example from an update
//!    `WITH`) are wrapped in a `Graph` operation of their own. A basic graph
//!    pattern mixing graphs is split into one part per graph, joined.
//!
//! `DeleteInsert` operations are left alone; update lifting removes quads
//! from their WHERE separately.

use crate::algebra::{Node, NodeKind, Op, Operation, Pattern};
use crate::rewrite::{Rewriter, TransformContext};
use crate::term::Term;
use tracing::debug;

use super::{LiftError, Result};

/// Remove embedded graph names from `op`.
pub fn remove_quads(op: Operation) -> Result<Operation> {
    let op = clear_block_graphs(op)?;
    let op = wrap_foreign_graphs(op)?;
    debug!(op = op.type_name(), "removed embedded graph names");
    Ok(op)
}

fn clear_block_graphs(op: Operation) -> Result<Operation> {
    Rewriter::<LiftError>::new()
        .previsit(NodeKind::DeleteInsert, |_| TransformContext::skip())
        .on(NodeKind::Graph, |node| match node {
            Node::Operation(Operation {
                node: Op::Graph { input, name },
                metadata,
            }) => {
                let input = clear_graph(*input, &name)?;
                Ok(Node::Operation(Operation {
                    node: Op::Graph {
                        input: Box::new(input),
                        name,
                    },
                    metadata,
                }))
            }
            other => Ok(other),
        })
        .rewrite_operation(op)
}

/// Reset `name` to the default graph in every pattern and path of `op`,
/// outside nested `Graph` operations.
fn clear_graph(op: Operation, name: &Term) -> Result<Operation> {
    Rewriter::<LiftError>::new()
        .previsit(NodeKind::Graph, |_| TransformContext::skip())
        .previsit(NodeKind::DeleteInsert, |_| TransformContext::skip())
        .on(NodeKind::Pattern, |node| {
            Ok(match node {
                Node::Pattern(mut pattern) if pattern.graph == *name => {
                    pattern.graph = Term::DefaultGraph;
                    Node::Pattern(pattern)
                }
                other => other,
            })
        })
        .on(NodeKind::Path, |mut node| {
            if let Node::Operation(Operation {
                node: Op::Path { graph, .. },
                ..
            }) = &mut node
            {
                if graph == name {
                    *graph = Term::DefaultGraph;
                }
            }
            Ok(node)
        })
        .rewrite_operation(op)
}

fn wrap_foreign_graphs(op: Operation) -> Result<Operation> {
    Rewriter::<LiftError>::new()
        .previsit(NodeKind::DeleteInsert, |_| TransformContext::skip())
        .on(NodeKind::Bgp, |node| {
            Ok(match node {
                Node::Operation(Operation {
                    node: Op::Bgp { patterns },
                    metadata,
                }) => Node::Operation(Operation {
                    metadata,
                    ..split_bgp(patterns)
                }),
                other => other,
            })
        })
        .on(NodeKind::Path, |node| {
            Ok(match node {
                Node::Operation(Operation {
                    node:
                        Op::Path {
                            subject,
                            predicate,
                            object,
                            graph,
                        },
                    metadata,
                }) if !graph.is_default_graph() => {
                    let path = Operation {
                        node: Op::Path {
                            subject,
                            predicate,
                            object,
                            graph: Term::DefaultGraph,
                        },
                        metadata,
                    };
                    Node::Operation(Operation::graph(path, graph))
                }
                other => other,
            })
        })
        .rewrite_operation(op)
}

/// One part per graph, in first-seen order.
fn split_bgp(patterns: Vec<Pattern>) -> Operation {
    if patterns.iter().all(|p| p.graph.is_default_graph()) {
        return Operation::bgp(patterns);
    }

    let mut parts: Vec<(Term, Vec<Pattern>)> = Vec::new();
    for mut pattern in patterns {
        let graph = std::mem::replace(&mut pattern.graph, Term::DefaultGraph);
        match parts.iter_mut().find(|(name, _)| *name == graph) {
            Some((_, group)) => group.push(pattern),
            None => parts.push((graph, vec![pattern])),
        }
    }

    let mut ops: Vec<Operation> = parts
        .into_iter()
        .map(|(graph, patterns)| {
            if graph.is_default_graph() {
                Operation::bgp(patterns)
            } else {
                Operation::graph(Operation::bgp(patterns), graph)
            }
        })
        .collect();
    match ops.len() {
        1 => ops.remove(0),
        _ => Operation::join(ops),
    }
}
