//! Embedding GRAPH names into patterns (quad mode).
//!
//! Every pattern and path below a `GRAPH ?g { ... }` whose graph is still the
//! default graph gets `?g` as its graph. When a subquery projects `?g` away,
//! or a BIND inside it rebinds `?g`, the variable is not the outer one any
//! more: from there down, occurrences of `?g` are renamed to a fresh variable.
//! The renaming continues through nested GRAPH and SERVICE blocks, whose
//! patterns keep the graph they were given.

use crate::algebra::{Node, Op, Operation, Pattern};
use crate::rewrite::RewriteError;
use crate::term::{Term, TermFactory, Variable};
use tracing::trace;

use super::{LoweringContext, Result};

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    /// Embed `name` as the graph of every default-graph pattern in `op`.
    pub(super) fn recurse_graph(&mut self, op: Operation, name: &Term) -> Result<Operation> {
        trace!(graph = %name, "embedding graph name");
        self.embed_operation(op, name, None, true)
    }

    /// With `embed` unset only the renaming is applied.
    fn embed_operation(
        &mut self,
        mut op: Operation,
        name: &Term,
        replacement: Option<&Variable>,
        embed: bool,
    ) -> Result<Operation> {
        let nested = matches!(op.node, Op::Graph { .. } | Op::Service { .. });
        if replacement.is_none() && (nested || !embed) {
            // Nested GRAPH blocks were embedded with their own name already
            return Ok(op);
        }
        let embed = embed && !nested;

        match &mut op.node {
            Op::Bgp { patterns } => {
                for pattern in patterns.iter_mut() {
                    embed_pattern(pattern, name, replacement, embed);
                }
                return Ok(op);
            }
            Op::Path {
                subject,
                object,
                graph,
                ..
            } => {
                substitute(subject, name, replacement);
                substitute(object, name, replacement);
                if embed && graph.is_default_graph() {
                    *graph = name.clone();
                } else {
                    substitute(graph, name, replacement);
                }
                return Ok(op);
            }
            Op::Project { variables, input } if replacement.is_none() => {
                let shadowed = (!variables.iter().any(|v| is_name(v, name)))
                    .then(|| self.fresh_variable());
                let inner = std::mem::take(&mut **input);
                **input = self.embed_operation(inner, name, shadowed.as_ref(), embed)?;
                return Ok(op);
            }
            Op::Extend {
                variable, input, ..
            } if replacement.is_none() => {
                let shadowed = is_name(variable, name).then(|| self.fresh_variable());
                let inner = std::mem::take(&mut **input);
                **input = self.embed_operation(inner, name, shadowed.as_ref(), embed)?;
                return Ok(op);
            }
            _ => {}
        }

        match self.embed_node(Node::Operation(op), name, replacement, embed)? {
            Node::Operation(op) => Ok(op),
            other => Err(RewriteError::RootMismatch { found: other.kind() }.into()),
        }
    }

    fn embed_node(
        &mut self,
        mut node: Node,
        name: &Term,
        replacement: Option<&Variable>,
        embed: bool,
    ) -> Result<Node> {
        let parent = node.kind();
        let children = node
            .take_children()
            .into_iter()
            .map(|child| match child {
                Node::Operation(op) => self
                    .embed_operation(op, name, replacement, embed)
                    .map(Node::Operation),
                Node::Pattern(mut pattern) => {
                    embed_pattern(&mut pattern, name, replacement, embed);
                    Ok(Node::Pattern(pattern))
                }
                other => self.embed_node(other, name, replacement, embed),
            })
            .collect::<Result<Vec<_>>>()?;
        node.put_children(children)
            .map_err(|_| RewriteError::ChildMismatch { parent })?;

        if let Some(var) = replacement {
            node.map_own_terms(&mut |term| {
                if &term == name {
                    Term::Variable(var.clone())
                } else {
                    term
                }
            });
        }
        Ok(node)
    }
}

fn is_name(var: &Variable, name: &Term) -> bool {
    matches!(name, Term::Variable(v) if v == var)
}

fn substitute(term: &mut Term, name: &Term, replacement: Option<&Variable>) {
    if let Some(var) = replacement {
        if term == name {
            *term = Term::Variable(var.clone());
        }
    }
}

fn embed_pattern(pattern: &mut Pattern, name: &Term, replacement: Option<&Variable>, embed: bool) {
    substitute(&mut pattern.subject, name, replacement);
    substitute(&mut pattern.predicate, name, replacement);
    substitute(&mut pattern.object, name, replacement);
    if embed && pattern.graph.is_default_graph() {
        pattern.graph = name.clone();
    } else {
        substitute(&mut pattern.graph, name, replacement);
    }
}
