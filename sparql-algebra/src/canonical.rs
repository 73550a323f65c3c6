//! Canonical renaming for structural comparison.
//!
//! [`canonicalize`] replaces every blank node, and optionally every variable,
//! by `value_0`, `value_1`, ... in the order the names are first met. Two
//! trees that differ only in naming canonicalize to equal trees.
//!
//! The traversal is the rewriter's post-order: children in field order, then
//! the node's own term fields. A `Construct` visits its input first and then
//! its template; template blank nodes keep their labels, template variables
//! share the mapping of the input.

use crate::algebra::{Node, NodeKind, Op, Operation, Pattern};
use crate::rewrite::{RewriteError, TransformContext, TreeRewriter};
use crate::term::{BlankNode, Term, Variable};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Rename blank nodes (and variables when `rename_variables`) deterministically.
///
/// ```
/// use sparql_algebra::algebra::{Operation, Pattern};
/// use sparql_algebra::canonicalize;
/// use sparql_algebra::term::{NamedNode, Term, Variable};
///
/// let bgp = |s: &str, o: &str| {
///     Operation::bgp(vec![Pattern::new(
///         Term::Variable(Variable::new(s)),
///         Term::NamedNode(NamedNode::new("http://ex.org/p")),
///         Term::Variable(Variable::new(o)),
///         Term::DefaultGraph,
///     )])
/// };
///
/// let left = canonicalize(&bgp("a", "b"), true).unwrap();
/// let right = canonicalize(&bgp("x", "y"), true).unwrap();
/// assert_eq!(left, right);
/// ```
pub fn canonicalize(op: &Operation, rename_variables: bool) -> Result<Operation, RewriteError> {
    let span = debug_span!("sparql_canonicalize", op = op.type_name(), rename_variables);
    let _guard = span.enter();

    let mut names = Names::new(rename_variables);
    let op = names.rename_operation(op.clone())?;
    debug!(renamed = names.counter, "canonicalization complete");
    Ok(op)
}

struct Names {
    rename_variables: bool,
    variables: FxHashMap<Arc<str>, Arc<str>>,
    blanks: FxHashMap<Arc<str>, Arc<str>>,
    counter: usize,
}

impl Names {
    fn new(rename_variables: bool) -> Self {
        Self {
            rename_variables,
            variables: FxHashMap::default(),
            blanks: FxHashMap::default(),
            counter: 0,
        }
    }

    fn rename_operation(&mut self, op: Operation) -> Result<Operation, RewriteError> {
        TreeRewriter::new().transform_operation::<RewriteError, _, _>(
            op,
            |view| match view.kind() {
                NodeKind::Construct => TransformContext::skip(),
                _ => TransformContext::default(),
            },
            |node| match node {
                Node::Operation(Operation {
                    node: Op::Construct { input, template },
                    metadata,
                }) => {
                    let input = self.rename_operation(*input)?;
                    let template = template
                        .into_iter()
                        .map(|pattern| self.rename_template(pattern))
                        .collect();
                    Ok(Node::Operation(Operation {
                        node: Op::Construct {
                            input: Box::new(input),
                            template,
                        },
                        metadata,
                    }))
                }
                mut node => {
                    node.map_own_terms(&mut |term| self.rename_term(term, true));
                    Ok(node)
                }
            },
        )
    }

    fn rename_template(&mut self, pattern: Pattern) -> Pattern {
        let Pattern {
            subject,
            predicate,
            object,
            graph,
        } = pattern;
        Pattern::new(
            self.rename_term(subject, false),
            self.rename_term(predicate, false),
            self.rename_term(object, false),
            self.rename_term(graph, false),
        )
    }

    fn rename_term(&mut self, term: Term, blanks: bool) -> Term {
        term.map_nested(&mut |t| match t {
            Term::Variable(var) if self.rename_variables => {
                Term::Variable(Variable::new(self.name_for(false, &var.value)))
            }
            Term::BlankNode(blank) if blanks => {
                Term::BlankNode(BlankNode::new(self.name_for(true, &blank.value)))
            }
            other => other,
        })
    }

    /// First-seen wins; variables and blank nodes share one counter.
    fn name_for(&mut self, blank: bool, label: &Arc<str>) -> Arc<str> {
        let map = if blank {
            &mut self.blanks
        } else {
            &mut self.variables
        };
        if let Some(name) = map.get(label) {
            return name.clone();
        }
        let name: Arc<str> = Arc::from(format!("value_{}", self.counter));
        self.counter += 1;
        map.insert(label.clone(), name.clone());
        name
    }
}
