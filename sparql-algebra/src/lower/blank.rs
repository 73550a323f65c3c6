//! Blank nodes to variables.
//!
//! Blank nodes in query patterns behave like non-projectable variables, so
//! when asked, lowering renames each blank node label to a variable. A label
//! maps to the variable of the same name unless that name is taken, in which
//! case a numeric suffix is added. CONSTRUCT templates and update templates
//! keep their blank nodes, since there they mint new nodes.

use crate::algebra::{Node, NodeKind, Op, Operation};
use crate::rewrite::{TransformContext, TreeRewriter};
use crate::term::{Term, TermFactory, Variable};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

use super::{LowerError, LoweringContext, Result};

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    pub(super) fn blank_to_variable(&mut self, op: Operation) -> Result<Operation> {
        let mut mapping = FxHashMap::default();
        let op = self.rename_blanks(op, &mut mapping)?;
        debug!(renamed = mapping.len(), "rewrote blank nodes to variables");
        Ok(op)
    }

    fn rename_blanks(
        &mut self,
        op: Operation,
        mapping: &mut FxHashMap<Arc<str>, Variable>,
    ) -> Result<Operation> {
        TreeRewriter::new().transform_operation::<LowerError, _, _>(
            op,
            |view| match view.kind() {
                NodeKind::Construct | NodeKind::DeleteInsert | NodeKind::Pattern | NodeKind::Path => {
                    TransformContext::skip()
                }
                _ => TransformContext::default(),
            },
            |node| match node {
                Node::Operation(Operation {
                    node: Op::Construct { input, template },
                    metadata,
                }) => {
                    let input = self.rename_blanks(*input, mapping)?;
                    Ok(Node::Operation(Operation {
                        node: Op::Construct {
                            input: Box::new(input),
                            template,
                        },
                        metadata,
                    }))
                }
                Node::Operation(Operation {
                    node:
                        Op::DeleteInsert {
                            delete,
                            insert,
                            where_op,
                        },
                    metadata,
                }) => {
                    let where_op = match where_op {
                        Some(w) => Some(Box::new(self.rename_blanks(*w, mapping)?)),
                        None => None,
                    };
                    Ok(Node::Operation(Operation {
                        node: Op::DeleteInsert {
                            delete,
                            insert,
                            where_op,
                        },
                        metadata,
                    }))
                }
                mut node @ (Node::Pattern(_)
                | Node::Operation(Operation {
                    node: Op::Path { .. },
                    ..
                })) => {
                    node.map_own_terms(&mut |term| self.blank_term(term, mapping));
                    Ok(node)
                }
                other => Ok(other),
            },
        )
    }

    fn blank_term(&mut self, term: Term, mapping: &mut FxHashMap<Arc<str>, Variable>) -> Term {
        term.map_nested(&mut |t| match t {
            Term::BlankNode(blank) => {
                let variable = match mapping.get(&blank.value) {
                    Some(v) => v.clone(),
                    None => {
                        let v = self.unique_variable(blank.as_str());
                        mapping.insert(blank.value.clone(), v.clone());
                        v
                    }
                };
                Term::Variable(variable)
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::Pattern;
    use crate::options::LowerOptions;
    use crate::term::{BlankNode, DataFactory, NamedNode};
    use std::sync::Arc;

    fn blank_pattern(label: &str) -> Pattern {
        Pattern::new(
            Term::BlankNode(BlankNode::new(label)),
            Term::NamedNode(NamedNode::new("http://ex.org/p")),
            Term::Variable(Variable::new("o")),
            Term::DefaultGraph,
        )
    }

    #[test]
    fn test_labels_become_variables() {
        let options = LowerOptions::default().with_blank_to_variable(true);
        let mut ctx = LoweringContext::new(&DataFactory, &options);
        ctx.variables.insert(Arc::from("b"));

        let op = Operation::bgp(vec![blank_pattern("a"), blank_pattern("b"), blank_pattern("a")]);
        let renamed = ctx.blank_to_variable(op).unwrap();
        let Op::Bgp { patterns } = renamed.node else {
            panic!("expected bgp");
        };
        assert_eq!(patterns[0].subject, Term::Variable(Variable::new("a")));
        assert_eq!(patterns[1].subject, Term::Variable(Variable::new("b0")));
        assert_eq!(patterns[2].subject, Term::Variable(Variable::new("a")));
    }

    #[test]
    fn test_construct_template_keeps_blanks() {
        let options = LowerOptions::default().with_blank_to_variable(true);
        let mut ctx = LoweringContext::new(&DataFactory, &options);

        let op = Operation::construct(
            Operation::bgp(vec![blank_pattern("x")]),
            vec![blank_pattern("t")],
        );
        let renamed = ctx.blank_to_variable(op).unwrap();
        let Op::Construct { input, template } = renamed.node else {
            panic!("expected construct");
        };
        assert_eq!(template[0].subject, Term::BlankNode(BlankNode::new("t")));
        let Op::Bgp { patterns } = input.node else {
            panic!("expected bgp");
        };
        assert_eq!(patterns[0].subject, Term::Variable(Variable::new("x")));
    }
}
