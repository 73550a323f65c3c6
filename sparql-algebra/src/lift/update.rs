//! Update lifting.
//!
//! `DeleteInsert` lifts to the most specific update form that lowers back to
//! it:
//!
//! - no DELETE template and no WHERE: `INSERT DATA`
//! - no INSERT template and no WHERE: `DELETE WHERE` if the template has
//!   variables, `DELETE DATA` otherwise
//! - no INSERT template and a WHERE that is exactly the DELETE template as a
//!   basic graph pattern: `DELETE WHERE`
//! - anything else: `DELETE/INSERT ... WHERE`
//!
//! Templates are grouped by graph into `GRAPH g { ... }` blocks.

use crate::algebra::{GraphTarget, Op, Operation, Pattern};
use crate::ast::update::{
    Create, DeleteData, DeleteWhere, GraphManagement, GraphOrDefault, GraphRefAll, GraphTransfer,
    InsertData, Load, Modify, QuadPattern, Quads, UpdateOperation, UpdateRequest, UpdateUnit,
    UsingClause, WherePattern,
};
use crate::term::Term;

use super::pattern::group_of;
use super::quads::remove_quads;
use super::term::{lift_iri, lift_triple, lift_var_or_iri};
use super::{no_span, LiftError, LiftingContext, Result};

impl LiftingContext {
    pub(super) fn lift_update_request(&mut self, op: &Operation) -> Result<UpdateRequest> {
        let operations = match &op.node {
            Op::Nop => Vec::new(),
            Op::CompositeUpdate { updates } => updates
                .iter()
                .map(|update| self.lift_update(update).map(UpdateUnit::new))
                .collect::<Result<Vec<_>>>()?,
            _ => vec![UpdateUnit::new(self.lift_update(op)?)],
        };
        Ok(UpdateRequest::new(operations, no_span()))
    }

    fn lift_update(&mut self, op: &Operation) -> Result<UpdateOperation> {
        Ok(match &op.node {
            Op::DeleteInsert {
                delete,
                insert,
                where_op,
            } => self.lift_delete_insert(delete.as_deref(), insert.as_deref(), where_op.as_deref())?,
            Op::Load {
                source,
                destination,
                silent,
            } => UpdateOperation::Load(Load {
                silent: *silent,
                source: lift_iri(source),
                destination: destination.as_ref().map(lift_iri),
                span: no_span(),
            }),
            Op::Clear { source, silent } => UpdateOperation::Clear(GraphManagement {
                silent: *silent,
                target: graph_ref_all(source),
                span: no_span(),
            }),
            Op::Drop { source, silent } => UpdateOperation::Drop(GraphManagement {
                silent: *silent,
                target: graph_ref_all(source),
                span: no_span(),
            }),
            Op::Create { source, silent } => UpdateOperation::Create(Create {
                silent: *silent,
                graph: lift_iri(source),
                span: no_span(),
            }),
            Op::Add {
                source,
                destination,
                silent,
            } => UpdateOperation::Add(transfer(source, destination, *silent)?),
            Op::Move {
                source,
                destination,
                silent,
            } => UpdateOperation::Move(transfer(source, destination, *silent)?),
            Op::Copy {
                source,
                destination,
                silent,
            } => UpdateOperation::Copy(transfer(source, destination, *silent)?),
            _ => return Err(LiftError::unexpected(op.type_name())),
        })
    }

    fn lift_delete_insert(
        &mut self,
        delete: Option<&[Pattern]>,
        insert: Option<&[Pattern]>,
        where_op: Option<&Operation>,
    ) -> Result<UpdateOperation> {
        let (where_op, using) = match where_op {
            Some(Operation {
                node:
                    Op::From {
                        input,
                        default,
                        named,
                    },
                ..
            }) => (
                Some(&**input),
                Some(UsingClause {
                    default_graphs: default.iter().map(lift_iri).collect(),
                    named_graphs: named.iter().map(lift_iri).collect(),
                    span: no_span(),
                }),
            ),
            other => (other, None),
        };
        let where_op = where_op.filter(|op| !op.is_empty_bgp());

        match (delete, insert, where_op) {
            (None, insert, None) => {
                let data = lift_quads(insert.unwrap_or_default())?;
                return Ok(UpdateOperation::InsertData(InsertData::new(data, no_span())));
            }
            (Some(delete), None, None) => {
                let data = lift_quads(delete)?;
                return Ok(if has_variables(delete) {
                    UpdateOperation::DeleteWhere(DeleteWhere::new(data, no_span()))
                } else {
                    UpdateOperation::DeleteData(DeleteData::new(data, no_span()))
                });
            }
            (Some(delete), None, Some(Operation { node: Op::Bgp { patterns }, .. }))
                if using.is_none() && patterns.as_slice() == delete =>
            {
                let data = lift_quads(delete)?;
                return Ok(UpdateOperation::DeleteWhere(DeleteWhere::new(data, no_span())));
            }
            _ => {}
        }

        let pattern = match where_op {
            Some(op) => {
                let op = remove_quads(op.clone())?;
                self.project = false;
                group_of(self.lift_patterns(&op)?)
            }
            None => group_of(Vec::new()),
        };
        let mut modify = Modify::new(
            delete.map(lift_quads).transpose()?,
            insert.map(lift_quads).transpose()?,
            WherePattern::new(pattern, no_span()),
            no_span(),
        );
        modify.using = using;
        Ok(UpdateOperation::Modify(Box::new(modify)))
    }
}

/// Group template patterns into one block per graph, in first-seen order.
fn lift_quads(patterns: &[Pattern]) -> Result<QuadPattern> {
    let mut blocks: Vec<(&Term, Vec<_>)> = Vec::new();
    for pattern in patterns {
        let triple = lift_triple(pattern)?;
        match blocks.iter_mut().find(|(graph, _)| **graph == pattern.graph) {
            Some((_, triples)) => triples.push(triple),
            None => blocks.push((&pattern.graph, vec![triple])),
        }
    }
    let quads = blocks
        .into_iter()
        .map(|(graph, triples)| {
            let graph = if graph.is_default_graph() {
                None
            } else {
                Some(lift_var_or_iri(graph)?)
            };
            Ok(Quads {
                graph,
                triples,
                span: no_span(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(QuadPattern::new(quads, no_span()))
}

fn has_variables(patterns: &[Pattern]) -> bool {
    let mut found = false;
    for pattern in patterns {
        pattern.for_each_term(&mut |term| {
            term.for_each_nested(&mut |t| found |= t.is_variable());
        });
    }
    found
}

fn graph_ref_all(target: &GraphTarget) -> GraphRefAll {
    match target {
        GraphTarget::Default => GraphRefAll::Default,
        GraphTarget::Named => GraphRefAll::Named,
        GraphTarget::All => GraphRefAll::All,
        GraphTarget::Graph(iri) => GraphRefAll::Graph(lift_iri(iri)),
    }
}

fn graph_or_default(target: &GraphTarget) -> Result<GraphOrDefault> {
    match target {
        GraphTarget::Default => Ok(GraphOrDefault::Default),
        GraphTarget::Graph(iri) => Ok(GraphOrDefault::Graph(lift_iri(iri))),
        GraphTarget::Named | GraphTarget::All => Err(LiftError::unsupported(
            "ADD/MOVE/COPY take a single graph, not NAMED or ALL",
        )),
    }
}

fn transfer(source: &GraphTarget, destination: &GraphTarget, silent: bool) -> Result<GraphTransfer> {
    Ok(GraphTransfer {
        silent,
        source: graph_or_default(source)?,
        destination: graph_or_default(destination)?,
        span: no_span(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{Literal, NamedNode, Variable};

    fn quad(s: Term, o: Term, g: Term) -> Pattern {
        Pattern::new(s, Term::NamedNode(NamedNode::new("http://ex.org/p")), o, g)
    }

    fn iri(value: &str) -> Term {
        Term::NamedNode(NamedNode::new(value))
    }

    fn lift(op: &Operation) -> UpdateOperation {
        let mut request = LiftingContext::default().lift_update_request(op).unwrap();
        assert_eq!(request.operations.len(), 1);
        request.operations.remove(0).operation
    }

    #[test]
    fn test_insert_data_grouped_by_graph() {
        let op = Operation::delete_insert(
            None,
            Some(vec![
                quad(iri("http://ex.org/a"), Term::Literal(Literal::simple("x")), Term::DefaultGraph),
                quad(iri("http://ex.org/b"), Term::Literal(Literal::simple("y")), iri("http://ex.org/g")),
                quad(iri("http://ex.org/c"), Term::Literal(Literal::simple("z")), Term::DefaultGraph),
            ]),
            None,
        );
        let UpdateOperation::InsertData(data) = lift(&op) else {
            panic!("expected INSERT DATA");
        };
        assert_eq!(data.data.quads.len(), 2);
        assert!(data.data.quads[0].graph.is_none());
        assert_eq!(data.data.quads[0].triples.len(), 2);
        assert!(data.data.quads[1].graph.is_some());
    }

    #[test]
    fn test_delete_without_where() {
        let ground = quad(iri("http://ex.org/a"), iri("http://ex.org/b"), Term::DefaultGraph);
        let op = Operation::delete_insert(Some(vec![ground]), None, None);
        assert!(matches!(lift(&op), UpdateOperation::DeleteData(_)));

        let open = quad(Term::Variable(Variable::new("s")), iri("http://ex.org/b"), Term::DefaultGraph);
        let op = Operation::delete_insert(Some(vec![open]), None, None);
        assert!(matches!(lift(&op), UpdateOperation::DeleteWhere(_)));
    }

    #[test]
    fn test_where_equal_to_template_is_delete_where() {
        let template = vec![quad(
            Term::Variable(Variable::new("s")),
            Term::Variable(Variable::new("o")),
            Term::DefaultGraph,
        )];
        let op = Operation::delete_insert(
            Some(template.clone()),
            None,
            Some(Operation::bgp(template)),
        );
        assert!(matches!(lift(&op), UpdateOperation::DeleteWhere(_)));
    }

    #[test]
    fn test_using_from_dataset() {
        let template = vec![quad(
            Term::Variable(Variable::new("s")),
            Term::Variable(Variable::new("o")),
            Term::DefaultGraph,
        )];
        let where_op = Operation::from_dataset(
            Operation::bgp(template.clone()),
            vec![NamedNode::new("http://ex.org/g")],
            Vec::new(),
        );
        let op = Operation::delete_insert(None, Some(template), Some(where_op));
        let UpdateOperation::Modify(modify) = lift(&op) else {
            panic!("expected modify");
        };
        let using = modify.using.expect("using clause");
        assert_eq!(using.default_graphs.len(), 1);
        assert!(modify.delete_clause.is_none());
    }

    #[test]
    fn test_named_transfer_rejected() {
        let op = Operation::copy_graph(GraphTarget::Named, GraphTarget::Default, false);
        let err = LiftingContext::default().lift_update_request(&op).unwrap_err();
        assert!(matches!(err, LiftError::UnsupportedShape { .. }));
    }
}
