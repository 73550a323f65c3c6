//! Update lowering.
//!
//! Each operation of a request is lowered with the prologues seen so far:
//! prefixes and BASE declared before one operation stay visible to the
//! operations after it. INSERT/DELETE forms need quad mode, since their
//! templates carry graph names.

use crate::algebra::{GraphTarget, Operation, Pattern};
use crate::ast::pattern::GraphPattern;
use crate::ast::update::{GraphOrDefault, GraphRefAll, Modify, QuadPattern, UpdateOperation, UpdateRequest};
use crate::span::SourceSpan;
use crate::term::{Term, TermFactory};
use tracing::debug;

use super::{LowerError, LoweringContext, Result};

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    pub(super) fn lower_update_request(&mut self, request: &UpdateRequest) -> Result<Operation> {
        let mut updates = Vec::with_capacity(request.operations.len());
        for unit in &request.operations {
            self.register_prologue(&unit.prologue)?;
            updates.push(self.lower_update(&unit.operation)?);
        }
        debug!(operations = updates.len(), "lowered update request");
        Ok(match updates.len() {
            0 => Operation::nop(),
            1 => updates.remove(0),
            _ => Operation::composite_update(updates),
        })
    }

    fn lower_update(&mut self, operation: &UpdateOperation) -> Result<Operation> {
        match operation {
            UpdateOperation::InsertData(op) => {
                self.require_quads(op.span)?;
                let insert = self.lower_quads(&op.data, None)?;
                Ok(Operation::delete_insert(None, non_empty(insert), None))
            }
            UpdateOperation::DeleteData(op) => {
                self.require_quads(op.span)?;
                let delete = self.lower_quads(&op.data, None)?;
                Ok(Operation::delete_insert(non_empty(delete), None, None))
            }
            UpdateOperation::DeleteWhere(op) => {
                self.require_quads(op.span)?;
                let delete = self.lower_quads(&op.pattern, None)?;
                let where_op = Operation::bgp(delete.clone());
                Ok(Operation::delete_insert(non_empty(delete), None, Some(where_op)))
            }
            UpdateOperation::Modify(op) => self.lower_modify(op),

            UpdateOperation::Load(op) => {
                let source = self.lower_iri(&op.source)?;
                let destination = op
                    .destination
                    .as_ref()
                    .map(|iri| self.lower_iri(iri))
                    .transpose()?;
                Ok(Operation::load(source, destination, op.silent))
            }
            UpdateOperation::Clear(op) => {
                Ok(Operation::clear(self.lower_graph_ref_all(&op.target)?, op.silent))
            }
            UpdateOperation::Drop(op) => Ok(Operation::drop_graph(
                self.lower_graph_ref_all(&op.target)?,
                op.silent,
            )),
            UpdateOperation::Create(op) => Ok(Operation::create(self.lower_iri(&op.graph)?, op.silent)),
            UpdateOperation::Add(op) => Ok(Operation::add_graph(
                self.lower_graph_or_default(&op.source)?,
                self.lower_graph_or_default(&op.destination)?,
                op.silent,
            )),
            UpdateOperation::Move(op) => Ok(Operation::move_graph(
                self.lower_graph_or_default(&op.source)?,
                self.lower_graph_or_default(&op.destination)?,
                op.silent,
            )),
            UpdateOperation::Copy(op) => Ok(Operation::copy_graph(
                self.lower_graph_or_default(&op.source)?,
                self.lower_graph_or_default(&op.destination)?,
                op.silent,
            )),
        }
    }

    /// `[WITH g] [DELETE {..}] [INSERT {..}] [USING ..] WHERE {..}`
    fn lower_modify(&mut self, op: &Modify) -> Result<Operation> {
        self.require_quads(op.span)?;

        let with = op
            .with_iri
            .as_ref()
            .map(|iri| self.lower_iri(iri).map(Term::NamedNode))
            .transpose()?;

        let delete = match &op.delete_clause {
            Some(q) => self.lower_quads(q, with.as_ref())?,
            None => Vec::new(),
        };
        let insert = match &op.insert_clause {
            Some(q) => self.lower_quads(q, with.as_ref())?,
            None => Vec::new(),
        };

        let mut where_op = None;
        if !is_empty_pattern(&op.where_clause.pattern) {
            let mut lowered = self.lower_graph_pattern(&op.where_clause.pattern)?;
            match (&op.using, &with) {
                (Some(using), _) if !using.is_empty() => {
                    let default = using
                        .default_graphs
                        .iter()
                        .map(|iri| self.lower_iri(iri))
                        .collect::<Result<Vec<_>>>()?;
                    let named = using
                        .named_graphs
                        .iter()
                        .map(|iri| self.lower_iri(iri))
                        .collect::<Result<Vec<_>>>()?;
                    lowered = Operation::from_dataset(lowered, default, named);
                }
                (_, Some(graph)) => lowered = self.recurse_graph(lowered, graph)?,
                _ => {}
            }
            where_op = Some(lowered);
        }

        Ok(Operation::delete_insert(
            non_empty(delete),
            non_empty(insert),
            where_op,
        ))
    }

    /// Lower quad blocks; blocks without `GRAPH` go to `default` if given.
    fn lower_quads(&mut self, pattern: &QuadPattern, default: Option<&Term>) -> Result<Vec<Pattern>> {
        let mut out = Vec::new();
        for block in &pattern.quads {
            let graph = match &block.graph {
                Some(name) => Some(self.lower_var_or_iri(name)?),
                None => default.cloned(),
            };
            out.extend(self.lower_template(&block.triples, graph.as_ref())?);
        }
        Ok(out)
    }

    fn lower_graph_ref_all(&self, target: &GraphRefAll) -> Result<GraphTarget> {
        Ok(match target {
            GraphRefAll::Default => GraphTarget::Default,
            GraphRefAll::Named => GraphTarget::Named,
            GraphRefAll::All => GraphTarget::All,
            GraphRefAll::Graph(iri) => GraphTarget::Graph(self.lower_iri(iri)?),
        })
    }

    fn lower_graph_or_default(&self, target: &GraphOrDefault) -> Result<GraphTarget> {
        Ok(match target {
            GraphOrDefault::Default => GraphTarget::Default,
            GraphOrDefault::Graph(iri) => GraphTarget::Graph(self.lower_iri(iri)?),
        })
    }

    fn require_quads(&self, span: SourceSpan) -> Result<()> {
        if self.quads {
            Ok(())
        } else {
            Err(LowerError::QuadsRequired { span })
        }
    }
}

fn non_empty(patterns: Vec<Pattern>) -> Option<Vec<Pattern>> {
    (!patterns.is_empty()).then_some(patterns)
}

fn is_empty_pattern(pattern: &GraphPattern) -> bool {
    match pattern {
        GraphPattern::Group { patterns, .. } => patterns.is_empty(),
        GraphPattern::Bgp { patterns, .. } => patterns.is_empty(),
        _ => false,
    }
}
