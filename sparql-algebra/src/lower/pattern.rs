//! Graph pattern lowering.
//!
//! Converts SPARQL graph patterns (BGP, groups, OPTIONAL, MINUS, UNION,
//! FILTER, BIND, VALUES, GRAPH, SERVICE, subqueries) to algebra operations.
//!
//! Group elements are folded left to right onto an accumulator that starts
//! as the empty BGP. FILTERs are collected separately and applied once, as a
//! conjunction, to the whole group.

use crate::algebra::{Expression, Op, Operation, Pattern};
use crate::ast::path::PropertyPath;
use crate::ast::pattern::{GraphNode, GraphPattern, TriplePattern, Verb};
use crate::ast::term::{Term as SparqlTerm, Var};
use crate::term::{NamedNode, Term, TermFactory, Variable};
use sparql_vocab::rdf;
use std::collections::BTreeMap;

use super::path::PathFragment;
use super::{LowerError, LoweringContext, Result};

/// A triple after syntax-form expansion.
pub(super) struct FlatTriple<'p> {
    pub subject: Term,
    pub predicate: FlatPredicate<'p>,
    pub object: Term,
}

pub(super) enum FlatPredicate<'p> {
    Term(Term),
    Path(&'p PropertyPath),
}

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    pub(super) fn lower_graph_pattern(&mut self, pattern: &GraphPattern) -> Result<Operation> {
        match pattern {
            GraphPattern::Bgp { patterns, .. } => self.lower_bgp(patterns),

            GraphPattern::Group { patterns, .. } => self.lower_group(patterns),

            GraphPattern::Union { left, right, .. } => {
                let left = self.lower_graph_pattern(left)?;
                let right = self.lower_graph_pattern(right)?;
                Ok(Operation::union(vec![left, right]))
            }

            GraphPattern::Graph { name, pattern, .. } => {
                let inner = self.lower_graph_pattern(pattern)?;
                let name = self.lower_var_or_iri(name)?;
                let inner = if self.quads {
                    self.recurse_graph(inner, &name)?
                } else {
                    inner
                };
                Ok(Operation::graph(inner, name))
            }

            GraphPattern::Service {
                silent,
                endpoint,
                pattern,
                ..
            } => self.lower_service(*silent, endpoint, pattern),

            GraphPattern::Values { vars, data, .. } => self.lower_values(vars, data),

            GraphPattern::SubSelect { query, .. } => self.lower_select(query),

            GraphPattern::Optional { span, .. }
            | GraphPattern::Minus { span, .. }
            | GraphPattern::Filter { span, .. }
            | GraphPattern::Bind { span, .. } => {
                Err(LowerError::unexpected(pattern.kind_name(), *span))
            }
        }
    }

    fn lower_group(&mut self, elements: &[GraphPattern]) -> Result<Operation> {
        let mut filters = Vec::new();
        let mut acc = Operation::bgp(Vec::new());

        for element in elements {
            match element {
                GraphPattern::Filter { expr, .. } => filters.push(self.lower_expression(expr)?),
                other => acc = self.accumulate(acc, other)?,
            }
        }

        let mut filters = filters.into_iter();
        if let Some(first) = filters.next() {
            let condition =
                filters.fold(first, |acc, e| Expression::operator("&&", vec![acc, e]));
            acc = Operation::filter(acc, condition);
        }
        Ok(acc)
    }

    fn accumulate(&mut self, acc: Operation, element: &GraphPattern) -> Result<Operation> {
        match element {
            GraphPattern::Optional { pattern, .. } => {
                let right = self.lower_graph_pattern(pattern)?;
                Ok(match right {
                    Operation {
                        node: Op::Filter { input, expression },
                        metadata: None,
                    } => Operation::left_join(acc, *input, Some(expression)),
                    right => Operation::left_join(acc, right, None),
                })
            }
            GraphPattern::Minus { pattern, .. } => {
                let right = self.lower_graph_pattern(pattern)?;
                Ok(Operation::minus(acc, right))
            }
            GraphPattern::Bind { expr, var, .. } => {
                let expression = self.lower_expression(expr)?;
                Ok(Operation::extend(acc, self.lower_var(var), expression))
            }
            other => {
                let op = self.lower_graph_pattern(other)?;
                Ok(simplified_join(acc, op))
            }
        }
    }

    fn lower_service(
        &mut self,
        silent: bool,
        endpoint: &crate::ast::VarOrIri,
        pattern: &GraphPattern,
    ) -> Result<Operation> {
        let inner = self.lower_graph_pattern(pattern)?;
        let name = self.lower_var_or_iri(endpoint)?;
        Ok(Operation::service(inner, name, silent))
    }

    /// Lower a VALUES block; UNDEF cells are left out of their row.
    pub(super) fn lower_values(
        &mut self,
        vars: &[Var],
        data: &[Vec<Option<SparqlTerm>>],
    ) -> Result<Operation> {
        let variables: Vec<Variable> = vars.iter().map(|v| self.lower_var(v)).collect();
        let mut bindings = Vec::with_capacity(data.len());
        for row in data {
            let mut binding = BTreeMap::new();
            for (var, cell) in variables.iter().zip(row) {
                if let Some(term) = cell {
                    binding.insert(var.clone(), self.lower_term(term)?);
                }
            }
            bindings.push(binding);
        }
        Ok(Operation::values(variables, bindings))
    }

    /// Lower a triples block: expand syntax forms, translate paths, and
    /// stitch runs of plain patterns and path operations together.
    pub(super) fn lower_bgp(&mut self, triples: &[TriplePattern]) -> Result<Operation> {
        let mut flat = Vec::new();
        for triple in triples {
            self.flatten_triple(triple, &mut flat)?;
        }

        let mut patterns = Vec::new();
        let mut joins = Vec::new();
        for triple in flat {
            match triple.predicate {
                FlatPredicate::Term(predicate) => patterns.push(Pattern::new(
                    triple.subject,
                    predicate,
                    triple.object,
                    self.factory.default_graph(),
                )),
                FlatPredicate::Path(path) => {
                    for fragment in self.lower_path(triple.subject, path, triple.object)? {
                        match fragment {
                            PathFragment::Pattern(p) => patterns.push(p),
                            PathFragment::Path(op) => {
                                if !patterns.is_empty() {
                                    joins.push(Operation::bgp(std::mem::take(&mut patterns)));
                                }
                                joins.push(op);
                            }
                        }
                    }
                }
            }
        }
        if !patterns.is_empty() || joins.is_empty() {
            joins.push(Operation::bgp(patterns));
        }

        Ok(if joins.len() == 1 {
            joins.remove(0)
        } else {
            Operation::join(joins)
        })
    }

    /// Expand one surface triple. Triples produced by a nested subject come
    /// first, then those of a nested object, then the triple itself.
    pub(super) fn flatten_triple<'p>(
        &mut self,
        triple: &'p TriplePattern,
        out: &mut Vec<FlatTriple<'p>>,
    ) -> Result<()> {
        let subject = self.flatten_node(&triple.subject, out)?;
        let predicate = self.flatten_verb(&triple.predicate)?;
        let object = self.flatten_node(&triple.object, out)?;
        out.push(FlatTriple {
            subject,
            predicate,
            object,
        });
        Ok(())
    }

    fn flatten_verb<'p>(&mut self, verb: &'p Verb) -> Result<FlatPredicate<'p>> {
        Ok(match verb {
            Verb::Simple(v) => FlatPredicate::Term(self.lower_var_or_iri(v)?),
            Verb::Path(path) => match path.unwrap_group() {
                PropertyPath::Iri(iri) => FlatPredicate::Term(Term::NamedNode(self.lower_iri(iri)?)),
                PropertyPath::A { .. } => FlatPredicate::Term(Term::NamedNode(self.rdf(rdf::TYPE))),
                other => FlatPredicate::Path(other),
            },
        })
    }

    /// Lower a subject/object node, emitting the triples it implies.
    fn flatten_node<'p>(
        &mut self,
        node: &'p GraphNode,
        out: &mut Vec<FlatTriple<'p>>,
    ) -> Result<Term> {
        match node {
            GraphNode::Term(term) => self.lower_term(term),

            GraphNode::BlankNodePropertyList { properties, .. } => {
                let subject = Term::BlankNode(self.fresh_blank());
                for entry in properties {
                    let predicate = self.flatten_verb(&entry.verb)?;
                    let object = self.flatten_node(&entry.object, out)?;
                    out.push(FlatTriple {
                        subject: subject.clone(),
                        predicate,
                        object,
                    });
                }
                Ok(subject)
            }

            GraphNode::Collection { items, .. } => {
                let nil = Term::NamedNode(self.rdf(rdf::NIL));
                let cells: Vec<Term> = items
                    .iter()
                    .map(|_| Term::BlankNode(self.fresh_blank()))
                    .collect();
                for (i, item) in items.iter().enumerate() {
                    let value = self.flatten_node(item, out)?;
                    let next = cells.get(i + 1).cloned().unwrap_or_else(|| nil.clone());
                    out.push(FlatTriple {
                        subject: cells[i].clone(),
                        predicate: FlatPredicate::Term(Term::NamedNode(self.rdf(rdf::FIRST))),
                        object: value,
                    });
                    out.push(FlatTriple {
                        subject: cells[i].clone(),
                        predicate: FlatPredicate::Term(Term::NamedNode(self.rdf(rdf::REST))),
                        object: next,
                    });
                }
                Ok(cells.into_iter().next().unwrap_or(nil))
            }
        }
    }

    pub(super) fn rdf(&self, iri: &str) -> NamedNode {
        self.factory.named_node(iri)
    }
}

/// Join two group members, merging BGPs and dropping an empty BGP.
pub(super) fn simplified_join(left: Operation, right: Operation) -> Operation {
    match (left, right) {
        (
            Operation {
                node: Op::Bgp { patterns: mut lp },
                metadata: None,
            },
            Operation {
                node: Op::Bgp { patterns: rp },
                metadata: None,
            },
        ) => {
            lp.extend(rp);
            Operation::bgp(lp)
        }
        (left, right) if left.is_empty_bgp() => right,
        (left, right) if right.is_empty_bgp() => left,
        (left, right) => Operation::join(vec![left, right]),
    }
}
