//! RDF terms back to surface terms.
//!
//! IRIs come out in full form. Literals keep their explicit datatype rather
//! than the numeric shorthand, which lowers to the same literal.

use crate::ast::expr::Expression as SparqlExpr;
use crate::ast::pattern::TriplePattern;
use crate::ast::term::{
    BlankNode as SparqlBlankNode, Iri, Literal as SparqlLiteral, QuotedTriple, Term as SparqlTerm,
    Var, VarOrIri,
};
use crate::algebra::Pattern;
use crate::term::{Literal, NamedNode, Term, Variable};
use sparql_vocab::xsd;

use super::{no_span, LiftError, Result};

pub(super) fn lift_iri(node: &NamedNode) -> Iri {
    Iri::full(node.as_str(), no_span())
}

pub(super) fn lift_var(var: &Variable) -> Var {
    Var::new(var.as_str(), no_span())
}

pub(super) fn lift_literal(literal: &Literal) -> SparqlLiteral {
    match &literal.language {
        Some(lang) => SparqlLiteral::lang_string(&*literal.value, &**lang, no_span()),
        None if literal.datatype.as_str() == xsd::STRING => {
            SparqlLiteral::string(&*literal.value, no_span())
        }
        None => SparqlLiteral::typed(&*literal.value, lift_iri(&literal.datatype), no_span()),
    }
}

pub(super) fn lift_term(term: &Term) -> Result<SparqlTerm> {
    Ok(match term {
        Term::NamedNode(n) => SparqlTerm::Iri(lift_iri(n)),
        Term::BlankNode(b) => SparqlTerm::BlankNode(SparqlBlankNode::labeled(b.as_str(), no_span())),
        Term::Literal(l) => SparqlTerm::Literal(lift_literal(l)),
        Term::Variable(v) => SparqlTerm::Var(lift_var(v)),
        Term::Quad(quad) => {
            if !quad.graph.is_default_graph() {
                return Err(LiftError::unsupported(format!(
                    "quoted triple in graph {}",
                    quad.graph
                )));
            }
            SparqlTerm::QuotedTriple(Box::new(QuotedTriple::new(
                lift_term(&quad.subject)?,
                lift_var_or_iri(&quad.predicate)?,
                lift_term(&quad.object)?,
                no_span(),
            )))
        }
        Term::DefaultGraph => {
            return Err(LiftError::unsupported("default graph used as a term"));
        }
    })
}

pub(super) fn lift_var_or_iri(term: &Term) -> Result<VarOrIri> {
    match term {
        Term::Variable(v) => Ok(VarOrIri::Var(lift_var(v))),
        Term::NamedNode(n) => Ok(VarOrIri::Iri(lift_iri(n))),
        other => Err(LiftError::unsupported(format!(
            "{} where a variable or IRI is required",
            other.term_type().as_str()
        ))),
    }
}

/// A term inside an expression.
pub(super) fn lift_expression_term(term: &Term) -> Result<SparqlExpr> {
    match term {
        Term::Variable(v) => Ok(SparqlExpr::var(lift_var(v))),
        Term::NamedNode(n) => Ok(SparqlExpr::iri(lift_iri(n))),
        Term::Literal(l) => Ok(SparqlExpr::literal(lift_literal(l))),
        other => Err(LiftError::unsupported(format!(
            "{} inside an expression",
            other.term_type().as_str()
        ))),
    }
}

/// The triple of a pattern, ignoring its graph.
pub(super) fn lift_triple(pattern: &Pattern) -> Result<TriplePattern> {
    Ok(TriplePattern::new(
        lift_term(&pattern.subject)?,
        lift_var_or_iri(&pattern.predicate)?,
        lift_term(&pattern.object)?,
        no_span(),
    ))
}

/// A WHERE pattern; its graph must already have been removed.
pub(super) fn lift_pattern(pattern: &Pattern) -> Result<TriplePattern> {
    if !pattern.graph.is_default_graph() {
        return Err(LiftError::unsupported(format!(
            "pattern in graph {} outside a GRAPH block",
            pattern.graph
        )));
    }
    lift_triple(pattern)
}
