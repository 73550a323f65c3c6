//! Term and IRI lowering.
//!
//! Expands prefixed names, resolves relative IRIs against the current BASE,
//! gives numeric and boolean shorthand literals their XSD datatypes, and
//! labels anonymous blank nodes.

use crate::ast::term::{
    BlankNode as SparqlBlankNode, BlankNodeValue, Iri, IriValue, Literal as SparqlLiteral,
    LiteralValue, Term as SparqlTerm, Var, VarOrIri,
};
use crate::term::{Literal, NamedNode, Term, TermFactory, Variable};
use sparql_vocab::xsd;

use super::{LowerError, LoweringContext, Result};

impl<F: TermFactory + ?Sized> LoweringContext<'_, F> {
    pub(super) fn lower_var(&self, var: &Var) -> Variable {
        self.factory.variable(&var.name)
    }

    /// Expand and resolve an IRI.
    pub(super) fn lower_iri(&self, iri: &Iri) -> Result<NamedNode> {
        let expanded = match &iri.value {
            IriValue::Full(value) => self.resolve(value, iri.span)?,
            IriValue::Prefixed { prefix, local } => {
                let namespace = self
                    .prefixes
                    .get(prefix)
                    .ok_or_else(|| LowerError::unknown_prefix(prefix.clone(), iri.span))?;
                self.resolve(&format!("{namespace}{local}"), iri.span)?
            }
        };
        Ok(self.factory.named_node(&expanded))
    }

    pub(super) fn lower_var_or_iri(&self, v: &VarOrIri) -> Result<Term> {
        Ok(match v {
            VarOrIri::Var(var) => Term::Variable(self.lower_var(var)),
            VarOrIri::Iri(iri) => Term::NamedNode(self.lower_iri(iri)?),
        })
    }

    pub(super) fn lower_literal(&self, lit: &SparqlLiteral) -> Result<Literal> {
        let typed = |value: &str, datatype: &str| {
            self.factory
                .literal(value, None, Some(self.factory.named_node(datatype)))
        };
        Ok(match &lit.value {
            LiteralValue::Simple(value) => self.factory.literal(value, None, None),
            LiteralValue::LangTagged { value, lang } => {
                self.factory.literal(value, Some(&**lang), None)
            }
            LiteralValue::Typed { value, datatype } => {
                let datatype = self.lower_iri(datatype)?;
                self.factory.literal(value, None, Some(datatype))
            }
            LiteralValue::Integer(n) => typed(&n.to_string(), xsd::INTEGER),
            LiteralValue::Decimal(d) => typed(&**d, xsd::DECIMAL),
            LiteralValue::Double(d) => typed(&format!("{d:e}"), xsd::DOUBLE),
            LiteralValue::Boolean(b) => typed(if *b { "true" } else { "false" }, xsd::BOOLEAN),
        })
    }

    pub(super) fn lower_blank(&mut self, blank: &SparqlBlankNode) -> Term {
        match &blank.value {
            BlankNodeValue::Labeled(label) => Term::BlankNode(self.factory.blank_node(label)),
            BlankNodeValue::Anon => Term::BlankNode(self.fresh_blank()),
        }
    }

    /// Lower a term in any position. Quoted triples become nested quads in
    /// the default graph.
    pub(super) fn lower_term(&mut self, term: &SparqlTerm) -> Result<Term> {
        Ok(match term {
            SparqlTerm::Var(v) => Term::Variable(self.lower_var(v)),
            SparqlTerm::Iri(iri) => Term::NamedNode(self.lower_iri(iri)?),
            SparqlTerm::Literal(lit) => Term::Literal(self.lower_literal(lit)?),
            SparqlTerm::BlankNode(b) => self.lower_blank(b),
            SparqlTerm::QuotedTriple(q) => {
                let subject = self.lower_term(&q.subject)?;
                let predicate = self.lower_var_or_iri(&q.predicate)?;
                let object = self.lower_term(&q.object)?;
                let graph = self.factory.default_graph();
                Term::Quad(Box::new(
                    self.factory.quad(subject, predicate, object, graph),
                ))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::term::{BlankNode, Iri, Literal, QuotedTriple, Term as SparqlTerm, Var, VarOrIri};
    use crate::lower::{LowerError, LoweringContext};
    use crate::options::LowerOptions;
    use crate::span::SourceSpan;
    use crate::term::{DataFactory, Term};
    use sparql_vocab::{rdf, xsd};

    fn span() -> SourceSpan {
        SourceSpan::default()
    }

    fn options() -> LowerOptions {
        LowerOptions::new()
            .with_prefix("ex", "http://example.org/")
            .with_base_iri("http://example.org/base/")
    }

    #[test]
    fn test_prefixed_and_relative_iris() {
        let opts = options();
        let ctx = LoweringContext::new(&DataFactory, &opts);

        let prefixed = ctx.lower_iri(&Iri::prefixed("ex", "name", span())).unwrap();
        assert_eq!(prefixed.as_str(), "http://example.org/name");

        let relative = ctx.lower_iri(&Iri::full("doc", span())).unwrap();
        assert_eq!(relative.as_str(), "http://example.org/base/doc");
    }

    #[test]
    fn test_unknown_prefix() {
        let opts = options();
        let ctx = LoweringContext::new(&DataFactory, &opts);
        let err = ctx
            .lower_iri(&Iri::prefixed("foaf", "name", span()))
            .unwrap_err();
        assert!(matches!(err, LowerError::UnknownPrefix { .. }));
        assert_eq!(err.to_string(), "Unknown prefix: foaf");
    }

    #[test]
    fn test_shorthand_literal_datatypes() {
        let opts = options();
        let ctx = LoweringContext::new(&DataFactory, &opts);

        let int = ctx.lower_literal(&Literal::integer(42, span())).unwrap();
        assert_eq!(&*int.value, "42");
        assert_eq!(int.datatype.as_str(), xsd::INTEGER);

        let dec = ctx.lower_literal(&Literal::decimal("1.50", span())).unwrap();
        assert_eq!(&*dec.value, "1.50");
        assert_eq!(dec.datatype.as_str(), xsd::DECIMAL);

        let boolean = ctx.lower_literal(&Literal::boolean(true, span())).unwrap();
        assert_eq!(&*boolean.value, "true");
        assert_eq!(boolean.datatype.as_str(), xsd::BOOLEAN);

        let lang = ctx
            .lower_literal(&Literal::lang_string("hi", "en", span()))
            .unwrap();
        assert_eq!(lang.language.as_deref(), Some("en"));
        assert_eq!(lang.datatype.as_str(), rdf::LANG_STRING);
    }

    #[test]
    fn test_anonymous_blanks_get_distinct_labels() {
        let opts = options();
        let mut ctx = LoweringContext::new(&DataFactory, &opts);
        let a = ctx.lower_term(&SparqlTerm::BlankNode(BlankNode::anon(span()))).unwrap();
        let b = ctx.lower_term(&SparqlTerm::BlankNode(BlankNode::anon(span()))).unwrap();
        assert_eq!(a.value(), "g_0");
        assert_eq!(b.value(), "g_1");
    }

    #[test]
    fn test_quoted_triple_becomes_quad() {
        let opts = options();
        let mut ctx = LoweringContext::new(&DataFactory, &opts);
        let quoted = SparqlTerm::QuotedTriple(Box::new(QuotedTriple::new(
            SparqlTerm::Var(Var::new("s", span())),
            VarOrIri::Iri(Iri::prefixed("ex", "p", span())),
            SparqlTerm::Literal(Literal::string("o", span())),
            span(),
        )));
        match ctx.lower_term(&quoted).unwrap() {
            Term::Quad(q) => {
                assert!(q.subject.is_variable());
                assert_eq!(q.predicate.value(), "http://example.org/p");
                assert!(q.graph.is_default_graph());
            }
            other => panic!("expected quad, got {other:?}"),
        }
    }
}
