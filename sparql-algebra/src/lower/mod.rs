//! AST to algebra lowering.
//!
//! Lowering follows SPARQL 1.1 §18.2 in a fixed order:
//!
//! 1. Collect every variable name used in the AST so fresh variables
//!    (`var0`, `var1`, ...) never collide with user variables.
//! 2. Register the prologue (BASE, PREFIX) on top of the configured
//!    [`LowerOptions`] prefixes and base IRI.
//! 3. Translate the WHERE pattern (syntax forms, paths, groups, filters).
//! 4. Translate grouping, aggregates and solution modifiers, then wrap the
//!    query form (`Project`, `Construct`, `Ask`, `Describe`).
//! 5. Optionally rewrite blank nodes in patterns into variables.
//!
//! Updates skip steps 3 and 4 and translate each operation in sequence.
//!
//! Every call builds its own [`LoweringContext`]; nothing is shared between
//! calls.

mod blank;
mod error;
mod expression;
mod graph;
pub mod iri;
mod path;
mod pattern;
mod query;
mod scope;
mod term;
mod update;

pub use error::{LowerError, Result};

use crate::algebra::Operation;
use crate::ast::{Prologue, QueryBody, SparqlAst};
use crate::options::LowerOptions;
use crate::span::SourceSpan;
use crate::term::{BlankNode, DataFactory, TermFactory, Variable};
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;
use tracing::{debug, debug_span};

/// Lower a parsed query or update to algebra using the default term factory.
///
/// # Example
///
/// ```
/// use sparql_algebra::ast::*;
/// use sparql_algebra::lower::lower;
/// use sparql_algebra::options::LowerOptions;
/// use sparql_algebra::SourceSpan;
///
/// let span = SourceSpan::default();
/// let triple = TriplePattern::new(
///     Term::Var(Var::new("s", span)),
///     VarOrIri::Iri(Iri::full("http://example.org/name", span)),
///     Term::Var(Var::new("name", span)),
///     span,
/// );
/// let query = SelectQuery::new(
///     SelectClause::star(span),
///     WhereClause::new(GraphPattern::group(vec![GraphPattern::bgp(vec![triple], span)], span), true, span),
///     SolutionModifiers::new(),
///     span,
/// );
/// let ast = SparqlAst::new(Prologue::new(), QueryBody::Select(query), span);
///
/// let op = lower(&ast, &LowerOptions::default()).unwrap();
/// assert_eq!(op.type_name(), "project");
/// ```
pub fn lower(ast: &SparqlAst, options: &LowerOptions) -> Result<Operation> {
    lower_with_factory(ast, options, &DataFactory)
}

/// Lower with an injected term factory.
pub fn lower_with_factory<F>(ast: &SparqlAst, options: &LowerOptions, factory: &F) -> Result<Operation>
where
    F: TermFactory + ?Sized,
{
    let span = debug_span!(
        "sparql_lower",
        form = form_name(&ast.body),
        quads = options.quads,
        blank_to_variable = options.blank_to_variable,
    );
    let _guard = span.enter();

    let mut ctx = LoweringContext::new(factory, options);
    ctx.harvest(ast);
    ctx.register_prologue(&ast.prologue)?;

    let mut op = match &ast.body {
        QueryBody::Update(request) => ctx.lower_update_request(request)?,
        QueryBody::Select(query) => ctx.lower_select(query)?,
        QueryBody::Construct(query) => ctx.lower_construct(query)?,
        QueryBody::Ask(query) => ctx.lower_ask(query)?,
        QueryBody::Describe(query) => ctx.lower_describe(query)?,
    };

    if options.blank_to_variable {
        op = ctx.blank_to_variable(op)?;
    }

    debug!(op = op.type_name(), fresh_variables = ctx.var_count, "lowering complete");
    Ok(op)
}

fn form_name(body: &QueryBody) -> &'static str {
    match body {
        QueryBody::Select(_) => "select",
        QueryBody::Construct(_) => "construct",
        QueryBody::Ask(_) => "ask",
        QueryBody::Describe(_) => "describe",
        QueryBody::Update(_) => "update",
    }
}

/// Per-call lowering state.
pub(crate) struct LoweringContext<'a, F: TermFactory + ?Sized> {
    factory: &'a F,
    /// Quad mode: embed graph names into patterns
    quads: bool,
    /// Prefix -> namespace IRI
    prefixes: FxHashMap<Arc<str>, Arc<str>>,
    /// Current BASE
    base: Option<Arc<str>>,
    /// Every variable name in use, user-written or minted
    variables: FxHashSet<Arc<str>>,
    /// Every blank node label in use
    blank_labels: FxHashSet<Arc<str>>,
    var_count: usize,
    blank_count: usize,
}

impl<'a, F: TermFactory + ?Sized> LoweringContext<'a, F> {
    pub(crate) fn new(factory: &'a F, options: &LowerOptions) -> Self {
        Self {
            factory,
            quads: options.quads,
            prefixes: options
                .prefixes
                .iter()
                .map(|(k, v)| (Arc::from(k.as_str()), Arc::from(v.as_str())))
                .collect(),
            base: options.base_iri.as_deref().map(Arc::from),
            variables: FxHashSet::default(),
            blank_labels: FxHashSet::default(),
            var_count: 0,
            blank_count: 0,
        }
    }

    /// Fold BASE and PREFIX declarations into the context.
    ///
    /// BASE is applied first, so prefix IRIs may be relative to it.
    pub(crate) fn register_prologue(&mut self, prologue: &Prologue) -> Result<()> {
        if let Some(base) = &prologue.base {
            let resolved = self.resolve(&base.iri, base.span)?;
            self.base = Some(Arc::from(resolved));
        }
        for decl in &prologue.prefixes {
            let resolved = self.resolve(&decl.iri, decl.span)?;
            self.prefixes
                .insert(decl.prefix.clone(), Arc::from(resolved));
        }
        Ok(())
    }

    fn resolve(&self, iri: &str, span: SourceSpan) -> Result<String> {
        iri::resolve_iri(iri, self.base.as_deref()).ok_or_else(|| LowerError::relative_iri(iri, span))
    }

    /// Mint a variable `varN` not used anywhere in the query.
    pub(crate) fn fresh_variable(&mut self) -> Variable {
        loop {
            let name = format!("var{}", self.var_count);
            self.var_count += 1;
            if self.variables.insert(Arc::from(name.as_str())) {
                return self.factory.variable(&name);
            }
        }
    }

    /// Mint a label for an anonymous blank node.
    pub(crate) fn fresh_blank(&mut self) -> BlankNode {
        loop {
            let label = format!("g_{}", self.blank_count);
            self.blank_count += 1;
            if self.blank_labels.insert(Arc::from(label.as_str())) {
                return self.factory.blank_node(&label);
            }
        }
    }

    /// A variable named after `label`, or `label0`, `label1`, ... if taken.
    pub(crate) fn unique_variable(&mut self, label: &str) -> Variable {
        let mut candidate = label.to_string();
        let mut counter = 0usize;
        while self.variables.contains(candidate.as_str()) {
            candidate = format!("{label}{counter}");
            counter += 1;
        }
        self.variables.insert(Arc::from(candidate.as_str()));
        self.factory.variable(&candidate)
    }
}
