//! # SPARQL Algebra
//!
//! Translation between the SPARQL 1.1 abstract syntax tree and the SPARQL
//! algebra, with:
//! - Lowering of queries and updates to algebra (SPARQL 1.1 §18.2)
//! - Lifting of algebra back to an AST a generator can print
//! - A generic, stack-bounded tree rewriter both directions are built on
//! - Canonical renaming so algebra trees compare up to variable names
//!
//! ## Architecture
//!
//! Text parsing and generation live outside this crate. Data flows as:
//!
//! 1. **Lower**: `SparqlAst` → [`Operation`] under [`LowerOptions`]
//! 2. **Rewrite**: any number of [`rewrite::Rewriter`] passes over the algebra
//! 3. **Lift**: [`Operation`] → `SparqlAst`, or [`canonicalize`] for comparison
//!
//! Every call creates its own translation context; nothing is shared between
//! calls, so translations may run on any number of threads at once.
//!
//! ## Quick Start
//!
//! ```
//! use sparql_algebra::ast::*;
//! use sparql_algebra::{canonicalize, lift, lower, LowerOptions, SourceSpan};
//!
//! let span = SourceSpan::default();
//! let triple = TriplePattern::new(
//!     Term::Var(Var::new("s", span)),
//!     VarOrIri::Iri(Iri::full("http://example.org/name", span)),
//!     Term::Var(Var::new("name", span)),
//!     span,
//! );
//! let query = SelectQuery::new(
//!     SelectClause::star(span),
//!     WhereClause::new(GraphPattern::group(vec![GraphPattern::bgp(vec![triple], span)], span), true, span),
//!     SolutionModifiers::new(),
//!     span,
//! );
//! let ast = SparqlAst::new(Prologue::new(), QueryBody::Select(query), span);
//!
//! let options = LowerOptions::default();
//! let op = lower(&ast, &options).unwrap();
//! let again = lower(&lift(&op).unwrap(), &options).unwrap();
//! assert_eq!(canonicalize(&op, true).unwrap(), canonicalize(&again, true).unwrap());
//! ```

pub mod algebra;
pub mod ast;
pub mod canonical;
pub mod lift;
pub mod lower;
pub mod options;
pub mod rewrite;
pub mod span;
pub mod term;

// Re-exports
pub use algebra::{in_scope_variables, Expression, Op, Operation, PathSymbol, Pattern};
pub use ast::{Prologue, QueryBody, SparqlAst, UpdateOperation};
pub use canonical::canonicalize;
pub use lift::{lift, LiftError};
pub use lower::{lower, lower_with_factory, LowerError};
pub use options::LowerOptions;
pub use rewrite::{RewriteError, Rewriter, TransformContext, TreeRewriter};
pub use span::SourceSpan;
pub use term::{DataFactory, TermFactory};
