//! SPARQL syntax trees: the input of lowering and the output of lifting.
//!
//! Every node carries a [`SourceSpan`](crate::span::SourceSpan). Lifted
//! trees use the default span throughout.

pub mod expr;
pub mod path;
pub mod pattern;
pub mod query;
pub mod term;
pub mod update;

pub use expr::{AggregateFunction, BinaryOp, Builtin, Expression, FunctionName, UnaryOp};
pub use path::{NegatedPredicate, PropertyPath};
pub use pattern::{GraphNode, GraphPattern, PropertyListEntry, TriplePattern, Verb};
pub use query::{
    AskQuery, BaseDecl, ConstructQuery, ConstructTemplate, DatasetClause, DescribeQuery,
    DescribeTarget, GroupByClause, GroupCondition, HavingClause, LimitClause, OffsetClause,
    OrderByClause, OrderCondition, OrderDirection, OrderExpr, PrefixDecl, Prologue, QueryBody,
    SelectClause, SelectModifier, SelectQuery, SelectVariable, SelectVariables, SolutionModifiers,
    SparqlAst, ValuesClause, WhereClause,
};
pub use term::{
    BlankNode, BlankNodeValue, Iri, IriValue, Literal, LiteralValue, QuotedTriple, Term, Var,
    VarOrIri,
};
pub use update::{
    Create, DeleteData, DeleteWhere, GraphManagement, GraphOrDefault, GraphRefAll, GraphTransfer,
    InsertData, Load, Modify, QuadPattern, Quads, UpdateOperation, UpdateRequest, UpdateUnit,
    UsingClause, WherePattern,
};
