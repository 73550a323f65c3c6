//! Update requests: a `;`-separated sequence of operations, each with its
//! own prologue. Declarations accumulate across the request.

use super::pattern::{GraphPattern, TriplePattern};
use super::query::Prologue;
use super::term::{Iri, VarOrIri};
use crate::span::SourceSpan;

/// A complete update request.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateRequest {
    pub operations: Vec<UpdateUnit>,
    pub span: SourceSpan,
}

impl UpdateRequest {
    pub fn new(operations: Vec<UpdateUnit>, span: SourceSpan) -> Self {
        Self { operations, span }
    }
}

/// One operation of a request and the declarations preceding it.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateUnit {
    pub prologue: Prologue,
    pub operation: UpdateOperation,
}

impl UpdateUnit {
    pub fn new(operation: UpdateOperation) -> Self {
        Self {
            prologue: Prologue::default(),
            operation,
        }
    }

    pub fn with_prologue(mut self, prologue: Prologue) -> Self {
        self.prologue = prologue;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperation {
    InsertData(InsertData),
    DeleteData(DeleteData),
    DeleteWhere(DeleteWhere),
    /// `[WITH g] DELETE {..} INSERT {..} [USING ..] WHERE {..}`
    Modify(Box<Modify>),
    Load(Load),
    Clear(GraphManagement),
    Drop(GraphManagement),
    Create(Create),
    Add(GraphTransfer),
    Move(GraphTransfer),
    Copy(GraphTransfer),
}

#[derive(Clone, Debug, PartialEq)]
pub struct InsertData {
    pub data: QuadPattern,
    pub span: SourceSpan,
}

impl InsertData {
    pub fn new(data: QuadPattern, span: SourceSpan) -> Self {
        Self { data, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeleteData {
    pub data: QuadPattern,
    pub span: SourceSpan,
}

impl DeleteData {
    pub fn new(data: QuadPattern, span: SourceSpan) -> Self {
        Self { data, span }
    }
}

/// The pattern doubles as delete template and WHERE clause.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteWhere {
    pub pattern: QuadPattern,
    pub span: SourceSpan,
}

impl DeleteWhere {
    pub fn new(pattern: QuadPattern, span: SourceSpan) -> Self {
        Self { pattern, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Modify {
    pub with_iri: Option<Iri>,
    pub using: Option<UsingClause>,
    pub delete_clause: Option<QuadPattern>,
    pub insert_clause: Option<QuadPattern>,
    pub where_clause: WherePattern,
    pub span: SourceSpan,
}

impl Modify {
    pub fn new(
        delete_clause: Option<QuadPattern>,
        insert_clause: Option<QuadPattern>,
        where_clause: WherePattern,
        span: SourceSpan,
    ) -> Self {
        Self {
            with_iri: None,
            using: None,
            delete_clause,
            insert_clause,
            where_clause,
            span,
        }
    }

    pub fn with_graph(mut self, iri: Iri) -> Self {
        self.with_iri = Some(iri);
        self
    }

    pub fn with_using(mut self, using: UsingClause) -> Self {
        self.using = Some(using);
        self
    }
}

/// Quads template: triple blocks, optionally inside `GRAPH name { ... }`.
#[derive(Clone, Debug, PartialEq)]
pub struct QuadPattern {
    pub quads: Vec<Quads>,
    pub span: SourceSpan,
}

impl QuadPattern {
    pub fn new(quads: Vec<Quads>, span: SourceSpan) -> Self {
        Self { quads, span }
    }

    /// A template with triples in the default graph only.
    pub fn triples(triples: Vec<TriplePattern>, span: SourceSpan) -> Self {
        Self {
            quads: vec![Quads {
                graph: None,
                triples,
                span,
            }],
            span,
        }
    }
}

/// A block of triples and the graph they belong to (`None` = default).
#[derive(Clone, Debug, PartialEq)]
pub struct Quads {
    pub graph: Option<VarOrIri>,
    pub triples: Vec<TriplePattern>,
    pub span: SourceSpan,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WherePattern {
    pub pattern: GraphPattern,
    pub span: SourceSpan,
}

impl WherePattern {
    pub fn new(pattern: GraphPattern, span: SourceSpan) -> Self {
        Self { pattern, span }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UsingClause {
    pub default_graphs: Vec<Iri>,
    pub named_graphs: Vec<Iri>,
    pub span: SourceSpan,
}

impl UsingClause {
    /// `USING <iri>`
    pub fn default_graph(iri: Iri, span: SourceSpan) -> Self {
        Self {
            default_graphs: vec![iri],
            named_graphs: Vec::new(),
            span,
        }
    }

    /// `USING NAMED <iri>`
    pub fn named_graph(iri: Iri, span: SourceSpan) -> Self {
        Self {
            default_graphs: Vec::new(),
            named_graphs: vec![iri],
            span,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.default_graphs.is_empty() && self.named_graphs.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Load {
    pub silent: bool,
    pub source: Iri,
    pub destination: Option<Iri>,
    pub span: SourceSpan,
}

/// CLEAR / DROP target.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphRefAll {
    Default,
    Named,
    All,
    Graph(Iri),
}

/// ADD / MOVE / COPY endpoint.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphOrDefault {
    Default,
    Graph(Iri),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphManagement {
    pub silent: bool,
    pub target: GraphRefAll,
    pub span: SourceSpan,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Create {
    pub silent: bool,
    pub graph: Iri,
    pub span: SourceSpan,
}

/// ADD, MOVE or COPY.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphTransfer {
    pub silent: bool,
    pub source: GraphOrDefault,
    pub destination: GraphOrDefault,
    pub span: SourceSpan,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::query::BaseDecl;

    fn test_span() -> SourceSpan {
        SourceSpan::new(0, 10)
    }

    #[test]
    fn test_insert_data_creation() {
        let data = QuadPattern::triples(vec![], test_span());
        let insert = InsertData::new(data, test_span());
        assert_eq!(insert.data.quads.len(), 1);
        assert!(insert.data.quads[0].graph.is_none());
    }

    #[test]
    fn test_modify_builder() {
        let where_pattern = WherePattern::new(GraphPattern::empty_bgp(test_span()), test_span());
        let modify = Modify::new(None, None, where_pattern, test_span())
            .with_graph(Iri::full("http://example.org/graph", test_span()))
            .with_using(UsingClause::named_graph(
                Iri::full("http://example.org/n", test_span()),
                test_span(),
            ));

        assert!(modify.with_iri.is_some());
        assert!(!modify.using.as_ref().unwrap().is_empty());
        assert!(modify.delete_clause.is_none());
    }

    #[test]
    fn test_units_keep_their_own_prologue() {
        let prologue =
            Prologue::new().with_base(BaseDecl::new("http://example.org/", test_span()));
        let clear = UpdateOperation::Clear(GraphManagement {
            silent: false,
            target: GraphRefAll::All,
            span: test_span(),
        });
        let request = UpdateRequest::new(
            vec![
                UpdateUnit::new(clear.clone()).with_prologue(prologue.clone()),
                UpdateUnit::new(clear),
            ],
            SourceSpan::new(0, 24),
        );
        assert_eq!(request.operations.len(), 2);
        assert_eq!(request.operations[0].prologue, prologue);
        assert_eq!(request.operations[1].prologue, Prologue::default());
    }
}
