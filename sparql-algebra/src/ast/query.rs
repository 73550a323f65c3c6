//! Query forms, the prologue and solution modifiers.
//!
//! A [`SparqlAst`] is what the external parser hands to [`lower`](crate::lower)
//! and what [`lift`](crate::lift) hands back to the external generator.

use super::expr::Expression;
use super::pattern::{GraphPattern, TriplePattern};
use super::term::{Iri, Term, Var, VarOrIri};
use super::update::UpdateRequest;
use crate::span::SourceSpan;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub struct SparqlAst {
    pub prologue: Prologue,
    pub body: QueryBody,
    pub span: SourceSpan,
}

impl SparqlAst {
    pub fn new(prologue: Prologue, body: QueryBody, span: SourceSpan) -> Self {
        Self {
            prologue,
            body,
            span,
        }
    }
}

/// The query form, or an update request.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryBody {
    Select(SelectQuery),
    Construct(ConstructQuery),
    Ask(AskQuery),
    Describe(DescribeQuery),
    Update(UpdateRequest),
}

/// BASE and PREFIX declarations, in source order.
///
/// Declared prefixes may be relative; lowering resolves them against the
/// BASE in effect at that point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prologue {
    pub base: Option<BaseDecl>,
    pub prefixes: Vec<PrefixDecl>,
}

impl Prologue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: BaseDecl) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_prefix(mut self, prefix: PrefixDecl) -> Self {
        self.prefixes.push(prefix);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BaseDecl {
    pub iri: Arc<str>,
    pub span: SourceSpan,
}

impl BaseDecl {
    pub fn new(iri: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            iri: Arc::from(iri.as_ref()),
            span,
        }
    }
}

/// `PREFIX prefix: <iri>`; the empty prefix is the default namespace.
#[derive(Clone, Debug, PartialEq)]
pub struct PrefixDecl {
    pub prefix: Arc<str>,
    pub iri: Arc<str>,
    pub span: SourceSpan,
}

impl PrefixDecl {
    pub fn new(prefix: impl AsRef<str>, iri: impl AsRef<str>, span: SourceSpan) -> Self {
        Self {
            prefix: Arc::from(prefix.as_ref()),
            iri: Arc::from(iri.as_ref()),
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectQuery {
    pub select: SelectClause,
    pub dataset: Option<DatasetClause>,
    pub where_clause: WhereClause,
    pub modifiers: SolutionModifiers,
    pub span: SourceSpan,
}

impl SelectQuery {
    /// A SELECT without a dataset clause.
    pub fn new(
        select: SelectClause,
        where_clause: WhereClause,
        modifiers: SolutionModifiers,
        span: SourceSpan,
    ) -> Self {
        Self {
            select,
            dataset: None,
            where_clause,
            modifiers,
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectClause {
    pub modifier: Option<SelectModifier>,
    pub variables: SelectVariables,
    pub span: SourceSpan,
}

impl SelectClause {
    pub fn star(span: SourceSpan) -> Self {
        Self {
            modifier: None,
            variables: SelectVariables::Star,
            span,
        }
    }

    pub fn variables(vars: Vec<SelectVariable>, span: SourceSpan) -> Self {
        Self {
            modifier: None,
            variables: SelectVariables::Explicit(vars),
            span,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectModifier {
    Distinct,
    Reduced,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectVariables {
    Star,
    Explicit(Vec<SelectVariable>),
}

/// One projected item: `?v` or `(expr AS ?v)`.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectVariable {
    Var(Var),
    Expr {
        expr: Expression,
        alias: Var,
        span: SourceSpan,
    },
}

impl SelectVariable {
    /// The variable this item binds in the result.
    pub fn var(&self) -> &Var {
        match self {
            SelectVariable::Var(v) => v,
            SelectVariable::Expr { alias, .. } => alias,
        }
    }
}

/// FROM and FROM NAMED graphs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatasetClause {
    pub default_graphs: Vec<Iri>,
    pub named_graphs: Vec<Iri>,
    pub span: SourceSpan,
}

impl DatasetClause {
    pub fn is_empty(&self) -> bool {
        self.default_graphs.is_empty() && self.named_graphs.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhereClause {
    /// The WHERE keyword is optional in SELECT and ASK; kept for printing.
    pub has_where_keyword: bool,
    pub pattern: GraphPattern,
    pub span: SourceSpan,
}

impl WhereClause {
    pub fn new(pattern: GraphPattern, has_where_keyword: bool, span: SourceSpan) -> Self {
        Self {
            has_where_keyword,
            pattern,
            span,
        }
    }
}

/// Everything after the WHERE clause, including a trailing VALUES block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolutionModifiers {
    pub group_by: Option<GroupByClause>,
    pub having: Option<HavingClause>,
    pub order_by: Option<OrderByClause>,
    pub limit: Option<LimitClause>,
    pub offset: Option<OffsetClause>,
    pub values: Option<ValuesClause>,
}

impl SolutionModifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group_by(mut self, group_by: GroupByClause) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn with_having(mut self, having: HavingClause) -> Self {
        self.having = Some(having);
        self
    }

    pub fn with_order_by(mut self, order_by: OrderByClause) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn with_limit(mut self, limit: LimitClause) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: OffsetClause) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_values(mut self, values: ValuesClause) -> Self {
        self.values = Some(values);
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GroupByClause {
    pub conditions: Vec<GroupCondition>,
    pub span: SourceSpan,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GroupCondition {
    Var(Var),
    /// `(expr)` or `(expr AS ?alias)`
    Expr {
        expr: Expression,
        alias: Option<Var>,
        span: SourceSpan,
    },
}

/// HAVING constraints; several are conjoined.
#[derive(Clone, Debug, PartialEq)]
pub struct HavingClause {
    pub conditions: Vec<Expression>,
    pub span: SourceSpan,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderByClause {
    pub conditions: Vec<OrderCondition>,
    pub span: SourceSpan,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderCondition {
    pub expr: OrderExpr,
    pub direction: OrderDirection,
    pub span: SourceSpan,
}

#[derive(Clone, Debug, PartialEq)]
pub enum OrderExpr {
    Var(Var),
    Expr(Expression),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LimitClause {
    pub value: u64,
    pub span: SourceSpan,
}

impl LimitClause {
    pub fn new(value: u64, span: SourceSpan) -> Self {
        Self { value, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OffsetClause {
    pub value: u64,
    pub span: SourceSpan,
}

impl OffsetClause {
    pub fn new(value: u64, span: SourceSpan) -> Self {
        Self { value, span }
    }
}

/// CONSTRUCT; `template` is `None` for the `CONSTRUCT WHERE { ... }` short
/// form, whose template is the WHERE pattern itself.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructQuery {
    pub template: Option<ConstructTemplate>,
    pub dataset: Option<DatasetClause>,
    pub where_clause: WhereClause,
    pub modifiers: SolutionModifiers,
    pub span: SourceSpan,
}

impl ConstructQuery {
    pub fn new(
        template: Option<ConstructTemplate>,
        where_clause: WhereClause,
        modifiers: SolutionModifiers,
        span: SourceSpan,
    ) -> Self {
        Self {
            template,
            dataset: None,
            where_clause,
            modifiers,
            span,
        }
    }
}

/// Triples a CONSTRUCT instantiates per solution. Blank nodes here are
/// fresh per solution, never pattern variables.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstructTemplate {
    pub triples: Vec<TriplePattern>,
    pub span: SourceSpan,
}

impl ConstructTemplate {
    pub fn new(triples: Vec<TriplePattern>, span: SourceSpan) -> Self {
        Self { triples, span }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AskQuery {
    pub dataset: Option<DatasetClause>,
    pub where_clause: WhereClause,
    pub modifiers: SolutionModifiers,
    pub span: SourceSpan,
}

impl AskQuery {
    pub fn new(where_clause: WhereClause, span: SourceSpan) -> Self {
        Self {
            dataset: None,
            where_clause,
            modifiers: SolutionModifiers::new(),
            span,
        }
    }
}

/// DESCRIBE; the WHERE clause is optional.
#[derive(Clone, Debug, PartialEq)]
pub struct DescribeQuery {
    pub target: DescribeTarget,
    pub dataset: Option<DatasetClause>,
    pub where_clause: Option<WhereClause>,
    pub modifiers: SolutionModifiers,
    pub span: SourceSpan,
}

impl DescribeQuery {
    pub fn new(target: DescribeTarget, span: SourceSpan) -> Self {
        Self {
            target,
            dataset: None,
            where_clause: None,
            modifiers: SolutionModifiers::new(),
            span,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DescribeTarget {
    /// `DESCRIBE *`: every variable in scope of the WHERE clause
    Star,
    Resources(Vec<VarOrIri>),
}

/// A VALUES block; `None` cells are UNDEF.
#[derive(Clone, Debug, PartialEq)]
pub struct ValuesClause {
    pub vars: Vec<Var>,
    pub data: Vec<Vec<Option<Term>>>,
    pub span: SourceSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> SourceSpan {
        SourceSpan::default()
    }

    #[test]
    fn test_select_variable_binds_alias() {
        let plain = SelectVariable::Var(Var::new("s", span()));
        let aliased = SelectVariable::Expr {
            expr: Expression::var(Var::new("o", span())),
            alias: Var::new("n", span()),
            span: span(),
        };
        assert_eq!(plain.var().name.as_ref(), "s");
        assert_eq!(aliased.var().name.as_ref(), "n");
    }

    #[test]
    fn test_empty_dataset_clause() {
        let mut dataset = DatasetClause::default();
        assert!(dataset.is_empty());
        dataset.named_graphs.push(Iri::full("http://example.org/g", span()));
        assert!(!dataset.is_empty());
    }

    #[test]
    fn test_modifier_builders_compose() {
        let modifiers = SolutionModifiers::new()
            .with_limit(LimitClause::new(3, span()))
            .with_having(HavingClause {
                conditions: vec![Expression::var(Var::new("ok", span()))],
                span: span(),
            });
        assert!(modifiers.group_by.is_none());
        assert_eq!(modifiers.having.map(|h| h.conditions.len()), Some(1));
        assert_eq!(modifiers.limit.map(|l| l.value), Some(3));
    }
}
