//! Expressions of FILTER, BIND, SELECT, GROUP BY, HAVING and ORDER BY.
//!
//! Every operator, built-in call and aggregate knows the name it carries in
//! algebra expressions (`&&`, `UMINUS`, `regex`, `count`, ...). Lowering maps
//! through `operator_name`, lifting back through `from_operator_name`.

use super::pattern::GraphPattern;
use super::term::{Iri, Literal, Var};
use crate::span::SourceSpan;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Var(Var),
    Literal(Literal),
    Iri(Iri),
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        span: SourceSpan,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        span: SourceSpan,
    },
    /// Built-in or extension function call
    FunctionCall {
        name: FunctionName,
        args: Vec<Expression>,
        distinct: bool,
        span: SourceSpan,
    },
    If {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
        span: SourceSpan,
    },
    Coalesce {
        args: Vec<Expression>,
        span: SourceSpan,
    },
    /// `expr IN (...)`, or `NOT IN` when `negated`
    In {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
        span: SourceSpan,
    },
    Exists {
        pattern: Box<GraphPattern>,
        span: SourceSpan,
    },
    NotExists {
        pattern: Box<GraphPattern>,
        span: SourceSpan,
    },
    /// `expr` is `None` for `COUNT(*)`.
    Aggregate {
        function: AggregateFunction,
        expr: Option<Box<Expression>>,
        distinct: bool,
        separator: Option<Arc<str>>,
        span: SourceSpan,
    },
    /// Parenthesized expression; translation looks straight through it.
    Bracketed {
        inner: Box<Expression>,
        span: SourceSpan,
    },
}

impl Expression {
    pub fn var(var: Var) -> Self {
        Expression::Var(var)
    }

    pub fn literal(lit: Literal) -> Self {
        Expression::Literal(lit)
    }

    pub fn iri(iri: Iri) -> Self {
        Expression::Iri(iri)
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression, span: SourceSpan) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        }
    }

    pub fn unary(op: UnaryOp, operand: Expression, span: SourceSpan) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
            span,
        }
    }

    /// A non-DISTINCT call.
    pub fn function_call(name: FunctionName, args: Vec<Expression>, span: SourceSpan) -> Self {
        Expression::FunctionCall {
            name,
            args,
            distinct: false,
            span,
        }
    }
}

/// Defines a fieldless operator enum together with its algebra names.
macro_rules! named_operators {
    ($(#[$meta:meta])* $vis:vis enum $ty:ident { $($variant:ident => $name:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $ty {
            $($variant),*
        }

        impl $ty {
            pub fn operator_name(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name),*
                }
            }

            pub fn from_operator_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some($ty::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

named_operators! {
    /// Infix operators; the algebra name is the SPARQL symbol.
    pub enum BinaryOp {
        And => "&&",
        Or => "||",
        Eq => "=",
        Ne => "!=",
        Lt => "<",
        Le => "<=",
        Gt => ">",
        Ge => ">=",
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
    }
}

named_operators! {
    /// Prefix operators. Minus and plus are renamed so they never collide
    /// with the binary operators.
    pub enum UnaryOp {
        Not => "!",
        Neg => "UMINUS",
        Pos => "UPLUS",
    }
}

named_operators! {
    pub enum AggregateFunction {
        Count => "count",
        Sum => "sum",
        Avg => "avg",
        Min => "min",
        Max => "max",
        GroupConcat => "group_concat",
        Sample => "sample",
    }
}

named_operators! {
    /// Built-in call names. `IsUri` and `Uri` keep their own spelling so a
    /// lifted query prints the way it was written.
    pub enum Builtin {
        Bound => "bound",
        IsIri => "isiri",
        IsUri => "isuri",
        IsBlank => "isblank",
        IsLiteral => "isliteral",
        IsNumeric => "isnumeric",
        Str => "str",
        Lang => "lang",
        Datatype => "datatype",
        Iri => "iri",
        Uri => "uri",
        BNode => "bnode",
        StrLang => "strlang",
        StrDt => "strdt",
        Strlen => "strlen",
        Substr => "substr",
        Ucase => "ucase",
        Lcase => "lcase",
        StrStarts => "strstarts",
        StrEnds => "strends",
        Contains => "contains",
        StrBefore => "strbefore",
        StrAfter => "strafter",
        EncodeForUri => "encode_for_uri",
        Concat => "concat",
        LangMatches => "langmatches",
        Regex => "regex",
        Replace => "replace",
        Abs => "abs",
        Round => "round",
        Ceil => "ceil",
        Floor => "floor",
        Rand => "rand",
        Now => "now",
        Year => "year",
        Month => "month",
        Day => "day",
        Hours => "hours",
        Minutes => "minutes",
        Seconds => "seconds",
        Timezone => "timezone",
        Tz => "tz",
        Md5 => "md5",
        Sha1 => "sha1",
        Sha256 => "sha256",
        Sha384 => "sha384",
        Sha512 => "sha512",
        SameTerm => "sameterm",
        Uuid => "uuid",
        StrUuid => "struuid",
        Triple => "triple",
        Subject => "subject",
        Predicate => "predicate",
        Object => "object",
        IsTriple => "istriple",
        If => "if",
        Coalesce => "coalesce",
    }
}

/// The callee of a function call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunctionName {
    Builtin(Builtin),
    /// Extension function named by IRI; lowers to a named expression
    Extension(Iri),
}

impl FunctionName {
    /// Algebra operator name; `None` for extension functions.
    pub fn operator_name(&self) -> Option<&'static str> {
        match self {
            FunctionName::Builtin(builtin) => Some(builtin.operator_name()),
            FunctionName::Extension(_) => None,
        }
    }

    /// Built-in for an algebra operator name, ignoring ASCII case.
    pub fn from_operator_name(name: &str) -> Option<Self> {
        Builtin::from_operator_name(&name.to_ascii_lowercase()).map(FunctionName::Builtin)
    }
}

impl From<Builtin> for FunctionName {
    fn from(builtin: Builtin) -> Self {
        FunctionName::Builtin(builtin)
    }
}
