//! AST for the retrace script dialect.
//!
//! Every node carries a [`Span`]. Source order is preserved everywhere,
//! including dict entries and keyword arguments.

use crate::Span;

/// A parsed script: a flat list of top-level statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `name = expr`
    Assign { target: Ident, value: Expr },
    /// `expr.attr = expr`
    SetAttr {
        object: Expr,
        attr: Ident,
        value: Expr,
    },
    /// A bare expression evaluated for its effect.
    Expr(Expr),
    /// `def name():` followed by an indented block.
    Def { name: Ident, body: Vec<Stmt> },
    /// `from a.b import x, y` or `from a.b import *`
    Import { module: String, names: ImportNames },
    /// `pass`
    Pass,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportNames {
    All,
    Names(Vec<Ident>),
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    NoneLit,
    BoolLit(bool),
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    BytesLit(Vec<u8>),
    Identifier(String),

    ListLit(Vec<Expr>),
    TupleLit(Vec<Expr>),
    DictLit(Vec<(Expr, Expr)>),
    SetLit(Vec<Expr>),

    /// Unary minus.
    Neg(Box<Expr>),
    /// `object.name`
    Attr { object: Box<Expr>, name: Ident },
    /// `object[index]`
    Index { object: Box<Expr>, index: Box<Expr> },
    /// `callee(args, name=value)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        kwargs: Vec<Keyword>,
    },
}

/// A `name=value` call argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: Ident,
    pub value: Expr,
}
