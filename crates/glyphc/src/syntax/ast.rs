//! The parsed syntax tree: a closed set of expression forms, each tagged
//! with the source span it was parsed from.

use std::fmt;

use super::position::Position;

/// A binary expression form. `Dot` (field access), `Assign` (`=`, also
/// used for destructuring binds) and the control-flow forms (`If`, `Else`,
/// `While`, `Fn`, `Call`) are modeled as ordinary binary operators so the
/// parser's precedence ladder and the lowerer's per-node dispatch both stay
/// a single flat match over one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Less,
    Assign,
    Dot,
    If,
    Else,
    While,
    Fn,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Postfix `?`, valid only in a boolean-expression context.
    Maybe,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Identifier(String),
    IntegerLiteral(i64),
    BooleanLiteral(bool),
    Binary { op: BinaryOp, left: Box<Span>, right: Box<Span> },
    Unary { op: UnaryOp, operand: Box<Span> },
    /// Statements executed in order; the block's type is the last one's.
    Block(Vec<Span>),
    /// Positional `(a, b, c)`.
    Tuple(Vec<Span>),
    /// `struct { ... }` — the inner block's statements populate the struct.
    Struct(Box<Span>),
    /// A node the parser could not make sense of; carries the message that
    /// was also recorded as a `CompileError::Parse`, so the tree stays
    /// walkable without the lowerer needing a second error channel.
    Error(String),
}

/// An AST node together with the source range it was parsed from.
#[derive(Debug, Clone)]
pub struct Span {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub expr: Expr,
}

impl Span {
    pub fn new(start: Position<'_>, end: Position<'_>, expr: Expr) -> Self {
        Span {
            start_line: start.line(),
            start_column: start.column(),
            end_line: end.line(),
            end_column: end.column(),
            expr,
        }
    }

    pub fn error(start: Position<'_>, end: Position<'_>, message: impl Into<String>) -> Self {
        Span::new(start, end, Expr::Error(message.into()))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_indented(self, f, 0)
    }
}

fn fmt_indented(span: &Span, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match &span.expr {
        Expr::Identifier(name) => writeln!(f, "{pad}{name}"),
        Expr::IntegerLiteral(n) => writeln!(f, "{pad}{n}"),
        Expr::BooleanLiteral(b) => writeln!(f, "{pad}{b}"),
        Expr::Error(message) => writeln!(f, "{pad}<error: {message}>"),
        Expr::Unary { op, operand } => {
            writeln!(f, "{pad}{op:?}")?;
            fmt_indented(operand, f, depth + 1)
        }
        Expr::Binary { op, left, right } => {
            writeln!(f, "{pad}{op:?}")?;
            fmt_indented(left, f, depth + 1)?;
            fmt_indented(right, f, depth + 1)
        }
        Expr::Block(items) | Expr::Tuple(items) => {
            let label = if matches!(span.expr, Expr::Block(_)) { "block" } else { "tuple" };
            writeln!(f, "{pad}{label}")?;
            for item in items {
                fmt_indented(item, f, depth + 1)?;
            }
            Ok(())
        }
        Expr::Struct(body) => {
            writeln!(f, "{pad}struct")?;
            fmt_indented(body, f, depth + 1)
        }
    }
}
