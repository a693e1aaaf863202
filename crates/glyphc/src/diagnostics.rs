//! Structured compiler diagnostics (§7). Every variant here is a recorded
//! failure of a subtree during lowering or parsing; the compiler keeps
//! going after recording one (no error aborts the pass), matching the
//! accumulate-and-continue policy the front end is built around.

use std::fmt;

use thiserror::Error;

use crate::syntax::{Position, Span};

/// A 1-indexed line/column into the source a diagnostic was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl From<&Span> for SourceSpan {
    /// Anchors on the span's start — close enough to point an editor at the
    /// right line without needing to carry a whole range around.
    fn from(span: &Span) -> Self {
        SourceSpan { line: span.start_line, column: span.start_column }
    }
}

impl From<Position<'_>> for SourceSpan {
    fn from(pos: Position<'_>) -> Self {
        SourceSpan { line: pos.line(), column: pos.column() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("parse error: {0} ({1})")]
    Parse(String, SourceSpan),
    #[error("undefined name: {0} ({1})")]
    Name(String, SourceSpan),
    #[error("type error: {0} ({1})")]
    Type(String, SourceSpan),
    #[error("shape error: {0} ({1})")]
    Shape(String, SourceSpan),
    /// No source location applies — raised once, for a whole compilation
    /// that produced no top-level value at all.
    #[error("unimplemented: {0}")]
    Unimplemented(String),
}

impl CompileError {
    pub fn parse(message: impl Into<String>, at: impl Into<SourceSpan>) -> Self {
        CompileError::Parse(message.into(), at.into())
    }

    pub fn name(message: impl Into<String>, at: impl Into<SourceSpan>) -> Self {
        CompileError::Name(message.into(), at.into())
    }

    pub fn ty(message: impl Into<String>, at: impl Into<SourceSpan>) -> Self {
        CompileError::Type(message.into(), at.into())
    }

    pub fn shape(message: impl Into<String>, at: impl Into<SourceSpan>) -> Self {
        CompileError::Shape(message.into(), at.into())
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        CompileError::Unimplemented(message.into())
    }
}
