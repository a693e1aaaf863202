//! Lowers a parsed [`Span`] tree into IR (§4.8). A [`Compiler`] is a small
//! cursor over the program under construction: a current block to append
//! instructions to, a current scope to resolve and bind names in, and the
//! errors accumulated so far. Lowering a node never aborts the whole
//! compilation — a failing subtree records a [`CompileError`] and returns
//! `None`, and its caller propagates that `None` upward without emitting a
//! follow-on error for the same cause.

mod control;
mod merge;

use std::rc::Rc;

use crate::diagnostics::{CompileError, SourceSpan};
use crate::ir::{BlockId, Program};
use crate::syntax::{BinaryOp, Expr, Span, UnaryOp};
use crate::types::{ScopeNode, ScopeRef, Type};

pub struct Compiler {
    pub program: Program,
    block: BlockId,
    scope: ScopeRef,
    errors: Vec<CompileError>,
}

/// The outcome of compiling a whole source file: the IR built so far, the
/// block execution falls into after the last top-level statement, the type
/// of that statement (`None` if compilation failed), and any errors
/// recorded along the way.
pub struct CompileResult {
    pub program: Program,
    pub exit_block: BlockId,
    pub result_type: Option<Type>,
    pub errors: Vec<CompileError>,
}

/// Parses and lowers `source` in one pass. The entry block is named
/// `_start`; callers that want a runnable program still need to install an
/// `Exit` branch on `exit_block` themselves (the compiler doesn't know
/// which value the caller wants to observe).
pub fn compile(source: &str) -> CompileResult {
    let (tree, parse_errors) = crate::syntax::parse(source);
    let mut compiler = Compiler::new();
    compiler.errors.extend(parse_errors);
    let result_type = compiler.compile(&tree);
    CompileResult {
        program: compiler.program,
        exit_block: compiler.block,
        result_type,
        errors: compiler.errors,
    }
}

impl Compiler {
    pub fn new() -> Self {
        let mut program = Program::new();
        let entry = program.new_block();
        program.set_block_name(entry, "_start");
        Compiler { program, block: entry, scope: ScopeNode::root(), errors: Vec::new() }
    }

    fn error(&mut self, err: CompileError) -> Option<Type> {
        self.errors.push(err);
        None
    }

    fn error_unit(&mut self, err: CompileError) -> Option<()> {
        self.errors.push(err);
        None
    }

    /// Lowers one node, producing its [`Type`] (and the instructions/
    /// branches needed to compute it) or recording why it couldn't be
    /// lowered.
    pub(crate) fn compile(&mut self, span: &Span) -> Option<Type> {
        match &span.expr {
            Expr::IntegerLiteral(n) => Some(Type::Integer(self.program.constant(self.block, *n))),
            Expr::BooleanLiteral(b) => Some(Type::Boolean(self.program.constant(self.block, *b as i64))),
            Expr::Identifier(name) => match ScopeNode::get(&self.scope, name) {
                Some(ty) => Some(ty),
                None => self.error(CompileError::name(format!("undefined name '{name}'"), span)),
            },
            Expr::Error(message) => self.error(CompileError::parse(message.clone(), span)),
            Expr::Tuple(items) => {
                let mut types = Vec::with_capacity(items.len());
                for item in items {
                    types.push(self.compile(item)?);
                }
                Some(Type::Tuple(types))
            }
            Expr::Struct(body) => self.compile_struct(body),
            Expr::Block(items) => self.compile_block(items),
            Expr::Unary { op: UnaryOp::Maybe, .. } => {
                self.error(CompileError::ty("'?' is only valid in a boolean context".to_string(), span))
            }
            Expr::Binary { op: BinaryOp::Add, left, right } => self.compile_add(left, right),
            Expr::Binary { op: BinaryOp::Assign, left, right } => self.compile_assign(left, right),
            Expr::Binary { op: BinaryOp::Dot, left, right } => self.compile_dot(left, right),
            Expr::Binary { op: BinaryOp::Less, left, right } => self.compile_comparison_value(left, right),
            Expr::Binary { op: BinaryOp::If, left, right } => self.compile_if(left, right),
            Expr::Binary { op: BinaryOp::Else, left, right } => self.compile_else(left, right),
            Expr::Binary { op: BinaryOp::While, left, right } => self.compile_while(left, right),
            Expr::Binary { op: BinaryOp::Fn, left, right } => self.compile_fn(left, right),
            Expr::Binary { op: BinaryOp::Call, left, right } => self.compile_call(left, right),
        }
    }

    fn compile_block(&mut self, items: &[Span]) -> Option<Type> {
        if items.is_empty() {
            return Some(Type::Tuple(Vec::new()));
        }
        let mut result = None;
        for item in items {
            result = self.compile(item);
            result.as_ref()?;
        }
        result
    }

    fn compile_struct(&mut self, body: &Span) -> Option<Type> {
        let parent = Rc::clone(&self.scope);
        self.scope = ScopeNode::child(&parent);
        let body_result = self.compile(body);
        let fields = ScopeNode::snapshot(&self.scope);
        self.scope = parent;
        body_result?;
        Some(Type::Struct(fields))
    }

    fn compile_add(&mut self, left: &Span, right: &Span) -> Option<Type> {
        let a = self.compile(left)?;
        let b = self.compile(right)?;
        match (a, b) {
            (Type::Integer(av), Type::Integer(bv)) => Some(Type::Integer(self.program.add(self.block, av, bv))),
            (a, b) => self.error(CompileError::ty(
                format!("cannot add {} and {}", a.type_string(), b.type_string()),
                left,
            )),
        }
    }

    fn compile_assign(&mut self, left: &Span, right: &Span) -> Option<Type> {
        let value = self.compile(right)?;
        self.bind_pattern(left, value.clone())?;
        Some(value)
    }

    /// `left.right`: `left` must evaluate to a struct; `right` is lowered
    /// with that struct's fields bound in a child scope, so `p.a` resolves
    /// `a` the same way a bare identifier would inside the struct. If
    /// `left` is itself an identifier, the binding is re-matched against the
    /// (possibly mutated, e.g. by an assignment inside `right`) struct
    /// snapshot afterward.
    fn compile_dot(&mut self, left: &Span, right: &Span) -> Option<Type> {
        let left_ty = self.compile(left)?;
        let Type::Struct(fields) = left_ty else {
            return self.error(CompileError::ty(
                format!("'.' requires a struct, found {}", left_ty.type_string()),
                left,
            ));
        };
        let parent = Rc::clone(&self.scope);
        self.scope = ScopeNode::child(&parent);
        for (name, ty) in &fields {
            ScopeNode::assign(&self.scope, name.clone(), ty.clone());
        }
        let right_result = self.compile(right);
        let updated_fields = ScopeNode::snapshot(&self.scope);
        self.scope = parent;
        let right_ty = right_result?;
        if matches!(left.expr, Expr::Identifier(_)) {
            self.bind_pattern(left, Type::Struct(updated_fields))?;
        }
        Some(right_ty)
    }

    /// `<` used as a value (not a condition): lower it against two
    /// throwaway blocks, same as a boolean-context `<`, then fold the
    /// chosen branch back into a single `Boolean` value.
    fn compile_comparison_value(&mut self, left: &Span, right: &Span) -> Option<Type> {
        let true_block = self.program.new_block();
        let false_block = self.program.new_block();
        let join_block = self.program.new_block();
        self.compile_less(left, right, true_block, false_block)?;
        let one = self.program.constant(true_block, 1);
        self.program.jump(true_block, join_block);
        let zero = self.program.constant(false_block, 0);
        self.program.jump(false_block, join_block);
        self.block = join_block;
        Some(Type::Boolean(self.merge_values(one, true_block, zero, false_block)))
    }

    /// Binds `pattern` against `value`, recording a shape error if the
    /// pattern and value don't agree. Identifiers bind directly; tuples
    /// destructure position by position. This is the only place names enter
    /// scope outside of function-call parameter binding.
    fn bind_pattern(&mut self, pattern: &Span, value: Type) -> Option<()> {
        match &pattern.expr {
            Expr::Identifier(name) => {
                ScopeNode::assign(&self.scope, name.clone(), value);
                Some(())
            }
            Expr::Tuple(items) => match value {
                Type::Tuple(values) if values.len() == items.len() => {
                    for (item, v) in items.iter().zip(values) {
                        self.bind_pattern(item, v)?;
                    }
                    Some(())
                }
                other => self.error_unit(CompileError::shape(
                    format!(
                        "cannot destructure {} into a {}-element tuple pattern",
                        other.type_string(),
                        items.len()
                    ),
                    pattern,
                )),
            },
            _ => self.error_unit(CompileError::shape("invalid binding pattern".to_string(), pattern)),
        }
    }
}
