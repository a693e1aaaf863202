//! Control-flow joins (§4.8.1, §4.8.2): merging two branches' scopes and
//! types into the single scope/type visible after the join, and lowering
//! conditions into branches (§4.8.3).

use std::collections::BTreeMap;

use crate::diagnostics::{CompileError, SourceSpan};
use crate::ir::{BlockId, ValueId};
use crate::syntax::{BinaryOp, Expr, Span, UnaryOp};
use crate::types::{ScopeNode, ScopeRef, Type};

use super::Compiler;

impl Compiler {
    /// `dest = a` on `a_block`, `dest = b` on `b_block`, same fresh `dest`.
    /// The building block every other merge in this module is made of:
    /// exactly one of `a_block`/`b_block` runs for any given execution, so
    /// `dest` always ends up with a well-defined value despite having two
    /// static defs.
    pub(super) fn merge_values(&mut self, a: ValueId, a_block: BlockId, b: ValueId, b_block: BlockId) -> ValueId {
        let dest = self.program.new_value();
        self.program.copy_into(a_block, a, dest);
        self.program.copy_into(b_block, b, dest);
        dest
    }

    /// Merges two values of the same shape (same `type_string`) leaf by
    /// leaf via `merge_values`. Presence flags of nested `Maybe`s are merged
    /// the same way as any other leaf.
    fn merge_same_shape(&mut self, a: &Type, a_block: BlockId, b: &Type, b_block: BlockId) -> Type {
        match (a, b) {
            (Type::Integer(av), Type::Integer(bv)) => Type::Integer(self.merge_values(*av, a_block, *bv, b_block)),
            (Type::Boolean(av), Type::Boolean(bv)) => Type::Boolean(self.merge_values(*av, a_block, *bv, b_block)),
            (Type::Maybe(ap, ai), Type::Maybe(bp, bi)) => {
                let presence = self.merge_values(*ap, a_block, *bp, b_block);
                let inner = self.merge_same_shape(ai, a_block, bi, b_block);
                Type::Maybe(presence, Box::new(inner))
            }
            (Type::Tuple(ats), Type::Tuple(bts)) => Type::Tuple(
                ats.iter()
                    .zip(bts)
                    .map(|(at, bt)| self.merge_same_shape(at, a_block, bt, b_block))
                    .collect(),
            ),
            (Type::Struct(af), Type::Struct(bf)) => Type::Struct(
                af.iter()
                    .map(|(name, at)| {
                        let bt = bf.get(name).expect("merge_same_shape: struct field missing on other side");
                        (name.clone(), self.merge_same_shape(at, a_block, bt, b_block))
                    })
                    .collect(),
            ),
            (Type::Func(f), Type::Func(_)) => Type::Func(std::rc::Rc::clone(f)),
            _ => unreachable!("merge_same_shape called on mismatched shapes despite equal type strings"),
        }
    }

    /// Wraps `child_ty` in a fresh `Maybe`, present (1) on `c_block` and
    /// absent (0) on `a_block`. Used both when one side of a join doesn't
    /// bind a name the other does, and when lifting a non-`Maybe` side to
    /// match a `Maybe` one in `merge_types`. If `child_ty` is already a
    /// `Maybe`, flattens instead of double-wrapping: the existing presence
    /// value carries through on `c_block`, only `a_block` needs a fresh 0.
    pub(super) fn new_maybe(&mut self, child_ty: Type, c_block: BlockId, a_block: BlockId) -> Type {
        let presence = self.program.new_value();
        let zero = self.program.constant(a_block, 0);
        self.program.copy_into(a_block, zero, presence);
        if let Type::Maybe(inner_val, inner_ty) = child_ty {
            self.program.copy_into(c_block, inner_val, presence);
            Type::Maybe(presence, inner_ty)
        } else {
            let one = self.program.constant(c_block, 1);
            self.program.copy_into(c_block, one, presence);
            Type::Maybe(presence, Box::new(child_ty))
        }
    }

    /// Merges the types of two branches of a join (§4.8.2). Types with the
    /// same printed form merge leaf-by-leaf (and may collapse a `Maybe`
    /// apart if both sides happen to agree past it — see `merge_same_shape`
    /// restoring a plain type when both branches write it). Structs merge
    /// field-by-field, field-by-field absence lifting to `Maybe`. Exactly
    /// one side being `Maybe` lifts the other, each side judged only by its
    /// own shape — lifting `b` never depends on what `a` is, and vice
    /// versa. Anything else is a genuine type mismatch.
    pub(super) fn merge_types(&mut self, a: Type, a_block: BlockId, b: Type, b_block: BlockId, at: SourceSpan) -> Option<Type> {
        if a.type_string() == b.type_string() {
            return Some(self.merge_same_shape(&a, a_block, &b, b_block));
        }
        if let (Type::Struct(a_fields), Type::Struct(b_fields)) = (&a, &b) {
            let mut names: Vec<String> = a_fields.keys().chain(b_fields.keys()).cloned().collect();
            names.sort();
            names.dedup();
            let mut out = BTreeMap::new();
            for name in names {
                let merged = match (a_fields.get(&name), b_fields.get(&name)) {
                    (Some(at_ty), Some(bt)) => self.merge_types(at_ty.clone(), a_block, bt.clone(), b_block, at)?,
                    (Some(at_ty), None) => self.new_maybe(at_ty.clone(), a_block, b_block),
                    (None, Some(bt)) => self.new_maybe(bt.clone(), b_block, a_block),
                    (None, None) => continue,
                };
                out.insert(name, merged);
            }
            return Some(Type::Struct(out));
        }
        if a.is_maybe() != b.is_maybe() {
            let (a_presence, a_inner, b_presence, b_inner) = match (a, b) {
                (Type::Maybe(ap, ai), b) => {
                    let Type::Maybe(bp, bi) = self.new_maybe(b, b_block, a_block) else { unreachable!() };
                    (ap, *ai, bp, *bi)
                }
                (a, Type::Maybe(bp, bi)) => {
                    let Type::Maybe(ap, ai) = self.new_maybe(a, a_block, b_block) else { unreachable!() };
                    (ap, *ai, bp, *bi)
                }
                _ => unreachable!(),
            };
            let presence = self.merge_values(a_presence, a_block, b_presence, b_block);
            let inner = self.merge_types(a_inner, a_block, b_inner, b_block, at)?;
            return Some(Type::Maybe(presence, Box::new(inner)));
        }
        self.error(CompileError::ty(
            format!("incompatible types: {} and {}", a.type_string(), b.type_string()),
            at,
        ));
        None
    }

    /// Merges every name given by `names` between two branch scopes into
    /// `target` (§4.8.1). A name present on only one side is wrapped in a
    /// fresh `Maybe`; present on both, the two types are merged. `names`
    /// should cover exactly the bindings that might differ between the two
    /// sides — callers pick that set based on which of `a_scope`/`c_scope`
    /// are genuinely per-branch frames versus long-lived outer ones.
    pub(super) fn merge_scopes_over(
        &mut self,
        names: impl Iterator<Item = String>,
        a_scope: &ScopeRef,
        a_block: BlockId,
        c_scope: &ScopeRef,
        c_block: BlockId,
        target: &ScopeRef,
        at: SourceSpan,
    ) -> Option<()> {
        for name in names {
            let a_ty = ScopeNode::get(a_scope, &name);
            let c_ty = ScopeNode::get(c_scope, &name);
            let merged = match (a_ty, c_ty) {
                (Some(a_ty), Some(c_ty)) => self.merge_types(a_ty, a_block, c_ty, c_block, at)?,
                (Some(a_ty), None) => self.new_maybe(a_ty, a_block, c_block),
                (None, Some(c_ty)) => self.new_maybe(c_ty, c_block, a_block),
                (None, None) => continue,
            };
            ScopeNode::assign(target, name, merged);
        }
        Some(())
    }

    /// Lowers `a < b` (both integer) into a branch: `JumpIfGreater(b, a, ..)`
    /// selects `if_true` exactly when `a < b`.
    pub(super) fn compile_less(
        &mut self,
        left: &Span,
        right: &Span,
        if_true: BlockId,
        if_false: BlockId,
    ) -> Option<()> {
        let a = self.compile(left)?;
        let b = self.compile(right)?;
        match (a, b) {
            (Type::Integer(av), Type::Integer(bv)) => {
                self.program.jump_if_greater(self.block, bv, av, if_true, if_false);
                Some(())
            }
            (a, b) => {
                self.error(CompileError::ty(
                    format!("'<' requires integers, found {} and {}", a.type_string(), b.type_string()),
                    left,
                ));
                None
            }
        }
    }

    /// Lowers `span` as a boolean-context condition (§4.8.3): a literal
    /// jumps unconditionally, `bool` identifiers/subexpressions branch on
    /// equality with `1`, `<` branches directly via `compile_less`, and
    /// `expr?` branches on a `Maybe`'s presence, narrowing `expr` (when it's
    /// a plain identifier) to its inner type on the `if_true` side only.
    pub(super) fn compile_bool_expr(
        &mut self,
        span: &Span,
        if_true: BlockId,
        if_false: BlockId,
    ) -> Option<()> {
        match &span.expr {
            Expr::BooleanLiteral(true) => {
                self.program.jump(self.block, if_true);
                Some(())
            }
            Expr::BooleanLiteral(false) => {
                self.program.jump(self.block, if_false);
                Some(())
            }
            Expr::Binary { op: BinaryOp::Less, left, right } => self.compile_less(left, right, if_true, if_false),
            Expr::Unary { op: UnaryOp::Maybe, operand } => {
                let ty = self.compile(operand)?;
                let Type::Maybe(presence, inner) = ty else {
                    return self.error_bool(
                        format!("'?' requires a maybe type, found {}", ty.type_string()),
                        operand,
                    );
                };
                let one = self.program.constant(self.block, 1);
                self.program.jump_if_equal(self.block, presence, one, if_true, if_false);
                if let Expr::Identifier(name) = &operand.expr {
                    let narrowed = ScopeNode::child(&self.scope);
                    ScopeNode::assign(&narrowed, name.clone(), *inner);
                    self.scope = narrowed;
                }
                Some(())
            }
            _ => {
                let ty = self.compile(span)?;
                match ty {
                    Type::Boolean(v) => {
                        let one = self.program.constant(self.block, 1);
                        self.program.jump_if_equal(self.block, v, one, if_true, if_false);
                        Some(())
                    }
                    other => self.error_bool(
                        format!("'if'/'while' condition must be boolean, found {}", other.type_string()),
                        span,
                    ),
                }
            }
        }
    }

    fn error_bool(&mut self, message: String, at: &Span) -> Option<()> {
        self.errors.push(CompileError::ty(message, at));
        None
    }
}
