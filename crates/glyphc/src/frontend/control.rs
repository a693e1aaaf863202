//! Lowering for the four constructs that need more than one block: `if`,
//! `else`, `while` (§4.8), and function definition/call, which together
//! implement monomorphization by caching one `Impl` per argument shape.

use std::cell::RefCell;
use std::rc::Rc;

use crate::diagnostics::{CompileError, SourceSpan};
use crate::syntax::Span;
use crate::types::{FuncData, Impl, ScopeNode, Type};

use super::Compiler;

impl Compiler {
    /// `if cond body`: `body`'s type is wrapped in `Maybe` because the
    /// implicit else-path is absent (§4.8).
    pub(super) fn compile_if(&mut self, cond: &Span, body: &Span) -> Option<Type> {
        let start_block = self.block;
        let then_block = self.program.new_block();
        let join_block = self.program.new_block();
        let parent_scope = Rc::clone(&self.scope);

        self.compile_bool_expr(cond, then_block, join_block)?;

        self.block = then_block;
        self.scope = ScopeNode::child(&self.scope);
        let then_result = self.compile(body);
        let then_end_block = self.block;
        let then_scope = Rc::clone(&self.scope);
        self.scope = Rc::clone(&parent_scope);
        let then_ty = then_result?;
        self.program.jump(then_end_block, join_block);

        self.block = join_block;
        let then_names: Vec<String> = ScopeNode::snapshot(&then_scope).into_keys().collect();
        self.merge_scopes_over(
            then_names.into_iter(),
            &parent_scope,
            start_block,
            &then_scope,
            then_end_block,
            &parent_scope,
            SourceSpan::from(body),
        )?;

        Some(self.new_maybe(then_ty, then_end_block, start_block))
    }

    /// `left else right`: `left` must be `Maybe`; present falls through
    /// carrying the inner type, absent lowers `right`. The two branches'
    /// types are merged at the join (§4.8.2) — if they agree, the result is
    /// no longer wrapped in `Maybe`.
    pub(super) fn compile_else(&mut self, left: &Span, right: &Span) -> Option<Type> {
        let left_ty = self.compile(left)?;
        let Type::Maybe(presence, inner_ty) = left_ty else {
            return self.error(CompileError::ty(
                format!("'else' requires a maybe type, found {}", left_ty.type_string()),
                left,
            ));
        };

        let present_block = self.program.new_block();
        let absent_block = self.program.new_block();
        let join_block = self.program.new_block();
        let one = self.program.constant(self.block, 1);
        self.program.jump_if_equal(self.block, presence, one, present_block, absent_block);

        let parent_scope = Rc::clone(&self.scope);

        self.block = present_block;
        self.scope = ScopeNode::child(&parent_scope);
        let present_ty = *inner_ty;
        let present_end_block = self.block;
        let present_scope = Rc::clone(&self.scope);

        self.block = absent_block;
        self.scope = ScopeNode::child(&parent_scope);
        let absent_result = self.compile(right);
        let absent_end_block = self.block;
        let absent_scope = Rc::clone(&self.scope);
        self.scope = Rc::clone(&parent_scope);
        let absent_ty = absent_result?;

        self.program.jump(present_end_block, join_block);
        self.program.jump(absent_end_block, join_block);
        self.block = join_block;

        let mut names: Vec<String> = ScopeNode::snapshot(&present_scope).into_keys().collect();
        names.extend(ScopeNode::snapshot(&absent_scope).into_keys());
        names.sort();
        names.dedup();
        self.merge_scopes_over(
            names.into_iter(),
            &present_scope,
            present_end_block,
            &absent_scope,
            absent_end_block,
            &parent_scope,
            SourceSpan::from(right),
        )?;

        self.merge_types(present_ty, present_end_block, absent_ty, absent_end_block, SourceSpan::from(right))
    }

    /// `while cond body`: the body is lowered twice — once into `start`
    /// (the first iteration, reached only if `cond` held already) and once
    /// into `body` (every later iteration, reached from `cond`). Every name
    /// the first lowering rebinds gets a dedicated fresh slot that both
    /// copies write into, so `cond`'s second and later evaluations always
    /// read a stable, single-allocation value per loop variable — the same
    /// two-predecessors-into-one-destination pattern `<` uses, generalized
    /// to a back edge. A name changing structural type between iterations
    /// is rejected outright rather than silently re-merged.
    pub(super) fn compile_while(&mut self, cond: &Span, body: &Span) -> Option<Type> {
        let before_scope = Rc::clone(&self.scope);
        let entry_block = self.block;
        let start_block = self.program.new_block();
        let cond_block = self.program.new_block();
        let body_block = self.program.new_block();
        let final_block = self.program.new_block();
        let exit_block = self.program.new_block();

        self.compile_bool_expr(cond, start_block, exit_block)?;

        self.block = start_block;
        self.scope = ScopeNode::child(&before_scope);
        let start_result = self.compile(body);
        let start_end_block = self.block;
        let start_scope = Rc::clone(&self.scope);
        start_result?;

        let mutated_names: Vec<String> = ScopeNode::snapshot(&start_scope).into_keys().collect();
        let mut carried: Vec<(String, Type)> = Vec::new();
        for name in &mutated_names {
            let start_ty = ScopeNode::get(&start_scope, name).expect("name just read from its own snapshot");
            if let Some(prior_ty) = ScopeNode::get(&before_scope, name) {
                if prior_ty.type_string() != start_ty.type_string() {
                    return self.error(CompileError::ty(
                        format!(
                            "recursive type definition: '{name}' changes from {} to {} across the loop",
                            prior_ty.type_string(),
                            start_ty.type_string()
                        ),
                        body,
                    ));
                }
            }
            let slot = start_ty.fresh_like(&mut self.program);
            Type::copy_into(&mut self.program, start_end_block, &start_ty, &slot);
            carried.push((name.clone(), slot));
        }
        self.program.jump(start_end_block, cond_block);

        let cond_scope = ScopeNode::child(&before_scope);
        for (name, ty) in &carried {
            ScopeNode::assign(&cond_scope, name.clone(), ty.clone());
        }
        self.scope = Rc::clone(&cond_scope);
        self.block = cond_block;
        self.compile_bool_expr(cond, body_block, final_block)?;

        self.block = body_block;
        self.scope = ScopeNode::child(&cond_scope);
        let body_result = self.compile(body);
        let body_end_block = self.block;
        let body_ty = body_result?;
        for (name, slot) in &carried {
            let body_ty = ScopeNode::get(&self.scope, name).expect("carried name bound in cond_scope");
            if body_ty.type_string() != slot.type_string() {
                return self.error(CompileError::ty(
                    format!("recursive type definition: '{name}' changes type across the loop"),
                    body,
                ));
            }
            Type::copy_into(&mut self.program, body_end_block, &body_ty, slot);
        }
        self.program.jump(body_end_block, cond_block);
        self.program.jump(final_block, exit_block);

        self.block = exit_block;
        self.scope = Rc::clone(&before_scope);
        let names = carried.iter().map(|(name, _)| name.clone());
        self.merge_scopes_over(
            names,
            &before_scope,
            entry_block,
            &cond_scope,
            final_block,
            &before_scope,
            SourceSpan::from(body),
        )?;

        Some(body_ty)
    }

    /// `fn params body`: captures the current scope in a dedicated child
    /// frame, sealed off from further mutation of the defining scope —
    /// binding parameters into it on each call never leaks into the scope
    /// the `fn` expression itself was written in, and two `fn` expressions
    /// never end up sharing one captured frame.
    pub(super) fn compile_fn(&mut self, params: &Span, body: &Span) -> Option<Type> {
        let captured_scope = ScopeNode::child(&self.scope);
        let func = FuncData {
            params: params.clone(),
            body: body.clone(),
            captured_scope,
            impls: Vec::new(),
        };
        Some(Type::Func(Rc::new(RefCell::new(func))))
    }

    /// `callee(args)`: monomorphizes on the argument shape's printed form.
    /// The first call with a given shape compiles a dedicated entry block
    /// under the function's captured scope and caches it as an `Impl`;
    /// every call — cached or fresh — then copies its actual arguments into
    /// that `Impl`'s own parameter slots and emits a `Call`/return-block
    /// pair, duplicating the returned values into fresh caller-local ones.
    pub(super) fn compile_call(&mut self, callee: &Span, args: &Span) -> Option<Type> {
        let callee_ty = self.compile(callee)?;
        let Type::Func(func) = callee_ty else {
            return self.error(CompileError::ty(
                format!("cannot call a value of type {}", callee_ty.type_string()),
                callee,
            ));
        };
        let arg_ty = self.compile(args)?;

        let existing = func.borrow().impls.iter().position(|imp| imp.params_type.type_string() == arg_ty.type_string());

        let entry_block;
        let params_type;
        let return_type;
        if let Some(idx) = existing {
            let data = func.borrow();
            let imp = &data.impls[idx];
            entry_block = imp.entry_block;
            params_type = imp.params_type.clone();
            return_type = imp.return_type.clone();
        } else {
            let (params_span, body_span, captured_scope) = {
                let data = func.borrow();
                (data.params.clone(), data.body.clone(), Rc::clone(&data.captured_scope))
            };
            let fresh_params = arg_ty.fresh_like(&mut self.program);
            let new_entry = self.program.new_block();

            let caller_block = self.block;
            let caller_scope = Rc::clone(&self.scope);

            self.block = new_entry;
            self.scope = ScopeNode::child(&captured_scope);
            self.bind_pattern(&params_span, fresh_params.clone())?;
            let body_ty = self.compile(&body_span);
            let body_end_block = self.block;
            let body_ty = body_ty?;
            self.program.ret(body_end_block);

            self.block = caller_block;
            self.scope = caller_scope;

            func.borrow_mut().impls.push(Impl {
                params_type: fresh_params.clone(),
                return_type: body_ty.clone(),
                entry_block: new_entry,
            });
            entry_block = new_entry;
            params_type = fresh_params;
            return_type = body_ty;
        }

        Type::copy_into(&mut self.program, self.block, &arg_ty, &params_type);
        let exit_block = self.program.new_block();
        self.program.call(self.block, entry_block, exit_block);
        self.block = exit_block;
        Some(return_type.duplicate(&mut self.program, exit_block))
    }
}
