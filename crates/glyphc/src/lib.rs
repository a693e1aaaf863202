//! glyphc — compiler for a small expression-oriented language.
//!
//! Source text is parsed into an AST ([`syntax`]), lowered to a
//! block-structured IR ([`ir`], built by [`frontend`]), optimized
//! ([`passes`]), then either interpreted directly ([`interp`]) or
//! register-allocated and emitted as x86 assembly ([`emit`]).

pub mod diagnostics;
pub mod emit;
pub mod frontend;
pub mod interp;
pub mod ir;
pub mod passes;
pub mod syntax;
pub mod types;

pub use anyhow::{Context, Result};

use diagnostics::CompileError;
use ir::{BlockId, Program};

/// A compiled program ready for a backend, or the errors that kept it from
/// getting there.
pub struct Compilation {
    pub program: Program,
    pub entry: BlockId,
    pub errors: Vec<CompileError>,
}

/// Parses, lowers and appends the `Exit` branch for `source`'s top-level
/// value, then runs dead-code elimination, liveness and copy/binary
/// coalescing (§4.2–§4.4) — liveness's interference graph is what tells
/// coalescing which merges are safe, even though nothing downstream of it
/// needs a register assigned. `glyphc run` uses exactly this pipeline.
pub fn compile_core(source: &str) -> Compilation {
    let frontend::CompileResult { mut program, exit_block, result_type, mut errors } = frontend::compile(source);

    if let Some(ty) = result_type {
        let mut values = Vec::new();
        ty.to_values(&mut values);
        let exit_value = values.first().copied().unwrap_or_else(|| program.constant(exit_block, 0));
        program.exit(exit_block, exit_value);
    } else if errors.is_empty() {
        errors.push(CompileError::unimplemented("no top-level value to exit with"));
    }

    if errors.is_empty() {
        passes::dead_code::remove_dead_code(&mut program);
        passes::liveness::compute(&mut program);
        passes::coalesce::run(&mut program);
    }

    Compilation { program, entry: BlockId(0), errors }
}

/// Runs the full pipeline (§4): [`compile_core`] plus register allocation
/// (§4.5), ready for [`emit`]. `glyphc build` uses this. Register
/// allocation failure is a fatal internal error (spec.md §4.5, §7 give no
/// recovery path) and panics rather than returning a `CompileError`.
pub fn compile(source: &str) -> Compilation {
    let mut compilation = compile_core(source);
    if compilation.errors.is_empty() {
        passes::regalloc::allocate(&mut compilation.program);
    }
    compilation
}
