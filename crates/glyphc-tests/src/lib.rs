//! Shared helpers for the integration tests in `tests/`. End-to-end
//! scenarios live there, one file per concern (§8).

/// Compiles and interprets `source`, returning the integer printed by its
/// `Exit`. Panics (via the harness's own error reporting) on a compile
/// error, since every test source here is expected to be well-typed.
pub fn run(source: &str) -> i64 {
    let mut compilation = glyphc::compile_core(source);
    assert!(compilation.errors.is_empty(), "unexpected compile errors: {:?}", compilation.errors);
    glyphc::interp::run(&mut compilation.program, compilation.entry)
}

/// Compiles `source` through register allocation and emits x86 assembly,
/// for tests asserting on the emitted text shape rather than the
/// interpreted result.
pub fn emit(source: &str) -> String {
    let compilation = glyphc::compile(source);
    assert!(compilation.errors.is_empty(), "unexpected compile errors: {:?}", compilation.errors);
    glyphc::emit::emit(&compilation.program, compilation.entry)
}
