//! Boundary cases called out explicitly in §8, beyond the six scenarios.

#[test]
fn constant_folding_collapses_to_one_constant() {
    let compilation = glyphc::compile_core("1 + 2");
    assert!(compilation.errors.is_empty());
    let text = compilation.program.to_ir_text();
    assert!(text.contains("= 3"), "expected a folded Constant(3) in:\n{text}");
    assert!(!text.contains(" + "), "addition should have folded away:\n{text}");
}

#[test]
fn unused_binding_produces_no_instruction() {
    let compilation = glyphc::compile_core("x = 7  1");
    assert!(compilation.errors.is_empty());
    let text = compilation.program.to_ir_text();
    assert!(!text.contains("7"), "dead store of 7 should have been eliminated:\n{text}");
}

#[test]
fn register_allocation_succeeds_with_at_most_eight_simultaneously_live_values() {
    // Three loop-carried variables, none of them constant-foldable, keep a
    // handful of values genuinely live across the loop body at once — well
    // under the eight-register budget.
    let source = "x = 0  y = 0  z = 0  while x < 5 { y = y + x  z = z + y  x = x + 1 }  z";
    let compilation = glyphc::compile(source);
    assert!(compilation.errors.is_empty());
    for v in compilation.program.value_ids() {
        if !compilation.program.value(v).defs.is_empty() {
            assert!(compilation.program.value(v).register.is_some());
        }
    }
}
