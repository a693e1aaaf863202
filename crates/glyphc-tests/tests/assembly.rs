//! Emitted assembly shape (§6.4): AT&T syntax, a label per block, and the
//! fixed three-instruction `Exit` sequence ending the program.

#[test]
fn emits_a_label_and_the_exit_syscall_sequence() {
    let asm = glyphc_tests::emit("1 + 2 + 3");
    assert!(asm.contains("_start:"));
    assert!(asm.contains("mov $60, %eax"));
    assert!(asm.contains("syscall"));
}

#[test]
fn conditional_branch_emits_a_comparison_and_a_named_jump() {
    let asm = glyphc_tests::emit("x = 1  if 0 < x { x = x + 1 }  x");
    assert!(asm.contains("cmp "));
    assert!(asm.lines().any(|l| l.trim_start().starts_with("ja ")));
}
