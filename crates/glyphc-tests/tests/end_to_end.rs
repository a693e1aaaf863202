//! The six end-to-end scenarios (§8): source text in, one interpreted
//! integer out.

#[test]
fn addition_chain() {
    assert_eq!(glyphc_tests::run("1 + 2 + 3"), 6);
}

#[test]
fn assignment_then_use() {
    assert_eq!(glyphc_tests::run("x = 10  x + 5"), 15);
}

#[test]
fn if_with_both_branches_writing_the_same_name_collapses_the_maybe() {
    assert_eq!(glyphc_tests::run("x = 1  if 0 < x { x = x + 1 }  x"), 2);
}

#[test]
fn while_loop_counts_up() {
    assert_eq!(glyphc_tests::run("x = 0  while x < 3 { x = x + 1 }  x"), 3);
}

#[test]
fn function_called_twice_with_the_same_argument_shape() {
    assert_eq!(glyphc_tests::run("f = fn (a) a + 1  f(4) + f(10)"), 16);
}

#[test]
fn struct_field_access() {
    assert_eq!(glyphc_tests::run("p = struct { a = 2  b = 3 }  p.a + p.b"), 5);
}
