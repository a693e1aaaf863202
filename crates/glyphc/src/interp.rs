//! Reference IR interpreter (§4.6): a single-threaded stack machine used as
//! an oracle for the register-allocated/emitted path, and as the backend for
//! `glyphc run`. Each `ValueData::value` slot is scratch space this module
//! owns exclusively — nothing else in the pipeline reads or writes it.
//!
//! `Exit` is documented as printing directly, but this function only
//! computes and returns the final integer; the one caller (`glyphc run`) is
//! where standard output actually happens, keeping this module pure and
//! easy to call from tests.

use crate::ir::{Branch, BlockId, Instr, JumpCondition, Program};

/// Runs `program` starting from `entry`, returning the integer passed to
/// whichever `Exit` the run reaches.
pub fn run(program: &mut Program, entry: BlockId) -> i64 {
    let mut current = entry;
    let mut return_stack: Vec<BlockId> = Vec::new();

    loop {
        for &id in &program.block(current).instructions.clone() {
            match *program.instr(id) {
                Instr::Constant { dest, value } => program.value_mut(dest).value = value,
                Instr::Binary { a, b, dest, op: crate::ir::BinaryOp::Add } => {
                    let sum = program.value(a).value + program.value(b).value;
                    program.value_mut(dest).value = sum;
                }
                Instr::Copy { src, dest } => {
                    let v = program.value(src).value;
                    program.value_mut(dest).value = v;
                }
            }
        }

        let branch = program.block(current).branch.expect("every block has a branch by the time it runs");
        match branch {
            Branch::Jump { target } => current = target,
            Branch::ConditionalJump { a, b, if_true, if_false, cond } => {
                let av = program.value(a).value;
                let bv = program.value(b).value;
                let taken = match cond {
                    JumpCondition::Equal => av == bv,
                    JumpCondition::Greater => av > bv,
                    JumpCondition::LessOrEqual => av <= bv,
                };
                current = if taken { if_true } else { if_false };
            }
            Branch::Exit { val } => return program.value(val).value,
            Branch::Call { target, ret } => {
                return_stack.push(ret);
                current = target;
            }
            Branch::Return => {
                current = return_stack.pop().expect("Return with an empty return-block stack");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Program;

    #[test]
    fn adds_two_constants() {
        let mut p = Program::new();
        let b = p.new_block();
        let a = p.constant(b, 1);
        let c = p.constant(b, 2);
        let sum = p.add(b, a, c);
        p.exit(b, sum);
        assert_eq!(run(&mut p, b), 3);
    }

    #[test]
    fn conditional_jump_takes_the_true_edge() {
        let mut p = Program::new();
        let entry = p.new_block();
        let t = p.new_block();
        let f = p.new_block();
        let a = p.constant(entry, 5);
        let z = p.constant(entry, 0);
        p.jump_if_greater(entry, a, z, t, f);
        let one = p.constant(t, 1);
        p.exit(t, one);
        let two = p.constant(f, 2);
        p.exit(f, two);
        assert_eq!(run(&mut p, entry), 1);
    }

    #[test]
    fn call_and_return_round_trip() {
        let mut p = Program::new();
        let caller = p.new_block();
        let callee = p.new_block();
        let ret = p.new_block();
        let arg = p.constant(caller, 4);
        let one = p.constant(callee, 1);
        let bumped = p.add(callee, arg, one);
        p.ret(callee);
        p.call(caller, callee, ret);
        p.exit(ret, bumped);
        assert_eq!(run(&mut p, caller), 5);
    }
}
