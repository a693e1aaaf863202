//! x86-64 AT&T-syntax emitter (§4.7, §6.4). Walks the CFG reachable from the
//! entry block with a LIFO worklist, emitting one label per block and
//! falling through where the worklist order allows it. `Call`/`Return` are
//! interpreter-only constructs (§9) and are never lowered here.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::ir::{BinaryOp, Branch, BlockId, Instr, JumpCondition, Program, ValueId};

/// Emits a single assembly text buffer for `program`, starting from `entry`.
/// The caller hands the result to an external assembler/linker.
pub fn emit(program: &Program, entry: BlockId) -> String {
    let mut out = String::new();
    let mut emitted: BTreeSet<BlockId> = BTreeSet::new();
    let mut worklist = vec![entry];

    while let Some(block) = worklist.pop() {
        if !emitted.insert(block) {
            continue;
        }
        writeln!(out, "{}:", program.block_name(block)).unwrap();

        for &id in &program.block(block).instructions {
            emit_instr(&mut out, program, *program.instr(id));
        }

        match program.block(block).branch.expect("every block has a branch by emission time") {
            Branch::Jump { target } => emit_jump(&mut out, &mut worklist, &emitted, program, target),
            Branch::ConditionalJump { a, b, if_true, if_false, cond } => {
                writeln!(out, "  cmp {}, {}", reg(program, b), reg(program, a)).unwrap();
                let mnemonic = match cond {
                    JumpCondition::Equal => "je",
                    JumpCondition::Greater => "ja",
                    JumpCondition::LessOrEqual => "jle",
                };
                writeln!(out, "  {mnemonic} {}", program.block_name(if_true)).unwrap();
                if !emitted.contains(&if_true) {
                    worklist.push(if_true);
                }
                emit_jump(&mut out, &mut worklist, &emitted, program, if_false);
            }
            Branch::Exit { val } => {
                writeln!(out, "  mov {}, %edi", reg(program, val)).unwrap();
                writeln!(out, "  mov $60, %eax").unwrap();
                writeln!(out, "  syscall").unwrap();
            }
            Branch::Call { .. } | Branch::Return => {}
        }
    }

    out
}

/// `target` already emitted → it's a real backward/converging edge, so emit
/// an explicit jump. Otherwise leave it to fall through: push it onto the
/// worklist so it's emitted immediately after the current block.
fn emit_jump(out: &mut String, worklist: &mut Vec<BlockId>, emitted: &BTreeSet<BlockId>, program: &Program, target: BlockId) {
    if emitted.contains(&target) {
        writeln!(out, "  jmp {}", program.block_name(target)).unwrap();
    } else {
        worklist.push(target);
    }
}

fn reg(program: &Program, v: ValueId) -> String {
    program
        .value(v)
        .register
        .unwrap_or_else(|| panic!("{v} has no assigned register — emit requires allocation to have run"))
        .to_string()
}

fn emit_instr(out: &mut String, program: &Program, instr: Instr) {
    match instr {
        Instr::Constant { dest, value } => {
            writeln!(out, "  mov ${value}, {}", reg(program, dest)).unwrap();
        }
        Instr::Copy { src, dest } => {
            if program.value(src).register != program.value(dest).register {
                writeln!(out, "  mov {}, {}", reg(program, src), reg(program, dest)).unwrap();
            }
        }
        Instr::Binary { a, b, dest, op: BinaryOp::Add } => {
            if program.value(a).register == program.value(dest).register {
                writeln!(out, "  add {}, {}", reg(program, b), reg(program, a)).unwrap();
            } else if program.value(b).register == program.value(dest).register {
                writeln!(out, "  add {}, {}", reg(program, a), reg(program, b)).unwrap();
            } else {
                writeln!(out, "  mov {}, {}", reg(program, a), reg(program, dest)).unwrap();
                writeln!(out, "  add {}, {}", reg(program, b), reg(program, dest)).unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Program;
    use crate::passes::{coalesce, dead_code, liveness, regalloc};

    fn allocate(p: &mut Program) {
        dead_code::remove_dead_code(p);
        liveness::compute(p);
        coalesce::run(p);
        regalloc::allocate(p);
    }

    #[test]
    fn exit_lowers_to_the_linux_exit_syscall() {
        let mut p = Program::new();
        let b = p.new_block();
        let v = p.constant(b, 42);
        p.exit(b, v);
        allocate(&mut p);
        let asm = emit(&p, b);
        assert!(asm.contains("mov $42,"));
        assert!(asm.contains("mov $60, %eax"));
        assert!(asm.contains("syscall"));
    }

    #[test]
    fn fallthrough_target_gets_no_redundant_jump() {
        let mut p = Program::new();
        let entry = p.new_block();
        let next = p.new_block();
        p.jump(entry, next);
        let v = p.constant(next, 1);
        p.exit(next, v);
        allocate(&mut p);
        let asm = emit(&p, entry);
        assert!(!asm.contains("jmp"));
    }

    #[test]
    fn jump_back_into_an_already_emitted_block_is_explicit() {
        let mut p = Program::new();
        let a = p.new_block();
        let b = p.new_block();
        p.jump(a, b);
        p.jump(b, a);
        allocate(&mut p);
        let asm = emit(&p, a);
        assert!(asm.contains(&format!("jmp {}", p.block_name(a))));
    }
}
