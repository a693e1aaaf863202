//! Mark-sweep dead-code elimination (§4.3). Runs before liveness — nothing
//! here reads `interfere` or `live_out`.

use std::collections::BTreeSet;

use crate::ir::{Branch, Instr, Program, ValueId};

/// Drops every instruction whose destination is never observed by a branch,
/// transitively through the chain of copies/binaries that produced it.
/// Branches themselves are never dropped.
pub fn remove_dead_code(program: &mut Program) {
    let mut used = BTreeSet::new();
    for block in program.block_ids().collect::<Vec<_>>() {
        let Some(branch) = program.block(block).branch else { continue };
        for v in branch.value_operands() {
            mark_used_value(program, &mut used, v);
        }
    }

    for block in program.block_ids().collect::<Vec<_>>() {
        let kept: Vec<_> = program
            .block(block)
            .instructions
            .iter()
            .copied()
            .filter(|&id| used.contains(&program.instr(id).dest()))
            .collect();
        program.block_mut(block).instructions = kept;
    }

    for id in program.value_ids().collect::<Vec<_>>() {
        program.value_mut(id).alive = used.contains(&id);
    }
}

fn mark_used_value(program: &Program, used: &mut BTreeSet<ValueId>, v: ValueId) {
    if !used.insert(v) {
        return;
    }
    for &def in &program.value(v).defs {
        match *program.instr(def) {
            Instr::Binary { a, b, .. } => {
                mark_used_value(program, used, a);
                mark_used_value(program, used, b);
            }
            Instr::Copy { src, .. } => mark_used_value(program, used, src),
            Instr::Constant { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Program;

    #[test]
    fn unused_constant_is_dropped() {
        let mut p = Program::new();
        let b = p.new_block();
        let _unused = p.constant(b, 7);
        let used = p.constant(b, 1);
        p.exit(b, used);
        remove_dead_code(&mut p);
        assert_eq!(p.block(b).instructions.len(), 1);
        assert!(p.value(used).alive);
    }

    #[test]
    fn chain_feeding_exit_survives() {
        let mut p = Program::new();
        let b = p.new_block();
        let a = p.constant(b, 1);
        let other = p.new_value();
        let sum = p.add(b, a, other);
        p.exit(b, sum);
        remove_dead_code(&mut p);
        assert_eq!(p.block(b).instructions.len(), 2);
        assert!(p.value(a).alive);
        assert!(p.value(sum).alive);
    }
}
