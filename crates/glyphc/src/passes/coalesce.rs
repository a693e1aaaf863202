//! Copy and binary coalescing (§4.4). Runs once each, after DCE and
//! liveness, in that order — both rely on `interfere` to decide whether a
//! merge is safe.

use crate::ir::{BinaryOp, Branch, Instr, Program, UseSite, ValueId};

pub fn run(program: &mut Program) {
    coalesce_copies(program);
    coalesce_binary(program);
}

/// For every `Copy(src, dest)` whose operands don't interfere, merges `src`
/// into `dest` and drops the copy — it's a no-op once the two share an
/// identity. Interfering copies are left alone.
fn coalesce_copies(program: &mut Program) {
    for block in program.block_ids().collect::<Vec<_>>() {
        let instrs = program.block(block).instructions.clone();
        let mut kept = Vec::with_capacity(instrs.len());
        for id in instrs {
            if let Instr::Copy { src, dest } = *program.instr(id) {
                if !program.value(src).interfere.contains(&dest) {
                    merge_into(program, src, dest);
                    continue;
                }
            }
            kept.push(id);
        }
        program.block_mut(block).instructions = kept;
    }
}

/// For every `Binary(a, b, dest, Add)`, merges `a` into `dest` if they don't
/// interfere, else `b` into `dest` if that pair doesn't interfere (`Add` is
/// commutative, so either operand may take the destination's identity). The
/// instruction itself stays — merging rewrites its own operand in place,
/// leaving a two-address-friendly `dest = dest + b` shape for the emitter.
fn coalesce_binary(program: &mut Program) {
    for block in program.block_ids().collect::<Vec<_>>() {
        for id in program.block(block).instructions.clone() {
            let Instr::Binary { a, b, dest, op: BinaryOp::Add } = *program.instr(id) else { continue };
            if !program.value(a).interfere.contains(&dest) {
                merge_into(program, a, dest);
            } else if !program.value(b).interfere.contains(&dest) {
                merge_into(program, b, dest);
            }
        }
    }
}

/// Rewrites every def, use, and interference edge of `src` to name `dest`
/// instead, then clears `src`'s own bookkeeping. `src` itself is left
/// orphaned in the arena (nothing still points to it).
fn merge_into(program: &mut Program, src: ValueId, dest: ValueId) {
    let src_defs = program.value(src).defs.clone();
    let src_uses = program.value(src).uses.clone();
    program.value_mut(dest).defs.extend(src_defs.iter().copied());
    program.value_mut(dest).uses.extend(src_uses.iter().copied());

    for &def in &src_defs {
        match program.instr_mut(def) {
            Instr::Constant { dest: d, .. } | Instr::Binary { dest: d, .. } | Instr::Copy { dest: d, .. } => {
                *d = dest;
            }
        }
    }

    for use_site in &src_uses {
        match *use_site {
            UseSite::Instr(id) => match program.instr_mut(id) {
                Instr::Binary { a, b, .. } => {
                    if *a == src {
                        *a = dest;
                    }
                    if *b == src {
                        *b = dest;
                    }
                }
                Instr::Copy { src: s, .. } => {
                    if *s == src {
                        *s = dest;
                    }
                }
                Instr::Constant { .. } => {}
            },
            UseSite::Branch(block) => {
                if let Some(branch) = program.block_mut(block).branch.as_mut() {
                    match branch {
                        Branch::ConditionalJump { a, b, .. } => {
                            if *a == src {
                                *a = dest;
                            }
                            if *b == src {
                                *b = dest;
                            }
                        }
                        Branch::Exit { val } => {
                            if *val == src {
                                *val = dest;
                            }
                        }
                        Branch::Jump { .. } | Branch::Call { .. } | Branch::Return => {}
                    }
                }
            }
        }
    }

    let neighbors: Vec<_> = program.value(src).interfere.iter().copied().collect();
    for n in neighbors {
        program.value_mut(n).interfere.remove(&src);
        program.value_mut(n).interfere.insert(dest);
        program.value_mut(dest).interfere.insert(n);
    }
    program.value_mut(src).interfere.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Program;
    use crate::passes::liveness;

    #[test]
    fn non_interfering_copy_is_removed() {
        let mut p = Program::new();
        let b = p.new_block();
        let src = p.constant(b, 5);
        let dest = p.copy(b, src);
        p.exit(b, dest);
        liveness::compute(&mut p);
        run(&mut p);
        assert!(p.block(b).instructions.iter().all(|&id| !matches!(p.instr(id), Instr::Copy { .. })));
    }

    #[test]
    fn interfering_copy_survives() {
        let mut p = Program::new();
        let b = p.new_block();
        let src = p.new_value();
        let dest = p.copy(b, src);
        let sum = p.add(b, src, dest);
        p.exit(b, sum);
        liveness::compute(&mut p);
        assert!(p.value(src).interfere.contains(&dest));
        run(&mut p);
        assert!(p.block(b).instructions.iter().any(|&id| matches!(p.instr(id), Instr::Copy { .. })));
    }

    #[test]
    fn binary_merges_non_interfering_operand_into_dest() {
        let mut p = Program::new();
        let b = p.new_block();
        let a = p.new_value();
        let other = p.new_value();
        let sum = p.add(b, a, other);
        p.exit(b, sum);
        liveness::compute(&mut p);
        run(&mut p);
        let Instr::Binary { a: new_a, .. } = *p.instr(p.block(b).instructions[0]) else { panic!("expected binary") };
        assert_eq!(new_a, sum);
    }
}
