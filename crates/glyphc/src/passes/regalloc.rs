//! Chaitin simplify/select register allocation (§4.5) over the fixed
//! 8-register file. Allocation failure is fatal: there is no fallback
//! (spilling, rewriting, stack slots) in this core, so a graph that isn't
//! 8-colorable panics rather than returning an error.

use std::collections::BTreeMap;

use crate::ir::{Program, Register, ValueId};

/// Simplifies the whole program's interference graph down to a stack order,
/// then selects a register for each value in that order, checking against
/// the *original* (pre-simplify) neighbor sets — simplify destroys the
/// graph as it goes, so select needs its own untouched copy.
pub fn allocate(program: &mut Program) {
    let original: BTreeMap<ValueId, Vec<ValueId>> =
        program.value_ids().map(|v| (v, program.value(v).interfere.iter().copied().collect())).collect();

    let stack = simplify(program);

    for v in stack.into_iter().rev() {
        let taken: Vec<Register> = original[&v].iter().filter_map(|n| program.value(*n).register).collect();
        let reg = Register::ALL
            .into_iter()
            .find(|r| !taken.contains(r))
            .unwrap_or_else(|| panic!("register allocation failed: {v} has no free register among {taken:?}"));
        program.value_mut(v).register = Some(reg);
    }
}

fn simplify(program: &mut Program) -> Vec<ValueId> {
    let mut working: BTreeMap<ValueId, std::collections::BTreeSet<ValueId>> =
        program.value_ids().map(|v| (v, program.value(v).interfere.clone())).collect();
    let mut stack = Vec::with_capacity(working.len());

    while !working.is_empty() {
        let next = *working.iter().min_by_key(|(_, neighbors)| neighbors.len()).map(|(v, _)| v).unwrap();
        let neighbors = working.remove(&next).unwrap();
        for n in &neighbors {
            if let Some(set) = working.get_mut(n) {
                set.remove(&next);
            }
        }
        stack.push(next);
    }

    stack
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Program;
    use crate::passes::{coalesce, liveness};

    #[test]
    fn disjoint_values_can_share_a_register() {
        let mut p = Program::new();
        let b = p.new_block();
        let a = p.constant(b, 1);
        p.exit(b, a);
        liveness::compute(&mut p);
        allocate(&mut p);
        assert!(p.value(a).register.is_some());
    }

    #[test]
    fn interfering_values_get_distinct_registers() {
        let mut p = Program::new();
        let b = p.new_block();
        let a = p.new_value();
        let c = p.new_value();
        let sum = p.add(b, a, c);
        p.exit(b, sum);
        liveness::compute(&mut p);
        coalesce::run(&mut p);
        allocate(&mut p);
        assert_ne!(p.value(a).register, p.value(c).register);
    }

    #[test]
    #[should_panic(expected = "register allocation failed")]
    fn nine_mutually_interfering_values_exhaust_the_register_file() {
        let mut p = Program::new();
        let b = p.new_block();
        let values: Vec<_> = (0..9).map(|_| p.new_value()).collect();
        for &v in &values {
            for &other in &values {
                if v != other {
                    p.value_mut(v).interfere.insert(other);
                }
            }
        }
        allocate(&mut p);
    }
}
