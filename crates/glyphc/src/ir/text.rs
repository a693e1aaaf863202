//! Deterministic textual dump of a [`Program`], §6.2's diagnostic IR form.
//! Block order is creation order; within a block, instructions print in
//! the order they were appended.

use std::fmt::Write as _;

use super::types::{BinaryOp, Branch, Instr, JumpCondition, Program};

impl Program {
    pub fn to_ir_text(&self) -> String {
        let mut out = String::new();
        for block_id in self.block_ids() {
            let block = self.block(block_id);
            writeln!(out, "{} {{", block.name).unwrap();
            for &instr_id in &block.instructions {
                match self.instr(instr_id) {
                    Instr::Constant { dest, value } => {
                        writeln!(out, "  {dest} = {value}").unwrap();
                    }
                    Instr::Binary { a, b, dest, op: BinaryOp::Add } => {
                        writeln!(out, "  {dest} = {a} + {b}").unwrap();
                    }
                    Instr::Copy { src, dest } => {
                        writeln!(out, "  {dest} = {src}").unwrap();
                    }
                }
            }
            match block.branch {
                Some(Branch::Jump { target }) => {
                    writeln!(out, "  goto {}", self.block_name(target)).unwrap();
                }
                Some(Branch::ConditionalJump { a, b, if_true, if_false, cond }) => {
                    let op = match cond {
                        JumpCondition::Equal => "==",
                        JumpCondition::Greater => ">",
                        JumpCondition::LessOrEqual => "<=",
                    };
                    writeln!(
                        out,
                        "  goto {} if {} {} {} else goto {}",
                        self.block_name(if_true),
                        a,
                        op,
                        b,
                        self.block_name(if_false)
                    )
                    .unwrap();
                }
                Some(Branch::Exit { val }) => {
                    writeln!(out, "  exit({val})").unwrap();
                }
                Some(Branch::Call { target, ret }) => {
                    writeln!(out, "  {}()", self.block_name(target)).unwrap();
                    writeln!(out, "  goto {}", self.block_name(ret)).unwrap();
                }
                Some(Branch::Return) => {
                    writeln!(out, "  return").unwrap();
                }
                None => {}
            }
            writeln!(out, "}}").unwrap();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dumps_constant_and_exit() {
        let mut p = Program::new();
        let b = p.new_block();
        let v = p.constant(b, 3);
        p.exit(b, v);
        let text = p.to_ir_text();
        assert!(text.contains("v0 = 3"));
        assert!(text.contains("exit(v0)"));
    }

    #[test]
    fn dumps_conditional_jump_with_named_targets() {
        let mut p = Program::new();
        let b = p.new_block();
        let t = p.new_block();
        let f = p.new_block();
        let a = p.constant(b, 1);
        let c = p.new_value();
        p.jump_if_equal(b, a, c, t, f);
        let text = p.to_ir_text();
        assert!(text.contains(&format!("goto {} if v0 == v1 else goto {}", p.block_name(t), p.block_name(f))));
    }
}
