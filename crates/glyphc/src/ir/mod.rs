//! The intermediate representation: an arena of values, instructions and
//! blocks (`types`), the constructors that keep it internally consistent
//! (`builder`), and its diagnostic text form (`text`).

mod builder;
mod text;
mod types;

pub use types::{
    BinaryOp, Branch, BlockData, BlockId, Instr, InstrId, JumpCondition, Program, Register,
    UseSite, ValueData, ValueId,
};
