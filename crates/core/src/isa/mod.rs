//! Instruction set: the ten supported operations and the instruction record.

/// Opcodes, instruction records, and per-opcode operand shapes.
pub mod instruction;

pub use instruction::{Instruction, Opcode};
