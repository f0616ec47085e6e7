//! Arithmetic and logic result computation.
//!
//! Word arithmetic wraps (the simulator imposes no narrower width than the
//! 64-bit machine word), and shift amounts are masked modulo the word size.

use crate::isa::instruction::Opcode;

/// Computes an arithmetic opcode's result from its operands.
///
/// `vk` and `imm` are only read by the opcodes that use them.
///
/// # Panics
///
/// Panics when called for a non-arithmetic opcode.
pub(crate) fn arithmetic(op: Opcode, vj: i64, vk: i64, imm: i64) -> i64 {
    match op {
        Opcode::Add => vj.wrapping_add(vk),
        Opcode::Addi => vj.wrapping_add(imm),
        Opcode::Neg => vj.wrapping_neg(),
        Opcode::Nand => !(vj & vk),
        Opcode::Sll => vj.wrapping_shl(vk as u32),
        _ => unreachable!("{op} has no arithmetic result"),
    }
}

/// A control transfer's absolute target: `pc + offset`.
pub(crate) fn branch_target(pc: usize, offset: i64) -> i64 {
    (pc as i64).wrapping_add(offset)
}
