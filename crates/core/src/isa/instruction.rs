//! Instruction model.
//!
//! This module defines the decoded form of the ten supported operations:
//! 1. **`Opcode`** — the closed operation set, in CDB arbitration order.
//! 2. **Shape tables** — which of `rd`/`rs1`/`rs2`/`imm` each opcode carries.
//! 3. **`Instruction`** — one program record, constructed through
//!    shape-checked builders so malformed records never reach the pipeline.

use std::fmt;

use crate::common::reg::Reg;

/// One of the ten supported operations.
///
/// The declaration order is load-bearing: it is the deterministic iteration
/// order for reservation-station scans, and therefore the CDB arbitration
/// priority when several stations are ready to write in the same cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    /// Word load: `rd := memory[rs1 + imm]`.
    Load,
    /// Word store: `memory[rs1 + imm] := rs2`.
    Store,
    /// Branch if not equal: taken when `rs1 != rs2`, target `pc + imm`.
    Bne,
    /// Jump and link: `R1 := pc + 1`, target `pc + imm`.
    Jal,
    /// Return: target is the value of `R1`.
    Ret,
    /// Addition: `rd := rs1 + rs2`.
    Add,
    /// Add immediate: `rd := rs1 + imm`.
    Addi,
    /// Arithmetic negation: `rd := -rs1`.
    Neg,
    /// Bitwise not-and: `rd := !(rs1 & rs2)`.
    Nand,
    /// Shift left logical: `rd := rs1 << rs2`.
    Sll,
}

impl Opcode {
    /// All opcodes, in CDB arbitration order.
    pub const ALL: [Self; 10] = [
        Self::Load,
        Self::Store,
        Self::Bne,
        Self::Jal,
        Self::Ret,
        Self::Add,
        Self::Addi,
        Self::Neg,
        Self::Nand,
        Self::Sll,
    ];

    /// The assembly mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Load => "LOAD",
            Self::Store => "STORE",
            Self::Bne => "BNE",
            Self::Jal => "JAL",
            Self::Ret => "RET",
            Self::Add => "ADD",
            Self::Addi => "ADDI",
            Self::Neg => "NEG",
            Self::Nand => "NAND",
            Self::Sll => "SLL",
        }
    }

    /// Looks up an opcode by mnemonic (case-insensitive).
    pub fn parse(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
    }

    /// Position in [`Self::ALL`]; indexes per-opcode tables.
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Load => 0,
            Self::Store => 1,
            Self::Bne => 2,
            Self::Jal => 3,
            Self::Ret => 4,
            Self::Add => 5,
            Self::Addi => 6,
            Self::Neg => 7,
            Self::Nand => 8,
            Self::Sll => 9,
        }
    }

    /// Does this opcode produce a register value? JAL counts: it links `R1`.
    pub const fn writes_register(self) -> bool {
        matches!(
            self,
            Self::Load | Self::Jal | Self::Add | Self::Addi | Self::Neg | Self::Nand | Self::Sll
        )
    }

    /// LOAD or STORE: serialized in program order through the memory class.
    pub const fn is_memory(self) -> bool {
        matches!(self, Self::Load | Self::Store)
    }

    /// BNE or RET: opens a speculation window that defers younger work.
    pub const fn is_branch_like(self) -> bool {
        matches!(self, Self::Bne | Self::Ret)
    }

    /// Does the instruction record carry `rd`?
    pub const fn has_rd(self) -> bool {
        matches!(
            self,
            Self::Load | Self::Add | Self::Addi | Self::Neg | Self::Nand | Self::Sll
        )
    }

    /// Does the instruction record carry `rs1`?
    pub const fn has_rs1(self) -> bool {
        !matches!(self, Self::Jal | Self::Ret)
    }

    /// Does the instruction record carry `rs2`?
    pub const fn has_rs2(self) -> bool {
        matches!(self, Self::Store | Self::Bne | Self::Add | Self::Nand | Self::Sll)
    }

    /// Does the instruction record carry an immediate?
    pub const fn has_imm(self) -> bool {
        matches!(self, Self::Load | Self::Store | Self::Bne | Self::Jal | Self::Addi)
    }

    /// Must the `k` operand be present before execute may start?
    ///
    /// STORE is the exception: its address needs only `j`, and the value to
    /// store may arrive any time up to write-back.
    pub const fn needs_vk_to_execute(self) -> bool {
        matches!(self, Self::Bne | Self::Add | Self::Nand | Self::Sll)
    }

    /// Human-readable operand shape, used in loader diagnostics.
    pub(crate) const fn shape(self) -> &'static str {
        match self {
            Self::Load => "rd and a base/offset operand",
            Self::Store => "a value register and a base/offset operand",
            Self::Bne => "rs1, rs2 and a branch offset",
            Self::Jal => "a jump offset",
            Self::Ret => "no operands",
            Self::Add | Self::Nand | Self::Sll => "rd, rs1, rs2",
            Self::Addi => "rd, rs1 and an immediate",
            Self::Neg => "rd, rs1",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One decoded program record.
///
/// Field presence follows the per-opcode shape table; use the named
/// constructors (or the loader) so the shape is checked once, up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The operation.
    pub op: Opcode,
    /// Destination register, for register-producing opcodes.
    pub rd: Option<Reg>,
    /// First source register (address base for LOAD/STORE).
    pub rs1: Option<Reg>,
    /// Second source register (the stored value for STORE).
    pub rs2: Option<Reg>,
    /// Immediate: memory offset, branch/jump offset, or ADDI operand.
    pub imm: Option<i64>,
}

impl Instruction {
    /// Builds an instruction, verifying the operand shape for `op`.
    ///
    /// Returns the expected-shape description on mismatch, for the loader
    /// to wrap into a positioned error.
    pub fn checked(
        op: Opcode,
        rd: Option<Reg>,
        rs1: Option<Reg>,
        rs2: Option<Reg>,
        imm: Option<i64>,
    ) -> Result<Self, &'static str> {
        let shape_ok = rd.is_some() == op.has_rd()
            && rs1.is_some() == op.has_rs1()
            && rs2.is_some() == op.has_rs2()
            && imm.is_some() == op.has_imm();
        if shape_ok {
            Ok(Self { op, rd, rs1, rs2, imm })
        } else {
            Err(op.shape())
        }
    }

    /// `ADD rd, rs1, rs2`
    pub fn add(rd: Reg, rs1: Reg, rs2: Reg) -> Self {
        Self { op: Opcode::Add, rd: Some(rd), rs1: Some(rs1), rs2: Some(rs2), imm: None }
    }

    /// `ADDI rd, rs1, imm`
    pub fn addi(rd: Reg, rs1: Reg, imm: i64) -> Self {
        Self { op: Opcode::Addi, rd: Some(rd), rs1: Some(rs1), rs2: None, imm: Some(imm) }
    }

    /// `NEG rd, rs1`
    pub fn neg(rd: Reg, rs1: Reg) -> Self {
        Self { op: Opcode::Neg, rd: Some(rd), rs1: Some(rs1), rs2: None, imm: None }
    }

    /// `NAND rd, rs1, rs2`
    pub fn nand(rd: Reg, rs1: Reg, rs2: Reg) -> Self {
        Self { op: Opcode::Nand, rd: Some(rd), rs1: Some(rs1), rs2: Some(rs2), imm: None }
    }

    /// `SLL rd, rs1, rs2`
    pub fn sll(rd: Reg, rs1: Reg, rs2: Reg) -> Self {
        Self { op: Opcode::Sll, rd: Some(rd), rs1: Some(rs1), rs2: Some(rs2), imm: None }
    }

    /// `LOAD rd, imm(base)`
    pub fn load(rd: Reg, base: Reg, imm: i64) -> Self {
        Self { op: Opcode::Load, rd: Some(rd), rs1: Some(base), rs2: None, imm: Some(imm) }
    }

    /// `STORE value, imm(base)`
    pub fn store(value: Reg, base: Reg, imm: i64) -> Self {
        Self { op: Opcode::Store, rd: None, rs1: Some(base), rs2: Some(value), imm: Some(imm) }
    }

    /// `BNE rs1, rs2, imm`
    pub fn bne(rs1: Reg, rs2: Reg, imm: i64) -> Self {
        Self { op: Opcode::Bne, rd: None, rs1: Some(rs1), rs2: Some(rs2), imm: Some(imm) }
    }

    /// `JAL imm`
    pub fn jal(imm: i64) -> Self {
        Self { op: Opcode::Jal, rd: None, rs1: None, rs2: None, imm: Some(imm) }
    }

    /// `RET`
    pub fn ret() -> Self {
        Self { op: Opcode::Ret, rd: None, rs1: None, rs2: None, imm: None }
    }
}

/// Renders an optional operand, or `?` for a hole that validation should
/// have ruled out.
struct Hole<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Hole<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => v.fmt(f),
            None => f.write_str("?"),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rd, rs1, rs2, imm) = (Hole(self.rd), Hole(self.rs1), Hole(self.rs2), Hole(self.imm));
        match self.op {
            Opcode::Load => write!(f, "LOAD {rd}, {imm}({rs1})"),
            Opcode::Store => write!(f, "STORE {rs2}, {imm}({rs1})"),
            Opcode::Bne => write!(f, "BNE {rs1}, {rs2}, {imm}"),
            Opcode::Jal => write!(f, "JAL {imm}"),
            Opcode::Ret => f.write_str("RET"),
            Opcode::Add | Opcode::Nand | Opcode::Sll => {
                write!(f, "{} {rd}, {rs1}, {rs2}", self.op)
            }
            Opcode::Addi => write!(f, "ADDI {rd}, {rs1}, {imm}"),
            Opcode::Neg => write!(f, "NEG {rd}, {rs1}"),
        }
    }
}
