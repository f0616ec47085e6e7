//! Error definitions.
//!
//! This module defines the error handling surface for the simulator:
//! 1. **`ProgramError`** — syntactic problems reported by the loader.
//! 2. **`ConfigError`** — configurations that could never run to completion.
//! 3. **`SimError`** — fatal runtime conditions raised by the engine.
//!
//! Everything recoverable inside the pipeline is a structural stall, not an
//! error; engine invariant violations (a second CDB grant in one cycle, a
//! write to `R0`'s value) are bugs and panic instead of returning.

use thiserror::Error;

use crate::isa::instruction::Opcode;

/// A malformed program, reported by the loader before simulation starts.
///
/// `line` is the source line for assembly input and the 1-based record
/// position for JSON input.
#[derive(Debug, Error)]
pub enum ProgramError {
    /// The mnemonic is not one of the ten supported operations.
    #[error("line {line}: unknown opcode `{text}`")]
    UnknownOpcode {
        /// Source position.
        line: usize,
        /// The offending mnemonic.
        text: String,
    },

    /// A register operand is not `R0`..`R7`.
    #[error("line {line}: invalid register `{text}` (expected R0..R7)")]
    InvalidRegister {
        /// Source position.
        line: usize,
        /// The offending operand text.
        text: String,
    },

    /// An immediate operand is not an integer.
    #[error("line {line}: invalid immediate `{text}`")]
    InvalidImmediate {
        /// Source position.
        line: usize,
        /// The offending operand text.
        text: String,
    },

    /// The operand list does not match the opcode's shape.
    #[error("line {line}: {op} takes {expected}")]
    OperandMismatch {
        /// Source position.
        line: usize,
        /// The opcode whose shape was violated.
        op: Opcode,
        /// Human-readable description of the expected operands.
        expected: &'static str,
    },

    /// The program file could not be read.
    #[error("could not read program: {0}")]
    Io(#[from] std::io::Error),

    /// The program JSON did not deserialize.
    #[error("malformed program JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A configuration the simulator refuses to run.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An opcode used by the program has no reservation stations, which
    /// would deadlock issue.
    #[error("{op} appears in the program but has no reservation stations")]
    NoStations {
        /// The opcode with a zero station count.
        op: Opcode,
    },

    /// An opcode has a zero execution latency.
    #[error("{op} has a zero execution latency; every operation needs at least one cycle")]
    ZeroLatency {
        /// The opcode with a zero latency.
        op: Opcode,
    },

    /// The configured memory holds no words.
    #[error("memory must hold at least one word")]
    EmptyMemory,

    /// The cycle cap is zero, so no program could ever drain.
    #[error("cycle cap must be nonzero")]
    ZeroCycleCap,

    /// The configuration JSON did not deserialize.
    #[error("malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A fatal runtime condition. The pipeline cannot continue past any of
/// these; the partial architectural state is still observable for debugging.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// A LOAD or STORE computed an effective address outside memory.
    #[error("memory address {addr} is outside [0, {len})")]
    MemoryOutOfRange {
        /// The computed effective address.
        addr: i64,
        /// Number of words in memory.
        len: usize,
    },

    /// A branch, JAL, or RET resolved to a negative instruction index.
    #[error("control transfer from pc {pc} to negative target {target}")]
    NegativeTarget {
        /// The resolved target.
        target: i64,
        /// PC of the transferring instruction.
        pc: usize,
    },

    /// The cycle cap was reached before every station drained.
    #[error("cycle cap of {0} reached before the pipeline drained")]
    CycleCap(u64),
}
