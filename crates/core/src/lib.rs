//! Tomasulo dynamic-scheduling simulator library.
//!
//! This crate implements a cycle-accurate simulator of Tomasulo's
//! out-of-order execution algorithm over a ten-opcode instruction set,
//! eight architectural registers, and a word-addressed memory:
//! 1. **Core:** reservation stations, register renaming, the common data
//!    bus, speculative-branch bookkeeping, and the per-cycle
//!    issue/execute/write-back driver.
//! 2. **ISA:** the closed opcode set (LOAD, STORE, BNE, JAL, RET, ADD,
//!    ADDI, NEG, NAND, SLL) and shape-checked instruction records.
//! 3. **Simulation:** `Simulator` (owns the pipeline and trace sink), the
//!    program loader, configuration, and statistics.
//!
//! Configure station counts and latencies per opcode via [`SimConfig`],
//! load a program with [`sim::loader`], and drive a [`Simulator`] to get a
//! [`sim::Summary`] of the final register file, memory, and cycle count.

/// Common types: architectural registers and error definitions.
pub mod common;
/// Simulator configuration (per-opcode tables, defaults, validation).
pub mod config;
/// The simulated core: stations, renaming, memory, flow, pipeline driver.
pub mod core;
/// Instruction set: opcodes and instruction records.
pub mod isa;
/// Simulation surface: loader and the `Simulator` facade.
pub mod sim;
/// Run statistics collection and reporting.
pub mod stats;
/// Trace observer interface and stock sinks.
pub mod trace;

/// Root configuration type; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// The pipeline engine; usually driven through `Simulator`.
pub use crate::core::Pipeline;
/// Decoded instruction record and its opcode set.
pub use crate::isa::{Instruction, Opcode};
/// Top-level simulator; owns the pipeline and the attached trace sink.
pub use crate::sim::{Simulator, Summary};
