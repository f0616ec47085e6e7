//! Configuration for the simulator.
//!
//! This module defines the structures that parameterize a run:
//! 1. **Defaults:** baseline constants in the `defaults` module.
//! 2. **`PerOp<T>`:** one value per opcode, used for both the station
//!    counts and the execution latencies.
//! 3. **`SimConfig`:** the root configuration, deserializable from JSON.
//!
//! Use `SimConfig::default()` for the classic single-station,
//! single-cycle setup, or deserialize a partial JSON override.

use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;
use crate::isa::instruction::{Instruction, Opcode};

/// Default configuration constants.
mod defaults {
    /// Words of data memory: 128 KiB of 4-byte words.
    pub const MEMORY_WORDS: usize = 32 * 1024;

    /// Cycle cap: a drain that takes this long is a runaway program.
    pub const MAX_CYCLES: u64 = 1_000_000;
}

/// A table holding one value per opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[allow(missing_docs)]
pub struct PerOp<T> {
    pub load: T,
    pub store: T,
    pub bne: T,
    pub jal: T,
    pub ret: T,
    pub add: T,
    pub addi: T,
    pub neg: T,
    pub nand: T,
    pub sll: T,
}

impl<T> PerOp<T> {
    /// Looks up the entry for an opcode.
    pub const fn get(&self, op: Opcode) -> &T {
        match op {
            Opcode::Load => &self.load,
            Opcode::Store => &self.store,
            Opcode::Bne => &self.bne,
            Opcode::Jal => &self.jal,
            Opcode::Ret => &self.ret,
            Opcode::Add => &self.add,
            Opcode::Addi => &self.addi,
            Opcode::Neg => &self.neg,
            Opcode::Nand => &self.nand,
            Opcode::Sll => &self.sll,
        }
    }
}

impl<T: Clone> PerOp<T> {
    /// Builds a table with the same value for every opcode.
    pub fn uniform(value: T) -> Self {
        Self {
            load: value.clone(),
            store: value.clone(),
            bne: value.clone(),
            jal: value.clone(),
            ret: value.clone(),
            add: value.clone(),
            addi: value.clone(),
            neg: value.clone(),
            nand: value.clone(),
            sll: value,
        }
    }
}

impl<T> Index<Opcode> for PerOp<T> {
    type Output = T;

    fn index(&self, op: Opcode) -> &T {
        self.get(op)
    }
}

/// Root simulator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Reservation stations per opcode. Stations and functional units are
    /// one-to-one, so this is also the number of in-flight instructions an
    /// opcode can have.
    pub stations: PerOp<usize>,
    /// Execution latency per opcode, in cycles.
    pub latency: PerOp<u64>,
    /// Size of data memory, in words.
    pub memory_words: usize,
    /// Hard cap on simulated cycles before the run is abandoned.
    pub max_cycles: u64,
}

impl Default for SimConfig {
    /// The classic exercise setup: one station everywhere except two ADD
    /// stations, and single-cycle latencies.
    fn default() -> Self {
        let mut stations = PerOp::uniform(1);
        stations.add = 2;
        Self {
            stations,
            latency: PerOp::uniform(1),
            memory_words: defaults::MEMORY_WORDS,
            max_cycles: defaults::MAX_CYCLES,
        }
    }
}

impl SimConfig {
    /// Deserializes a configuration from JSON. Missing fields fall back to
    /// the defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Checks that this configuration can run `program` to completion.
    ///
    /// Latencies must be nonzero for every opcode; station counts must be
    /// nonzero for every opcode the program actually uses (an instruction
    /// with no station would stall issue forever).
    pub fn validate_for(&self, program: &[Instruction]) -> Result<(), ConfigError> {
        if self.memory_words == 0 {
            return Err(ConfigError::EmptyMemory);
        }
        if self.max_cycles == 0 {
            return Err(ConfigError::ZeroCycleCap);
        }
        for op in Opcode::ALL {
            if self.latency[op] == 0 {
                return Err(ConfigError::ZeroLatency { op });
            }
        }
        for inst in program {
            if self.stations[inst.op] == 0 {
                return Err(ConfigError::NoStations { op: inst.op });
            }
        }
        Ok(())
    }
}
