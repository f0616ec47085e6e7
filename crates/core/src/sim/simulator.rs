//! Simulator facade: owns the pipeline, the trace sink, and the cycle cap.

use std::fmt;

use crate::common::error::{ConfigError, SimError};
use crate::common::reg::Reg;
use crate::config::SimConfig;
use crate::core::pipeline::Pipeline;
use crate::isa::instruction::Instruction;
use crate::stats::SimStats;
use crate::trace::{NullSink, TraceSink};

/// Top-level simulator: validates the configuration against the program,
/// then steps the pipeline cycle by cycle.
pub struct Simulator {
    pipeline: Pipeline,
    sink: Box<dyn TraceSink>,
    max_cycles: u64,
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("pipeline", &self.pipeline)
            .field("max_cycles", &self.max_cycles)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Creates a simulator, rejecting configurations that could never run
    /// `program` to completion.
    pub fn new(program: Vec<Instruction>, config: &SimConfig) -> Result<Self, ConfigError> {
        config.validate_for(&program)?;
        Ok(Self {
            pipeline: Pipeline::new(program, config),
            sink: Box::new(NullSink),
            max_cycles: config.max_cycles,
        })
    }

    /// Installs a trace observer, replacing the previous one.
    pub fn attach(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = sink;
    }

    /// Read access to the pipeline state.
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Presets a register before the run (`R0` excluded).
    pub fn write_register(&mut self, reg: Reg, value: i64) {
        self.pipeline.write_register(reg, value);
    }

    /// Presets a span of memory words before the run.
    pub fn store_words(&mut self, base: usize, words: &[i64]) -> Result<(), SimError> {
        self.pipeline.store_words(base, words)
    }

    /// Advances one clock cycle. Returns `true` once the pipeline has
    /// drained.
    pub fn tick(&mut self) -> Result<bool, SimError> {
        self.pipeline.tick(self.sink.as_mut())?;
        Ok(self.pipeline.is_drained())
    }

    /// Runs until the pipeline drains or the cycle cap is hit.
    pub fn run(&mut self) -> Result<Summary, SimError> {
        while !self.pipeline.is_drained() {
            if self.pipeline.clock() >= self.max_cycles {
                return Err(SimError::CycleCap(self.max_cycles));
            }
            self.pipeline.tick(self.sink.as_mut())?;
        }
        Ok(self.summary())
    }

    /// The architectural state and counters as of the current cycle.
    pub fn summary(&self) -> Summary {
        Summary {
            cycles: self.pipeline.clock(),
            registers: self.pipeline.registers().snapshot(),
            memory: self.pipeline.memory().words().to_vec(),
            stats: self.pipeline.stats().clone(),
        }
    }
}

/// The reported outcome of a run: final register file, final memory, and
/// the cycle count, plus the accumulated counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Total cycles consumed.
    pub cycles: u64,
    /// Final register values, `R0` through `R7`.
    pub registers: [i64; Reg::COUNT],
    /// Final memory contents.
    pub memory: Vec<i64>,
    /// Counters accumulated over the run.
    pub stats: SimStats,
}

impl Summary {
    /// The final value of one register.
    pub fn register(&self, reg: Reg) -> i64 {
        self.registers[reg.index()]
    }
}
