use std::collections::{HashMap, HashSet};

use tomsim_core::common::reg::Reg;
use tomsim_core::config::PerOp;
use tomsim_core::core::station::Tag;
use tomsim_core::trace::{EventLog, TraceEvent};
use tomsim_core::{Instruction, Opcode, SimConfig, Simulator, Summary};

/// Shorthand register constructor for test programs.
pub fn r(i: u8) -> Reg {
    Reg::new(i).unwrap()
}

/// A simulator with a recording event log attached.
pub struct TestContext {
    pub sim: Simulator,
    pub log: EventLog,
}

impl TestContext {
    pub fn new(program: Vec<Instruction>, config: &SimConfig) -> Self {
        let log = EventLog::new();
        let mut sim = Simulator::new(program, config).unwrap();
        sim.attach(Box::new(log.clone()));
        Self { sim, log }
    }

    /// A context with the same station count and latency for every opcode.
    pub fn uniform(program: Vec<Instruction>, stations: usize, latency: u64) -> Self {
        Self::new(program, &uniform_config(stations, latency))
    }

    /// Presets a register value.
    pub fn set_reg(&mut self, reg: u8, value: i64) {
        self.sim.write_register(r(reg), value);
    }

    /// Runs to completion, panicking on any fatal error.
    pub fn run(&mut self) -> Summary {
        self.sim.run().unwrap()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.log.events()
    }

    /// All recorded flush events.
    pub fn flushes(&self) -> Vec<TraceEvent> {
        self.events()
            .into_iter()
            .filter(|ev| matches!(ev, TraceEvent::Flush { .. }))
            .collect()
    }
}

/// A configuration with uniform station counts and latencies.
pub fn uniform_config(stations: usize, latency: u64) -> SimConfig {
    SimConfig {
        stations: PerOp::uniform(stations),
        latency: PerOp::uniform(latency),
        ..SimConfig::default()
    }
}

/// Runs a pure-arithmetic program sequentially, mirroring the engine's
/// wrapping word semantics. The gold model for equivalence tests.
pub fn reference_run(program: &[Instruction]) -> [i64; Reg::COUNT] {
    let mut regs: [i64; Reg::COUNT] = [0, 1, 2, 3, 4, 5, 6, 7];
    for inst in program {
        let vj = inst.rs1.map_or(0, |reg| regs[reg.index()]);
        let vk = inst.rs2.map_or(0, |reg| regs[reg.index()]);
        let imm = inst.imm.unwrap_or(0);
        let result = match inst.op {
            Opcode::Add => vj.wrapping_add(vk),
            Opcode::Addi => vj.wrapping_add(imm),
            Opcode::Neg => vj.wrapping_neg(),
            Opcode::Nand => !(vj & vk),
            Opcode::Sll => vj.wrapping_shl(vk as u32),
            op => panic!("reference interpreter only covers arithmetic, got {op}"),
        };
        if let Some(rd) = inst.rd {
            if rd != Reg::R0 {
                regs[rd.index()] = result;
            }
        }
    }
    regs
}

/// Events that consume the cycle's CDB slot, as `(cycle, tag)`.
fn cdb_consumers(events: &[TraceEvent]) -> Vec<(u64, Tag)> {
    events
        .iter()
        .filter_map(|ev| match *ev {
            TraceEvent::Write { cycle, tag, .. }
            | TraceEvent::Store { cycle, tag, .. }
            | TraceEvent::Redirect { cycle, tag, .. }
            | TraceEvent::Drain { cycle, tag } => Some((cycle, tag)),
            _ => None,
        })
        .collect()
}

/// Asserts that at most one station consumed the CDB in any cycle.
pub fn assert_single_writer(events: &[TraceEvent]) {
    let mut writers: HashMap<u64, HashSet<Tag>> = HashMap::new();
    for (cycle, tag) in cdb_consumers(events) {
        writers.entry(cycle).or_default().insert(tag);
    }
    for (cycle, tags) in writers {
        assert!(
            tags.len() <= 1,
            "cycle {cycle}: multiple CDB writers {tags:?}"
        );
    }
}

/// Asserts the cycle-boundary guarantees per station episode: no execution
/// in the issue cycle, no write-back in the final execution cycle.
pub fn assert_stage_separation(events: &[TraceEvent]) {
    let mut issued: HashMap<Tag, u64> = HashMap::new();
    let mut last_exec: HashMap<Tag, u64> = HashMap::new();
    for ev in events {
        match *ev {
            TraceEvent::Issue { cycle, tag, .. } => {
                issued.insert(tag, cycle);
                last_exec.remove(&tag);
            }
            TraceEvent::Execute { cycle, tag } | TraceEvent::Complete { cycle, tag } => {
                assert!(
                    cycle > issued[&tag],
                    "{tag} executed in its issue cycle {cycle}"
                );
                last_exec.insert(tag, cycle);
            }
            TraceEvent::Write { cycle, tag, .. }
            | TraceEvent::Store { cycle, tag, .. }
            | TraceEvent::Redirect { cycle, tag, .. }
            | TraceEvent::Drain { cycle, tag } => {
                if let Some(&exec) = last_exec.get(&tag) {
                    assert!(
                        cycle > exec,
                        "{tag} wrote back in its final execute cycle {cycle}"
                    );
                }
            }
            _ => {}
        }
    }
}
