//! Property tests: the out-of-order engine agrees with a sequential
//! reference interpreter on pure-arithmetic programs.

use proptest::prelude::*;

use crate::common::harness::{assert_single_writer, assert_stage_separation, reference_run};
use tomsim_core::common::reg::Reg;
use tomsim_core::config::PerOp;
use tomsim_core::trace::EventLog;
use tomsim_core::{Instruction, SimConfig, Simulator};

fn any_reg() -> impl Strategy<Value = Reg> {
    (0u8..8).prop_map(|i| Reg::new(i).unwrap())
}

/// Destinations avoid R0, whose writes are architecturally discarded.
fn dest_reg() -> impl Strategy<Value = Reg> {
    (1u8..8).prop_map(|i| Reg::new(i).unwrap())
}

fn arith_inst() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (dest_reg(), any_reg(), any_reg()).prop_map(|(d, a, b)| Instruction::add(d, a, b)),
        (dest_reg(), any_reg(), any::<i16>())
            .prop_map(|(d, a, imm)| Instruction::addi(d, a, i64::from(imm))),
        (dest_reg(), any_reg()).prop_map(|(d, a)| Instruction::neg(d, a)),
        (dest_reg(), any_reg(), any_reg()).prop_map(|(d, a, b)| Instruction::nand(d, a, b)),
        (dest_reg(), any_reg(), any_reg()).prop_map(|(d, a, b)| Instruction::sll(d, a, b)),
    ]
}

proptest! {
    /// With a station per instruction, dynamic scheduling must be
    /// indistinguishable from sequential execution for arithmetic.
    #[test]
    fn arithmetic_matches_sequential_reference(
        program in prop::collection::vec(arith_inst(), 1..12),
        latency in 1u64..4,
    ) {
        let config = SimConfig {
            stations: PerOp::uniform(program.len()),
            latency: PerOp::uniform(latency),
            ..SimConfig::default()
        };
        let mut sim = Simulator::new(program.clone(), &config).unwrap();
        let log = EventLog::new();
        sim.attach(Box::new(log.clone()));
        let summary = sim.run().unwrap();

        prop_assert_eq!(summary.registers, reference_run(&program));
        prop_assert_eq!(summary.stats.issued, program.len() as u64);

        let events = log.events();
        assert_stage_separation(&events);
        assert_single_writer(&events);
    }

    /// Cycle accounting never undershoots the structural floor: one issue
    /// per cycle, plus the last instruction's latency and write-back.
    #[test]
    fn cycle_count_has_a_structural_floor(
        program in prop::collection::vec(arith_inst(), 1..8),
        latency in 1u64..4,
    ) {
        let config = SimConfig {
            stations: PerOp::uniform(program.len()),
            latency: PerOp::uniform(latency),
            ..SimConfig::default()
        };
        let mut sim = Simulator::new(program.clone(), &config).unwrap();
        let summary = sim.run().unwrap();
        prop_assert!(summary.cycles >= program.len() as u64 + latency + 1);
    }
}
