//! Memory traffic: program-order serialization, late-arriving store
//! values, bounds enforcement, and the register round-trip property.

use pretty_assertions::assert_eq;

use crate::common::harness::{TestContext, r, uniform_config};
use tomsim_core::common::error::SimError;
use tomsim_core::common::reg::Reg;
use tomsim_core::config::PerOp;
use tomsim_core::{Instruction, SimConfig, Simulator};

#[test]
fn registers_round_trip_through_memory() {
    // Store every register to a distinct address, then load each back into
    // the same register: the register file must come back identical.
    let mut program = Vec::new();
    for i in 1..8 {
        program.push(Instruction::store(r(i), Reg::R0, 10 + i64::from(i)));
    }
    for i in 1..8 {
        program.push(Instruction::load(r(i), Reg::R0, 10 + i64::from(i)));
    }
    let mut ctx = TestContext::uniform(program, 1, 1);
    let summary = ctx.run();

    assert_eq!(summary.registers, [0, 1, 2, 3, 4, 5, 6, 7]);
    for i in 1..8i64 {
        assert_eq!(summary.memory[(10 + i) as usize], i);
    }
}

#[test]
fn store_waits_for_its_value_at_writeback() {
    // The store's address is ready immediately (base R0), but the stored
    // value comes from a slow ADDI. The store executes its address fold,
    // then sits executed-but-unwritable until the value is broadcast.
    let mut config = SimConfig::default();
    config.latency = PerOp::uniform(1);
    config.latency.addi = 4;
    let program = vec![
        Instruction::addi(r(5), r(2), 7),
        Instruction::store(r(5), Reg::R0, 0),
    ];
    let mut ctx = TestContext::new(program, &config);
    let summary = ctx.run();

    assert_eq!(summary.memory[0], 9);
    assert_eq!(summary.register(r(5)), 9);
    assert_eq!(summary.cycles, 7);
}

#[test]
fn memory_ops_serialize_in_program_order() {
    let program = vec![
        Instruction::store(r(5), Reg::R0, 0),
        Instruction::load(r(4), Reg::R0, 0),
    ];
    let mut ctx = TestContext::uniform(program, 4, 1);
    let summary = ctx.run();

    // Even with four stations per pool, the load held back until the
    // store's station drained.
    assert!(summary.stats.stalls_memory > 0);
    assert_eq!(summary.register(r(4)), 5);
}

#[test]
fn load_beyond_memory_is_fatal() {
    let mut config = uniform_config(1, 1);
    config.memory_words = 16;
    let program = vec![Instruction::load(r(4), Reg::R0, 9999)];
    let mut sim = Simulator::new(program, &config).unwrap();
    let err = sim.run().unwrap_err();
    assert_eq!(err, SimError::MemoryOutOfRange { addr: 9999, len: 16 });
}

#[test]
fn store_to_negative_address_is_fatal() {
    let program = vec![Instruction::store(r(1), Reg::R0, -1)];
    let config = uniform_config(1, 1);
    let mut sim = Simulator::new(program, &config).unwrap();
    let err = sim.run().unwrap_err();
    assert!(matches!(err, SimError::MemoryOutOfRange { addr: -1, .. }));
}

#[test]
fn load_address_uses_the_base_register() {
    // LOAD R4, 2(R3) with R3 = 3 reads mem[5].
    let mut ctx = TestContext::uniform(vec![Instruction::load(r(4), r(3), 2)], 1, 1);
    ctx.sim.store_words(5, &[77]).unwrap();
    let summary = ctx.run();
    assert_eq!(summary.register(r(4)), 77);
}

#[test]
fn preset_memory_rejects_out_of_range() {
    let mut config = uniform_config(1, 1);
    config.memory_words = 4;
    let mut sim = Simulator::new(Vec::new(), &config).unwrap();
    assert!(sim.store_words(3, &[1, 2]).is_err());
    assert!(sim.store_words(2, &[1, 2]).is_ok());
}
