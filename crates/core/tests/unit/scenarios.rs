//! End-to-end pipeline scenarios: forwarding, parallelism, the zero
//! register, branches in both directions, and store-to-load traffic.

use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::harness::{TestContext, r, uniform_config};
use tomsim_core::Instruction;
use tomsim_core::common::reg::Reg;

#[test]
fn raw_forwarding_through_cdb() {
    // ADD R1, R2, R3 ; ADD R4, R1, R2 — the second ADD waits on the first
    // through its tag and captures the broadcast result.
    let program = vec![
        Instruction::add(r(1), r(2), r(3)),
        Instruction::add(r(4), r(1), r(2)),
    ];
    let mut ctx = TestContext::uniform(program, 2, 3);
    let summary = ctx.run();

    assert_eq!(summary.register(r(1)), 5);
    assert_eq!(summary.register(r(4)), 7);
    // Issue, three execute cycles, write; then the dependent chain again.
    assert_eq!(summary.cycles, 9);
}

#[test]
fn independent_ops_execute_in_parallel() {
    let program = vec![
        Instruction::add(r(1), r(2), r(3)),
        Instruction::nand(r(4), r(5), r(6)),
    ];
    let mut ctx = TestContext::uniform(program, 2, 3);
    let summary = ctx.run();

    assert_eq!(summary.register(r(1)), 5);
    assert_eq!(summary.register(r(4)), !(5 & 6));
    // issue-1 / issue-2+exec-1 / exec+exec / exec+exec / write-1+exec-2 /
    // write-2: the second result lands one cycle after the first.
    assert_eq!(summary.cycles, 6);
}

#[test]
fn r0_value_is_immune_to_writeback() {
    let program = vec![Instruction::addi(Reg::R0, r(2), 6)];
    let mut ctx = TestContext::uniform(program, 1, 1);
    let summary = ctx.run();

    assert_eq!(summary.register(Reg::R0), 0, "R0 must stay zero, not become 8");
    assert_eq!(summary.cycles, 3);
}

#[test]
fn not_taken_branch_costs_its_latency() {
    // With R2 == R3 the branch falls through; the queued successor executes
    // normally and the run is exactly one BNE latency over the unbranched
    // baseline.
    let branched = vec![
        Instruction::add(r(1), r(2), r(3)),
        Instruction::bne(r(2), r(3), 3),
        Instruction::add(r(4), r(1), r(1)),
    ];
    let baseline = vec![
        Instruction::add(r(1), r(2), r(3)),
        Instruction::add(r(4), r(1), r(1)),
    ];

    let mut ctx = TestContext::uniform(branched, 2, 1);
    ctx.set_reg(3, 2);
    let summary = ctx.run();
    assert_eq!(summary.register(r(1)), 4);
    assert_eq!(summary.register(r(4)), 8);
    assert_eq!(summary.stats.branches_not_taken, 1);
    assert_eq!(summary.stats.flushed, 0);

    let mut base_ctx = TestContext::uniform(baseline, 2, 1);
    base_ctx.set_reg(3, 2);
    let base = base_ctx.run();
    assert_eq!(summary.cycles, base.cycles + 1);
}

#[test]
fn taken_backward_branch_flushes_and_reruns() {
    // R2 starts at 1: the first pass through the loop increments it to 2,
    // the branch is taken back to the top, the second pass reaches 3 == R3
    // and falls through. Everything issued behind the first (taken)
    // resolution is flushed and re-executed.
    let program = vec![
        Instruction::add(r(4), r(2), r(3)),
        Instruction::addi(r(2), r(2), 1),
        Instruction::bne(r(2), r(3), -2),
        Instruction::add(r(5), r(3), r(3)),
        Instruction::nand(r(6), r(1), r(1)),
        Instruction::add(r(7), r(3), r(1)),
    ];
    let mut ctx = TestContext::uniform(program, 2, 1);
    ctx.set_reg(2, 1);
    let summary = ctx.run();

    assert_eq!(summary.register(r(2)), 3);
    assert_eq!(summary.register(r(4)), 5, "second-pass value, not first-pass");
    assert_eq!(summary.register(r(5)), 6);
    assert_eq!(summary.register(r(6)), !(1 & 1));
    assert_eq!(summary.register(r(7)), 4);

    assert_eq!(summary.stats.branches_taken, 1);
    assert_eq!(summary.stats.branches_not_taken, 1);
    assert_eq!(summary.stats.flushed, 3, "all three speculative stations discarded");
    assert_eq!(ctx.flushes().len(), 3);
    assert_eq!(summary.cycles, 16);
}

#[test]
fn store_then_load_round_trips_through_memory() {
    // STORE R5 at mem[0], LOAD it back into R4. The memory class
    // serializes in program order, so the load observes the store.
    let program = vec![
        Instruction::store(r(5), Reg::R0, 0),
        Instruction::load(r(4), Reg::R0, 0),
    ];
    let mut ctx = TestContext::uniform(program, 1, 1);
    let summary = ctx.run();

    assert_eq!(summary.memory[0], 5);
    assert_eq!(summary.register(r(4)), 5);
    assert_eq!(summary.cycles, 6);
    assert!(summary.stats.stalls_memory > 0, "the load waited its turn");
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn single_instruction_drains_in_latency_plus_two(#[case] latency: u64) {
    let program = vec![Instruction::add(r(1), r(2), r(3))];
    let mut ctx = TestContext::uniform(program, 1, latency);
    let summary = ctx.run();
    assert_eq!(summary.cycles, latency + 2);
}

#[test]
fn empty_program_terminates_immediately() {
    let mut ctx = TestContext::new(Vec::new(), &uniform_config(1, 1));
    let summary = ctx.run();
    assert_eq!(summary.cycles, 0);
    assert_eq!(summary.registers, [0, 1, 2, 3, 4, 5, 6, 7]);
}
