//! Fetch + issue.
//!
//! At most one instruction issues per cycle. Source operands are filled
//! rename-or-read: a register with a pending producer contributes its tag
//! (`qj`/`qk`), anything else contributes its architectural value
//! (`vj`/`vk`). Source tags are captured *before* the destination rename is
//! installed, so an instruction reading its own destination sees the
//! previous producer rather than itself.
//!
//! Issue stalls — leaving the PC where it is — behind an unresolved JAL,
//! when a second BNE/RET would nest speculation, when a memory-class
//! instruction would overtake an in-flight LOAD/STORE, or when the
//! opcode's station pool is full.

use tracing::trace;

use crate::common::reg::Reg;
use crate::core::pipeline::Pipeline;
use crate::core::station::Tag;
use crate::isa::instruction::Opcode;
use crate::trace::TraceSink;

impl Pipeline {
    /// Attempts to fetch and issue `program[pc]` this cycle.
    pub(super) fn issue_stage(&mut self, sink: &mut dyn TraceSink) {
        let Some(&inst) = self.program.get(self.pc) else {
            return;
        };
        let op = inst.op;

        if self.flow.jal_pending() {
            self.stats.stalls_control += 1;
            trace!("IS  STALL pc={} behind JAL", self.pc);
            return;
        }
        if op.is_branch_like() && self.flow.is_speculating() {
            // One unresolved control transfer at a time.
            self.stats.stalls_control += 1;
            trace!("IS  STALL pc={} behind unresolved branch", self.pc);
            return;
        }
        if op.is_memory() && self.stations.memory_class_busy() {
            // Loads and stores serialize through program order.
            self.stats.stalls_memory += 1;
            trace!("IS  STALL pc={} behind older memory op", self.pc);
            return;
        }
        let Some(tag) = self.stations.free_slot(op) else {
            self.stats.stalls_structural += 1;
            trace!("IS  STALL pc={} no free {op} station", self.pc);
            return;
        };

        let fetch_pc = self.pc;

        // Sources first, destination rename after.
        let j_source = if op == Opcode::Ret { Some(Reg::LINK) } else { inst.rs1 };
        let j = j_source.map(|reg| self.rename_or_read(reg));
        let k = inst.rs2.map(|reg| self.rename_or_read(reg));
        let dest = match op {
            _ if !op.writes_register() => None,
            Opcode::Jal => Some(Reg::LINK),
            _ => inst.rd,
        };

        let latency = self.latency[op];
        let clock = self.clock;
        let st = self.stations.get_mut(tag);
        st.busy = true;
        if let Some((value, producer)) = j {
            st.vj = value;
            st.qj = producer;
        }
        if let Some((value, producer)) = k {
            st.vk = value;
            st.qk = producer;
        }
        st.a = inst.imm;
        st.rd = dest;
        st.pc = fetch_pc;
        st.remaining = latency;
        st.issue_cycle = clock;

        if let Some(rd) = dest {
            self.status.set_producer(rd, tag);
        }

        if op.is_branch_like() {
            self.flow.speculate(tag);
        } else if self.flow.is_speculating() {
            self.flow.record_shadow(tag);
        }
        if op == Opcode::Jal {
            self.flow.begin_jal(tag);
        }

        self.pc += 1;
        self.stats.issued += 1;
        trace!("IS  {tag} pc={fetch_pc} {inst}");
        sink.on_issue(clock, tag, fetch_pc, &inst);
    }

    /// A source operand as (value, producer): exactly one side is set.
    fn rename_or_read(&self, reg: Reg) -> (Option<i64>, Option<Tag>) {
        match self.status.producer(reg) {
            Some(tag) => (None, Some(tag)),
            None => (Some(self.regs.read(reg)), None),
        }
    }
}
