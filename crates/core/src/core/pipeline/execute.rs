//! Execute-all.
//!
//! Every busy, unexecuted station attempts one execution cycle, gated by:
//! issued in an earlier cycle, not deferred behind an unresolved branch,
//! and operand-ready for its opcode. LOAD/STORE fold the effective address
//! (`A := vj + A`) on their first execution cycle. The cycle that drains
//! the latency countdown marks the station executed and computes its
//! result; LOAD reads memory at that point, and an out-of-range address is
//! fatal.

use tracing::trace;

use crate::common::error::SimError;
use crate::core::exec;
use crate::core::pipeline::Pipeline;
use crate::core::station::Tag;
use crate::isa::instruction::Opcode;
use crate::trace::TraceSink;

impl Pipeline {
    /// Runs one execution cycle for every eligible station.
    pub(super) fn execute_stage(&mut self, sink: &mut dyn TraceSink) -> Result<(), SimError> {
        for tag in self.stations.tags() {
            let st = self.stations.get(tag);
            if !st.busy || st.executed {
                continue;
            }
            if st.issue_cycle >= self.clock {
                continue;
            }
            if self.flow.is_deferred(tag) {
                continue;
            }
            if !st.operands_ready() {
                continue;
            }

            let clock = self.clock;
            let op = tag.op();
            let st = self.stations.get_mut(tag);
            if op.is_memory() && !st.addr_computed {
                // A transitions from immediate to effective address.
                st.a = Some(st.val_j().wrapping_add(st.addr()));
                st.addr_computed = true;
            }
            st.remaining -= 1;
            st.execute_cycle = clock;

            let remaining = st.remaining;
            if remaining == 0 {
                self.finish_execute(tag)?;
                trace!("EX  {tag} complete");
                sink.on_complete(clock, tag);
            } else {
                trace!("EX  {tag} remaining={remaining}");
                sink.on_execute(clock, tag, remaining);
            }
        }
        Ok(())
    }

    /// Computes the station's result as its latency countdown reaches zero.
    fn finish_execute(&mut self, tag: Tag) -> Result<(), SimError> {
        let st = self.stations.get(tag);
        let (result, taken) = match tag.op() {
            Opcode::Load => (Some(self.memory.read(st.addr())?), false),
            // The store value is consumed at write-back, not here.
            Opcode::Store => (None, false),
            Opcode::Bne => {
                let taken = st.val_j() != st.val_k();
                (Some(exec::branch_target(st.pc, st.addr())), taken)
            }
            Opcode::Jal => (Some(exec::branch_target(st.pc, st.addr())), false),
            Opcode::Ret => (Some(st.val_j()), false),
            op => {
                let vk = st.vk.unwrap_or_default();
                let imm = st.a.unwrap_or_default();
                (Some(exec::arithmetic(op, st.val_j(), vk, imm)), false)
            }
        };

        let st = self.stations.get_mut(tag);
        st.result = result;
        st.taken = taken;
        st.executed = true;
        Ok(())
    }
}
