//! Write-back and CDB arbitration.
//!
//! At most one executed station writes per cycle: the first, in opcode
//! declaration order then slot order, that finished executing in an earlier
//! cycle. Producers broadcast `(tag, result)` to the rename table, the
//! register file, and every waiting station. STORE commits to memory
//! (consuming the CDB slot without broadcasting a value) once its store
//! value has arrived. BNE, JAL, and RET resolve control flow here — the
//! redirect, the shadow-queue drain, and any flushes happen atomically
//! within the same write-back.
//!
//! Flush policy is direction-sensitive: a backward (or self-targeting)
//! transfer discards the entire shadow queue; a forward transfer discards
//! only stations fetched before the target, keeping those that lie on the
//! taken path, and leaves the PC past the retained work so nothing is
//! issued twice.

use tracing::trace;

use crate::common::error::SimError;
use crate::core::pipeline::Pipeline;
use crate::core::station::{Station, Tag};
use crate::isa::instruction::Opcode;
use crate::trace::TraceSink;

impl Pipeline {
    /// Lets at most one executed station write back this cycle.
    pub(super) fn write_stage(&mut self, sink: &mut dyn TraceSink) -> Result<(), SimError> {
        let Some(tag) = self.select_writer() else {
            return Ok(());
        };
        self.grant_cdb();
        self.stats.completed += 1;
        match tag.op() {
            Opcode::Store => self.commit_store(tag, sink),
            Opcode::Bne => self.resolve_branch(tag, sink),
            Opcode::Ret => self.resolve_ret(tag, sink),
            Opcode::Jal => self.resolve_jal(tag, sink),
            _ => {
                self.write_result(tag, sink);
                Ok(())
            }
        }
    }

    /// First station eligible to write, in arbitration order.
    fn select_writer(&self) -> Option<Tag> {
        self.stations
            .iter()
            .find(|st| {
                st.busy
                    && st.executed
                    && st.execute_cycle < self.clock
                    && (st.op() != Opcode::Store || st.qk.is_none())
            })
            .map(Station::tag)
    }

    /// LOAD and arithmetic write-back: broadcast the result and free the
    /// station.
    fn write_result(&mut self, tag: Tag, sink: &mut dyn TraceSink) {
        let value = self.stations.get(tag).outcome();
        self.broadcast(tag, value);
        self.release(tag);
        trace!("WB  {tag} value={value}");
        sink.on_write(self.clock, tag, value);
    }

    /// STORE write-back: commit the value to memory. No value broadcast,
    /// but the CDB slot is consumed.
    fn commit_store(&mut self, tag: Tag, sink: &mut dyn TraceSink) -> Result<(), SimError> {
        let st = self.stations.get(tag);
        let (addr, value) = (st.addr(), st.val_k());
        self.memory.write(addr, value)?;
        self.release(tag);
        trace!("WB  {tag} mem[{addr}]={value}");
        sink.on_store(self.clock, tag, addr, value);
        Ok(())
    }

    /// BNE resolution: redirect and flush when taken, drain the shadow
    /// queue when not.
    fn resolve_branch(&mut self, tag: Tag, sink: &mut dyn TraceSink) -> Result<(), SimError> {
        let st = self.stations.get(tag);
        let (taken, target, from_pc) = (st.taken, st.outcome(), st.pc);
        self.release(tag);
        if taken {
            self.stats.branches_taken += 1;
            self.redirect(tag, from_pc, target, sink)
        } else {
            self.stats.branches_not_taken += 1;
            self.flow.resolve();
            trace!("WB  {tag} not taken");
            sink.on_drain(self.clock, tag);
            Ok(())
        }
    }

    /// RET resolution: an unconditional transfer to the captured `R1`.
    fn resolve_ret(&mut self, tag: Tag, sink: &mut dyn TraceSink) -> Result<(), SimError> {
        let st = self.stations.get(tag);
        let (target, from_pc) = (st.outcome(), st.pc);
        self.release(tag);
        self.stats.branches_taken += 1;
        self.redirect(tag, from_pc, target, sink)
    }

    /// JAL resolution: broadcast the link value (`pc + 1`, reaching `R1`
    /// through its rename), jump to the target, and lift the issue stall.
    fn resolve_jal(&mut self, tag: Tag, sink: &mut dyn TraceSink) -> Result<(), SimError> {
        let st = self.stations.get(tag);
        let (target, from_pc) = (st.outcome(), st.pc);
        if target < 0 {
            return Err(SimError::NegativeTarget { target, pc: from_pc });
        }
        let link = from_pc as i64 + 1;
        self.broadcast(tag, link);
        self.release(tag);
        self.flow.end_jal();
        self.pc = target as usize;
        self.stats.redirects += 1;
        trace!("WB  {tag} link={link} pc={}", self.pc);
        sink.on_write(self.clock, tag, link);
        sink.on_redirect(self.clock, tag, self.pc);
        Ok(())
    }

    /// A taken transfer: closes the speculation window, flushes the
    /// direction-appropriate part of the shadow queue, and moves the PC.
    fn redirect(
        &mut self,
        tag: Tag,
        from_pc: usize,
        target: i64,
        sink: &mut dyn TraceSink,
    ) -> Result<(), SimError> {
        if target < 0 {
            return Err(SimError::NegativeTarget { target, pc: from_pc });
        }
        let target_pc = target as usize;
        let shadow = self.flow.resolve();
        if target_pc <= from_pc {
            // Backward: all speculative work is on the wrong path.
            for victim in shadow {
                self.flush_station(victim, sink);
            }
            self.pc = target_pc;
        } else {
            // Forward: stations fetched at or past the target would also
            // run on the taken path; keep them, and keep the PC past them.
            for victim in shadow {
                if self.stations.get(victim).pc < target_pc {
                    self.flush_station(victim, sink);
                }
            }
            self.pc = self.pc.max(target_pc);
        }
        self.stats.redirects += 1;
        trace!("BR  {tag} pc={}", self.pc);
        sink.on_redirect(self.clock, tag, self.pc);
        Ok(())
    }

    /// Discards one mis-speculated station, releasing its rename and, for
    /// a queued JAL, its issue stall.
    fn flush_station(&mut self, tag: Tag, sink: &mut dyn TraceSink) {
        if !self.stations.get(tag).busy {
            return;
        }
        self.flow.note_flushed(tag);
        self.release(tag);
        self.stats.flushed += 1;
        trace!("FL  {tag}");
        sink.on_flush(self.clock, tag);
    }
}
