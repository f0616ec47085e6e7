//! Reservation stations.
//!
//! This module holds the buffer slots at the heart of the algorithm:
//! 1. **`Tag`** — the opaque identity of one station; all cross-station
//!    references travel as tags, never as pointers.
//! 2. **`Station`** — one in-flight instruction and its operand state.
//! 3. **`StationFile`** — the per-opcode pools, iterated in the fixed
//!    arbitration order.

use std::fmt;

use crate::common::reg::Reg;
use crate::config::PerOp;
use crate::isa::instruction::Opcode;

/// Identity of one reservation station: opcode plus slot index.
///
/// Displays as the classic tag names, `ADD1`, `LOAD2`, and so on
/// (indices are 1-based in the rendered form only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    op: Opcode,
    slot: u8,
}

impl Tag {
    pub(crate) const fn new(op: Opcode, slot: u8) -> Self {
        Self { op, slot }
    }

    /// The opcode this station serves.
    pub const fn op(self) -> Opcode {
        self.op
    }

    /// Zero-based slot index within the opcode's pool.
    pub const fn slot(self) -> usize {
        self.slot as usize
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.mnemonic(), self.slot + 1)
    }
}

/// One reservation station.
///
/// Operand invariant: for each of `j`/`k`, at most one of the value (`vj`)
/// and the producer tag (`qj`) is set; both clear means the operand does
/// not apply to this opcode.
#[derive(Debug, Clone)]
pub struct Station {
    tag: Tag,
    /// Slot occupied.
    pub busy: bool,
    /// First operand value, once known.
    pub vj: Option<i64>,
    /// Second operand value, once known.
    pub vk: Option<i64>,
    /// Producer of the first operand, while outstanding.
    pub qj: Option<Tag>,
    /// Producer of the second operand, while outstanding.
    pub qk: Option<Tag>,
    /// Immediate at issue; for LOAD/STORE, the effective address after the
    /// first execute cycle (`addr_computed` marks the transition).
    pub a: Option<i64>,
    /// Renamed destination register.
    pub rd: Option<Reg>,
    /// PC the instruction was fetched from.
    pub pc: usize,
    /// Value to broadcast: the computed result, or the resolved target for
    /// control transfers.
    pub result: Option<i64>,
    /// BNE only: did the comparison resolve taken?
    pub taken: bool,
    /// All latency cycles have elapsed.
    pub executed: bool,
    /// The `A` field now holds an effective address, not an immediate.
    pub addr_computed: bool,
    /// Latency countdown.
    pub remaining: u64,
    /// Cycle this station was issued in (same-cycle execute guard).
    pub issue_cycle: u64,
    /// Most recent execute cycle (same-cycle write guard).
    pub execute_cycle: u64,
}

impl Station {
    fn new(tag: Tag) -> Self {
        Self {
            tag,
            busy: false,
            vj: None,
            vk: None,
            qj: None,
            qk: None,
            a: None,
            rd: None,
            pc: 0,
            result: None,
            taken: false,
            executed: false,
            addr_computed: false,
            remaining: 0,
            issue_cycle: 0,
            execute_cycle: 0,
        }
    }

    /// This station's tag.
    pub const fn tag(&self) -> Tag {
        self.tag
    }

    /// The opcode this station serves.
    pub const fn op(&self) -> Opcode {
        self.tag.op()
    }

    /// Clears every field except the identity, freeing the slot.
    pub fn reset(&mut self) {
        *self = Self::new(self.tag);
    }

    /// Are all operands needed to *start* execution present?
    pub fn operands_ready(&self) -> bool {
        self.qj.is_none() && (!self.op().needs_vk_to_execute() || self.qk.is_none())
    }

    /// CDB listen: if either outstanding operand names `tag`, capture the
    /// broadcast value and clear the producer reference.
    pub fn capture(&mut self, tag: Tag, value: i64) {
        if self.qj == Some(tag) {
            self.vj = Some(value);
            self.qj = None;
        }
        if self.qk == Some(tag) {
            self.vk = Some(value);
            self.qk = None;
        }
    }

    /// The `j` operand value. Gated by `operands_ready`, so absence is an
    /// engine bug.
    pub(crate) fn val_j(&self) -> i64 {
        match self.vj {
            Some(v) => v,
            None => panic!("{}: operand j read before ready", self.tag),
        }
    }

    /// The `k` operand value (STORE reads it at write-back).
    pub(crate) fn val_k(&self) -> i64 {
        match self.vk {
            Some(v) => v,
            None => panic!("{}: operand k read before ready", self.tag),
        }
    }

    /// The `A` field: immediate, or effective address once computed.
    pub(crate) fn addr(&self) -> i64 {
        match self.a {
            Some(v) => v,
            None => panic!("{}: A field read but never filled", self.tag),
        }
    }

    /// The computed result or resolved target.
    pub(crate) fn outcome(&self) -> i64 {
        match self.result {
            Some(v) => v,
            None => panic!("{}: result read before execute completed", self.tag),
        }
    }
}

/// All reservation stations, pooled per opcode.
#[derive(Debug, Clone)]
pub struct StationFile {
    pools: Vec<Vec<Station>>,
}

impl StationFile {
    /// Builds the pools from a per-opcode station count table.
    pub fn new(counts: &PerOp<usize>) -> Self {
        let pools = Opcode::ALL
            .into_iter()
            .map(|op| {
                (0..counts[op])
                    .map(|slot| Station::new(Tag::new(op, slot as u8)))
                    .collect()
            })
            .collect();
        Self { pools }
    }

    /// Borrows the station identified by `tag`.
    pub fn get(&self, tag: Tag) -> &Station {
        &self.pools[tag.op().index()][tag.slot()]
    }

    /// Mutably borrows the station identified by `tag`.
    pub fn get_mut(&mut self, tag: Tag) -> &mut Station {
        &mut self.pools[tag.op().index()][tag.slot()]
    }

    /// First free slot in `op`'s pool, if any.
    pub fn free_slot(&self, op: Opcode) -> Option<Tag> {
        self.pools[op.index()]
            .iter()
            .find(|st| !st.busy)
            .map(Station::tag)
    }

    /// Is any LOAD or STORE station busy?
    pub fn memory_class_busy(&self) -> bool {
        [Opcode::Load, Opcode::Store]
            .into_iter()
            .any(|op| self.pools[op.index()].iter().any(|st| st.busy))
    }

    /// Are all stations free?
    pub fn all_idle(&self) -> bool {
        self.iter().all(|st| !st.busy)
    }

    /// Iterates stations in arbitration order: opcode declaration order,
    /// then slot index.
    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.pools.iter().flatten()
    }

    /// Tags of every station, in arbitration order.
    pub fn tags(&self) -> Vec<Tag> {
        self.iter().map(Station::tag).collect()
    }

    /// Delivers a CDB broadcast to every busy station.
    pub fn deliver(&mut self, tag: Tag, value: i64) {
        for st in self.pools.iter_mut().flatten() {
            if st.busy {
                st.capture(tag, value);
            }
        }
    }
}
