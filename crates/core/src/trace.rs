//! Trace observer interface.
//!
//! The pipeline reports every externally meaningful event through a
//! `TraceSink`: issue, execution progress and completion, write-back,
//! store commit, PC redirects, flushes, and not-taken drains. Sinks get
//! default-empty methods so an observer implements only what it needs.
//!
//! Two implementations ship with the crate: `EventLog`, a recording sink
//! with a shareable handle (used heavily by the test suite), and
//! `StderrSink`, which prints the classic per-cycle trace lines.

use std::sync::{Arc, Mutex, PoisonError};

use crate::core::station::Tag;
use crate::isa::instruction::Instruction;

/// Observer of pipeline events. All methods default to no-ops.
pub trait TraceSink {
    /// An instruction entered station `tag`.
    fn on_issue(&mut self, _cycle: u64, _tag: Tag, _pc: usize, _inst: &Instruction) {}

    /// A station spent an execution cycle; `remaining` cycles left.
    fn on_execute(&mut self, _cycle: u64, _tag: Tag, _remaining: u64) {}

    /// A station finished its last execution cycle.
    fn on_complete(&mut self, _cycle: u64, _tag: Tag) {}

    /// A station broadcast `value` on the CDB.
    fn on_write(&mut self, _cycle: u64, _tag: Tag, _value: i64) {}

    /// A store committed `value` to `memory[addr]`.
    fn on_store(&mut self, _cycle: u64, _tag: Tag, _addr: i64, _value: i64) {}

    /// A control transfer moved the fetch PC to `target`.
    fn on_redirect(&mut self, _cycle: u64, _tag: Tag, _target: usize) {}

    /// A mis-speculated station was discarded.
    fn on_flush(&mut self, _cycle: u64, _tag: Tag) {}

    /// A branch resolved not-taken and released its shadow queue.
    fn on_drain(&mut self, _cycle: u64, _tag: Tag) {}
}

/// A sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TraceSink for NullSink {}

/// One recorded pipeline event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// Instruction issued into a station.
    Issue {
        /// Cycle of the event.
        cycle: u64,
        /// Station issued into.
        tag: Tag,
        /// PC the instruction was fetched from.
        pc: usize,
    },
    /// One execution cycle elapsed.
    Execute {
        /// Cycle of the event.
        cycle: u64,
        /// Executing station.
        tag: Tag,
    },
    /// Execution finished.
    Complete {
        /// Cycle of the event.
        cycle: u64,
        /// Completing station.
        tag: Tag,
    },
    /// Result broadcast on the CDB.
    Write {
        /// Cycle of the event.
        cycle: u64,
        /// Writing station.
        tag: Tag,
        /// Broadcast value.
        value: i64,
    },
    /// Store committed to memory.
    Store {
        /// Cycle of the event.
        cycle: u64,
        /// Committing station.
        tag: Tag,
        /// Effective address.
        addr: i64,
        /// Stored value.
        value: i64,
    },
    /// Fetch PC redirected.
    Redirect {
        /// Cycle of the event.
        cycle: u64,
        /// Redirecting station.
        tag: Tag,
        /// New fetch PC.
        target: usize,
    },
    /// Station flushed.
    Flush {
        /// Cycle of the event.
        cycle: u64,
        /// Discarded station.
        tag: Tag,
    },
    /// Not-taken branch drained its shadow queue.
    Drain {
        /// Cycle of the event.
        cycle: u64,
        /// Resolving branch station.
        tag: Tag,
    },
}

impl TraceEvent {
    /// The cycle this event happened in.
    pub const fn cycle(&self) -> u64 {
        match *self {
            Self::Issue { cycle, .. }
            | Self::Execute { cycle, .. }
            | Self::Complete { cycle, .. }
            | Self::Write { cycle, .. }
            | Self::Store { cycle, .. }
            | Self::Redirect { cycle, .. }
            | Self::Flush { cycle, .. }
            | Self::Drain { cycle, .. } => cycle,
        }
    }
}

/// A recording sink. Cloning shares the underlying log, so a test can keep
/// one handle and hand the other to the simulator.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, in order.
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, event: TraceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl TraceSink for EventLog {
    fn on_issue(&mut self, cycle: u64, tag: Tag, pc: usize, _inst: &Instruction) {
        self.push(TraceEvent::Issue { cycle, tag, pc });
    }

    fn on_execute(&mut self, cycle: u64, tag: Tag, _remaining: u64) {
        self.push(TraceEvent::Execute { cycle, tag });
    }

    fn on_complete(&mut self, cycle: u64, tag: Tag) {
        self.push(TraceEvent::Complete { cycle, tag });
    }

    fn on_write(&mut self, cycle: u64, tag: Tag, value: i64) {
        self.push(TraceEvent::Write { cycle, tag, value });
    }

    fn on_store(&mut self, cycle: u64, tag: Tag, addr: i64, value: i64) {
        self.push(TraceEvent::Store { cycle, tag, addr, value });
    }

    fn on_redirect(&mut self, cycle: u64, tag: Tag, target: usize) {
        self.push(TraceEvent::Redirect { cycle, tag, target });
    }

    fn on_flush(&mut self, cycle: u64, tag: Tag) {
        self.push(TraceEvent::Flush { cycle, tag });
    }

    fn on_drain(&mut self, cycle: u64, tag: Tag) {
        self.push(TraceEvent::Drain { cycle, tag });
    }
}

/// A sink that prints one line per event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl TraceSink for StderrSink {
    fn on_issue(&mut self, cycle: u64, tag: Tag, pc: usize, inst: &Instruction) {
        eprintln!("[{cycle:>4}] IS  {tag:<7} pc={pc} {inst}");
    }

    fn on_execute(&mut self, cycle: u64, tag: Tag, remaining: u64) {
        eprintln!("[{cycle:>4}] EX  {tag:<7} remaining={remaining}");
    }

    fn on_complete(&mut self, cycle: u64, tag: Tag) {
        eprintln!("[{cycle:>4}] EX  {tag:<7} complete");
    }

    fn on_write(&mut self, cycle: u64, tag: Tag, value: i64) {
        eprintln!("[{cycle:>4}] WB  {tag:<7} value={value}");
    }

    fn on_store(&mut self, cycle: u64, tag: Tag, addr: i64, value: i64) {
        eprintln!("[{cycle:>4}] WB  {tag:<7} mem[{addr}]={value}");
    }

    fn on_redirect(&mut self, cycle: u64, tag: Tag, target: usize) {
        eprintln!("[{cycle:>4}] BR  {tag:<7} pc={target}");
    }

    fn on_flush(&mut self, cycle: u64, tag: Tag) {
        eprintln!("[{cycle:>4}] FL  {tag:<7} flushed");
    }

    fn on_drain(&mut self, cycle: u64, tag: Tag) {
        eprintln!("[{cycle:>4}] WB  {tag:<7} not taken");
    }
}
