//! Simulation statistics collection and reporting.
//!
//! Tracks the counters a run accumulates: cycles, instruction outcomes
//! (issued, completed, flushed), stall causes, CDB traffic, and branch
//! resolution mix.

/// Counters accumulated over one simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Total clock cycles elapsed.
    pub cycles: u64,
    /// Instructions issued into a reservation station (flushed issues
    /// included; a re-fetched instruction counts again).
    pub issued: u64,
    /// Instructions that completed write-back.
    pub completed: u64,
    /// Stations discarded by a taken-branch or RET flush.
    pub flushed: u64,
    /// Issue cycles lost to a full station pool.
    pub stalls_structural: u64,
    /// Issue cycles lost to JAL or nested-branch serialization.
    pub stalls_control: u64,
    /// Issue cycles lost to load/store program-order serialization.
    pub stalls_memory: u64,
    /// CDB grants (one per write-back, stores included).
    pub cdb_writes: u64,
    /// BNE resolutions that were taken, plus RET transfers.
    pub branches_taken: u64,
    /// BNE resolutions that fell through.
    pub branches_not_taken: u64,
    /// PC redirects performed at write-back (taken BNE, JAL, RET).
    pub redirects: u64,
}

impl SimStats {
    /// Prints all counters to stdout as an aligned report.
    pub fn print(&self) {
        println!("==========================================================");
        println!("TOMASULO SIMULATION STATISTICS");
        println!("==========================================================");
        println!("sim_cycles               {}", self.cycles);
        println!("inst.issued              {}", self.issued);
        println!("inst.completed           {}", self.completed);
        println!("inst.flushed             {}", self.flushed);
        println!("----------------------------------------------------------");
        println!("stall.structural         {}", self.stalls_structural);
        println!("stall.control            {}", self.stalls_control);
        println!("stall.memory_order       {}", self.stalls_memory);
        println!("----------------------------------------------------------");
        println!("cdb.writes               {}", self.cdb_writes);
        println!("branch.taken             {}", self.branches_taken);
        println!("branch.not_taken         {}", self.branches_not_taken);
        println!("redirects                {}", self.redirects);
        println!("==========================================================");
    }
}
