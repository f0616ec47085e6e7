//! Register-status table (the renaming table).
//!
//! Maps each architectural register to the tag of the reservation station
//! currently producing its next value, or `None` if the value is already in
//! the register file. Issue renames destinations here; write-back clears a
//! rename only if it still points at the writing station, so an older
//! producer never clobbers a newer rename of the same register.
//!
//! `R0` is special only in its *value*: its tag entry is writable like any
//! other, but write-back never touches the zero register's contents.

use crate::common::reg::Reg;
use crate::core::station::Tag;

/// The renaming table.
#[derive(Debug, Clone, Default)]
pub struct RegisterStatus {
    entries: [Option<Tag>; Reg::COUNT],
}

impl RegisterStatus {
    /// Creates a table with no pending producers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `reg` as produced by the station `tag`.
    pub fn set_producer(&mut self, reg: Reg, tag: Tag) {
        self.entries[reg.index()] = Some(tag);
    }

    /// The pending producer of `reg`, if any.
    pub fn producer(&self, reg: Reg) -> Option<Tag> {
        self.entries[reg.index()]
    }

    /// Clears `reg`'s rename, but only if it still names `tag`.
    ///
    /// A later instruction renaming the same register must win: the older
    /// producer's write-back sees a mismatch and leaves the entry alone.
    pub fn clear_if_match(&mut self, reg: Reg, tag: Tag) {
        let slot = &mut self.entries[reg.index()];
        if *slot == Some(tag) {
            *slot = None;
        }
    }

    /// Removes every rename pointing at `tag`.
    ///
    /// Used when a station is emptied (write-back or flush) so no stale
    /// rename survives the slot being recycled.
    pub fn clear_tag(&mut self, tag: Tag) {
        for slot in &mut self.entries {
            if *slot == Some(tag) {
                *slot = None;
            }
        }
    }
}
