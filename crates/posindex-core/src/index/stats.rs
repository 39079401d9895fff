//! Index statistics.

use super::PatternIndex;
use crate::bitmap_store::{ColumnStats, PositionalBitmapStore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic write counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrudCounters {
    /// Successful inserts (updates excluded).
    pub inserts: u64,
    /// Successful updates.
    pub updates: u64,
    /// Successful deletes (updates excluded).
    pub deletes: u64,
    /// Completed tombstone cleanups.
    pub cleanups: u64,
}

/// Read-only diagnostic snapshot of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Live records.
    pub live_count: u64,
    /// Deleted records not yet purged.
    pub tombstone_count: u64,
    /// Slots waiting for reuse.
    pub free_slot_count: usize,
    /// Slot ids ever handed out.
    pub total_slots: usize,
    /// Total inserts.
    pub insert_count: u64,
    /// Total updates.
    pub update_count: u64,
    /// Total deletes.
    pub delete_count: u64,
    /// Completed tombstone cleanups.
    pub cleanup_count: u64,
    /// Longest value indexed in any column.
    pub max_value_length: usize,
    /// Estimated memory usage in bytes.
    pub memory_bytes: usize,
    /// Per-column bitmap statistics.
    pub columns: Vec<ColumnStats>,
}

impl PatternIndex {
    /// Returns a statistics snapshot. No side effects.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let columns: Vec<ColumnStats> = self.columns.iter().map(|c| c.stats()).collect();
        let max_value_length = columns.iter().map(|c| c.max_length).max().unwrap_or(0);
        let memory_bytes =
            self.slots.memory_bytes() + columns.iter().map(|c| c.memory_bytes).sum::<usize>();

        IndexStats {
            live_count: self.slots.live_count(),
            tombstone_count: self.slots.tombstone_count(),
            free_slot_count: self.slots.free_count(),
            total_slots: self.slots.total_slots(),
            insert_count: self.counters.inserts,
            update_count: self.counters.updates,
            delete_count: self.counters.deletes,
            cleanup_count: self.counters.cleanups,
            max_value_length,
            memory_bytes,
            columns,
        }
    }

    /// Estimated heap usage of bitmaps and the slot table, in bytes.
    #[must_use]
    pub fn estimate_memory_bytes(&self) -> usize {
        self.slots.memory_bytes()
            + self
                .columns
                .iter()
                .map(PositionalBitmapStore::memory_bytes)
                .sum::<usize>()
    }

    /// Write counters.
    #[must_use]
    pub fn counters(&self) -> CrudCounters {
        self.counters
    }
}

impl fmt::Display for IndexStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pattern index statistics")?;
        writeln!(f, "  active records:   {}", self.live_count)?;
        writeln!(f, "  total slots:      {}", self.total_slots)?;
        writeln!(f, "  free slots:       {}", self.free_slot_count)?;
        writeln!(f, "  tombstones:       {}", self.tombstone_count)?;
        writeln!(f, "  max value length: {}", self.max_value_length)?;
        writeln!(
            f,
            "  inserts/updates/deletes: {}/{}/{} ({} cleanups)",
            self.insert_count, self.update_count, self.delete_count, self.cleanup_count
        )?;
        for (i, column) in self.columns.iter().enumerate() {
            writeln!(
                f,
                "  column {i}: {} fwd, {} bwd, {} folded fwd, {} folded bwd, {} lengths (max {})",
                column.forward_entries,
                column.backward_entries,
                column.folded_forward_entries,
                column.folded_backward_entries,
                column.distinct_lengths,
                column.max_length
            )?;
        }
        write!(f, "  memory: {:.1} KiB", self.memory_bytes as f64 / 1024.0)
    }
}
