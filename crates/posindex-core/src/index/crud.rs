//! Insert, update, delete and tombstone cleanup.
//!
//! Deletes are O(1): the slot moves to the tombstone set and the bitmaps are
//! left alone. Once the tombstone count reaches
//! `maintenance.tombstone_cleanup_threshold`, one batch purge subtracts the
//! whole set from every bitmap and the slots go to the free list.

use super::{CrudCounters, PatternIndex};
use crate::bitmap_store::PositionalBitmapStore;
use crate::error::{Error, Result};
use crate::locator::{Locator, RecordHandle};
use crate::slot_table::SlotTable;

impl PatternIndex {
    /// Replaces the whole index content with `rows`.
    ///
    /// Also the way out of a poisoned state.
    ///
    /// # Errors
    ///
    /// Returns `ColumnCountMismatch` or `ResourceExhausted` from the first
    /// failing row. Rows before it stay indexed.
    pub fn build<I, V, S>(&mut self, rows: I) -> Result<u64>
    where
        I: IntoIterator<Item = (Locator, V)>,
        V: AsRef<[S]>,
        S: AsRef<str>,
    {
        let column_count = self.columns.len();
        self.columns = vec![PositionalBitmapStore::new(); column_count];
        self.slots = SlotTable::new();
        self.counters = CrudCounters::default();
        self.poisoned = None;

        for (locator, values) in rows {
            self.insert_row(locator, values.as_ref())?;
            self.counters.inserts += 1;
        }

        let built = self.counters.inserts;
        tracing::info!(records = built, columns = column_count, "Index built");
        Ok(built)
    }

    /// Indexes one record and returns its handle.
    ///
    /// # Errors
    ///
    /// - `ColumnCountMismatch` if `values` does not have one entry per column
    /// - `ResourceExhausted` if a bitmap or the slot table cannot grow; the
    ///   index is left as it was
    /// - `InconsistentState` if the index is poisoned
    pub fn insert<S: AsRef<str>>(&mut self, locator: Locator, values: &[S]) -> Result<RecordHandle> {
        self.ensure_consistent()?;
        let handle = self.insert_row(locator, values)?;
        self.counters.inserts += 1;
        Ok(handle)
    }

    /// Replaces the values of a live record, keeping its locator.
    ///
    /// Implemented as delete + insert: the returned handle may differ from
    /// `handle`.
    ///
    /// # Errors
    ///
    /// `UnknownRecordHandle` if `handle` is not live, plus the errors of
    /// [`insert`](Self::insert).
    pub fn update<S: AsRef<str>>(&mut self, handle: RecordHandle, values: &[S]) -> Result<RecordHandle> {
        let locator = self
            .locator(handle)
            .ok_or(Error::UnknownRecordHandle(handle.slot()))?;
        self.update_at(handle, locator, values)
    }

    /// Replaces the values and the locator of a live record.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub fn update_at<S: AsRef<str>>(
        &mut self,
        handle: RecordHandle,
        locator: Locator,
        values: &[S],
    ) -> Result<RecordHandle> {
        self.ensure_consistent()?;
        self.check_arity(values.len())?;
        self.remove_row(handle)?;
        let new_handle = self.insert_row(locator, values)?;
        self.counters.updates += 1;
        Ok(new_handle)
    }

    /// Marks a record deleted. It disappears from query results immediately.
    ///
    /// May trigger a batch cleanup.
    ///
    /// # Errors
    ///
    /// `UnknownRecordHandle` if the record is not live (already deleted,
    /// never inserted). Nothing is modified. `InconsistentState` if the index
    /// is poisoned or the triggered cleanup fails.
    pub fn delete(&mut self, handle: RecordHandle) -> Result<()> {
        self.ensure_consistent()?;
        self.remove_row(handle)?;
        self.counters.deletes += 1;
        Ok(())
    }

    /// Deletes every live record whose locator `doomed` selects.
    ///
    /// The cleanup threshold is checked once, after the whole batch, so a
    /// batch crossing it leaves no tombstones behind. Returns the number of
    /// records deleted.
    ///
    /// # Errors
    ///
    /// `InconsistentState` if the index is poisoned or the cleanup fails.
    pub fn bulk_delete<F>(&mut self, mut doomed: F) -> Result<u64>
    where
        F: FnMut(Locator) -> bool,
    {
        self.ensure_consistent()?;
        let live = self.slots.live().clone();
        let mut removed = 0_u64;
        for slot in &live {
            let Some(locator) = self.slots.locator(slot) else {
                continue;
            };
            if doomed(locator) {
                self.slots.tombstone(slot)?;
                removed += 1;
            }
        }
        self.counters.deletes += removed;
        tracing::debug!(removed, "Bulk delete");
        self.cleanup_if_due()?;
        Ok(removed)
    }

    /// Purges every tombstone now, regardless of the threshold.
    ///
    /// Returns the number of slots reclaimed.
    ///
    /// # Errors
    ///
    /// `InconsistentState` if the index is poisoned or the purge fails.
    pub fn purge_now(&mut self) -> Result<u64> {
        self.ensure_consistent()?;
        self.purge_tombstones()
    }

    fn insert_row<S: AsRef<str>>(&mut self, locator: Locator, values: &[S]) -> Result<RecordHandle> {
        self.check_arity(values.len())?;
        let slot = self.slots.allocate(locator)?;

        for (column, value) in values.iter().enumerate() {
            if let Err(err) = self.columns[column].insert(slot, value.as_ref().as_bytes()) {
                for (done, value) in values.iter().enumerate().take(column) {
                    self.columns[done].remove(slot, value.as_ref().as_bytes());
                }
                self.slots.release(slot);
                tracing::warn!(slot, column, error = %err, "Insert aborted");
                return Err(err);
            }
        }
        Ok(RecordHandle(slot))
    }

    fn remove_row(&mut self, handle: RecordHandle) -> Result<()> {
        if let Err(err) = self.slots.tombstone(handle.slot()) {
            tracing::warn!(handle = %handle, "Delete of a record that is not live");
            return Err(err);
        }
        self.cleanup_if_due()
    }

    fn cleanup_if_due(&mut self) -> Result<()> {
        let threshold = self.config.maintenance.tombstone_cleanup_threshold as u64;
        if self.slots.tombstone_count() >= threshold {
            self.purge_tombstones()?;
        }
        Ok(())
    }

    /// Subtracts all tombstones from every bitmap, then frees their slots.
    ///
    /// All-or-nothing: the poison flag stays set unless every column has
    /// dropped every dead slot.
    fn purge_tombstones(&mut self) -> Result<u64> {
        let dead = self.slots.tombstones().clone();
        if dead.is_empty() {
            return Ok(0);
        }
        tracing::info!(
            tombstones = dead.len(),
            columns = self.columns.len(),
            "Starting tombstone cleanup"
        );

        self.poisoned = Some(format!(
            "tombstone cleanup of {} slots did not complete",
            dead.len()
        ));
        for store in &mut self.columns {
            store.purge(&dead);
        }
        if let Some(slot) = dead
            .iter()
            .find(|&slot| self.columns.iter().any(|store| store.references(slot)))
        {
            let reason = format!("slot {slot} still referenced after cleanup");
            tracing::error!(slot, "Tombstone cleanup left a dead slot behind; index poisoned");
            self.poisoned = Some(reason.clone());
            return Err(Error::InconsistentState(reason));
        }

        let purged = self.slots.reclaim_tombstones().len();
        self.poisoned = None;
        self.counters.cleanups += 1;

        tracing::info!(
            purged,
            free_slots = self.slots.free_count(),
            live = self.slots.live_count(),
            "Tombstone cleanup finished"
        );
        Ok(purged)
    }
}
