//! Slot table: dense slot ids → physical locators.
//!
//! Every slot is in exactly one state:
//!
//! | State      | `locators[s]` | in `live` | in `tombstones` | in `free` |
//! |------------|---------------|-----------|-----------------|-----------|
//! | live       | `Some`        | yes       | no              | no        |
//! | tombstoned | `Some`        | no        | yes             | no        |
//! | free       | `None`        | no        | no              | yes       |
//!
//! Deletion only flips a slot from live to tombstoned; the bitmaps keep
//! referencing it until [`SlotTable::reclaim_tombstones`] runs as part of a
//! batch purge.

use crate::error::{Error, Result};
use crate::locator::Locator;
use roaring::RoaringBitmap;

/// Arena of slots with a free-list of recycled ids and a tombstone set.
#[derive(Debug, Default, Clone)]
pub struct SlotTable {
    locators: Vec<Option<Locator>>,
    live: RoaringBitmap,
    tombstones: RoaringBitmap,
    /// Stack of reusable slot ids; the lowest id is on top after a reclaim.
    free: Vec<u32>,
}

impl SlotTable {
    /// Creates an empty slot table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a slot for `locator`, reusing a freed slot when one exists.
    ///
    /// # Errors
    ///
    /// Returns `ResourceExhausted` when the slot space (u32) or memory is exhausted.
    pub fn allocate(&mut self, locator: Locator) -> Result<u32> {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.locators[slot as usize] = Some(locator);
                slot
            }
            None => {
                let slot = u32::try_from(self.locators.len()).map_err(|_| {
                    Error::ResourceExhausted("slot space exhausted (u32::MAX slots)".to_string())
                })?;
                self.locators
                    .try_reserve(1)
                    .map_err(|e| Error::ResourceExhausted(format!("slot table growth: {e}")))?;
                self.locators.push(Some(locator));
                slot
            }
        };
        self.live.insert(slot);
        Ok(slot)
    }

    /// Gives back a slot claimed by [`allocate`](Self::allocate) whose insert was aborted.
    pub(crate) fn release(&mut self, slot: u32) {
        if self.live.remove(slot) {
            self.locators[slot as usize] = None;
            self.free.push(slot);
        }
    }

    /// Marks a live slot as deleted. Bitmaps are left untouched.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRecordHandle` if the slot is not live (free, already
    /// tombstoned, or never allocated).
    pub fn tombstone(&mut self, slot: u32) -> Result<()> {
        if !self.live.remove(slot) {
            return Err(Error::UnknownRecordHandle(slot));
        }
        self.tombstones.insert(slot);
        Ok(())
    }

    /// Moves every tombstoned slot to the free list and returns the purged set.
    ///
    /// Callers must already have subtracted the returned set from all bitmaps.
    pub fn reclaim_tombstones(&mut self) -> RoaringBitmap {
        let purged = std::mem::take(&mut self.tombstones);
        let slots: Vec<u32> = purged.iter().collect();
        self.free.reserve(slots.len());
        // Push in descending order so the lowest id is reused first.
        for &slot in slots.iter().rev() {
            self.locators[slot as usize] = None;
            self.free.push(slot);
        }
        purged
    }

    /// Replaces the locator of a live slot.
    ///
    /// # Errors
    ///
    /// Returns `UnknownRecordHandle` if the slot is not live.
    pub fn set_locator(&mut self, slot: u32, locator: Locator) -> Result<()> {
        if !self.live.contains(slot) {
            return Err(Error::UnknownRecordHandle(slot));
        }
        self.locators[slot as usize] = Some(locator);
        Ok(())
    }

    /// Returns the locator stored for an occupied (live or tombstoned) slot.
    #[inline]
    #[must_use]
    pub fn locator(&self, slot: u32) -> Option<Locator> {
        self.locators.get(slot as usize).copied().flatten()
    }

    /// Returns true if the slot holds a live record.
    #[inline]
    #[must_use]
    pub fn is_live(&self, slot: u32) -> bool {
        self.live.contains(slot)
    }

    /// Bitmap of live slots: the universe for negation and `%`.
    #[must_use]
    pub fn live(&self) -> &RoaringBitmap {
        &self.live
    }

    /// Bitmap of tombstoned slots awaiting purge.
    #[must_use]
    pub fn tombstones(&self) -> &RoaringBitmap {
        &self.tombstones
    }

    /// Number of live records.
    #[must_use]
    pub fn live_count(&self) -> u64 {
        self.live.len()
    }

    /// Number of tombstoned slots.
    #[must_use]
    pub fn tombstone_count(&self) -> u64 {
        self.tombstones.len()
    }

    /// Number of slots waiting on the free list.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Number of slot ids ever handed out (high-water mark).
    #[must_use]
    pub fn total_slots(&self) -> usize {
        self.locators.len()
    }

    /// Estimated heap footprint in bytes.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.locators.capacity() * std::mem::size_of::<Option<Locator>>()
            + self.free.capacity() * std::mem::size_of::<u32>()
            + self.live.serialized_size()
            + self.tombstones.serialized_size()
    }
}
