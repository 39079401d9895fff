//! Positional bitmap store implementation.

use crate::error::{Error, Result};
use roaring::RoaringBitmap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Composite key: (byte, signed position).
type PosKey = (u8, i32);

/// Which bitmap families a lookup reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseMode {
    /// Bytes as stored (LIKE).
    Sensitive,
    /// ASCII-lowercased bytes (ILIKE).
    Folded,
}

/// Forward, backward and presence families for one case mode.
#[derive(Debug, Default, Clone)]
struct CaseView {
    forward: FxHashMap<PosKey, RoaringBitmap>,
    backward: FxHashMap<PosKey, RoaringBitmap>,
    presence: FxHashMap<u8, RoaringBitmap>,
}

impl CaseView {
    fn insert(&mut self, slot: u32, byte: u8, pos: i32, neg: i32) {
        self.forward.entry((byte, pos)).or_default().insert(slot);
        self.backward.entry((byte, neg)).or_default().insert(slot);
        self.presence.entry(byte).or_default().insert(slot);
    }

    fn remove(&mut self, slot: u32, byte: u8, pos: i32, neg: i32) {
        remove_from(&mut self.forward, &(byte, pos), slot);
        remove_from(&mut self.backward, &(byte, neg), slot);
        remove_from(&mut self.presence, &byte, slot);
    }

    fn purge(&mut self, dead: &RoaringBitmap) {
        purge_map(&mut self.forward, dead);
        purge_map(&mut self.backward, dead);
        purge_map(&mut self.presence, dead);
    }

    fn memory_bytes(&self) -> usize {
        let key_overhead = (self.forward.len() + self.backward.len())
            * (std::mem::size_of::<PosKey>() + std::mem::size_of::<RoaringBitmap>())
            + self.presence.len() * (1 + std::mem::size_of::<RoaringBitmap>());
        let bitmaps: usize = self
            .forward
            .values()
            .chain(self.backward.values())
            .chain(self.presence.values())
            .map(RoaringBitmap::serialized_size)
            .sum();
        key_overhead + bitmaps
    }
}

fn remove_from<K: std::hash::Hash + Eq>(map: &mut FxHashMap<K, RoaringBitmap>, key: &K, slot: u32) {
    if let Some(bitmap) = map.get_mut(key) {
        bitmap.remove(slot);
        if bitmap.is_empty() {
            map.remove(key);
        }
    }
}

fn purge_map<K>(map: &mut FxHashMap<K, RoaringBitmap>, dead: &RoaringBitmap) {
    map.retain(|_, bitmap| {
        *bitmap -= dead;
        !bitmap.is_empty()
    });
}

/// Per-column bitmap statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Distinct (byte, position) entries in the forward family.
    pub forward_entries: usize,
    /// Distinct (byte, position) entries in the backward family.
    pub backward_entries: usize,
    /// Distinct entries in the case-folded forward family.
    pub folded_forward_entries: usize,
    /// Distinct entries in the case-folded backward family.
    pub folded_backward_entries: usize,
    /// Number of distinct value lengths currently indexed.
    pub distinct_lengths: usize,
    /// Longest value ever indexed in this column.
    pub max_length: usize,
    /// Estimated memory usage in bytes.
    pub memory_bytes: usize,
}

/// Positional bitmap store for one column.
///
/// Holds live and tombstoned slots alike; filtering tombstones is the
/// caller's job until [`purge`](Self::purge) subtracts them.
#[derive(Debug, Default, Clone)]
pub struct PositionalBitmapStore {
    exact: CaseView,
    folded: CaseView,
    /// `len_eq[n]`: slots whose value has exactly `n` bytes.
    len_eq: Vec<RoaringBitmap>,
    /// `len_ge[n]`: slots whose value has at least `n` bytes.
    len_ge: Vec<RoaringBitmap>,
}

impl PositionalBitmapStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes `value` under `slot`.
    ///
    /// # Errors
    ///
    /// Returns `ResourceExhausted` if the value is longer than the signed
    /// 32-bit position space or the length tables cannot grow. Nothing is
    /// modified in that case.
    pub fn insert(&mut self, slot: u32, value: &[u8]) -> Result<()> {
        let len = i32::try_from(value.len()).map_err(|_| {
            Error::ResourceExhausted(format!(
                "value of {} bytes exceeds the positional range",
                value.len()
            ))
        })?;
        self.grow_lengths(value.len())?;

        for (i, &byte) in value.iter().enumerate() {
            // Bounded by `len`, which fits in i32.
            let pos = i as i32;
            let neg = pos - len;
            self.exact.insert(slot, byte, pos, neg);
            self.folded.insert(slot, byte.to_ascii_lowercase(), pos, neg);
        }

        self.len_eq[value.len()].insert(slot);
        for bitmap in &mut self.len_ge[..=value.len()] {
            bitmap.insert(slot);
        }
        Ok(())
    }

    /// Removes `slot` from every entry `value` contributed to.
    ///
    /// Inverse of [`insert`](Self::insert). Entries left empty are dropped.
    pub fn remove(&mut self, slot: u32, value: &[u8]) {
        let Ok(len) = i32::try_from(value.len()) else {
            return;
        };
        for (i, &byte) in value.iter().enumerate() {
            let pos = i as i32;
            let neg = pos - len;
            self.exact.remove(slot, byte, pos, neg);
            self.folded.remove(slot, byte.to_ascii_lowercase(), pos, neg);
        }
        if let Some(bitmap) = self.len_eq.get_mut(value.len()) {
            bitmap.remove(slot);
        }
        for bitmap in self.len_ge.iter_mut().take(value.len() + 1) {
            bitmap.remove(slot);
        }
    }

    /// Subtracts `dead` from every entry of every family.
    ///
    /// O(number of distinct entries); run in batches, not per delete.
    pub fn purge(&mut self, dead: &RoaringBitmap) {
        if dead.is_empty() {
            return;
        }
        self.exact.purge(dead);
        self.folded.purge(dead);
        for bitmap in self.len_eq.iter_mut().chain(self.len_ge.iter_mut()) {
            *bitmap -= dead;
        }
    }

    fn grow_lengths(&mut self, len: usize) -> Result<()> {
        if self.len_eq.len() > len {
            return Ok(());
        }
        let additional = len + 1 - self.len_eq.len();
        self.len_eq
            .try_reserve(additional)
            .and_then(|()| self.len_ge.try_reserve(additional))
            .map_err(|e| Error::ResourceExhausted(format!("length table growth: {e}")))?;
        self.len_eq.resize_with(len + 1, RoaringBitmap::new);
        self.len_ge.resize_with(len + 1, RoaringBitmap::new);
        Ok(())
    }

    fn view(&self, mode: CaseMode) -> &CaseView {
        match mode {
            CaseMode::Sensitive => &self.exact,
            CaseMode::Folded => &self.folded,
        }
    }

    /// Slots with `byte` at 0-based position `pos`.
    #[inline]
    #[must_use]
    pub fn forward(&self, mode: CaseMode, byte: u8, pos: usize) -> Option<&RoaringBitmap> {
        let pos = i32::try_from(pos).ok()?;
        self.view(mode).forward.get(&(byte, pos))
    }

    /// Slots with `byte` at negative position `neg` (`-1` = last byte).
    #[inline]
    #[must_use]
    pub fn backward(&self, mode: CaseMode, byte: u8, neg: i32) -> Option<&RoaringBitmap> {
        self.view(mode).backward.get(&(byte, neg))
    }

    /// Slots whose value contains `byte` anywhere.
    #[inline]
    #[must_use]
    pub fn presence(&self, mode: CaseMode, byte: u8) -> Option<&RoaringBitmap> {
        self.view(mode).presence.get(&byte)
    }

    /// Slots whose value is exactly `n` bytes long.
    #[inline]
    #[must_use]
    pub fn len_eq(&self, n: usize) -> Option<&RoaringBitmap> {
        self.len_eq.get(n)
    }

    /// Slots whose value is at least `n` bytes long.
    #[inline]
    #[must_use]
    pub fn len_ge(&self, n: usize) -> Option<&RoaringBitmap> {
        self.len_ge.get(n)
    }

    /// Longest value ever indexed (0 for an empty store).
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.len_ge.len().saturating_sub(1)
    }

    /// Every slot present in the store, including tombstoned ones.
    #[must_use]
    pub fn indexed(&self) -> RoaringBitmap {
        self.len_ge.first().cloned().unwrap_or_default()
    }

    /// Returns true if `slot` is referenced by the store.
    #[must_use]
    pub fn references(&self, slot: u32) -> bool {
        self.len_ge.first().is_some_and(|b| b.contains(slot))
    }

    /// Estimated memory usage in bytes.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        let lengths: usize = self
            .len_eq
            .iter()
            .chain(self.len_ge.iter())
            .map(RoaringBitmap::serialized_size)
            .sum();
        self.exact.memory_bytes() + self.folded.memory_bytes() + lengths
    }

    /// Per-column statistics.
    #[must_use]
    pub fn stats(&self) -> ColumnStats {
        ColumnStats {
            forward_entries: self.exact.forward.len(),
            backward_entries: self.exact.backward.len(),
            folded_forward_entries: self.folded.forward.len(),
            folded_backward_entries: self.folded.backward.len(),
            distinct_lengths: self.len_eq.iter().filter(|b| !b.is_empty()).count(),
            max_length: self.max_len(),
            memory_bytes: self.memory_bytes(),
        }
    }
}
