//! Result materialization: candidate slots → physical locators.
//!
//! Three strategies, picked per query:
//!
//! - **Unordered**: walk the bitmap lazily and resolve each slot on demand;
//!   a limit stops the walk early.
//! - **Ordered, small**: collect, then comparison sort.
//! - **Ordered, large** (`>= sort_threshold`): collect, then LSD radix sort
//!   by (block, offset) so the host reads its heap sequentially.
//!
//! With the `parallel` feature, collection of large result sets is split
//! into disjoint slot ranges resolved on rayon workers and concatenated in
//! range order.

use crate::config::MaterializeConfig;
use crate::locator::Locator;
use crate::slot_table::SlotTable;
use roaring::RoaringBitmap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Result sets below this size use two workers.
#[cfg(feature = "parallel")]
const SMALL_PARALLEL_RESULT: u64 = 100_000;

/// How the host will consume the results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeOptions {
    /// Sort by locator for sequential heap access.
    pub needs_order: bool,
    /// Stop after this many locators.
    pub limit: Option<usize>,
}

impl MaterializeOptions {
    /// Sorted output, no limit.
    #[must_use]
    pub const fn ordered() -> Self {
        Self {
            needs_order: true,
            limit: None,
        }
    }

    /// Bitmap order, no limit.
    #[must_use]
    pub const fn unordered() -> Self {
        Self {
            needs_order: false,
            limit: None,
        }
    }

    /// Builder: cap the number of results.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Lazy, finite, non-restartable sequence of locators.
///
/// Borrows the index, so no write can happen while it is alive: a recycled
/// slot is never observed with its new value.
pub struct QueryResults<'a> {
    inner: Inner<'a>,
}

enum Inner<'a> {
    Lazy {
        slots: roaring::bitmap::IntoIter,
        table: &'a SlotTable,
        remaining: usize,
    },
    Sorted(std::vec::IntoIter<Locator>),
}

impl Iterator for QueryResults<'_> {
    type Item = Locator;

    fn next(&mut self) -> Option<Locator> {
        match &mut self.inner {
            Inner::Lazy {
                slots,
                table,
                remaining,
            } => {
                if *remaining == 0 {
                    return None;
                }
                let locator = slots.find_map(|slot| table.locator(slot))?;
                *remaining -= 1;
                Some(locator)
            }
            Inner::Sorted(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Inner::Lazy {
                slots, remaining, ..
            } => {
                let (lower, upper) = slots.size_hint();
                let upper = upper.map_or(*remaining, |u| u.min(*remaining));
                (lower.min(*remaining), Some(upper))
            }
            Inner::Sorted(iter) => iter.size_hint(),
        }
    }
}

/// Turns `candidates` into locators according to `options`.
#[must_use]
pub fn materialize<'a>(
    candidates: RoaringBitmap,
    table: &'a SlotTable,
    options: MaterializeOptions,
    config: &MaterializeConfig,
) -> QueryResults<'a> {
    if !options.needs_order {
        return QueryResults {
            inner: Inner::Lazy {
                slots: candidates.into_iter(),
                table,
                remaining: options.limit.unwrap_or(usize::MAX),
            },
        };
    }

    let mut locators = collect_locators(&candidates, table, config);
    sort_locators(&mut locators, config.sort_threshold);
    if let Some(limit) = options.limit {
        locators.truncate(limit);
    }
    QueryResults {
        inner: Inner::Sorted(locators.into_iter()),
    }
}

/// Resolves every candidate slot, in slot order.
#[must_use]
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
pub fn collect_locators(
    candidates: &RoaringBitmap,
    table: &SlotTable,
    config: &MaterializeConfig,
) -> Vec<Locator> {
    #[cfg(feature = "parallel")]
    if candidates.len() >= config.parallel_threshold as u64 {
        let workers = if candidates.len() < SMALL_PARALLEL_RESULT {
            2
        } else {
            config.max_workers
        };
        return collect_parallel(candidates, table, workers);
    }

    candidates
        .iter()
        .filter_map(|slot| table.locator(slot))
        .collect()
}

#[cfg(feature = "parallel")]
fn collect_parallel(candidates: &RoaringBitmap, table: &SlotTable, workers: usize) -> Vec<Locator> {
    let (Some(lo), Some(hi)) = (candidates.min(), candidates.max()) else {
        return Vec::new();
    };
    let workers = workers.max(1) as u64;
    let span = u64::from(hi) - u64::from(lo) + 1;
    let step = span.div_ceil(workers);

    let shards: Vec<RoaringBitmap> = (0..workers)
        .filter_map(|w| {
            let start = u64::from(lo) + w * step;
            let end = (start + step).min(u64::from(hi) + 1);
            if start >= end {
                return None;
            }
            let mut shard = RoaringBitmap::new();
            // end - 1 <= hi, so both casts are lossless.
            shard.insert_range(start as u32..=(end - 1) as u32);
            shard &= candidates;
            Some(shard)
        })
        .collect();

    let parts: Vec<Vec<Locator>> = shards
        .par_iter()
        .map(|shard| shard.iter().filter_map(|slot| table.locator(slot)).collect())
        .collect();

    let mut locators = Vec::with_capacity(candidates.len() as usize);
    for part in parts {
        locators.extend(part);
    }
    locators
}

/// Sorts by (block, offset): radix sort from `threshold` on, comparison sort below.
pub fn sort_locators(locators: &mut Vec<Locator>, threshold: usize) {
    if locators.len() >= threshold {
        radix_sort(locators);
    } else {
        locators.sort_unstable();
    }
}

/// Stable LSD radix sort: two 8-bit passes over the offset, then four over
/// the block number. No assumption on key density or range.
pub fn radix_sort(locators: &mut Vec<Locator>) {
    if locators.len() < 2 {
        return;
    }
    let mut scratch = vec![Locator::default(); locators.len()];

    radix_pass(locators, &mut scratch, |l| (l.offset & 0xFF) as usize);
    radix_pass(locators, &mut scratch, |l| (l.offset >> 8) as usize);
    for shift in [0_u32, 8, 16, 24] {
        radix_pass(locators, &mut scratch, |l| ((l.block >> shift) & 0xFF) as usize);
    }
}

/// One counting-sort pass from `src` into `dst`, then swap.
fn radix_pass(src: &mut Vec<Locator>, dst: &mut Vec<Locator>, digit: impl Fn(&Locator) -> usize) {
    let mut counts = [0_usize; 256];
    for locator in src.iter() {
        counts[digit(locator)] += 1;
    }
    if counts.iter().any(|&c| c == src.len()) {
        // Every key shares this digit.
        return;
    }

    let mut offsets = [0_usize; 256];
    let mut total = 0;
    for (offset, count) in offsets.iter_mut().zip(counts) {
        *offset = total;
        total += count;
    }
    for locator in src.iter() {
        let d = digit(locator);
        dst[offsets[d]] = *locator;
        offsets[d] += 1;
    }
    std::mem::swap(src, dst);
}
