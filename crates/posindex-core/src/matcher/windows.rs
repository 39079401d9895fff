//! General multi-segment evaluation.
//!
//! The compiled segments are regrouped into fixed-width *windows*: a window
//! is a maximal run of literals and `_`-only gaps, so every byte in it sits
//! at a known offset from the window start. Windows are separated by
//! unbounded gaps with a minimum width, and the pattern as a whole has a
//! leading and a trailing [`Slack`].
//!
//! Evaluation walks the windows left to right. For window `i` it records,
//! per end offset `e`, the slots whose *earliest* valid placement of windows
//! `0..=i` ends at `e`. Keeping only the earliest end is exact: a later
//! window can be placed after window `i` iff it fits after its earliest end.
//! The search is a loop over windows and start offsets with no recursion.

use super::Lookup;
use roaring::RoaringBitmap;

/// Slack before the first window or after the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slack {
    /// Exactly zero bytes (anchored).
    Tight,
    /// Any number of bytes, at least the given minimum.
    AtLeast(usize),
}

/// A fixed-width run of concrete bytes and single-byte wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Window {
    /// (offset within the window, byte) for every concrete byte.
    pub chars: Vec<(usize, u8)>,
    pub width: usize,
}

/// Segments regrouped for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub lead: Slack,
    pub windows: Vec<Window>,
    /// `gaps[i]` is the minimum distance between window `i` and `i + 1`.
    pub gaps: Vec<usize>,
    pub trail: Slack,
}

impl Layout {
    pub(crate) fn from_segments(segments: &[crate::pattern::Segment]) -> Self {
        use crate::pattern::Segment;

        let mut lead = Slack::Tight;
        let mut windows = Vec::new();
        let mut gaps = Vec::new();
        let mut current = Window::default();
        let mut open = false;
        let mut pending = Slack::Tight;

        for segment in segments {
            match segment {
                Segment::Literal(bytes) => {
                    for &byte in bytes {
                        current.chars.push((current.width, byte));
                        current.width += 1;
                    }
                    open = true;
                }
                Segment::Gap { min, max: Some(_) } => {
                    current.width += min;
                    open = true;
                }
                Segment::Gap { min, max: None } => {
                    if open {
                        close(&mut windows, &mut gaps, &mut lead, pending, &mut current);
                        open = false;
                        pending = Slack::AtLeast(*min);
                    } else {
                        pending = match pending {
                            Slack::Tight => Slack::AtLeast(*min),
                            Slack::AtLeast(m) => Slack::AtLeast(m + min),
                        };
                    }
                }
            }
        }
        if open {
            close(&mut windows, &mut gaps, &mut lead, pending, &mut current);
            pending = Slack::Tight;
        }

        Self {
            lead,
            windows,
            gaps,
            trail: pending,
        }
    }

    /// Concrete bytes across all windows.
    pub(crate) fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        self.windows
            .iter()
            .flat_map(|w| w.chars.iter().map(|&(_, b)| b))
    }
}

fn close(
    windows: &mut Vec<Window>,
    gaps: &mut Vec<usize>,
    lead: &mut Slack,
    before: Slack,
    current: &mut Window,
) {
    if windows.is_empty() {
        *lead = before;
    } else if let Slack::AtLeast(min) = before {
        gaps.push(min);
    }
    windows.push(std::mem::take(current));
}

/// Slots reached, keyed by the ascending end offset of the last placed window.
type Frontier = Vec<(usize, RoaringBitmap)>;

/// Evaluates `layout` over `base`, a superset of the possible matches.
pub(crate) fn evaluate(layout: &Layout, lookup: &Lookup<'_>, base: &RoaringBitmap) -> RoaringBitmap {
    let Some((last, init)) = layout.windows.split_last() else {
        return pure_length(layout, lookup, base);
    };

    let mut frontier: Option<Frontier> = None;
    for (i, window) in init.iter().enumerate() {
        let next = match &frontier {
            None => first_window(layout.lead, window, lookup, base),
            Some(prev) => next_window(prev, layout.gaps[i - 1], window, lookup),
        };
        if next.is_empty() {
            return RoaringBitmap::new();
        }
        frontier = Some(next);
    }

    match layout.trail {
        Slack::Tight => anchored_last(layout, frontier.as_ref(), last, lookup, base),
        Slack::AtLeast(min) => {
            let ends = match &frontier {
                None => first_window(layout.lead, last, lookup, base),
                Some(prev) => next_window(prev, layout.gaps[layout.gaps.len() - 1], last, lookup),
            };
            let mut result = RoaringBitmap::new();
            for (end, slots) in ends {
                if min == 0 {
                    result |= slots;
                } else if let Some(fits) = lookup.len_ge(end + min) {
                    result |= &slots & fits;
                }
            }
            result
        }
    }
}

/// No windows: the trailing slack is the whole pattern.
fn pure_length(layout: &Layout, lookup: &Lookup<'_>, base: &RoaringBitmap) -> RoaringBitmap {
    let lengths = match layout.trail {
        Slack::Tight => lookup.len_eq(0),
        Slack::AtLeast(min) => lookup.len_ge(min),
    };
    lengths.map(|b| b & base).unwrap_or_default()
}

/// Slots where `window` occurs at start offset `start`, restricted to `base`.
fn window_at(window: &Window, start: usize, lookup: &Lookup<'_>, base: &RoaringBitmap) -> RoaringBitmap {
    let Some(fits) = lookup.len_ge(start + window.width) else {
        return RoaringBitmap::new();
    };
    let mut hit = base & fits;
    for &(offset, byte) in &window.chars {
        if hit.is_empty() {
            break;
        }
        match lookup.forward(byte, start + offset) {
            Some(bitmap) => hit &= bitmap,
            None => return RoaringBitmap::new(),
        }
    }
    hit
}

fn last_start(window: &Window, lookup: &Lookup<'_>) -> Option<usize> {
    lookup.max_len().checked_sub(window.width)
}

fn first_window(lead: Slack, window: &Window, lookup: &Lookup<'_>, base: &RoaringBitmap) -> Frontier {
    let mut frontier = Frontier::new();
    let Some(max_start) = last_start(window, lookup) else {
        return frontier;
    };
    match lead {
        Slack::Tight => {
            let hit = window_at(window, 0, lookup, base);
            if !hit.is_empty() {
                frontier.push((window.width, hit));
            }
        }
        Slack::AtLeast(min) => {
            let mut seen = RoaringBitmap::new();
            for start in min..=max_start {
                let mut hit = window_at(window, start, lookup, base);
                hit -= &seen;
                if hit.is_empty() {
                    continue;
                }
                seen |= &hit;
                frontier.push((start + window.width, hit));
                if seen.len() == base.len() {
                    break;
                }
            }
        }
    }
    frontier
}

fn next_window(prev: &Frontier, gap: usize, window: &Window, lookup: &Lookup<'_>) -> Frontier {
    let mut frontier = Frontier::new();
    let (Some(max_start), Some((first_end, _))) = (last_start(window, lookup), prev.first()) else {
        return frontier;
    };
    let total: u64 = prev.iter().map(|(_, slots)| slots.len()).sum();

    let mut reachable = RoaringBitmap::new();
    let mut pending = prev.iter().peekable();
    let mut seen = RoaringBitmap::new();
    for start in (first_end + gap)..=max_start {
        while let Some((_, slots)) = pending.next_if(|(end, _)| end + gap <= start) {
            reachable |= slots;
        }
        let mut hit = window_at(window, start, lookup, &reachable);
        hit -= &seen;
        if hit.is_empty() {
            continue;
        }
        seen |= &hit;
        frontier.push((start + window.width, hit));
        if seen.len() == total {
            break;
        }
    }
    frontier
}

/// Last window pinned to the end of the value, read from the backward family.
fn anchored_last(
    layout: &Layout,
    frontier: Option<&Frontier>,
    window: &Window,
    lookup: &Lookup<'_>,
    base: &RoaringBitmap,
) -> RoaringBitmap {
    let Some(mut tail) = lookup.len_ge(window.width).map(|b| b & base) else {
        return RoaringBitmap::new();
    };
    for &(offset, byte) in &window.chars {
        if tail.is_empty() {
            return tail;
        }
        let Ok(back) = i32::try_from(window.width - offset) else {
            return RoaringBitmap::new();
        };
        match lookup.backward(byte, -back) {
            Some(bitmap) => tail &= bitmap,
            None => return RoaringBitmap::new(),
        }
    }

    let Some(prev) = frontier else {
        // Single window: only the lead constrains where it starts.
        let fits = match layout.lead {
            Slack::Tight => lookup.len_eq(window.width),
            Slack::AtLeast(min) => lookup.len_ge(window.width + min),
        };
        return fits.map(|b| &tail & b).unwrap_or_default();
    };

    // A value of length `n` places the window at `n - width`; it must start
    // at least `gap` bytes after some earlier placement ends.
    let gap = layout.gaps[layout.gaps.len() - 1];
    let mut result = RoaringBitmap::new();
    let mut reachable = RoaringBitmap::new();
    let mut pending = prev.iter().peekable();
    for n in window.width..=lookup.max_len() {
        let start = n - window.width;
        while let Some((_, slots)) = pending.next_if(|(end, _)| end + gap <= start) {
            reachable |= slots & &tail;
        }
        if reachable.is_empty() {
            continue;
        }
        if let Some(exact) = lookup.len_eq(n) {
            result |= exact & &reachable;
        }
    }
    result
}
