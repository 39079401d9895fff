//! Exact pattern evaluation over a column's positional bitmaps.
//!
//! [`evaluate`] turns a [`CompiledPattern`] into the set of live slots whose
//! value matches it, with no false positives and no verification pass.
//! Common shapes take a direct bitmap path; everything else goes through the
//! windowed search in `windows`.
//!
//! | Shape        | Bitmaps read                                          |
//! |--------------|-------------------------------------------------------|
//! | `Empty`      | `len_eq[0]`                                           |
//! | `Exact`      | `fwd[c][i]` for each byte, `len_eq[n]`                |
//! | `Prefix`     | `fwd[c][i]` for each byte, `len_ge[n]`                |
//! | `Suffix`     | `bwd[c][i-n]` for each byte, `len_ge[n]`              |
//! | `Infix`      | prefix ∩ suffix ∩ `len_ge[a+b]`                       |
//! | `PureLength` | `len_eq[min]`, `len_ge[min]` or the live universe     |
//! | other        | windowed search, pruned by `presence` when floating  |

mod windows;


use crate::bitmap_store::{CaseMode, PositionalBitmapStore};
use crate::pattern::{CompiledPattern, PatternShape, Segment};
use roaring::RoaringBitmap;
use windows::{Layout, Slack};

/// Case-mode-bound view of one column's store.
pub(crate) struct Lookup<'a> {
    store: &'a PositionalBitmapStore,
    mode: CaseMode,
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(store: &'a PositionalBitmapStore, case_sensitive: bool) -> Self {
        let mode = if case_sensitive {
            CaseMode::Sensitive
        } else {
            CaseMode::Folded
        };
        Self { store, mode }
    }

    #[inline]
    fn forward(&self, byte: u8, pos: usize) -> Option<&'a RoaringBitmap> {
        self.store.forward(self.mode, byte, pos)
    }

    #[inline]
    fn backward(&self, byte: u8, neg: i32) -> Option<&'a RoaringBitmap> {
        self.store.backward(self.mode, byte, neg)
    }

    #[inline]
    fn presence(&self, byte: u8) -> Option<&'a RoaringBitmap> {
        self.store.presence(self.mode, byte)
    }

    #[inline]
    fn len_eq(&self, n: usize) -> Option<&'a RoaringBitmap> {
        self.store.len_eq(n)
    }

    #[inline]
    fn len_ge(&self, n: usize) -> Option<&'a RoaringBitmap> {
        self.store.len_ge(n)
    }

    #[inline]
    fn max_len(&self) -> usize {
        self.store.max_len()
    }
}

/// Evaluates `pattern` against `store`, restricted to `universe` (the live slots).
///
/// The result never contains a slot outside `universe`.
#[must_use]
pub fn evaluate(
    pattern: &CompiledPattern,
    store: &PositionalBitmapStore,
    universe: &RoaringBitmap,
) -> RoaringBitmap {
    let lookup = Lookup::new(store, pattern.case_sensitive());
    let segments = pattern.segments();

    let result = match (pattern.shape(), segments) {
        (PatternShape::Empty, _) => restrict(lookup.len_eq(0), universe),
        (PatternShape::PureLength, [Segment::Gap { min, max }]) => match max {
            Some(_) => restrict(lookup.len_eq(*min), universe),
            None if *min == 0 => universe.clone(),
            None => restrict(lookup.len_ge(*min), universe),
        },
        (PatternShape::Exact, [Segment::Literal(lit)]) => {
            anchored_front(&lookup, lit, lookup.len_eq(lit.len()), universe)
        }
        (PatternShape::Prefix, [Segment::Literal(lit), _]) => {
            anchored_front(&lookup, lit, lookup.len_ge(lit.len()), universe)
        }
        (PatternShape::Suffix, [_, Segment::Literal(lit)]) => anchored_back(&lookup, lit, universe),
        (PatternShape::Infix, [Segment::Literal(head), _, Segment::Literal(tail)]) => {
            infix(&lookup, head, tail, universe)
        }
        _ => general(&lookup, pattern, universe),
    };

    tracing::trace!(
        pattern = pattern.source(),
        shape = pattern.shape().as_str(),
        case_sensitive = pattern.case_sensitive(),
        matches = result.len(),
        "Pattern evaluated"
    );
    result
}

/// NOT LIKE / NOT ILIKE contribution of one predicate: `universe \ candidates`.
///
/// Applied per predicate, before intersecting with other predicates.
#[must_use]
pub fn negate(candidates: &RoaringBitmap, universe: &RoaringBitmap) -> RoaringBitmap {
    universe - candidates
}

fn restrict(bitmap: Option<&RoaringBitmap>, universe: &RoaringBitmap) -> RoaringBitmap {
    bitmap.map(|b| b & universe).unwrap_or_default()
}

/// `lit` at offset 0, intersected with a length constraint.
fn anchored_front(
    lookup: &Lookup<'_>,
    lit: &[u8],
    lengths: Option<&RoaringBitmap>,
    universe: &RoaringBitmap,
) -> RoaringBitmap {
    let mut result = restrict(lengths, universe);
    for (i, &byte) in lit.iter().enumerate() {
        if result.is_empty() {
            break;
        }
        match lookup.forward(byte, i) {
            Some(bitmap) => result &= bitmap,
            None => return RoaringBitmap::new(),
        }
    }
    result
}

/// `lit` ending at the last byte of the value.
fn anchored_back(lookup: &Lookup<'_>, lit: &[u8], universe: &RoaringBitmap) -> RoaringBitmap {
    let Ok(n) = i32::try_from(lit.len()) else {
        return RoaringBitmap::new();
    };
    let mut result = restrict(lookup.len_ge(lit.len()), universe);
    for (i, &byte) in (0_i32..).zip(lit) {
        if result.is_empty() {
            break;
        }
        match lookup.backward(byte, i - n) {
            Some(bitmap) => result &= bitmap,
            None => return RoaringBitmap::new(),
        }
    }
    result
}

/// `head%tail`: prefix and suffix must not overlap.
fn infix(lookup: &Lookup<'_>, head: &[u8], tail: &[u8], universe: &RoaringBitmap) -> RoaringBitmap {
    let fits = lookup.len_ge(head.len() + tail.len());
    let front = anchored_front(lookup, head, fits, universe);
    if front.is_empty() {
        return front;
    }
    anchored_back(lookup, tail, &front)
}

fn general(lookup: &Lookup<'_>, pattern: &CompiledPattern, universe: &RoaringBitmap) -> RoaringBitmap {
    let layout = Layout::from_segments(pattern.segments());

    // Every concrete byte has to occur somewhere; cheap to check first.
    let mut base = match layout.lead {
        Slack::Tight => universe.clone(),
        Slack::AtLeast(_) => {
            let mut base = universe.clone();
            let mut bytes: Vec<u8> = layout.bytes().collect();
            bytes.sort_unstable();
            bytes.dedup();
            for byte in bytes {
                match lookup.presence(byte) {
                    Some(bitmap) => base &= bitmap,
                    None => return RoaringBitmap::new(),
                }
                if base.is_empty() {
                    return base;
                }
            }
            base
        }
    };
    if let Some(fits) = lookup.len_ge(pattern.min_len()) {
        base &= fits;
    } else {
        return RoaringBitmap::new();
    }

    windows::evaluate(&layout, lookup, &base)
}
