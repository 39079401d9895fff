//! Wildcard pattern compiler for LIKE / ILIKE.
//!
//! A pattern is scanned left to right into an ordered list of [`Segment`]s:
//! literal byte runs and gaps. A gap collects a run of `_` and `%`:
//! `min` is the number of `_`, and `max` is unbounded as soon as the run
//! contains a `%` (otherwise `max == min`).
//!
//! Backslash escapes the next byte (`\%`, `\_`, `\\`). A trailing lone
//! backslash is rejected.
//!
//! Matching is byte-wise: `_` consumes exactly one byte, so a multi-byte
//! UTF-8 character spans several positions.
//!
//! # Example
//!
//! ```
//! use posindex_core::pattern::{compile, PatternShape, Segment};
//!
//! let p = compile("ab%_c", true).unwrap();
//! assert_eq!(p.shape(), PatternShape::Complex);
//! assert_eq!(
//!     p.segments(),
//!     &[
//!         Segment::Literal(b"ab".to_vec()),
//!         Segment::Gap { min: 1, max: None },
//!         Segment::Literal(b"c".to_vec()),
//!     ]
//! );
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One element of a compiled pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Bytes that must appear verbatim (already case-folded for ILIKE).
    Literal(Vec<u8>),
    /// Between `min` and `max` arbitrary bytes; `max = None` is unbounded.
    Gap {
        /// Number of `_` in the run.
        min: usize,
        /// `Some(min)` for `_`-only runs, `None` once a `%` is present.
        max: Option<usize>,
    },
}

impl Segment {
    /// Returns true for an unbounded gap.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        matches!(self, Self::Gap { max: None, .. })
    }
}

/// Coarse classification used for fast paths, planning and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternShape {
    /// `''`: matches only the empty string.
    Empty,
    /// `abc`: no wildcards.
    Exact,
    /// `abc%`
    Prefix,
    /// `%abc`
    Suffix,
    /// `%abc%`
    Substring,
    /// Wildcards only: `%`, `___`, `%___`.
    PureLength,
    /// `abc%def`
    Infix,
    /// Anything else (mixed `_`, several `%`-separated parts).
    Complex,
}

impl PatternShape {
    /// Lowercase name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Substring => "substring",
            Self::PureLength => "pure_length",
            Self::Infix => "infix",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for PatternShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable result of [`compile`]. Recomputed per query, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: String,
    segments: Vec<Segment>,
    anchored_start: bool,
    anchored_end: bool,
    case_sensitive: bool,
    shape: PatternShape,
}

/// Compiles a LIKE (`case_sensitive = true`) or ILIKE pattern.
///
/// For ILIKE the literal bytes are ASCII-lowercased here so the matcher can
/// read the case-folded bitmap families directly.
///
/// # Errors
///
/// Returns `InvalidPattern` if the pattern ends with an unpaired backslash.
pub fn compile(pattern: &str, case_sensitive: bool) -> Result<CompiledPattern> {
    let bytes = pattern.as_bytes();
    let mut segments: Vec<Segment> = Vec::new();
    let mut literal: Vec<u8> = Vec::new();

    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        match byte {
            b'%' | b'_' => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                push_wildcard(&mut segments, byte == b'%');
            }
            b'\\' => {
                let Some(&escaped) = bytes.get(i + 1) else {
                    return Err(Error::invalid_pattern(
                        pattern,
                        "pattern must not end with the escape character",
                    ));
                };
                literal.push(fold(escaped, case_sensitive));
                i += 1;
            }
            _ => literal.push(fold(byte, case_sensitive)),
        }
        i += 1;
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    let anchored_start = !bytes.starts_with(b"%");
    let anchored_end = !ends_with_unescaped_percent(bytes);
    let shape = classify(&segments);

    Ok(CompiledPattern {
        source: pattern.to_string(),
        segments,
        anchored_start,
        anchored_end,
        case_sensitive,
        shape,
    })
}

#[inline]
fn fold(byte: u8, case_sensitive: bool) -> u8 {
    if case_sensitive {
        byte
    } else {
        byte.to_ascii_lowercase()
    }
}

/// Extends the trailing gap, or opens a new one.
fn push_wildcard(segments: &mut Vec<Segment>, unbounded: bool) {
    if let Some(Segment::Gap { min, max }) = segments.last_mut() {
        if unbounded {
            *max = None;
        } else {
            *min += 1;
            if let Some(m) = max {
                *m += 1;
            }
        }
        return;
    }
    segments.push(if unbounded {
        Segment::Gap { min: 0, max: None }
    } else {
        Segment::Gap {
            min: 1,
            max: Some(1),
        }
    });
}

fn ends_with_unescaped_percent(bytes: &[u8]) -> bool {
    if !bytes.ends_with(b"%") {
        return false;
    }
    // `\%` is a literal unless the backslash is itself escaped.
    let backslashes = bytes[..bytes.len() - 1]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    backslashes % 2 == 0
}

fn is_any(segment: &Segment) -> bool {
    matches!(segment, Segment::Gap { min: 0, max: None })
}

fn classify(segments: &[Segment]) -> PatternShape {
    use Segment::{Gap, Literal};
    match segments {
        [] => PatternShape::Empty,
        [Gap { .. }] => PatternShape::PureLength,
        [Literal(_)] => PatternShape::Exact,
        [Literal(_), any] if is_any(any) => PatternShape::Prefix,
        [any, Literal(_)] if is_any(any) => PatternShape::Suffix,
        [a, Literal(_), b] if is_any(a) && is_any(b) => PatternShape::Substring,
        [Literal(_), any, Literal(_)] if is_any(any) => PatternShape::Infix,
        _ => PatternShape::Complex,
    }
}

impl CompiledPattern {
    /// The pattern text as given.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Ordered literal and gap segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True unless the pattern begins with `%`.
    #[must_use]
    pub const fn anchored_start(&self) -> bool {
        self.anchored_start
    }

    /// True unless the pattern ends with an unescaped `%`.
    #[must_use]
    pub const fn anchored_end(&self) -> bool {
        self.anchored_end
    }

    /// LIKE (`true`) or ILIKE (`false`).
    #[must_use]
    pub const fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Shape classification.
    #[must_use]
    pub const fn shape(&self) -> PatternShape {
        self.shape
    }

    /// Total number of literal bytes.
    #[must_use]
    pub fn concrete_chars(&self) -> usize {
        self.literals().map(<[u8]>::len).sum()
    }

    /// Total number of `_` wildcards.
    #[must_use]
    pub fn underscore_count(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Gap { min, .. } => *min,
                Segment::Literal(_) => 0,
            })
            .sum()
    }

    /// Number of literal segments.
    #[must_use]
    pub fn literal_count(&self) -> usize {
        self.literals().count()
    }

    /// Number of anchored ends: 0, 1 or 2.
    #[must_use]
    pub fn anchor_strength(&self) -> u8 {
        u8::from(self.anchored_start) + u8::from(self.anchored_end)
    }

    /// Shortest value length that can match.
    #[must_use]
    pub fn min_len(&self) -> usize {
        self.concrete_chars() + self.underscore_count()
    }

    /// Returns true if the pattern contains an unbounded gap.
    #[must_use]
    pub fn has_unbounded_gap(&self) -> bool {
        self.segments.iter().any(Segment::is_unbounded)
    }

    /// Iterates the literal segments in order.
    pub fn literals(&self) -> impl Iterator<Item = &[u8]> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Literal(bytes) => Some(bytes.as_slice()),
            Segment::Gap { .. } => None,
        })
    }
}

impl fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.case_sensitive { "LIKE" } else { "ILIKE" };
        write!(f, "{op} '{}' ({})", self.source, self.shape)
    }
}
