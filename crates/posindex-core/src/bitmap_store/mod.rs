//! Positional bitmap store for one indexed column.
//!
//! For every byte `c` and position `p` the store keeps the set of slots whose
//! value has `c` at `p`, using Roaring Bitmaps:
//!
//! - `forward[(c, p)]`: `p` counted from the start, 0-based
//! - `backward[(c, -k)]`: counted from the end, `-1` is the last byte
//! - case-folded twins of both, built from the ASCII-lowercased value
//! - `presence[c]`: slots whose value contains `c` anywhere
//! - `len_eq[n]` / `len_ge[n]`: exact length and minimum length
//!
//! Entries are created lazily, so there is no cap on value length beyond the
//! `i32` position space.
//!
//! # Example
//!
//! ```
//! use posindex_core::bitmap_store::{CaseMode, PositionalBitmapStore};
//!
//! let mut store = PositionalBitmapStore::new();
//! store.insert(0, b"hello").unwrap();
//! store.insert(1, b"help").unwrap();
//!
//! let l_at_2 = store.forward(CaseMode::Sensitive, b'l', 2).unwrap();
//! assert_eq!(l_at_2.len(), 2);
//! let o_last = store.backward(CaseMode::Sensitive, b'o', -1).unwrap();
//! assert!(o_last.contains(0) && !o_last.contains(1));
//! ```

mod store;

pub use store::{CaseMode, ColumnStats, PositionalBitmapStore};
