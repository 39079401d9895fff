//! # `PosIndex` Core
//!
//! Exact secondary index for `LIKE` / `ILIKE` predicates over string columns.
//!
//! For every byte `c` and position `p` the index keeps a Roaring Bitmap of
//! the records holding `c` at `p`, counted from the start and from the end,
//! plus ASCII case-folded twins and length bitmaps. Wildcard patterns are
//! answered by combining these bitmaps, with no false positives and no
//! recheck of the stored values.
//!
//! ## Features
//!
//! - **Exact**: prefix, suffix, substring, `_` spacing and any mix of them
//! - **Multi-column**: predicates ordered by estimated selectivity, with
//!   early exit on an empty candidate set
//! - **O(1) deletes**: tombstones purged in batches, slots recycled
//! - **Sequential heap access**: results radix-sorted by physical locator
//!
//! ## Quick Start
//!
//! ```rust
//! use posindex_core::{Locator, MaterializeOptions, PatternIndex, Predicate};
//!
//! // Two indexed columns: name, city
//! let mut index = PatternIndex::new(2);
//! index.insert(Locator::new(1, 1), &["alice", "Paris"])?;
//! index.insert(Locator::new(1, 2), &["bob", "Berlin"])?;
//! let carol = index.insert(Locator::new(2, 1), &["carol", "paris"])?;
//!
//! let hits: Vec<Locator> = index
//!     .query(
//!         &[Predicate::ilike(1, "paris"), Predicate::not_like(0, "a%")],
//!         MaterializeOptions::ordered(),
//!     )?
//!     .collect();
//! assert_eq!(hits, vec![Locator::new(2, 1)]);
//!
//! index.delete(carol)?;
//! assert_eq!(index.count(&[Predicate::ilike(1, "paris")])?, 1);
//! # Ok::<(), posindex_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// =============================================================================
// NUMERIC CAST LINTS
// =============================================================================
// Positions are bounded by i32 on insert and slots by u32 on allocate; the
// remaining `as` casts convert between those checked ranges.
// For new code: Use try_from() or explicit bounds checks instead of `as`.
// =============================================================================
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
// =============================================================================
// STYLISTIC LINTS - Safe to allow globally (no bug risk)
// =============================================================================
#![allow(clippy::option_if_let_else)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::if_not_else)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::single_match_else)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::ptr_arg)]

pub mod bitmap_store;
pub mod config;
pub mod error;
#[cfg(test)]
mod error_tests;
pub mod index;
pub mod locator;
pub mod matcher;
pub mod materialize;
pub mod pattern;
pub mod planner;
pub mod slot_table;

pub use bitmap_store::{CaseMode, ColumnStats, PositionalBitmapStore};
pub use config::{
    ConfigError, IndexConfig, LoggingConfig, MaintenanceConfig, MaterializeConfig, PlannerConfig,
};
pub use error::{Error, Result};
pub use index::{CrudCounters, IndexStats, PatternIndex};
pub use locator::{Locator, RecordHandle};
pub use materialize::{MaterializeOptions, QueryResults};
pub use pattern::{compile, CompiledPattern, PatternShape, Segment};
pub use planner::{LikeOp, Predicate, QueryPlan, QueryPlanner};
