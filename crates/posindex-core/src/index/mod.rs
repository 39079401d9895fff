//! The pattern index: maintenance, queries and statistics for N columns.
//!
//! [`PatternIndex`] owns one [`PositionalBitmapStore`] per indexed column
//! plus the [`SlotTable`]. Writes go through `&mut self` and reads borrow
//! `&self`, so the host's serialization of writes against reads is enforced
//! by the borrow checker rather than by locks.
//!
//! # Example
//!
//! ```
//! use posindex_core::{Locator, MaterializeOptions, PatternIndex, Predicate};
//!
//! let mut index = PatternIndex::new(1);
//! index.insert(Locator::new(0, 1), &["hello"]).unwrap();
//! index.insert(Locator::new(0, 2), &["world"]).unwrap();
//! index.insert(Locator::new(0, 3), &["test"]).unwrap();
//!
//! let hits: Vec<Locator> = index
//!     .query(&[Predicate::like(0, "%ell%")], MaterializeOptions::unordered())
//!     .unwrap()
//!     .collect();
//! assert_eq!(hits, vec![Locator::new(0, 1)]);
//! ```

mod crud;
mod query;
mod stats;

#[cfg(test)]
mod tests;

pub use stats::{CrudCounters, IndexStats};

use crate::bitmap_store::PositionalBitmapStore;
use crate::config::IndexConfig;
use crate::error::{Error, Result};
use crate::locator::{Locator, RecordHandle};
use crate::slot_table::SlotTable;

/// Exact LIKE/ILIKE index over a fixed number of string columns.
#[derive(Debug, Clone)]
pub struct PatternIndex {
    config: IndexConfig,
    columns: Vec<PositionalBitmapStore>,
    slots: SlotTable,
    counters: CrudCounters,
    /// Set while a purge is in flight; left set if it did not complete.
    poisoned: Option<String>,
}

impl PatternIndex {
    /// Creates an empty index with default configuration.
    #[must_use]
    pub fn new(column_count: usize) -> Self {
        Self {
            config: IndexConfig::default(),
            columns: vec![PositionalBitmapStore::new(); column_count],
            slots: SlotTable::new(),
            counters: CrudCounters::default(),
            poisoned: None,
        }
    }

    /// Creates an empty index with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the configuration fails validation.
    pub fn with_config(column_count: usize, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new(column_count)
        })
    }

    /// Number of indexed columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.slots.live_count()
    }

    /// Returns true if no record is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.live_count() == 0
    }

    /// Returns true if `handle` refers to a live record.
    #[must_use]
    pub fn contains(&self, handle: RecordHandle) -> bool {
        self.slots.is_live(handle.slot())
    }

    /// Locator of a live record.
    #[must_use]
    pub fn locator(&self, handle: RecordHandle) -> Option<Locator> {
        if self.contains(handle) {
            self.slots.locator(handle.slot())
        } else {
            None
        }
    }

    /// Returns true if a purge did not complete and the index must be rebuilt.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    fn ensure_consistent(&self) -> Result<()> {
        match &self.poisoned {
            None => Ok(()),
            Some(reason) => {
                tracing::error!(reason = %reason, "Index is poisoned; rebuild required");
                Err(Error::InconsistentState(reason.clone()))
            }
        }
    }

    fn check_arity(&self, actual: usize) -> Result<()> {
        if actual == self.columns.len() {
            Ok(())
        } else {
            Err(Error::ColumnCountMismatch {
                expected: self.columns.len(),
                actual,
            })
        }
    }

    #[cfg(test)]
    pub(crate) fn poison(&mut self, reason: &str) {
        self.poisoned = Some(reason.to_string());
    }
}
