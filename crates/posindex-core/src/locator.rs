//! Physical record locators and record handles.
//!
//! A [`Locator`] is the host's address for a stored row: a 32-bit block
//! number plus an offset inside that block. The index never interprets it
//! beyond ordering (block first, then offset), which is what turns random
//! heap access into sequential access after sorting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host-supplied physical address of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Locator {
    /// Block (page) number.
    pub block: u32,
    /// Item offset within the block.
    pub offset: u16,
}

impl Locator {
    /// Creates a locator from its block and offset components.
    #[must_use]
    pub const fn new(block: u32, offset: u16) -> Self {
        Self { block, offset }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.block, self.offset)
    }
}

/// Dense slot identifier returned by insert/update.
///
/// Stable until the record is deleted and the slot is recycled by a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordHandle(pub(crate) u32);

impl RecordHandle {
    /// Returns the raw slot number.
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.0
    }

    /// Wraps a raw slot number, e.g. one the host persisted earlier.
    #[must_use]
    pub const fn from_slot(slot: u32) -> Self {
        Self(slot)
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
