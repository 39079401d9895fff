//! Error types for `PosIndex`.
//!
//! This module provides a unified error type for every index operation.
//! Recoverable errors (bad pattern, stale handle) leave the index untouched;
//! `InconsistentState` means the bitmaps can no longer be trusted.

use thiserror::Error;

/// Result type alias for `PosIndex` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `PosIndex` operations.
///
/// Error codes follow the pattern `POSIDX-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed wildcard pattern or escape sequence (POSIDX-001).
    #[error("[POSIDX-001] Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Delete/update referencing a slot that is not live (POSIDX-002).
    #[error("[POSIDX-002] Record handle {0} is not live")]
    UnknownRecordHandle(u32),

    /// Allocation or addressing limit hit while growing the index (POSIDX-003).
    #[error("[POSIDX-003] Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Internal invariant violated (POSIDX-004).
    ///
    /// The index refuses further work until it is rebuilt.
    #[error("[POSIDX-004] Inconsistent index state: {0}")]
    InconsistentState(String),

    /// Predicate references a column the index does not have (POSIDX-005).
    #[error("[POSIDX-005] Column {column} out of range (index has {column_count} columns)")]
    UnknownColumn {
        /// Requested column.
        column: usize,
        /// Number of indexed columns.
        column_count: usize,
    },

    /// Row carries the wrong number of column values (POSIDX-006).
    #[error("[POSIDX-006] Column count mismatch: expected {expected}, got {actual}")]
    ColumnCountMismatch {
        /// Number of indexed columns.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// Configuration error (POSIDX-007).
    #[error("[POSIDX-007] Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the error code (e.g., "POSIDX-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidPattern { .. } => "POSIDX-001",
            Self::UnknownRecordHandle(_) => "POSIDX-002",
            Self::ResourceExhausted(_) => "POSIDX-003",
            Self::InconsistentState(_) => "POSIDX-004",
            Self::UnknownColumn { .. } => "POSIDX-005",
            Self::ColumnCountMismatch { .. } => "POSIDX-006",
            Self::Config(_) => "POSIDX-007",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Only `InconsistentState` is fatal: the index must be rebuilt.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InconsistentState(_))
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
