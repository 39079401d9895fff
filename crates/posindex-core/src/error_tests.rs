//! Tests for `error` module

use super::error::*;

// -------------------------------------------------------------------------
// Error code tests
// -------------------------------------------------------------------------

#[test]
fn test_error_codes_are_unique() {
    // Arrange - create all error variants
    let errors: Vec<Error> = vec![
        Error::invalid_pattern("ab\\", "dangling escape"),
        Error::UnknownRecordHandle(7),
        Error::ResourceExhausted("test".into()),
        Error::InconsistentState("test".into()),
        Error::UnknownColumn {
            column: 3,
            column_count: 2,
        },
        Error::ColumnCountMismatch {
            expected: 2,
            actual: 1,
        },
        Error::Config("test".into()),
    ];

    // Act - collect all codes
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert - all codes are unique and follow pattern
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(
        codes.len(),
        unique_codes.len(),
        "Error codes must be unique"
    );

    for code in &codes {
        assert!(
            code.starts_with("POSIDX-"),
            "Code {code} should start with POSIDX-"
        );
    }
}

#[test]
fn test_invalid_pattern_display() {
    // Arrange
    let err = Error::invalid_pattern("abc\\", "trailing escape character");

    // Act
    let display = format!("{err}");

    // Assert
    assert!(display.contains("POSIDX-001"));
    assert!(display.contains("abc\\"));
    assert!(display.contains("trailing escape"));
}

#[test]
fn test_column_count_mismatch_display() {
    let err = Error::ColumnCountMismatch {
        expected: 3,
        actual: 1,
    };

    let display = format!("{err}");

    assert!(display.contains("expected 3"));
    assert!(display.contains("got 1"));
    assert!(display.contains("POSIDX-006"));
}

#[test]
fn test_only_inconsistent_state_is_fatal() {
    assert!(!Error::InconsistentState("purge interrupted".into()).is_recoverable());

    assert!(Error::UnknownRecordHandle(1).is_recoverable());
    assert!(Error::ResourceExhausted("oom".into()).is_recoverable());
    assert!(Error::invalid_pattern("x", "y").is_recoverable());
}

#[test]
fn test_config_error_converts() {
    let config_err = crate::config::ConfigError::InvalidValue {
        key: "maintenance.tombstone_cleanup_threshold".to_string(),
        message: "must be >= 1".to_string(),
    };

    let err: Error = config_err.into();

    assert_eq!(err.code(), "POSIDX-007");
    assert!(err.to_string().contains("tombstone_cleanup_threshold"));
}
