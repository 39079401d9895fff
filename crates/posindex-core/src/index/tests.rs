//! Tests for the pattern index.

use super::*;
use crate::config::{IndexConfig, MaintenanceConfig};
use crate::materialize::MaterializeOptions;
use crate::planner::Predicate;

fn loc(n: u32) -> Locator {
    Locator::new(n, 1)
}

fn single(values: &[&str]) -> (PatternIndex, Vec<RecordHandle>) {
    let mut index = PatternIndex::new(1);
    let handles = values
        .iter()
        .enumerate()
        .map(|(i, v)| index.insert(loc(i as u32), &[*v]).unwrap())
        .collect();
    (index, handles)
}

fn like(index: &PatternIndex, pattern: &str) -> Vec<Locator> {
    index
        .query(&[Predicate::like(0, pattern)], MaterializeOptions::ordered())
        .unwrap()
        .collect()
}

fn with_threshold(columns: usize, threshold: usize) -> PatternIndex {
    let config = IndexConfig {
        maintenance: MaintenanceConfig {
            tombstone_cleanup_threshold: threshold,
        },
        ..IndexConfig::default()
    };
    PatternIndex::with_config(columns, config).unwrap()
}

// ========== Insert / query ==========

#[test]
fn test_scenario_hello_world_test() {
    let (index, _) = single(&["hello", "world", "test"]);

    assert_eq!(like(&index, "%ell%"), vec![loc(0)]);
    assert_eq!(like(&index, "_e__"), vec![loc(2)]);
    let not_o: Vec<Locator> = index
        .query(&[Predicate::not_like(0, "%o%")], MaterializeOptions::ordered())
        .unwrap()
        .collect();
    assert_eq!(not_o, vec![loc(2)]);
}

#[test]
fn test_zero_predicates_returns_all_live() {
    let (mut index, handles) = single(&["a", "b", "c"]);
    index.delete(handles[1]).unwrap();

    let all: Vec<Locator> = index.query(&[], MaterializeOptions::ordered()).unwrap().collect();

    assert_eq!(all, vec![loc(0), loc(2)]);
}

#[test]
fn test_insert_wrong_arity() {
    let mut index = PatternIndex::new(2);

    let err = index.insert(loc(0), &["only one"]).unwrap_err();

    assert!(matches!(
        err,
        Error::ColumnCountMismatch {
            expected: 2,
            actual: 1
        }
    ));
    assert!(index.is_empty());
    assert_eq!(index.stats().insert_count, 0);
}

#[test]
fn test_contains_and_locator() {
    let (mut index, handles) = single(&["x"]);

    assert!(index.contains(handles[0]));
    assert_eq!(index.locator(handles[0]), Some(loc(0)));

    index.delete(handles[0]).unwrap();

    assert!(!index.contains(handles[0]));
    assert_eq!(index.locator(handles[0]), None);
    assert!(!index.contains(RecordHandle::from_slot(99)));
}

#[test]
fn test_count_and_query_bitmap() {
    let (index, handles) = single(&["apple", "apricot", "banana"]);
    let predicates = [Predicate::like(0, "ap%")];

    assert_eq!(index.count(&predicates).unwrap(), 2);
    let bitmap = index.query_bitmap(&predicates).unwrap();
    assert!(bitmap.contains(handles[0].slot()));
    assert!(bitmap.contains(handles[1].slot()));
}

#[test]
fn test_query_errors_carry_no_results() {
    let (index, _) = single(&["a"]);

    assert!(index
        .query(&[Predicate::like(3, "a")], MaterializeOptions::default())
        .is_err());
    assert_eq!(
        index.count(&[Predicate::like(0, r"a\")]).unwrap_err().code(),
        "POSIDX-001"
    );
}

// ========== Delete / tombstones ==========

#[test]
fn test_deleted_record_disappears_immediately() {
    let (mut index, handles) = single(&["abc", "abd"]);

    index.delete(handles[0]).unwrap();

    assert_eq!(like(&index, "ab%"), vec![loc(1)]);
    let stats = index.stats();
    assert_eq!(stats.tombstone_count, 1);
    assert_eq!(stats.delete_count, 1);
}

#[test]
fn test_double_delete_is_reported() {
    let (mut index, handles) = single(&["abc"]);
    index.delete(handles[0]).unwrap();

    let err = index.delete(handles[0]).unwrap_err();

    assert!(matches!(err, Error::UnknownRecordHandle(0)));
    assert!(err.is_recoverable());
    assert_eq!(index.stats().delete_count, 1);
    assert_eq!(index.stats().tombstone_count, 1);
}

#[test]
fn test_slot_reuse_after_cleanup() {
    let (mut index, handles) = single(&["abc"]);

    index.delete(handles[0]).unwrap();
    index.purge_now().unwrap();
    let xyz = index.insert(loc(7), &["xyz"]).unwrap();

    assert_eq!(xyz, handles[0]);
    assert!(like(&index, "abc").is_empty());
    assert_eq!(like(&index, "xyz"), vec![loc(7)]);
    assert_eq!(like(&index, "%b%"), Vec::<Locator>::new());
}

#[test]
fn test_cleanup_triggers_at_threshold() {
    let mut index = with_threshold(1, 3);
    let handles: Vec<RecordHandle> = (0..5)
        .map(|i| index.insert(loc(i), &[format!("v{i}")]).unwrap())
        .collect();

    index.delete(handles[0]).unwrap();
    index.delete(handles[1]).unwrap();
    assert_eq!(index.stats().tombstone_count, 2);

    index.delete(handles[2]).unwrap();

    let stats = index.stats();
    assert_eq!(stats.tombstone_count, 0);
    assert_eq!(stats.free_slot_count, 3);
    assert_eq!(stats.cleanup_count, 1);
    assert_eq!(stats.columns[0].forward_entries, 3); // 'v' at 0, '3' and '4' at 1
}

#[test]
fn test_bulk_delete_checks_threshold_after_batch() {
    let mut index = with_threshold(1, 3);
    for i in 0..6 {
        index.insert(loc(i), &["row"]).unwrap();
    }

    let removed = index.bulk_delete(|l| l.block < 4).unwrap();

    assert_eq!(removed, 4);
    let stats = index.stats();
    assert_eq!(stats.tombstone_count, 0);
    assert_eq!(stats.free_slot_count, 4);
    assert_eq!(stats.delete_count, 4);
    assert_eq!(index.count(&[Predicate::like(0, "row")]).unwrap(), 2);
}

// ========== Update ==========

#[test]
fn test_update_keeps_locator() {
    let (mut index, handles) = single(&["old"]);

    let handle = index.update(handles[0], &["new"]).unwrap();

    assert!(like(&index, "old").is_empty());
    assert_eq!(like(&index, "new"), vec![loc(0)]);
    assert_eq!(index.locator(handle), Some(loc(0)));
    let stats = index.stats();
    assert_eq!(stats.update_count, 1);
    assert_eq!(stats.insert_count, 1);
    assert_eq!(stats.delete_count, 0);
}

#[test]
fn test_update_at_moves_record() {
    let (mut index, handles) = single(&["old"]);

    let handle = index.update_at(handles[0], loc(42), &["new"]).unwrap();

    assert_eq!(index.locator(handle), Some(loc(42)));
    assert_eq!(like(&index, "new"), vec![loc(42)]);
}

#[test]
fn test_update_unknown_handle() {
    let (mut index, _) = single(&["a"]);

    let err = index.update(RecordHandle::from_slot(9), &["b"]).unwrap_err();

    assert!(matches!(err, Error::UnknownRecordHandle(9)));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_update_wrong_arity_keeps_record() {
    let (mut index, handles) = single(&["a"]);

    assert!(index.update(handles[0], &["b", "c"]).is_err());

    assert!(index.contains(handles[0]));
    assert_eq!(like(&index, "a"), vec![loc(0)]);
}

// ========== Poisoning / build ==========

#[test]
fn test_poisoned_index_refuses_work() {
    let (mut index, handles) = single(&["a"]);
    index.poison("test");

    assert!(matches!(
        index.insert(loc(1), &["b"]),
        Err(Error::InconsistentState(_))
    ));
    assert!(index.delete(handles[0]).is_err());
    let err = index.count(&[]).unwrap_err();
    assert!(!err.is_recoverable());
}

#[test]
fn test_build_replaces_content_and_clears_poison() {
    let (mut index, _) = single(&["stale"]);
    index.poison("test");

    let built = index
        .build(vec![(loc(10), vec!["fresh"]), (loc(11), vec!["frost"])])
        .unwrap();

    assert_eq!(built, 2);
    assert!(!index.is_poisoned());
    assert!(like(&index, "stale").is_empty());
    assert_eq!(like(&index, "fr%"), vec![loc(10), loc(11)]);
    assert_eq!(index.stats().insert_count, 2);
}

// ========== Stats ==========

#[test]
fn test_stats_snapshot() {
    let mut index = PatternIndex::new(2);
    index.insert(loc(0), &["hello", "x"]).unwrap();
    index.insert(loc(1), &["hi", "yz"]).unwrap();

    let stats = index.stats();

    assert_eq!(stats.live_count, 2);
    assert_eq!(stats.total_slots, 2);
    assert_eq!(stats.max_value_length, 5);
    assert_eq!(stats.columns.len(), 2);
    assert_eq!(stats.columns[1].max_length, 2);
    assert!(stats.memory_bytes > 0);
    assert_eq!(index.estimate_memory_bytes(), stats.memory_bytes);
}

#[test]
fn test_stats_serialize_and_display() {
    let (index, _) = single(&["abc"]);
    let stats = index.stats();

    let json = serde_json::to_string(&stats).unwrap();
    let back: IndexStats = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stats);

    let report = stats.to_string();
    assert!(report.contains("active records:   1"));
    assert!(report.contains("column 0:"));
}

#[test]
fn test_with_config_validates() {
    let config = IndexConfig {
        maintenance: MaintenanceConfig {
            tombstone_cleanup_threshold: 0,
        },
        ..IndexConfig::default()
    };

    let err = PatternIndex::with_config(1, config).unwrap_err();

    assert_eq!(err.code(), "POSIDX-007");
}
