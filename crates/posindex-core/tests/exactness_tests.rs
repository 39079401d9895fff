//! Exactness of LIKE / ILIKE answers against a brute-force evaluation.
//!
//! Every query must return exactly the live records whose values match,
//! for every operator, over ASCII and multi-byte data, with and without
//! deletes and predicate reordering.
#![allow(clippy::cast_possible_truncation, clippy::uninlined_format_args)]

mod common;

use common::{brute_force, build_index, loc};
use posindex_core::{
    IndexConfig, LikeOp, Locator, MaintenanceConfig, MaterializeOptions, PatternIndex,
    PlannerConfig, Predicate,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn query_set(index: &PatternIndex, predicates: &[Predicate]) -> BTreeSet<Locator> {
    index
        .query(predicates, MaterializeOptions::unordered())
        .unwrap()
        .collect()
}

fn op_strategy() -> impl Strategy<Value = LikeOp> {
    prop_oneof![
        Just(LikeOp::Like),
        Just(LikeOp::NotLike),
        Just(LikeOp::ILike),
        Just(LikeOp::NotILike),
    ]
}

/// Patterns assembled from literals, wildcards and escaped wildcards.
fn pattern_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            3 => Just("a"),
            2 => Just("b"),
            1 => Just("A"),
            1 => Just("é"),
            3 => Just("%"),
            2 => Just("_"),
            1 => Just(r"\%"),
            1 => Just(r"\_"),
        ],
        0..7,
    )
    .prop_map(|pieces| pieces.concat())
}

fn rows_of(values: &[String]) -> Vec<Vec<String>> {
    values.iter().map(|v| vec![v.clone()]).collect()
}

// ========== Fixed scenarios ==========

#[test]
fn test_every_shape_on_fixed_corpus() {
    let values: Vec<String> = [
        "", "a", "ab", "abc", "abcabc", "cab", "bca", "aXbYc", "ABC", "a_c", "a%c", "héllo",
        "hello", "xabcx", "abab",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    let rows = rows_of(&values);
    let index = build_index(&rows, 1);
    let alive = vec![true; rows.len()];

    let patterns = [
        "", "%", "_", "___", "abc", "ab%", "%bc", "%ab%", "a%c", "a_c", r"a\_c", r"a\%c",
        "%a%b%c%", "_b%", "%b_", "h_llo", "h__llo", "%é%", "ab%ab", "%a_c%", "a%", "%",
    ];
    for pattern in patterns {
        for op in [LikeOp::Like, LikeOp::NotLike, LikeOp::ILike, LikeOp::NotILike] {
            let predicates = [Predicate::new(0, op, pattern)];
            assert_eq!(
                query_set(&index, &predicates),
                brute_force(&rows, &alive, &predicates),
                "{} '{}'",
                op,
                pattern
            );
        }
    }
}

#[test]
fn test_underscore_counts_bytes_not_characters() {
    let rows = rows_of(&["é".to_string(), "e".to_string()]);
    let index = build_index(&rows, 1);

    let two = query_set(&index, &[Predicate::like(0, "__")]);
    let one = query_set(&index, &[Predicate::like(0, "_")]);

    assert_eq!(two, BTreeSet::from([loc(0)]));
    assert_eq!(one, BTreeSet::from([loc(1)]));
}

#[test]
fn test_ilike_folds_ascii_only() {
    let rows = rows_of(&["ÉCOLE".to_string(), "école".to_string(), "Ecole".to_string()]);
    let index = build_index(&rows, 1);

    let hits = query_set(&index, &[Predicate::ilike(0, "%cole")]);
    assert_eq!(hits.len(), 3);

    let accent = query_set(&index, &[Predicate::ilike(0, "é%")]);
    assert_eq!(accent, BTreeSet::from([loc(1)]));
}

/// `A AND NOT B` must not be answered as `NOT (A AND B)`.
#[test]
fn test_negation_applies_to_its_own_predicate() {
    let rows: Vec<Vec<String>> = [("apple", "red"), ("apple", "green"), ("pear", "red")]
        .iter()
        .map(|(a, b)| vec![(*a).to_string(), (*b).to_string()])
        .collect();
    let index = build_index(&rows, 2);

    let hits = query_set(
        &index,
        &[Predicate::like(0, "app%"), Predicate::not_like(1, "red")],
    );
    assert_eq!(hits, BTreeSet::from([loc(1)]));

    let both_negated = query_set(
        &index,
        &[Predicate::not_like(0, "app%"), Predicate::not_like(1, "green")],
    );
    assert_eq!(both_negated, BTreeSet::from([loc(2)]));
}

// ========== Properties ==========

mod proptest_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_single_predicate_is_exact(
            values in prop::collection::vec("[abAB%_é ]{0,8}", 0..40),
            pattern in pattern_strategy(),
            op in op_strategy(),
        ) {
            let rows = rows_of(&values);
            let index = build_index(&rows, 1);
            let alive = vec![true; rows.len()];
            let predicates = [Predicate::new(0, op, pattern)];

            prop_assert_eq!(
                query_set(&index, &predicates),
                brute_force(&rows, &alive, &predicates)
            );
        }

        #[test]
        fn prop_multi_column_with_deletes_is_exact(
            pairs in prop::collection::vec(("[abAé]{0,6}", "[abB_]{0,6}"), 1..40),
            doomed in prop::collection::vec(any::<bool>(), 40),
            first in (op_strategy(), pattern_strategy()),
            second in (op_strategy(), pattern_strategy()),
        ) {
            let config = IndexConfig {
                maintenance: MaintenanceConfig { tombstone_cleanup_threshold: 4 },
                ..IndexConfig::default()
            };
            let mut index = PatternIndex::with_config(2, config).unwrap();
            let rows: Vec<Vec<String>> = pairs.iter().map(|(a, b)| vec![a.clone(), b.clone()]).collect();
            let handles: Vec<_> = rows
                .iter()
                .enumerate()
                .map(|(i, row)| index.insert(loc(i), row.as_slice()).unwrap())
                .collect();
            let mut alive = vec![true; rows.len()];
            for (i, handle) in handles.iter().enumerate() {
                if doomed[i] {
                    index.delete(*handle).unwrap();
                    alive[i] = false;
                }
            }

            let predicates = [
                Predicate::new(0, first.0, first.1),
                Predicate::new(1, second.0, second.1),
            ];

            prop_assert_eq!(
                query_set(&index, &predicates),
                brute_force(&rows, &alive, &predicates)
            );
        }

        #[test]
        fn prop_predicate_order_does_not_change_results(
            pairs in prop::collection::vec(("[abc]{0,5}", "[abc]{0,5}"), 0..30),
            first in (op_strategy(), pattern_strategy()),
            second in (op_strategy(), pattern_strategy()),
        ) {
            let rows: Vec<Vec<String>> = pairs.iter().map(|(a, b)| vec![a.clone(), b.clone()]).collect();
            let fixed_order = IndexConfig {
                planner: PlannerConfig { reorder_predicates: false },
                ..IndexConfig::default()
            };
            let mut unordered = PatternIndex::with_config(2, fixed_order).unwrap();
            unordered
                .build(rows.iter().enumerate().map(|(i, row)| (loc(i), row.clone())))
                .unwrap();
            let reordered = build_index(&rows, 2);

            let forward = [
                Predicate::new(0, first.0, first.1.clone()),
                Predicate::new(1, second.0, second.1.clone()),
            ];
            let backward = [forward[1].clone(), forward[0].clone()];

            let expected = query_set(&reordered, &forward);
            prop_assert_eq!(&query_set(&reordered, &backward), &expected);
            prop_assert_eq!(&query_set(&unordered, &forward), &expected);
            prop_assert_eq!(&query_set(&unordered, &backward), &expected);
        }

        #[test]
        fn prop_ordered_results_are_sorted_and_limited(
            values in prop::collection::vec("[ab]{0,4}", 0..60),
            pattern in pattern_strategy(),
            limit in 0_usize..20,
        ) {
            let rows = rows_of(&values);
            let index = build_index(&rows, 1);
            let alive = vec![true; rows.len()];
            let predicates = [Predicate::like(0, pattern)];

            let hits: Vec<Locator> = index
                .query(&predicates, MaterializeOptions::ordered().with_limit(limit))
                .unwrap()
                .collect();
            let expected: Vec<Locator> = brute_force(&rows, &alive, &predicates)
                .into_iter()
                .take(limit)
                .collect();

            prop_assert_eq!(hits, expected);
        }
    }
}
