//! Differential fuzz target: index answers against direct evaluation.
//!
//! Builds a one-column index from arbitrary values, runs one predicate and
//! checks the result set record by record.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use posindex_core::{LikeOp, Locator, MaterializeOptions, PatternIndex, Predicate};
use std::collections::BTreeSet;

const MAX_VALUES: usize = 64;
const MAX_VALUE_LEN: usize = 48;

#[derive(Debug, Arbitrary)]
struct Input {
    values: Vec<String>,
    pattern: String,
    op: u8,
}

fuzz_target!(|input: Input| {
    if input.pattern.ends_with('\\') {
        return;
    }
    let values: Vec<&String> = input
        .values
        .iter()
        .filter(|v| v.len() <= MAX_VALUE_LEN)
        .take(MAX_VALUES)
        .collect();
    let op = match input.op % 4 {
        0 => LikeOp::Like,
        1 => LikeOp::NotLike,
        2 => LikeOp::ILike,
        _ => LikeOp::NotILike,
    };

    let mut index = PatternIndex::new(1);
    for (i, value) in values.iter().enumerate() {
        index.insert(Locator::new(i as u32, 1), &[value.as_str()]).unwrap();
    }

    let predicate = Predicate::new(0, op, input.pattern.clone());
    let got: BTreeSet<Locator> = index
        .query(&[predicate], MaterializeOptions::unordered())
        .unwrap()
        .collect();
    let expected: BTreeSet<Locator> = values
        .iter()
        .enumerate()
        .filter(|(_, v)| {
            like(v.as_bytes(), input.pattern.as_bytes(), op.is_case_sensitive()) != op.is_negated()
        })
        .map(|(i, _)| Locator::new(i as u32, 1))
        .collect();

    assert_eq!(got, expected, "{} '{}'", op, input.pattern);
});

/// Byte-wise LIKE by dynamic programming over (value, pattern) prefixes.
fn like(value: &[u8], pattern: &[u8], case_sensitive: bool) -> bool {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < pattern.len() {
        let token = match pattern[i] {
            b'%' => None,
            b'_' => Some(None),
            b'\\' => {
                i += 1;
                Some(Some(pattern[i]))
            }
            b => Some(Some(b)),
        };
        tokens.push(token);
        i += 1;
    }

    let eq = |a: u8, b: u8| {
        if case_sensitive {
            a == b
        } else {
            a.eq_ignore_ascii_case(&b)
        }
    };
    // reach[j]: the first j tokens can consume the value prefix seen so far
    let mut reach = vec![false; tokens.len() + 1];
    reach[0] = true;
    for j in 0..tokens.len() {
        reach[j + 1] = reach[j] && tokens[j].is_none();
    }
    for &byte in value {
        let mut next = vec![false; tokens.len() + 1];
        for j in 0..tokens.len() {
            next[j + 1] = match tokens[j] {
                None => next[j] || reach[j + 1],
                Some(None) => reach[j],
                Some(Some(b)) => reach[j] && eq(b, byte),
            };
        }
        reach = next;
    }
    reach[tokens.len()]
}
