//! Shared helpers for integration tests: a brute-force LIKE oracle.
#![allow(dead_code)]

use posindex_core::{LikeOp, Locator, PatternIndex, Predicate};
use std::collections::BTreeSet;

/// Byte-wise LIKE with `\` escapes, evaluated directly on the value.
pub fn like(value: &[u8], pattern: &[u8], case_sensitive: bool) -> bool {
    let eq = |a: u8, b: u8| {
        if case_sensitive {
            a == b
        } else {
            a.eq_ignore_ascii_case(&b)
        }
    };

    // Iterative wildcard matching with single-star backtracking.
    let tokens = tokenize(pattern);
    let (mut v, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while v < value.len() {
        match tokens.get(t) {
            Some(Token::Any) => {
                star = Some((t, v));
                t += 1;
            }
            Some(Token::One) => {
                v += 1;
                t += 1;
            }
            Some(Token::Byte(b)) if eq(*b, value[v]) => {
                v += 1;
                t += 1;
            }
            _ => match star {
                Some((st, sv)) => {
                    t = st + 1;
                    v = sv + 1;
                    star = Some((st, sv + 1));
                }
                None => return false,
            },
        }
    }
    tokens[t..].iter().all(|tok| matches!(tok, Token::Any))
}

#[derive(Debug, Clone, Copy)]
enum Token {
    Byte(u8),
    One,
    Any,
}

fn tokenize(pattern: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < pattern.len() {
        match pattern[i] {
            b'%' => tokens.push(Token::Any),
            b'_' => tokens.push(Token::One),
            b'\\' if i + 1 < pattern.len() => {
                i += 1;
                tokens.push(Token::Byte(pattern[i]));
            }
            b => tokens.push(Token::Byte(b)),
        }
        i += 1;
    }
    tokens
}

/// Oracle for one predicate on one value.
pub fn predicate_holds(op: LikeOp, value: &str, pattern: &str) -> bool {
    let matched = like(value.as_bytes(), pattern.as_bytes(), op.is_case_sensitive());
    matched != op.is_negated()
}

/// Locator used for row `i` in these tests.
pub fn loc(i: usize) -> Locator {
    Locator::new(i as u32 / 8, (i % 8) as u16)
}

/// Builds an index whose row `i` has locator `loc(i)`.
pub fn build_index(rows: &[Vec<String>], columns: usize) -> PatternIndex {
    let mut index = PatternIndex::new(columns);
    index
        .build(rows.iter().enumerate().map(|(i, row)| (loc(i), row.clone())))
        .unwrap();
    index
}

/// Brute-force answer over the rows that are still alive.
pub fn brute_force(rows: &[Vec<String>], alive: &[bool], predicates: &[Predicate]) -> BTreeSet<Locator> {
    rows.iter()
        .enumerate()
        .filter(|(i, _)| alive[*i])
        .filter(|(_, row)| {
            predicates
                .iter()
                .all(|p| predicate_holds(p.op, &row[p.column], &p.pattern))
        })
        .map(|(i, _)| loc(i))
        .collect()
}
