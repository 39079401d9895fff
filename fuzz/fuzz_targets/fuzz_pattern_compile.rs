//! Fuzz target for the pattern compiler.
//!
//! Any string must either compile or be rejected with `InvalidPattern`.
//! A compiled pattern's minimum length is the number of non-`%` tokens.

#![no_main]

use libfuzzer_sys::fuzz_target;
use posindex_core::{compile, Error};

fuzz_target!(|input: (&str, bool)| {
    let (pattern, case_sensitive) = input;
    match compile(pattern, case_sensitive) {
        Ok(compiled) => {
            assert_eq!(compiled.min_len(), fixed_tokens(pattern.as_bytes()));
            assert_eq!(compiled.source(), pattern);
        }
        Err(Error::InvalidPattern { .. }) => {
            assert!(pattern.ends_with('\\'));
        }
        Err(other) => panic!("unexpected error kind: {other}"),
    }
});

/// Bytes the pattern consumes from every matching value.
fn fixed_tokens(pattern: &[u8]) -> usize {
    let mut count = 0;
    let mut i = 0;
    while i < pattern.len() {
        match pattern[i] {
            b'%' => {}
            b'\\' => {
                i += 1;
                count += 1;
            }
            _ => count += 1,
        }
        i += 1;
    }
    count
}
