//! Dynamic-programming diff for small sequences.
//!
//! * time: `O(N*M)`
//! * space: `O(N*M)`
//!
//! Computes the optimal diff by maximizing the weight of the common
//! subsequence.  Matches can carry a custom per-position score, and runs of
//! consecutive matches earn a bonus so that the backtrack prefers long
//! unbroken stretches over the same number of scattered matches.
use std::time::Instant;

use crate::algorithms::{DiffAlgorithmResult, Sequence, SequenceDiff};
use crate::deadline_support::deadline_exceeded;
use crate::ranges::OffsetRange;

/// A dense row-major matrix.
struct Array2D<T> {
    width: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Array2D<T> {
    fn new(width: usize, height: usize) -> Array2D<T> {
        Array2D {
            width,
            data: vec![T::default(); width * height],
        }
    }

    fn get(&self, x: usize, y: usize) -> T {
        self.data[x + y * self.width]
    }

    fn set(&mut self, x: usize, y: usize, value: T) {
        self.data[x + y * self.width] = value;
    }
}

const DIRECTION_HORIZONTAL: u8 = 1;
const DIRECTION_VERTICAL: u8 = 2;
const DIRECTION_DIAGONAL: u8 = 3;

/// Diffs two sequences, weighting every match equally.
pub fn diff<S>(seq1: &S, seq2: &S, deadline: Option<Instant>) -> DiffAlgorithmResult
where
    S: Sequence + ?Sized,
{
    diff_scored(seq1, seq2, deadline, |_, _| 1.0)
}

/// Diffs two sequences with a per-position score for matches.
///
/// `score` is consulted for every pair of equal elements and replaces the
/// default match weight of `1.0`.  Ties between a match and a skip resolve
/// in favor of the match.
pub fn diff_scored<S, F>(
    seq1: &S,
    seq2: &S,
    deadline: Option<Instant>,
    score: F,
) -> DiffAlgorithmResult
where
    S: Sequence + ?Sized,
    F: Fn(usize, usize) -> f64,
{
    if seq1.is_empty() || seq2.is_empty() {
        return DiffAlgorithmResult::trivial(seq1.len(), seq2.len());
    }

    let width = seq1.len();
    let height = seq2.len();
    let mut lengths = Array2D::<f64>::new(width, height);
    let mut directions = Array2D::<u8>::new(width, height);
    let mut lcs_lengths = Array2D::<u32>::new(width, height);

    for s1 in 0..width {
        if deadline_exceeded(deadline) {
            return DiffAlgorithmResult::trivial_timed_out(width, height);
        }
        for s2 in 0..height {
            let horizontal = if s1 == 0 { 0.0 } else { lengths.get(s1 - 1, s2) };
            let vertical = if s2 == 0 { 0.0 } else { lengths.get(s1, s2 - 1) };
            let extended = if seq1.element(s1) == seq2.element(s2) {
                let mut value = if s1 == 0 || s2 == 0 {
                    0.0
                } else {
                    lengths.get(s1 - 1, s2 - 1)
                };
                if s1 > 0 && s2 > 0 && directions.get(s1 - 1, s2 - 1) == DIRECTION_DIAGONAL {
                    value += lcs_lengths.get(s1 - 1, s2 - 1) as f64;
                }
                value + score(s1, s2)
            } else {
                -1.0
            };

            let new_value = extended.max(horizontal.max(vertical));
            if new_value == extended {
                let prev_lcs_length = if s1 > 0 && s2 > 0 {
                    lcs_lengths.get(s1 - 1, s2 - 1)
                } else {
                    0
                };
                lcs_lengths.set(s1, s2, prev_lcs_length + 1);
                directions.set(s1, s2, DIRECTION_DIAGONAL);
            } else if new_value == horizontal {
                lcs_lengths.set(s1, s2, 0);
                directions.set(s1, s2, DIRECTION_HORIZONTAL);
            } else {
                lcs_lengths.set(s1, s2, 0);
                directions.set(s1, s2, DIRECTION_VERTICAL);
            }
            lengths.set(s1, s2, new_value);
        }
    }

    // Backtrack from the bottom-right corner.  Non-diagonal steps accumulate
    // into a pending diff that gets flushed whenever a match is crossed.
    let mut result = Vec::new();
    let mut last_aligning1 = width;
    let mut last_aligning2 = height;
    let mut s1 = width as isize - 1;
    let mut s2 = height as isize - 1;
    while s1 >= 0 && s2 >= 0 {
        match directions.get(s1 as usize, s2 as usize) {
            DIRECTION_DIAGONAL => {
                let start1 = (s1 + 1) as usize;
                let start2 = (s2 + 1) as usize;
                if start1 != last_aligning1 || start2 != last_aligning2 {
                    result.push(SequenceDiff::new(
                        OffsetRange::new(start1, last_aligning1),
                        OffsetRange::new(start2, last_aligning2),
                    ));
                }
                last_aligning1 = s1 as usize;
                last_aligning2 = s2 as usize;
                s1 -= 1;
                s2 -= 1;
            }
            DIRECTION_HORIZONTAL => s1 -= 1,
            _ => s2 -= 1,
        }
    }
    if last_aligning1 != 0 || last_aligning2 != 0 {
        result.push(SequenceDiff::new(
            OffsetRange::new(0, last_aligning1),
            OffsetRange::new(0, last_aligning2),
        ));
    }
    result.reverse();

    DiffAlgorithmResult {
        diffs: result,
        hit_timeout: false,
    }
}

#[test]
fn test_diff() {
    let a: &[u32] = &[0, 1, 2, 3, 4];
    let b: &[u32] = &[0, 1, 2, 9, 4];

    let result = diff(a, b, None);
    assert!(!result.hit_timeout);
    assert_eq!(result.diffs.len(), 1);
    assert_eq!(result.diffs[0].to_string(), "[3, 4) <-> [3, 4)");
    assert_eq!(crate::algorithms::apply_diffs(a, b, &result.diffs), b);
}

#[test]
fn test_insert_and_delete() {
    let a: &[u32] = &[0, 1, 3, 4, 5];
    let b: &[u32] = &[0, 1, 4, 5, 8, 9];

    let result = diff(a, b, None);
    assert_eq!(crate::algorithms::apply_diffs(a, b, &result.diffs), b);
}

#[test]
fn test_empty_side() {
    let a: &[u32] = &[];
    let b: &[u32] = &[1, 2, 3];

    let result = diff(a, b, None);
    assert_eq!(result.diffs.len(), 1);
    assert_eq!(result.diffs[0].to_string(), "[0, 0) <-> [0, 3)");
}

#[test]
fn test_identical() {
    let a: &[u32] = &[1, 2, 3];

    let result = diff(a, a, None);
    assert!(result.diffs.is_empty());
}

#[test]
fn test_prefers_consecutive_matches() {
    // Both 4s of the new sequence can match in several places; the run
    // bonus keeps them together.
    let a: &[u32] = &[0, 1, 2, 3, 4, 4, 4, 5];
    let b: &[u32] = &[0, 1, 2, 8, 9, 4, 4, 7];

    let result = diff(a, b, None);
    assert_eq!(crate::algorithms::apply_diffs(a, b, &result.diffs), b);
    let rendered: Vec<String> = result.diffs.iter().map(|d| d.to_string()).collect();
    insta::assert_snapshot!(rendered.join("\n"), @r###"
    [3, 4) <-> [3, 5)
    [6, 8) <-> [7, 8)
    "###);
}

#[test]
fn test_scored_overrides_tie_break() {
    // The 0 at offset 2 of the second sequence can match either 0 of the
    // first one.  By default the diagonal tie-break keeps the second 0;
    // a heavy score on the first 0 flips the alignment.
    let a: &[u32] = &[0, 7, 0, 8];
    let b: &[u32] = &[9, 9, 0, 8];

    let unscored = diff(a, b, None);
    assert_eq!(crate::algorithms::apply_diffs(a, b, &unscored.diffs), b);
    assert_eq!(unscored.diffs.len(), 1);
    assert_eq!(unscored.diffs[0].to_string(), "[0, 2) <-> [0, 2)");

    let scored = diff_scored(a, b, None, |s1, _| if s1 == 0 { 10.0 } else { 1.0 });
    assert_eq!(crate::algorithms::apply_diffs(a, b, &scored.diffs), b);
    assert_eq!(scored.diffs.len(), 2);
    assert_eq!(scored.diffs[0].to_string(), "[0, 0) <-> [0, 2)");
    assert_eq!(scored.diffs[1].to_string(), "[1, 3) <-> [3, 3)");
}

#[test]
fn test_timeout_returns_trivial() {
    let a: Vec<u32> = (0..100).collect();
    let b: Vec<u32> = (100..200).collect();

    let deadline = Some(Instant::now() - std::time::Duration::from_millis(1));
    let result = diff(&a[..], &b[..], deadline);
    assert!(result.hit_timeout);
    assert_eq!(result.diffs.len(), 1);
    assert_eq!(result.diffs[0].seq1_range, OffsetRange::new(0, 100));
    assert_eq!(result.diffs[0].seq2_range, OffsetRange::new(0, 100));
}
