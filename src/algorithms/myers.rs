//! Myers' diff algorithm.
//!
//! * time: `O((N+M)D)`
//! * space: `O((N+M)D)`
//!
//! See [the original article by Eugene W. Myers](http://www.xmailserver.org/diff2.pdf)
//! describing it.  The implementation grows the edit distance `d` from zero
//! and tracks the furthest reaching point on every diagonal `k = x - y`,
//! sliding through runs of equal elements ("snakes").  The snakes are
//! recorded in an arena so that the final path can be walked backwards to
//! emit the diffs between consecutive snakes.
use std::time::Instant;

use crate::algorithms::{DiffAlgorithmResult, Sequence, SequenceDiff};
use crate::deadline_support::deadline_exceeded;
use crate::ranges::OffsetRange;

/// A growable int array addressable by positive and negative diagonal
/// indices.  Unset entries read as zero.
struct DiagonalArray {
    positive: Vec<i64>,
    negative: Vec<i64>,
}

impl DiagonalArray {
    fn new() -> DiagonalArray {
        DiagonalArray {
            positive: vec![0; 10],
            negative: vec![0; 10],
        }
    }

    fn get(&self, k: i64) -> i64 {
        if k < 0 {
            let idx = (-k - 1) as usize;
            self.negative.get(idx).copied().unwrap_or(0)
        } else {
            self.positive.get(k as usize).copied().unwrap_or(0)
        }
    }

    fn set(&mut self, k: i64, value: i64) {
        let (arr, idx) = if k < 0 {
            (&mut self.negative, (-k - 1) as usize)
        } else {
            (&mut self.positive, k as usize)
        };
        if idx >= arr.len() {
            let grown = (arr.len() * 2).max(idx + 1);
            arr.resize(grown, 0);
        }
        arr[idx] = value;
    }
}

/// Like [`DiagonalArray`] but holding optional snake arena indices.
struct SnakeEnds {
    positive: Vec<Option<usize>>,
    negative: Vec<Option<usize>>,
}

impl SnakeEnds {
    fn new() -> SnakeEnds {
        SnakeEnds {
            positive: Vec::new(),
            negative: Vec::new(),
        }
    }

    fn get(&self, k: i64) -> Option<usize> {
        if k < 0 {
            let idx = (-k - 1) as usize;
            self.negative.get(idx).copied().flatten()
        } else {
            self.positive.get(k as usize).copied().flatten()
        }
    }

    fn set(&mut self, k: i64, value: Option<usize>) {
        let (arr, idx) = if k < 0 {
            (&mut self.negative, (-k - 1) as usize)
        } else {
            (&mut self.positive, k as usize)
        };
        if idx >= arr.len() {
            arr.resize(idx + 1, None);
        }
        arr[idx] = value;
    }
}

/// A run of matching elements along a diagonal, linked to the run it was
/// reached from.
struct SnakePath {
    prev: Option<usize>,
    x: usize,
    y: usize,
    len: usize,
}

/// Diffs two sequences with Myers' algorithm.
pub fn diff<S>(seq1: &S, seq2: &S, deadline: Option<Instant>) -> DiffAlgorithmResult
where
    S: Sequence + ?Sized,
{
    if seq1.is_empty() || seq2.is_empty() {
        return DiffAlgorithmResult::trivial(seq1.len(), seq2.len());
    }

    let len1 = seq1.len() as i64;
    let len2 = seq2.len() as i64;
    let follow_snake = |mut x: i64, mut y: i64| -> i64 {
        while x < len1 && y < len2 && seq1.element(x as usize) == seq2.element(y as usize) {
            x += 1;
            y += 1;
        }
        x
    };

    let mut v = DiagonalArray::new();
    v.set(0, follow_snake(0, 0));
    let mut arena: Vec<SnakePath> = Vec::new();
    let mut paths = SnakeEnds::new();
    let seed = if v.get(0) == 0 {
        None
    } else {
        arena.push(SnakePath {
            prev: None,
            x: 0,
            y: 0,
            len: v.get(0) as usize,
        });
        Some(0)
    };
    paths.set(0, seed);

    let mut d = 0i64;
    let mut k;
    'outer: loop {
        d += 1;
        if deadline_exceeded(deadline) {
            return DiffAlgorithmResult::trivial_timed_out(seq1.len(), seq2.len());
        }
        let lower_bound = -(d.min(len2 + d % 2));
        let upper_bound = d.min(len1 + d % 2);
        k = lower_bound;
        while k <= upper_bound {
            let max_x_top = if k == upper_bound { -1 } else { v.get(k + 1) };
            let max_x_left = if k == lower_bound { -1 } else { v.get(k - 1) + 1 };
            let x = max_x_top.max(max_x_left).min(len1);
            let y = x - k;
            if x > len1 || y > len2 {
                k += 2;
                continue;
            }
            let new_max_x = if y >= 0 { follow_snake(x, y) } else { x };
            v.set(k, new_max_x);
            let last_path = if x == max_x_top {
                paths.get(k + 1)
            } else {
                paths.get(k - 1)
            };
            let path = if new_max_x != x {
                arena.push(SnakePath {
                    prev: last_path,
                    x: x as usize,
                    y: y as usize,
                    len: (new_max_x - x) as usize,
                });
                Some(arena.len() - 1)
            } else {
                last_path
            };
            paths.set(k, path);
            if v.get(k) == len1 && v.get(k) - k == len2 {
                break 'outer;
            }
            k += 2;
        }
    }

    // Walk the snake chain backwards; the gaps between consecutive snakes
    // are the diffs.
    let mut path = paths.get(k);
    let mut result = Vec::new();
    let mut last_aligning1 = seq1.len();
    let mut last_aligning2 = seq2.len();
    loop {
        let (end_x, end_y) = match path {
            Some(idx) => (arena[idx].x + arena[idx].len, arena[idx].y + arena[idx].len),
            None => (0, 0),
        };
        if end_x != last_aligning1 || end_y != last_aligning2 {
            result.push(SequenceDiff::new(
                OffsetRange::new(end_x, last_aligning1),
                OffsetRange::new(end_y, last_aligning2),
            ));
        }
        match path {
            Some(idx) => {
                last_aligning1 = arena[idx].x;
                last_aligning2 = arena[idx].y;
                path = arena[idx].prev;
            }
            None => break,
        }
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
fn test_single_char_replacement() {
    let a: Vec<char> = "abcabc".chars().collect();
    let b: Vec<char> = "abXabc".chars().collect();

    let result = diff(&a[..], &b[..], None);
    assert_eq!(result.diffs.len(), 1);
    assert_eq!(result.diffs[0].to_string(), "[2, 3) <-> [2, 3)");
}

#[test]
fn test_identical() {
    let a: &[u32] = &[1, 2, 3, 4];

    let result = diff(a, a, None);
    assert!(result.diffs.is_empty());
    assert!(!result.hit_timeout);
}

#[test]
fn test_empty_sides() {
    let a: &[u32] = &[];
    let b: &[u32] = &[1, 2];

    assert_eq!(diff(a, b, None).diffs[0].to_string(), "[0, 0) <-> [0, 2)");
    assert_eq!(diff(b, a, None).diffs[0].to_string(), "[0, 2) <-> [0, 0)");
}

#[test]
fn test_roundtrip() {
    let cases: &[(&[u32], &[u32])] = &[
        (&[0, 1, 3, 4, 5], &[0, 1, 4, 5, 8, 9]),
        (&[0, 1, 2, 3, 4, 4, 4, 5], &[0, 1, 2, 8, 9, 4, 4, 7]),
        (&[1, 2, 3], &[4, 5, 6, 7]),
        (&[5, 5, 5, 5], &[5, 5]),
    ];
    for &(a, b) in cases {
        let result = diff(a, b, None);
        assert_eq!(
            crate::algorithms::apply_diffs(a, b, &result.diffs),
            b,
            "roundtrip failed for {:?} -> {:?}",
            a,
            b
        );
    }
}

#[test]
fn test_matches_dynamic_programming_weight() {
    // Both algorithms must produce scripts that reconstruct the target;
    // the scripts themselves may differ.
    let a: Vec<u32> = (0..50).map(|i| i % 7).collect();
    let b: Vec<u32> = (0..50).map(|i| (i * 3) % 7).collect();

    let myers = diff(&a[..], &b[..], None);
    let dp = crate::algorithms::dynamic::diff(&a[..], &b[..], None);
    assert_eq!(crate::algorithms::apply_diffs(&a, &b, &myers.diffs), b);
    assert_eq!(crate::algorithms::apply_diffs(&a, &b, &dp.diffs), b);
}

#[test]
fn test_timeout_returns_trivial() {
    let a: Vec<u32> = (0..2000).collect();
    let b: Vec<u32> = (5000..7000).collect();

    let deadline = Some(Instant::now() - std::time::Duration::from_millis(1));
    let result = diff(&a[..], &b[..], deadline);
    assert!(result.hit_timeout);
    assert_eq!(result.diffs.len(), 1);
    assert_eq!(result.diffs[0].seq1_range, OffsetRange::new(0, 2000));
}
