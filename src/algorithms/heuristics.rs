//! Heuristic rewrites that turn a mechanically correct diff into one that
//! reads the way a human expects.
//!
//! Every pass takes the sorted, non-overlapping diff list produced by an
//! algorithm and returns a list with the same properties.  Applying the
//! rewritten script still reconstructs the second sequence from the first;
//! only the placement and grouping of the edits changes.
use crate::algorithms::{check_adjacent_items, BoundaryScored, Sequence, SequenceDiff};
use crate::ranges::OffsetRange;

/// How far a one-sided diff may be shifted while looking for a better
/// boundary.
const MAX_SHIFT_LIMIT: i64 = 100;

/// Joins diffs that can slide into each other and shifts the rest to the
/// most natural boundary.
pub fn optimize_sequence_diffs<S>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff>
where
    S: BoundaryScored + ?Sized,
{
    let diffs = join_sequence_diffs_by_shifting(seq1, seq2, diffs);
    let diffs = shift_sequence_diffs(seq1, seq2, diffs);
    debug_assert!(check_adjacent_items(&diffs, |a, b| {
        a.seq1_range.end < b.seq1_range.start && a.seq2_range.end < b.seq2_range.start
    }));
    diffs
}

/// A deletion of "aaa" from "aaaa" has several valid positions.  This pass
/// slides every pure insertion/deletion towards its neighbors; when the
/// window can slide all the way across the unchanged gap the two diffs are
/// merged.
fn join_sequence_diffs_by_shifting<S>(
    seq1: &S,
    seq2: &S,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff>
where
    S: Sequence + ?Sized,
{
    if diffs.is_empty() {
        return diffs;
    }

    // Backward: slide towards the previous diff.
    let mut joined: Vec<SequenceDiff> = Vec::with_capacity(diffs.len());
    joined.push(diffs[0]);
    for i in 1..diffs.len() {
        let last = *joined.last().unwrap();
        let mut cur = diffs[i];
        if cur.seq1_range.is_empty() || cur.seq2_range.is_empty() {
            let gap = cur.seq1_range.start - last.seq1_range.end;
            let mut d = 1;
            while d <= gap
                && seq1.element(cur.seq1_range.start - d) == seq1.element(cur.seq1_range.end - d)
                && seq2.element(cur.seq2_range.start - d) == seq2.element(cur.seq2_range.end - d)
            {
                d += 1;
            }
            d -= 1;
            if d == gap {
                *joined.last_mut().unwrap() = SequenceDiff::new(
                    OffsetRange::new(last.seq1_range.start, cur.seq1_range.end - gap),
                    OffsetRange::new(last.seq2_range.start, cur.seq2_range.end - gap),
                );
                continue;
            }
            cur = cur.delta(-(d as isize));
        }
        joined.push(cur);
    }

    // Forward: slide towards the next diff.
    let mut result: Vec<SequenceDiff> = Vec::with_capacity(joined.len());
    for i in 0..joined.len().saturating_sub(1) {
        let next = joined[i + 1];
        let mut cur = joined[i];
        if cur.seq1_range.is_empty() || cur.seq2_range.is_empty() {
            let gap = next.seq1_range.start - cur.seq1_range.end;
            let mut d = 0;
            while d < gap
                && seq1.element(cur.seq1_range.start + d) == seq1.element(cur.seq1_range.end + d)
                && seq2.element(cur.seq2_range.start + d) == seq2.element(cur.seq2_range.end + d)
            {
                d += 1;
            }
            if d == gap {
                joined[i + 1] = SequenceDiff::new(
                    OffsetRange::new(cur.seq1_range.start + gap, next.seq1_range.end),
                    OffsetRange::new(cur.seq2_range.start + gap, next.seq2_range.end),
                );
                continue;
            }
            if d > 0 {
                cur = cur.delta(d as isize);
            }
        }
        result.push(cur);
    }
    if let Some(&last) = joined.last() {
        result.push(last);
    }
    result
}

/// Shifts every remaining one-sided diff to the position with the best
/// combined boundary score.
fn shift_sequence_diffs<S>(seq1: &S, seq2: &S, mut diffs: Vec<SequenceDiff>) -> Vec<SequenceDiff>
where
    S: BoundaryScored + ?Sized,
{
    for i in 0..diffs.len() {
        let prev = if i > 0 { Some(diffs[i - 1]) } else { None };
        let next = if i + 1 < diffs.len() {
            Some(diffs[i + 1])
        } else {
            None
        };
        let seq1_window = OffsetRange::new(
            prev.map_or(0, |d| d.seq1_range.start + 1),
            next.map_or(seq1.len(), |d| d.seq1_range.end - 1),
        );
        let seq2_window = OffsetRange::new(
            prev.map_or(0, |d| d.seq2_range.start + 1),
            next.map_or(seq2.len(), |d| d.seq2_range.end - 1),
        );
        let diff = diffs[i];
        if diff.seq1_range.is_empty() {
            diffs[i] = shift_diff_to_better_position(diff, seq1, seq2, seq1_window, seq2_window);
        } else if diff.seq2_range.is_empty() {
            diffs[i] =
                shift_diff_to_better_position(diff.flip(), seq2, seq1, seq2_window, seq1_window)
                    .flip();
        }
    }
    diffs
}

/// Moves a pure insertion within the window of equal surrounding content to
/// the offset with the maximal boundary score.  Ties keep the earliest
/// candidate, i.e. the boundary right after the prior diff.
///
/// `diff.seq1_range` must be empty.
fn shift_diff_to_better_position<S>(
    diff: SequenceDiff,
    seq1: &S,
    seq2: &S,
    seq1_window: OffsetRange,
    seq2_window: OffsetRange,
) -> SequenceDiff
where
    S: BoundaryScored + ?Sized,
{
    let s1_start = diff.seq1_range.start as i64;
    let s2_start = diff.seq2_range.start as i64;
    let s2_end = diff.seq2_range.end as i64;

    let mut delta_before = 1i64;
    while s1_start - delta_before >= seq1_window.start as i64
        && s2_start - delta_before >= seq2_window.start as i64
        && seq2.element((s2_start - delta_before) as usize)
            == seq2.element((s2_end - delta_before) as usize)
        && delta_before < MAX_SHIFT_LIMIT
    {
        delta_before += 1;
    }
    delta_before -= 1;

    let mut delta_after = 0i64;
    while s1_start + delta_after < seq1_window.end as i64
        && s2_end + delta_after < seq2_window.end as i64
        && seq2.element((s2_start + delta_after) as usize)
            == seq2.element((s2_end + delta_after) as usize)
        && delta_after < MAX_SHIFT_LIMIT
    {
        delta_after += 1;
    }

    if delta_before == 0 && delta_after == 0 {
        return diff;
    }

    let mut best_delta = 0i64;
    let mut best_score = -1i64;
    for delta in -delta_before..=delta_after {
        let score = seq1.boundary_score((s1_start + delta) as usize)
            + seq2.boundary_score((s2_start + delta) as usize)
            + seq2.boundary_score((s2_end + delta) as usize);
        if score > best_score {
            best_score = score;
            best_delta = delta;
        }
    }
    diff.delta(best_delta as isize)
}

/// Merges adjacent diffs whose unchanged gap on either side is at most two
/// elements, avoiding diff/no-diff/diff slivers.
pub fn smoothen_sequence_diffs(diffs: Vec<SequenceDiff>) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::new();
    for diff in diffs {
        if let Some(last) = result.last_mut() {
            if diff.seq1_range.start - last.seq1_range.end <= 2
                || diff.seq2_range.start - last.seq2_range.end <= 2
            {
                *last = last.join(&diff);
                continue;
            }
        }
        result.push(diff);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A char sequence scoring breaks next to spaces higher.
    struct Chars(Vec<char>);

    impl Chars {
        fn new(text: &str) -> Chars {
            Chars(text.chars().collect())
        }
    }

    impl Sequence for Chars {
        type Element = char;

        fn len(&self) -> usize {
            self.0.len()
        }

        fn element(&self, offset: usize) -> char {
            self.0[offset]
        }
    }

    impl BoundaryScored for Chars {
        fn boundary_score(&self, offset: usize) -> i64 {
            let before_space = offset > 0 && self.0[offset - 1] == ' ';
            let after_space = offset < self.0.len() && self.0[offset] == ' ';
            if offset == 0 || offset == self.0.len() || before_space || after_space {
                10
            } else {
                0
            }
        }
    }

    fn diff_and_optimize(old: &str, new: &str) -> Vec<SequenceDiff> {
        let seq1 = Chars::new(old);
        let seq2 = Chars::new(new);
        let raw = crate::algorithms::myers::diff(&seq1, &seq2, None);
        optimize_sequence_diffs(&seq1, &seq2, raw.diffs)
    }

    #[test]
    fn test_shift_to_word_boundary() {
        // The inserted " xxx" fits at several offsets; both ends of the
        // window are word boundaries, so the tie keeps the earliest one,
        // right after "one".
        let diffs = diff_and_optimize("one two", "one xxx two");
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].to_string(), "[3, 3) <-> [3, 7)");
    }

    #[test]
    fn test_join_slidable_diffs() {
        // Both edits sit in a run of the same character, so the second one
        // can slide onto the first and the result is a single diff.
        let seq1 = Chars::new("aaaaaa");
        let seq2 = Chars::new("aaaa");
        let diffs = vec![
            SequenceDiff::new(OffsetRange::new(1, 2), OffsetRange::new(1, 1)),
            SequenceDiff::new(OffsetRange::new(4, 5), OffsetRange::new(3, 3)),
        ];
        let joined = join_sequence_diffs_by_shifting(&seq1, &seq2, diffs);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].seq1_range.len(), 2);
        assert_eq!(joined[0].seq2_range.len(), 0);
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let cases = &[
            ("one two", "one xxx two"),
            ("aaaa", "aaa"),
            ("fn main() {}", "fn other() {}"),
            ("a b c d", "a c b d"),
        ];
        for &(old, new) in cases {
            let seq1 = Chars::new(old);
            let seq2 = Chars::new(new);
            let once = diff_and_optimize(old, new);
            let twice = optimize_sequence_diffs(&seq1, &seq2, once.clone());
            assert_eq!(once, twice, "not idempotent for {:?} -> {:?}", old, new);
        }
    }

    #[test]
    fn test_smoothen_merges_small_gaps() {
        let diffs = vec![
            SequenceDiff::new(OffsetRange::new(0, 2), OffsetRange::new(0, 1)),
            SequenceDiff::new(OffsetRange::new(4, 6), OffsetRange::new(3, 4)),
            SequenceDiff::new(OffsetRange::new(20, 21), OffsetRange::new(18, 19)),
        ];
        let smoothed = smoothen_sequence_diffs(diffs);
        assert_eq!(smoothed.len(), 2);
        assert_eq!(smoothed[0].to_string(), "[0, 6) <-> [0, 4)");
        assert_eq!(smoothed[1].to_string(), "[20, 21) <-> [18, 19)");
    }
}
