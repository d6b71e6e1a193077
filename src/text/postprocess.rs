//! Text-aware post-processing of raw diffs.
//!
//! The generic passes in [`crate::algorithms::heuristics`] only look at
//! element equality and boundary scores.  The passes here additionally know
//! about words, lines and the text behind the sequences.
use crate::algorithms::{Sequence, SequenceDiff};
use crate::ranges::OffsetRange;
use crate::text::sequences::{CharSequence, LineSequence};

/// Snaps edit boundaries outward to the nearest containing word.
///
/// An edit that starts or ends in the middle of an alphanumeric run is
/// widened to the whole run, so a diff never splits a word into a changed
/// and an unchanged half.  Runs of words touched by the same edits form a
/// cluster; a cluster is only kept when its changed portion dominates its
/// unchanged portion.
pub(crate) fn extend_diffs_to_entire_word(
    seq1: &CharSequence,
    seq2: &CharSequence,
    diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    struct WordCluster {
        added: usize,
        deleted: usize,
        count: usize,
        seq1_range: OffsetRange,
        seq2_range: OffsetRange,
    }

    fn flush(cluster: &mut Option<WordCluster>, additional: &mut Vec<SequenceDiff>) {
        if let Some(cluster) = cluster.take() {
            let unchanged = cluster.seq1_range.len() - cluster.deleted;
            if cluster.deleted.max(cluster.added) + (cluster.count - 1) > unchanged {
                additional.push(SequenceDiff::new(cluster.seq1_range, cluster.seq2_range));
            }
        }
    }

    fn add_word(
        cluster: &mut Option<WordCluster>,
        additional: &mut Vec<SequenceDiff>,
        diff: &SequenceDiff,
        word1: OffsetRange,
        word2: OffsetRange,
    ) {
        let contained = match cluster {
            Some(cluster) => {
                cluster.seq1_range.contains_range(&word1)
                    && cluster.seq2_range.contains_range(&word2)
            }
            None => false,
        };
        if !contained {
            let extendable = match cluster {
                Some(cluster) => {
                    !(cluster.seq1_range.end < word1.start && cluster.seq2_range.end < word2.start)
                }
                None => false,
            };
            if extendable {
                let cluster = cluster.as_mut().unwrap();
                if let Some(gap) = OffsetRange::try_new(cluster.seq1_range.end, word1.start) {
                    cluster.deleted += gap.len();
                }
                if let Some(gap) = OffsetRange::try_new(cluster.seq2_range.end, word2.start) {
                    cluster.added += gap.len();
                }
                cluster.seq1_range = cluster.seq1_range.join(&word1);
                cluster.seq2_range = cluster.seq2_range.join(&word2);
            } else {
                flush(cluster, additional);
                *cluster = Some(WordCluster {
                    added: 0,
                    deleted: 0,
                    count: 0,
                    seq1_range: word1,
                    seq2_range: word2,
                });
            }
        }
        let cluster = cluster.as_mut().unwrap();
        cluster.count += 1;
        if let Some(overlap) = word1.intersect(&diff.seq1_range) {
            cluster.deleted += overlap.len();
        }
        if let Some(overlap) = word2.intersect(&diff.seq2_range) {
            cluster.added += overlap.len();
        }
    }

    let mut additional: Vec<SequenceDiff> = Vec::new();
    let mut cluster: Option<WordCluster> = None;
    for diff in &diffs {
        let word_begin1 = seq1.find_word_containing(diff.seq1_range.start as isize - 1);
        let word_begin2 = seq2.find_word_containing(diff.seq2_range.start as isize - 1);
        let word_end1 = seq1.find_word_containing(diff.seq1_range.end as isize);
        let word_end2 = seq2.find_word_containing(diff.seq2_range.end as isize);
        match (word_begin1, word_begin2, word_end1, word_end2) {
            (Some(begin1), Some(begin2), Some(end1), Some(end2))
                if begin1 == end1 && begin2 == end2 =>
            {
                add_word(&mut cluster, &mut additional, diff, begin1, begin2);
            }
            _ => {
                if let (Some(begin1), Some(begin2)) = (word_begin1, word_begin2) {
                    add_word(&mut cluster, &mut additional, diff, begin1, begin2);
                }
                if let (Some(end1), Some(end2)) = (word_end1, word_end2) {
                    add_word(&mut cluster, &mut additional, diff, end1, end2);
                }
            }
        }
    }
    flush(&mut cluster, &mut additional);

    merge_sorted_diffs(diffs, additional)
}

/// Merges two sorted diff lists, joining overlapping entries.
fn merge_sorted_diffs(sorted1: Vec<SequenceDiff>, sorted2: Vec<SequenceDiff>) -> Vec<SequenceDiff> {
    let mut result: Vec<SequenceDiff> = Vec::new();
    let mut iter1 = sorted1.into_iter().peekable();
    let mut iter2 = sorted2.into_iter().peekable();
    loop {
        let next = match (iter1.peek(), iter2.peek()) {
            (None, None) => break,
            (Some(_), None) => iter1.next().unwrap(),
            (None, Some(_)) => iter2.next().unwrap(),
            (Some(first), Some(second)) => {
                if first.seq1_range.start < second.seq1_range.start {
                    iter1.next().unwrap()
                } else {
                    iter2.next().unwrap()
                }
            }
        };
        match result.last_mut() {
            Some(last) if last.seq1_range.end >= next.seq1_range.start => {
                *last = last.join(&next);
            }
            _ => result.push(next),
        }
    }
    result
}

const GAP_MERGE_MAX_LINES: usize = 5;
const GAP_MERGE_MAX_CHARS: usize = 500;
const GAP_MERGE_MAX_TRIMMED_CHARS: usize = 20;

/// Merges two adjacent edits separated by very short unchanged text when
/// both edits are large relative to the gap, avoiding noisy
/// diff/no-diff/diff slivers.
pub(crate) fn join_small_gaps(
    seq1: &CharSequence,
    seq2: &CharSequence,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    if diffs.is_empty() {
        return diffs;
    }
    let mut rounds = 0;
    loop {
        let mut changed = false;
        let mut result: Vec<SequenceDiff> = Vec::new();
        result.push(diffs[0]);
        for &cur in &diffs[1..] {
            let last = *result.last().unwrap();
            if should_join_over_gap(seq1, seq2, &last, &cur) {
                changed = true;
                *result.last_mut().unwrap() = last.join(&cur);
            } else {
                result.push(cur);
            }
        }
        diffs = result;
        rounds += 1;
        if !(changed && rounds <= 10) {
            break;
        }
    }
    diffs
}

fn should_join_over_gap(
    seq1: &CharSequence,
    seq2: &CharSequence,
    before: &SequenceDiff,
    after: &SequenceDiff,
) -> bool {
    let gap = OffsetRange::new(before.seq1_range.end, after.seq1_range.start);
    if seq1.count_lines_in(&gap) > GAP_MERGE_MAX_LINES || gap.len() > GAP_MERGE_MAX_CHARS {
        return false;
    }
    let text = seq1.get_text(&gap);
    let trimmed = text.trim();
    if trimmed.chars().count() > GAP_MERGE_MAX_TRIMMED_CHARS || trimmed.lines().count() > 1 {
        return false;
    }

    const CAP: f64 = 2.0 * 40.0 + 50.0;
    fn capped_size(seq: &CharSequence, range: &OffsetRange) -> f64 {
        let size = seq.count_lines_in(range) as f64 * 40.0 + range.len() as f64;
        size.min(CAP)
    }
    let before_size = capped_size(seq1, &before.seq1_range).powf(1.5)
        + capped_size(seq2, &before.seq2_range).powf(1.5);
    let after_size = capped_size(seq1, &after.seq1_range).powf(1.5)
        + capped_size(seq2, &after.seq2_range).powf(1.5);
    before_size.powf(1.5) + after_size.powf(1.5) > (CAP.powf(1.5)).powf(1.5) * 1.3
}

const CONTIGUOUS_MAX_GAP_LINES: usize = 5;
const CONTIGUOUS_MAX_SPAN_LINES: usize = 20;

/// Re-anchors the unchanged lines between two nearby line diffs.
///
/// When two short diffs are separated by a few unchanged lines, the same
/// unchanged run often matches at several positions inside the combined
/// window.  Searching for the contiguous match with the most text tightens
/// the reported ranges around the real change.
pub(crate) fn extend_contiguous_matches(
    seq1: &LineSequence,
    seq2: &LineSequence,
    mut diffs: Vec<SequenceDiff>,
) -> Vec<SequenceDiff> {
    for i in 1..diffs.len() {
        let prev = diffs[i - 1];
        let cur = diffs[i];
        let gap = cur.seq1_range.start - prev.seq1_range.end;
        let full1 = OffsetRange::new(prev.seq1_range.start, cur.seq1_range.end);
        let full2 = OffsetRange::new(prev.seq2_range.start, cur.seq2_range.end);
        if gap >= CONTIGUOUS_MAX_GAP_LINES
            || full1.len() >= CONTIGUOUS_MAX_SPAN_LINES
            || full2.len() >= CONTIGUOUS_MAX_SPAN_LINES
        {
            continue;
        }
        if let Some((pos1, pos2)) = find_better_contiguous_match(seq1, seq2, &full1, &full2, gap) {
            if pos1 == prev.seq1_range.end && pos2 == prev.seq2_range.end {
                continue;
            }
            diffs[i - 1] = SequenceDiff::new(
                OffsetRange::new(full1.start, pos1),
                OffsetRange::new(full2.start, pos2),
            );
            diffs[i] = SequenceDiff::new(
                OffsetRange::new(pos1 + gap, full1.end),
                OffsetRange::new(pos2 + gap, full2.end),
            );
        }
    }
    diffs.retain(|diff| !(diff.seq1_range.is_empty() && diff.seq2_range.is_empty()));
    diffs
}

/// Finds the position pair whose `len` consecutive line pairs all match,
/// maximizing the total text length of the matched run.
fn find_better_contiguous_match(
    seq1: &LineSequence,
    seq2: &LineSequence,
    range1: &OffsetRange,
    range2: &OffsetRange,
    len: usize,
) -> Option<(usize, usize)> {
    if range1.len() < len || range2.len() < len {
        return None;
    }
    let mut best_score = 0;
    let mut best = None;
    for pos1 in range1.start..=(range1.end - len) {
        for pos2 in range2.start..=(range2.end - len) {
            let score = contiguous_match_score(seq1, seq2, pos1, pos2, len);
            if score > best_score {
                best_score = score;
                best = Some((pos1, pos2));
            }
        }
    }
    best
}

fn contiguous_match_score(
    seq1: &LineSequence,
    seq2: &LineSequence,
    pos1: usize,
    pos2: usize,
    len: usize,
) -> usize {
    let mut score = 0;
    for i in 0..len {
        if seq1.element(pos1 + i) != seq2.element(pos2 + i) {
            return 0;
        }
        score += seq1.line(pos1 + i).chars().count();
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::heuristics::{optimize_sequence_diffs, smoothen_sequence_diffs};
    use std::collections::HashMap;

    fn char_diff(old: &[&str], new: &[&str]) -> (CharSequence, CharSequence, Vec<SequenceDiff>) {
        let seq1 = CharSequence::new(old, OffsetRange::new(0, old.len()), true);
        let seq2 = CharSequence::new(new, OffsetRange::new(0, new.len()), true);
        let raw = crate::algorithms::myers::diff(&seq1, &seq2, None);
        let diffs = optimize_sequence_diffs(&seq1, &seq2, raw.diffs);
        (seq1, seq2, diffs)
    }

    #[test]
    fn test_word_extension_covers_scattered_edits() {
        // Three separate digit replacements inside "a1b2c3" change more of
        // the word than they keep, so the whole word becomes one edit.
        let (seq1, seq2, diffs) = char_diff(&["x a1b2c3 y"], &["x a4b5c6 y"]);
        assert_eq!(diffs.len(), 3);
        let extended = extend_diffs_to_entire_word(&seq1, &seq2, diffs);
        assert_eq!(extended.len(), 1);
        assert_eq!(extended[0].seq1_range, OffsetRange::new(2, 8));
        assert_eq!(extended[0].seq2_range, OffsetRange::new(2, 8));
    }

    #[test]
    fn test_word_extension_keeps_small_edits() {
        // A one-char typo fix inside a word must stay a one-char edit.
        let (seq1, seq2, diffs) = char_diff(&["abcabc"], &["abXabc"]);
        let extended = extend_diffs_to_entire_word(&seq1, &seq2, diffs);
        assert_eq!(extended.len(), 1);
        assert_eq!(extended[0].seq1_range, OffsetRange::new(2, 3));
        assert_eq!(extended[0].seq2_range, OffsetRange::new(2, 3));
    }

    #[test]
    fn test_join_small_gaps_merges_large_edits() {
        // A three-line block changed around a tiny " = " island; the
        // island is noise and gets absorbed.
        let a = "a".repeat(45);
        let b = "b".repeat(45);
        let last_old = format!("{} = X;", a);
        let last_new = format!("{} = Y;", b);
        let old = [a.as_str(), a.as_str(), last_old.as_str()];
        let new = [b.as_str(), b.as_str(), last_new.as_str()];
        let (seq1, seq2, diffs) = char_diff(&old, &new);
        let smoothed = smoothen_sequence_diffs(diffs);
        assert_eq!(smoothed.len(), 2);
        let joined = join_small_gaps(&seq1, &seq2, smoothed);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].seq1_range, OffsetRange::new(0, 141));
        assert_eq!(joined[0].seq2_range, OffsetRange::new(0, 141));
    }

    #[test]
    fn test_join_small_gaps_keeps_distant_edits() {
        let old = &["aX bbbbbbbbbbbbbbbbbbbbbbbbbbbbbb cY"];
        let new = &["aZ bbbbbbbbbbbbbbbbbbbbbbbbbbbbbb cW"];
        let (seq1, seq2, diffs) = char_diff(old, new);
        assert_eq!(diffs.len(), 2);
        let joined = join_small_gaps(&seq1, &seq2, diffs.clone());
        assert_eq!(joined, diffs);
    }

    #[test]
    fn test_extend_contiguous_matches_moves_split() {
        // The unchanged line between the two diffs ("dup") also matches at
        // a position with more text ("  dup  "), so the split moves there.
        let old = &["1", "dup", "2", "  dup  ", "3"];
        let new = &["9", "dup", "8", "dup", "7"];
        let mut interner = HashMap::new();
        let seq1 = LineSequence::new(old, &mut interner);
        let seq2 = LineSequence::new(new, &mut interner);
        let diffs = vec![
            SequenceDiff::new(OffsetRange::new(0, 1), OffsetRange::new(0, 1)),
            SequenceDiff::new(OffsetRange::new(2, 5), OffsetRange::new(2, 5)),
        ];
        let result = extend_contiguous_matches(&seq1, &seq2, diffs);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].seq1_range, OffsetRange::new(0, 3));
        assert_eq!(result[0].seq2_range, OffsetRange::new(0, 1));
        assert_eq!(result[1].seq1_range, OffsetRange::new(4, 5));
        assert_eq!(result[1].seq2_range, OffsetRange::new(2, 5));
    }

    #[test]
    fn test_extend_contiguous_matches_keeps_unique_alignment() {
        let old = &["start", "aaaa", "middle-line", "bbbb", "end"];
        let new = &["start", "cccc", "middle-line", "dddd", "end"];
        let mut interner = HashMap::new();
        let seq1 = LineSequence::new(old, &mut interner);
        let seq2 = LineSequence::new(new, &mut interner);
        let diffs = vec![
            SequenceDiff::new(OffsetRange::new(1, 2), OffsetRange::new(1, 2)),
            SequenceDiff::new(OffsetRange::new(3, 4), OffsetRange::new(3, 4)),
        ];
        let result = extend_contiguous_matches(&seq1, &seq2, diffs.clone());
        assert_eq!(result, diffs);
    }
}
