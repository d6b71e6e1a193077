//! Detection of moved blocks.
//!
//! A block of lines deleted in one place and inserted nearly verbatim in
//! another is more useful reported as a move than as an unrelated
//! deletion/insertion pair.  Candidate blocks are paired up by comparing
//! character histograms, which is cheap and robust against small edits
//! inside the moved block.
use std::collections::HashMap;

use crate::text::mapping::LineRangeMapping;
use crate::text::ranges::LineRange;

/// Only blocks of at least this many lines are considered for moves.
const MIN_MOVED_LINES: usize = 3;
/// Histogram similarity required to report a move.
const MIN_SIMILARITY: f64 = 0.90;

/// The character histogram of a block of lines.
pub(crate) struct LineRangeFragment {
    range: LineRange,
    total_count: usize,
    histogram: HashMap<char, usize>,
}

impl LineRangeFragment {
    pub(crate) fn new(range: LineRange, lines: &[&str]) -> LineRangeFragment {
        let mut histogram = HashMap::new();
        let mut total_count = 0;
        for line in &lines[range.start - 1..range.end - 1] {
            for c in line.chars() {
                total_count += 1;
                *histogram.entry(c).or_insert(0) += 1;
            }
            total_count += 1;
            *histogram.entry('\n').or_insert(0) += 1;
        }
        LineRangeFragment {
            range,
            total_count,
            histogram,
        }
    }

    /// Histogram similarity in `0..=1`; `1.0` means equal multisets of
    /// characters.
    pub(crate) fn similarity(&self, other: &LineRangeFragment) -> f64 {
        let mut sum_differences = 0;
        for key in self.histogram.keys().chain(
            other
                .histogram
                .keys()
                .filter(|key| !self.histogram.contains_key(*key)),
        ) {
            let count1 = self.histogram.get(key).copied().unwrap_or(0);
            let count2 = other.histogram.get(key).copied().unwrap_or(0);
            sum_differences += count1.max(count2) - count1.min(count2);
        }
        1.0 - sum_differences as f64 / (self.total_count + other.total_count) as f64
    }
}

/// Pairs deleted blocks with inserted blocks of nearly the same content.
///
/// Every pure deletion of at least [`MIN_MOVED_LINES`] lines is matched
/// against the pure insertions of the same minimum size; the most similar
/// insertion above [`MIN_SIMILARITY`] wins and is consumed.
pub(crate) fn find_moved_blocks(
    changes: &[LineRangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
) -> Vec<(LineRange, LineRange)> {
    let deletions: Vec<LineRangeFragment> = changes
        .iter()
        .filter(|change| change.modified.is_empty() && change.original.len() >= MIN_MOVED_LINES)
        .map(|change| LineRangeFragment::new(change.original, original_lines))
        .collect();
    let mut insertions: Vec<LineRangeFragment> = changes
        .iter()
        .filter(|change| change.original.is_empty() && change.modified.len() >= MIN_MOVED_LINES)
        .map(|change| LineRangeFragment::new(change.modified, modified_lines))
        .collect();

    let mut result = Vec::new();
    for deletion in &deletions {
        let mut best_similarity = -1.0;
        let mut best_index = None;
        for (index, insertion) in insertions.iter().enumerate() {
            let similarity = deletion.similarity(insertion);
            if similarity > best_similarity {
                best_similarity = similarity;
                best_index = Some(index);
            }
        }
        if best_similarity > MIN_SIMILARITY {
            if let Some(index) = best_index {
                let insertion = insertions.remove(index);
                result.push((deletion.range, insertion.range));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_of_equal_blocks() {
        let lines = &["fn f() {", "    1", "}"];
        let a = LineRangeFragment::new(LineRange::new(1, 4), lines);
        let b = LineRangeFragment::new(LineRange::new(1, 4), lines);
        assert!((a.similarity(&b) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_similarity_of_distinct_blocks() {
        let a = LineRangeFragment::new(LineRange::new(1, 4), &["aaa", "aaa", "aaa"]);
        let b = LineRangeFragment::new(LineRange::new(1, 4), &["zzz", "zzz", "zzz"]);
        assert!(a.similarity(&b) < 0.5);
    }

    #[test]
    fn test_find_moved_blocks() {
        let original = &["alpha one", "alpha two", "alpha three", "keep"];
        let modified = &["keep", "alpha one", "alpha two", "alpha three"];
        let changes = vec![
            LineRangeMapping::new(LineRange::new(1, 4), LineRange::new(1, 1), None),
            LineRangeMapping::new(LineRange::new(5, 5), LineRange::new(2, 5), None),
        ];
        let moves = find_moved_blocks(&changes, original, modified);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].0, LineRange::new(1, 4));
        assert_eq!(moves[0].1, LineRange::new(2, 5));
    }

    #[test]
    fn test_short_blocks_are_not_moves() {
        let original = &["a", "b", "keep"];
        let modified = &["keep", "a", "b"];
        let changes = vec![
            LineRangeMapping::new(LineRange::new(1, 3), LineRange::new(1, 1), None),
            LineRangeMapping::new(LineRange::new(4, 4), LineRange::new(2, 4), None),
        ];
        assert!(find_moved_blocks(&changes, original, modified).is_empty());
    }
}
