//! Text diffing.
//!
//! This module turns two documents, given as slices of lines, into the
//! line/column mappings an editor renders: a line-level diff, refined with
//! character-level inner changes where the changed blocks are small enough,
//! post-processed for readability and optionally annotated with moved
//! blocks.
//!
//! # Examples
//!
//! The common case goes through [`LinesDiff::compute`]:
//!
//! ```rust
//! use editdiff::LinesDiff;
//!
//! let diff = LinesDiff::compute(&["foo", "bar", "baz"], &["foo", "baz"]);
//! assert_eq!(diff.changes.len(), 1);
//! ```
//!
//! More involved uses configure the computation first:
//!
//! ```rust
//! use std::time::Duration;
//! use editdiff::LinesDiff;
//!
//! let diff = LinesDiff::configure()
//!     .max_computation_time(Duration::from_millis(500))
//!     .compute_moves(true)
//!     .diff_text("a\nb\n", "b\na\n");
//! ```
//!
//! # Whitespace
//!
//! Lines are always aligned by their trimmed content, so reindenting a
//! block does not obscure a real change inside it.  By default
//! whitespace-only differences on otherwise equal lines are still reported
//! as character-level changes; [`DiffConfig::ignore_trim_whitespace`] drops
//! them entirely.
mod mapping;
mod moves;
mod postprocess;
mod ranges;
mod sequences;

pub use self::mapping::{LineRangeMapping, LinesDiff, MovedText, RangeMapping};
pub use self::ranges::{LineRange, Position, TextRange};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::algorithms::heuristics::{optimize_sequence_diffs, smoothen_sequence_diffs};
use crate::algorithms::{
    check_adjacent_items, dynamic, myers, select_algorithm, Algorithm, Sequence, SequenceDiff,
};
use crate::deadline_support::duration_to_deadline;
use crate::ranges::OffsetRange;
use crate::text::mapping::{line_range_mappings_from_range_mappings, validate_line_range_mappings};
use crate::text::sequences::{char_count, CharSequence, LineSequence};

/// Combined size below which the line layer uses the dynamic-programming
/// differ.
const LINE_DP_THRESHOLD: usize = 1500;
/// Combined size below which the character layer uses the
/// dynamic-programming differ.
const CHAR_DP_THRESHOLD: usize = 500;
/// Only blocks shorter than this on both sides get character-level
/// refinement.
const MAX_REFINED_LINES: usize = 20;

/// A builder type config for diff computations.
#[derive(Clone, Debug)]
pub struct DiffConfig {
    max_computation_time: Option<Duration>,
    ignore_trim_whitespace: bool,
    compute_moves: bool,
}

impl Default for DiffConfig {
    fn default() -> DiffConfig {
        DiffConfig {
            max_computation_time: None,
            ignore_trim_whitespace: false,
            compute_moves: false,
        }
    }
}

impl DiffConfig {
    /// Bounds the wall-clock time of the computation.
    ///
    /// The budget is soft: it is polled inside the hot loops, and when it
    /// runs out the result degrades to a coarse whole-document diff with
    /// [`LinesDiff::hit_timeout`] set.  The default is no bound.
    pub fn max_computation_time(&mut self, budget: Duration) -> &mut Self {
        self.max_computation_time = Some(budget);
        self
    }

    /// Changes whether whitespace-only line changes are reported.
    ///
    /// Lines are always *aligned* ignoring leading and trailing whitespace;
    /// this flag only controls whether a line that differs from its
    /// counterpart purely in whitespace produces a change.  The default is
    /// `false` (such changes are reported).
    pub fn ignore_trim_whitespace(&mut self, yes: bool) -> &mut Self {
        self.ignore_trim_whitespace = yes;
        self
    }

    /// Enables detection of moved blocks.
    ///
    /// The default is `false`.
    pub fn compute_moves(&mut self, yes: bool) -> &mut Self {
        self.compute_moves = yes;
        self
    }

    /// Diffs two documents given as slices of lines.
    pub fn diff_lines(&self, original: &[&str], modified: &[&str]) -> LinesDiff {
        compute_diff(original, modified, self)
    }

    /// Diffs two documents given as text, splitting them into lines.
    pub fn diff_text(&self, original: &str, modified: &str) -> LinesDiff {
        let original_lines = split_lines(original);
        let modified_lines = split_lines(modified);
        compute_diff(&original_lines, &modified_lines, self)
    }
}

impl LinesDiff {
    /// Configures a diff computation.
    pub fn configure() -> DiffConfig {
        DiffConfig::default()
    }

    /// Diffs two documents with the default configuration.
    ///
    /// Equivalent to `LinesDiff::configure().diff_lines(original, modified)`.
    pub fn compute(original: &[&str], modified: &[&str]) -> LinesDiff {
        DiffConfig::default().diff_lines(original, modified)
    }
}

/// Splits text into lines at `\n`, `\r\n` or `\r`, without terminators.
///
/// A trailing line terminator produces a final empty line, so that
/// `"a\n"` and `"a"` differ.
pub fn split_lines(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                i += 1;
                if i < bytes.len() && bytes[i] == b'\n' {
                    i += 1;
                }
                start = i;
            }
            _ => i += 1,
        }
    }
    lines.push(&text[start..]);
    lines
}

fn compute_diff(original: &[&str], modified: &[&str], config: &DiffConfig) -> LinesDiff {
    if original == modified {
        return LinesDiff {
            changes: Vec::new(),
            moves: Vec::new(),
            hit_timeout: false,
        };
    }
    if is_effectively_empty(original) || is_effectively_empty(modified) {
        // One side has no content at all; everything is one change.
        return LinesDiff {
            changes: vec![LineRangeMapping::new(
                LineRange::new(1, original.len().max(1) + 1),
                LineRange::new(1, modified.len().max(1) + 1),
                Some(vec![RangeMapping::new(
                    whole_document_range(original),
                    whole_document_range(modified),
                )]),
            )],
            moves: Vec::new(),
            hit_timeout: false,
        };
    }

    let deadline = duration_to_deadline(config.max_computation_time);
    let consider_whitespace_changes = !config.ignore_trim_whitespace;

    let mut interner = HashMap::new();
    let seq1 = LineSequence::new(original, &mut interner);
    let seq2 = LineSequence::new(modified, &mut interner);

    let line_result = match select_algorithm(original.len(), modified.len(), LINE_DP_THRESHOLD) {
        Algorithm::DynamicProgramming => {
            // Weight matches by line length so that heavy lines anchor the
            // alignment; lines equal only after trimming almost count as a
            // match.
            dynamic::diff_scored(&seq1, &seq2, deadline, |offset1, offset2| {
                if original[offset1] == modified[offset2] {
                    if modified[offset2].is_empty() {
                        0.1
                    } else {
                        1.0 + (1.0 + modified[offset2].len() as f64).ln()
                    }
                } else {
                    0.99
                }
            })
        }
        Algorithm::Myers => myers::diff(&seq1, &seq2, deadline),
    };

    let mut hit_timeout = line_result.hit_timeout;
    let mut line_diffs = optimize_sequence_diffs(&seq1, &seq2, line_result.diffs);
    line_diffs = postprocess::extend_contiguous_matches(&seq1, &seq2, line_diffs);

    let mut changes: Vec<LineRangeMapping> = Vec::new();
    let mut pending: Vec<RangeMapping> = Vec::new();
    let mut pos1 = 0;
    let mut pos2 = 0;
    for diff in &line_diffs {
        debug_assert!(diff.seq1_range.start - pos1 == diff.seq2_range.start - pos2);
        if consider_whitespace_changes {
            let equal_lines = diff.seq1_range.start - pos1;
            scan_for_whitespace_changes(
                original,
                modified,
                pos1,
                pos2,
                equal_lines,
                deadline,
                &mut pending,
                &mut hit_timeout,
            );
        }
        pos1 = diff.seq1_range.end;
        pos2 = diff.seq2_range.end;

        let refinable = !diff.seq1_range.is_empty()
            && diff.seq1_range.len() < MAX_REFINED_LINES
            && !diff.seq2_range.is_empty()
            && diff.seq2_range.len() < MAX_REFINED_LINES;
        if refinable {
            let refined =
                refine_diff(original, modified, diff, deadline, consider_whitespace_changes);
            if refined.hit_timeout {
                hit_timeout = true;
            }
            pending.extend(refined.mappings);
        } else {
            let dont_assert_start_line = !changes.is_empty();
            flush_pending(
                &mut pending,
                original,
                modified,
                dont_assert_start_line,
                &mut changes,
            );
            changes.push(LineRangeMapping::new(
                LineRange::new(diff.seq1_range.start + 1, diff.seq1_range.end + 1),
                LineRange::new(diff.seq2_range.start + 1, diff.seq2_range.end + 1),
                None,
            ));
        }
    }
    if consider_whitespace_changes {
        scan_for_whitespace_changes(
            original,
            modified,
            pos1,
            pos2,
            original.len() - pos1,
            deadline,
            &mut pending,
            &mut hit_timeout,
        );
    }
    let dont_assert_start_line = !changes.is_empty();
    flush_pending(
        &mut pending,
        original,
        modified,
        dont_assert_start_line,
        &mut changes,
    );

    let changes = merge_touching_changes(changes);
    debug_assert!(validate_line_range_mappings(&changes, original, modified));
    debug_assert!(check_adjacent_items(&changes, |a, b| {
        b.original.start - a.original.end == b.modified.start - a.modified.end
            // There has to be an unchanged line in between (otherwise both
            // diffs should have been joined).
            && a.original.end < b.original.start
            && a.modified.end < b.modified.start
    }));

    let mut moved = Vec::new();
    if config.compute_moves {
        for (original_range, modified_range) in
            moves::find_moved_blocks(&changes, original, modified)
        {
            let diff = SequenceDiff::new(
                OffsetRange::new(original_range.start - 1, original_range.end - 1),
                OffsetRange::new(modified_range.start - 1, modified_range.end - 1),
            );
            let refined =
                refine_diff(original, modified, &diff, deadline, consider_whitespace_changes);
            let move_changes =
                line_range_mappings_from_range_mappings(&refined.mappings, original, modified, true);
            moved.push(MovedText::new(original_range, modified_range, move_changes));
        }
    }

    LinesDiff {
        changes,
        moves: moved,
        hit_timeout,
    }
}

fn is_effectively_empty(lines: &[&str]) -> bool {
    lines.is_empty() || (lines.len() == 1 && lines[0].is_empty())
}

fn whole_document_range(lines: &[&str]) -> TextRange {
    TextRange::new(
        1,
        1,
        lines.len().max(1),
        lines.last().map_or(0, |line| char_count(line)) + 1,
    )
}

struct RefinedDiff {
    mappings: Vec<RangeMapping>,
    hit_timeout: bool,
}

/// Computes the character-level diff inside one changed region.
fn refine_diff(
    original: &[&str],
    modified: &[&str],
    diff: &SequenceDiff,
    deadline: Option<Instant>,
    consider_whitespace_changes: bool,
) -> RefinedDiff {
    let slice1 = CharSequence::new(original, diff.seq1_range, consider_whitespace_changes);
    let slice2 = CharSequence::new(modified, diff.seq2_range, consider_whitespace_changes);

    let result = crate::algorithms::diff(
        select_algorithm(slice1.len(), slice2.len(), CHAR_DP_THRESHOLD),
        &slice1,
        &slice2,
        deadline,
    );

    let mut diffs = optimize_sequence_diffs(&slice1, &slice2, result.diffs);
    diffs = postprocess::extend_diffs_to_entire_word(&slice1, &slice2, diffs);
    diffs = smoothen_sequence_diffs(diffs);
    diffs = postprocess::join_small_gaps(&slice1, &slice2, diffs);

    RefinedDiff {
        mappings: diffs
            .iter()
            .map(|diff| {
                RangeMapping::new(
                    slice1.translate_range(&diff.seq1_range),
                    slice2.translate_range(&diff.seq2_range),
                )
            })
            .collect(),
        hit_timeout: result.hit_timeout,
    }
}

/// Reports whitespace-only changes on lines that are equal after trimming.
#[allow(clippy::too_many_arguments)]
fn scan_for_whitespace_changes(
    original: &[&str],
    modified: &[&str],
    start1: usize,
    start2: usize,
    count: usize,
    deadline: Option<Instant>,
    pending: &mut Vec<RangeMapping>,
    hit_timeout: &mut bool,
) {
    for i in 0..count {
        let line1 = start1 + i;
        let line2 = start2 + i;
        if original[line1] != modified[line2] {
            // The lines were aligned by their trimmed content, so only the
            // surrounding whitespace can differ here.
            let diff = SequenceDiff::new(
                OffsetRange::new(line1, line1 + 1),
                OffsetRange::new(line2, line2 + 1),
            );
            let refined = refine_diff(original, modified, &diff, deadline, true);
            if refined.hit_timeout {
                *hit_timeout = true;
            }
            pending.extend(refined.mappings);
        }
    }
}

fn flush_pending(
    pending: &mut Vec<RangeMapping>,
    original: &[&str],
    modified: &[&str],
    dont_assert_start_line: bool,
    changes: &mut Vec<LineRangeMapping>,
) {
    if pending.is_empty() {
        return;
    }
    let grouped = line_range_mappings_from_range_mappings(
        pending,
        original,
        modified,
        dont_assert_start_line,
    );
    changes.extend(grouped);
    pending.clear();
}

/// Joins changes whose line ranges became adjacent, so that the final list
/// always has an unchanged line between consecutive entries.
fn merge_touching_changes(changes: Vec<LineRangeMapping>) -> Vec<LineRangeMapping> {
    let mut result: Vec<LineRangeMapping> = Vec::new();
    for change in changes {
        let LineRangeMapping {
            original,
            modified,
            inner_changes,
        } = change;
        if let Some(last) = result.last_mut() {
            if last.original.end == original.start || last.modified.end == modified.start {
                let joined_inner = match (last.inner_changes.take(), inner_changes) {
                    (Some(mut first), Some(second)) => {
                        first.extend(second);
                        Some(first)
                    }
                    _ => None,
                };
                *last = LineRangeMapping::new(
                    last.original.join(&original),
                    last.modified.join(&modified),
                    joined_inner,
                );
                continue;
            }
        }
        result.push(LineRangeMapping::new(original, modified, inner_changes));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(changes: &[LineRangeMapping]) -> String {
        changes
            .iter()
            .map(|change| change.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_deleted_line() {
        let diff = LinesDiff::compute(&["foo", "bar", "baz"], &["foo", "baz"]);
        assert!(!diff.hit_timeout);
        insta::assert_snapshot!(render(&diff.changes), @"{[2,3)->[2,2)}");
        assert!(diff.changes[0].inner_changes.is_none());
    }

    #[test]
    fn test_identical_documents() {
        let diff = LinesDiff::compute(&["same", "lines"], &["same", "lines"]);
        assert_eq!(diff.changes, vec![]);
        assert_eq!(diff.moves, vec![]);
        assert!(!diff.hit_timeout);
    }

    #[test]
    fn test_single_char_replacement() {
        let diff = LinesDiff::compute(&["abcabc"], &["abXabc"]);
        assert_eq!(diff.changes.len(), 1);
        let inner = diff.changes[0].inner_changes.as_ref().unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].original, TextRange::new(1, 3, 1, 4));
        assert_eq!(inner[0].modified, TextRange::new(1, 3, 1, 4));
    }

    #[test]
    fn test_multiple_changes() {
        let diff = LinesDiff::compute(
            &["hello", "world", "foo", "bar"],
            &["hello", "wOrld", "foo", "baz"],
        );
        insta::assert_snapshot!(render(&diff.changes), @r###"
        {[2,3)->[2,3)}
        {[4,5)->[4,5)}
        "###);
    }

    #[test]
    fn test_flip_mirrors_reversed_diff() {
        let original = &["a", "x", "c"];
        let modified = &["a", "y", "c"];
        let forward = LinesDiff::compute(original, modified);
        let backward = LinesDiff::compute(modified, original);
        let flipped: Vec<_> = forward.changes.iter().map(|c| c.flip()).collect();
        assert_eq!(flipped, backward.changes);
    }

    #[test]
    fn test_inner_changes_cover_whole_words() {
        let diff = LinesDiff::compute(&["const value = alpha;"], &["const value = omega;"]);
        assert_eq!(diff.changes.len(), 1);
        let inner = diff.changes[0].inner_changes.as_ref().unwrap();
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].original, TextRange::new(1, 15, 1, 20));
        assert_eq!(inner[0].modified, TextRange::new(1, 15, 1, 20));
    }

    #[test]
    fn test_whitespace_only_change_is_reported() {
        let diff = LinesDiff::compute(&["  foo"], &["foo"]);
        assert_eq!(diff.changes.len(), 1);
        let inner = diff.changes[0].inner_changes.as_ref().unwrap();
        assert_eq!(inner[0].original, TextRange::new(1, 1, 1, 3));
        assert_eq!(inner[0].modified, TextRange::new(1, 1, 1, 1));
    }

    #[test]
    fn test_whitespace_only_change_can_be_ignored() {
        let diff = LinesDiff::configure()
            .ignore_trim_whitespace(true)
            .diff_lines(&["  foo"], &["foo"]);
        assert_eq!(diff.changes, vec![]);
    }

    #[test]
    fn test_empty_document_against_content() {
        let diff = LinesDiff::compute(&[""], &["hello", "world"]);
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].original, LineRange::new(1, 2));
        assert_eq!(diff.changes[0].modified, LineRange::new(1, 3));
        let inner = diff.changes[0].inner_changes.as_ref().unwrap();
        assert_eq!(inner[0].original, TextRange::new(1, 1, 1, 1));
        assert_eq!(inner[0].modified, TextRange::new(1, 1, 2, 6));
    }

    #[test]
    fn test_timeout_degrades_to_whole_document() {
        let original_owned: Vec<String> = (0..2000).map(|i| format!("original {}", i)).collect();
        let modified_owned: Vec<String> = (0..2000).map(|i| format!("modified {}", i)).collect();
        let original: Vec<&str> = original_owned.iter().map(String::as_str).collect();
        let modified: Vec<&str> = modified_owned.iter().map(String::as_str).collect();

        let diff = LinesDiff::configure()
            .max_computation_time(Duration::ZERO)
            .diff_lines(&original, &modified);
        assert!(diff.hit_timeout);
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].original, LineRange::new(1, 2001));
        assert_eq!(diff.changes[0].modified, LineRange::new(1, 2001));
    }

    #[test]
    fn test_moved_block_detection() {
        let original = &[
            "aaa",
            "bbb",
            "ccc",
            "the quick brown fox",
            "jumps over the lazy",
            "dog near the river",
            "tail",
        ];
        let modified = &[
            "the quick brown fox",
            "jumps over the lazy",
            "dog near the river",
            "aaa",
            "bbb",
            "ccc",
            "tail",
        ];
        let diff = LinesDiff::configure()
            .compute_moves(true)
            .diff_lines(original, modified);
        assert_eq!(diff.moves.len(), 1);
        assert_eq!(diff.moves[0].original, LineRange::new(1, 4));
        assert_eq!(diff.moves[0].modified, LineRange::new(4, 7));
        assert_eq!(diff.moves[0].changes, vec![]);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\r\nb\rc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }

    #[test]
    fn test_diff_text_matches_diff_lines() {
        let from_text = LinesDiff::configure().diff_text("foo\nbar\nbaz", "foo\nbaz");
        let from_lines = LinesDiff::compute(&["foo", "bar", "baz"], &["foo", "baz"]);
        assert_eq!(from_text, from_lines);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let diff = LinesDiff::configure()
            .compute_moves(true)
            .diff_lines(&["foo", "bar"], &["foo", "qux"]);
        let json = serde_json::to_string(&diff).unwrap();
        let back: LinesDiff = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diff);
    }
}
