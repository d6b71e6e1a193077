//! The mapping types a diff computation produces.
use std::fmt;

use crate::algorithms::check_adjacent_items;
use crate::text::ranges::{LineRange, Position, TextRange};
use crate::text::sequences::char_count;

/// A region of the original document mapped to the region of the modified
/// document it was changed into, in line/column coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RangeMapping {
    pub original: TextRange,
    pub modified: TextRange,
}

impl RangeMapping {
    /// Creates a new mapping.
    pub fn new(original: TextRange, modified: TextRange) -> RangeMapping {
        RangeMapping { original, modified }
    }

    /// Swaps the roles of original and modified.
    pub fn flip(&self) -> RangeMapping {
        RangeMapping::new(self.modified, self.original)
    }
}

impl fmt::Display for RangeMapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}->{}}}", self.original, self.modified)
    }
}

/// A changed block of lines, optionally refined with the character-level
/// changes inside it.
///
/// An empty `modified` range denotes a pure deletion, an empty `original`
/// range a pure insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineRangeMapping {
    pub original: LineRange,
    pub modified: LineRange,
    /// Character-level inner changes, present when the block was small
    /// enough to refine.
    pub inner_changes: Option<Vec<RangeMapping>>,
}

impl LineRangeMapping {
    /// Creates a new mapping.
    pub fn new(
        original: LineRange,
        modified: LineRange,
        inner_changes: Option<Vec<RangeMapping>>,
    ) -> LineRangeMapping {
        LineRangeMapping {
            original,
            modified,
            inner_changes,
        }
    }

    /// The number of lines the change touches on the larger side.
    pub fn changed_line_count(&self) -> usize {
        self.original.len().max(self.modified.len())
    }

    /// Swaps the roles of original and modified.
    pub fn flip(&self) -> LineRangeMapping {
        LineRangeMapping::new(
            self.modified,
            self.original,
            self.inner_changes
                .as_ref()
                .map(|changes| changes.iter().map(RangeMapping::flip).collect()),
        )
    }
}

impl fmt::Display for LineRangeMapping {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}->{}}}", self.original, self.modified)
    }
}

/// A block of lines that moved to another place in the document, with the
/// diff between both copies.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovedText {
    pub original: LineRange,
    pub modified: LineRange,
    /// The changes between the deleted and the inserted copy of the block.
    pub changes: Vec<LineRangeMapping>,
}

impl MovedText {
    /// Creates a new moved block.
    pub fn new(original: LineRange, modified: LineRange, changes: Vec<LineRangeMapping>) -> MovedText {
        MovedText {
            original,
            modified,
            changes,
        }
    }

    /// Swaps the roles of original and modified.
    pub fn flip(&self) -> MovedText {
        MovedText::new(
            self.modified,
            self.original,
            self.changes.iter().map(LineRangeMapping::flip).collect(),
        )
    }
}

impl fmt::Display for MovedText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}->{}}}", self.original, self.modified)
    }
}

/// The result of a line diff computation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinesDiff {
    /// The changed blocks, sorted and non-overlapping, with at least one
    /// unchanged line between consecutive blocks.
    pub changes: Vec<LineRangeMapping>,
    /// Moved blocks, when move computation was requested.
    pub moves: Vec<MovedText>,
    /// Set when the time budget ran out and the diff is a coarse
    /// approximation rather than a minimal script.
    pub hit_timeout: bool,
}

/// Groups character mappings into line mappings.
///
/// Mappings whose line ranges overlap or touch end up in the same
/// [`LineRangeMapping`]; the character mappings themselves are kept as the
/// inner changes.
pub(crate) fn line_range_mappings_from_range_mappings(
    mappings: &[RangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
    dont_assert_start_line: bool,
) -> Vec<LineRangeMapping> {
    let converted: Vec<LineRangeMapping> = mappings
        .iter()
        .map(|mapping| to_line_range_mapping(mapping, original_lines, modified_lines))
        .collect();

    let mut result: Vec<LineRangeMapping> = Vec::new();
    let mut group: Vec<LineRangeMapping> = Vec::new();
    for item in converted {
        let belongs = match group.last() {
            Some(last) => {
                last.original.overlap_or_touch(&item.original)
                    || last.modified.overlap_or_touch(&item.modified)
            }
            None => true,
        };
        if belongs {
            group.push(item);
        } else {
            result.push(collapse_group(group));
            group = vec![item];
        }
    }
    if !group.is_empty() {
        result.push(collapse_group(group));
    }

    debug_assert!(
        dont_assert_start_line
            || result.is_empty()
            || result[0].original.start == result[0].modified.start
    );
    debug_assert!(check_adjacent_items(&result, |a, b| {
        b.original.start - a.original.end == b.modified.start - a.modified.end
            // There has to be an unchanged line in between (otherwise both
            // diffs should have been joined).
            && a.original.end < b.original.start
            && a.modified.end < b.modified.start
    }));
    result
}

fn collapse_group(group: Vec<LineRangeMapping>) -> LineRangeMapping {
    let first = group.first().unwrap();
    let last = group.last().unwrap();
    LineRangeMapping::new(
        first.original.join(&last.original),
        first.modified.join(&last.modified),
        Some(
            group
                .iter()
                .map(|item| item.inner_changes.as_ref().unwrap()[0].clone())
                .collect(),
        ),
    )
}

/// Converts one character mapping to a line mapping.
///
/// A mapping that ends at column 1 of a line did not actually touch that
/// line, and a mapping that starts past the end of a line only touches the
/// following one; both cases shrink the reported line range accordingly.
fn to_line_range_mapping(
    mapping: &RangeMapping,
    original_lines: &[&str],
    modified_lines: &[&str],
) -> LineRangeMapping {
    let original = &mapping.original;
    let modified = &mapping.modified;
    let mut line_start_delta = 0usize;
    let mut line_end_delta = 0isize;
    if modified.end_column == 1
        && original.end_column == 1
        && original.start_line + line_start_delta <= original.end_line
        && modified.start_line + line_start_delta <= modified.end_line
    {
        line_end_delta = -1;
    }
    if modified.start_column - 1 >= char_count(modified_lines[modified.start_line - 1])
        && original.start_column - 1 >= char_count(original_lines[original.start_line - 1])
        && original.start_line as isize <= original.end_line as isize + line_end_delta
        && modified.start_line as isize <= modified.end_line as isize + line_end_delta
    {
        line_start_delta = 1;
    }
    LineRangeMapping::new(
        LineRange::new(
            original.start_line + line_start_delta,
            (original.end_line as isize + 1 + line_end_delta) as usize,
        ),
        LineRange::new(
            modified.start_line + line_start_delta,
            (modified.end_line as isize + 1 + line_end_delta) as usize,
        ),
        Some(vec![mapping.clone()]),
    )
}

/// Checks that every mapping points inside the documents.
pub(crate) fn validate_line_range_mappings(
    changes: &[LineRangeMapping],
    original_lines: &[&str],
    modified_lines: &[&str],
) -> bool {
    fn valid_position(position: Position, lines: &[&str]) -> bool {
        if position.line < 1 || position.line > lines.len() {
            return false;
        }
        position.column >= 1 && position.column <= char_count(lines[position.line - 1]) + 1
    }

    fn valid_line_range(range: &LineRange, lines: &[&str]) -> bool {
        range.start >= 1 && range.start <= lines.len() + 1 && range.end >= 1 && range.end <= lines.len() + 1
    }

    for change in changes {
        if !valid_line_range(&change.original, original_lines)
            || !valid_line_range(&change.modified, modified_lines)
        {
            return false;
        }
        if let Some(inner) = &change.inner_changes {
            for mapping in inner {
                if !(valid_position(mapping.original.start(), original_lines)
                    && valid_position(mapping.original.end(), original_lines)
                    && valid_position(mapping.modified.start(), modified_lines)
                    && valid_position(mapping.modified.end(), modified_lines))
                {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_line_range_mapping_plain() {
        let mapping = RangeMapping::new(
            TextRange::new(1, 3, 1, 4),
            TextRange::new(1, 3, 1, 4),
        );
        let result = to_line_range_mapping(&mapping, &["abcabc"], &["abXabc"]);
        assert_eq!(result.original, LineRange::new(1, 2));
        assert_eq!(result.modified, LineRange::new(1, 2));
    }

    #[test]
    fn test_to_line_range_mapping_full_lines() {
        // A deletion of complete lines ends at column 1 of the line after
        // the block, which must not count as part of the change.
        let mapping = RangeMapping::new(
            TextRange::new(2, 1, 4, 1),
            TextRange::new(2, 1, 2, 1),
        );
        let result = to_line_range_mapping(&mapping, &["a", "b", "c", "d"], &["a", "d"]);
        assert_eq!(result.original, LineRange::new(2, 4));
        assert_eq!(result.modified, LineRange::new(2, 2));
    }

    #[test]
    fn test_grouping_joins_touching_mappings() {
        let original = &["aa bb", "cc dd"];
        let modified = &["aa XX", "YY dd"];
        let mappings = vec![
            RangeMapping::new(TextRange::new(1, 4, 1, 6), TextRange::new(1, 4, 1, 6)),
            RangeMapping::new(TextRange::new(2, 1, 2, 3), TextRange::new(2, 1, 2, 3)),
        ];
        let result =
            line_range_mappings_from_range_mappings(&mappings, original, modified, false);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].original, LineRange::new(1, 3));
        assert_eq!(result[0].modified, LineRange::new(1, 3));
        assert_eq!(result[0].inner_changes.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_flip() {
        let mapping = LineRangeMapping::new(
            LineRange::new(2, 3),
            LineRange::new(2, 2),
            Some(vec![RangeMapping::new(
                TextRange::new(2, 1, 3, 1),
                TextRange::new(2, 1, 2, 1),
            )]),
        );
        let flipped = mapping.flip();
        assert_eq!(flipped.original, LineRange::new(2, 2));
        assert_eq!(flipped.modified, LineRange::new(2, 3));
        assert_eq!(flipped.flip(), mapping);
    }
}
