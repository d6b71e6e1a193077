//! The sequence implementations the text layer feeds into the algorithms.
use std::collections::HashMap;

use crate::algorithms::{BoundaryScored, Sequence};
use crate::ranges::OffsetRange;
use crate::text::ranges::{Position, TextRange};

/// The lines of one document, compared by their trimmed content.
///
/// Both sides of a diff share one interner so that equal trimmed lines get
/// equal element ids across the two sequences.
pub(crate) struct LineSequence<'a> {
    trimmed_ids: Vec<usize>,
    lines: &'a [&'a str],
}

impl<'a> LineSequence<'a> {
    pub(crate) fn new(
        lines: &'a [&'a str],
        interner: &mut HashMap<&'a str, usize>,
    ) -> LineSequence<'a> {
        let trimmed_ids = lines
            .iter()
            .map(|line| {
                let trimmed = line.trim();
                let next_id = interner.len();
                *interner.entry(trimmed).or_insert(next_id)
            })
            .collect();
        LineSequence { trimmed_ids, lines }
    }

    pub(crate) fn line(&self, offset: usize) -> &'a str {
        self.lines[offset]
    }
}

impl Sequence for LineSequence<'_> {
    type Element = usize;

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn element(&self, offset: usize) -> usize {
        self.trimmed_ids[offset]
    }
}

impl BoundaryScored for LineSequence<'_> {
    /// Breaks next to lines with little indentation are preferred, so that
    /// a change inside a deeply nested block does not get anchored to the
    /// block's interior when an equally valid outer position exists.
    fn boundary_score(&self, offset: usize) -> i64 {
        let indentation_before = if offset == 0 {
            0
        } else {
            indentation(self.lines[offset - 1])
        };
        let indentation_after = if offset == self.lines.len() {
            0
        } else {
            indentation(self.lines[offset])
        };
        1000 - (indentation_before + indentation_after) as i64
    }
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|&c| c == ' ' || c == '\t').count()
}

/// The characters of a contiguous line range, newline-joined, with enough
/// bookkeeping to translate element offsets back into document positions.
pub(crate) struct CharSequence {
    elements: Vec<char>,
    line_range: OffsetRange,
    /// For every line of the range that is followed by a newline element,
    /// the element offset just past that newline.
    first_element_offset_by_line: Vec<usize>,
    /// The number of leading characters trimmed from each line.
    trim_offset_by_line: Vec<usize>,
}

impl CharSequence {
    /// Builds the character sequence of `range`.
    ///
    /// With `consider_whitespace_changes` every character is kept verbatim;
    /// otherwise each line is trimmed and the removed leading width is
    /// remembered so columns can still be translated back.
    pub(crate) fn new(
        lines: &[&str],
        range: OffsetRange,
        consider_whitespace_changes: bool,
    ) -> CharSequence {
        let mut range = range;
        // When the range reaches the end of the document the position after
        // the final newline must stay addressable; widen one line up and
        // blank that line so only its end position contributes elements.
        let mut blank_first_line = false;
        if range.start > 0 && range.end >= lines.len() {
            range = OffsetRange::new(range.start - 1, range.end);
            blank_first_line = true;
        }

        let mut elements: Vec<char> = Vec::new();
        let mut first_element_offset_by_line = Vec::new();
        let mut trim_offset_by_line = Vec::new();
        for i in range.start..range.end {
            let mut line = lines[i];
            let mut offset = 0;
            if blank_first_line {
                offset = char_count(line);
                line = "";
                blank_first_line = false;
            } else if !consider_whitespace_changes {
                let trimmed = line.trim_start();
                offset = char_count(line) - char_count(trimmed);
                line = trimmed.trim_end();
            }
            trim_offset_by_line.push(offset);
            elements.extend(line.chars());
            if i < lines.len() - 1 {
                elements.push('\n');
                first_element_offset_by_line.push(elements.len());
            }
        }
        trim_offset_by_line.push(0);

        CharSequence {
            elements,
            line_range: range,
            first_element_offset_by_line,
            trim_offset_by_line,
        }
    }

    /// Translates an element offset into a document position.
    pub(crate) fn translate_offset(&self, offset: usize) -> Position {
        if self.line_range.is_empty() {
            return Position::new(self.line_range.start + 1, 1);
        }
        // The number of newline boundaries at or before the offset is the
        // line index within the range.
        let mut low = 0;
        let mut high = self.first_element_offset_by_line.len();
        while low < high {
            let mid = (low + high) / 2;
            if self.first_element_offset_by_line[mid] > offset {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        let line_start_offset = if low == 0 {
            0
        } else {
            self.first_element_offset_by_line[low - 1]
        };
        Position::new(
            self.line_range.start + low + 1,
            offset - line_start_offset + 1 + self.trim_offset_by_line[low],
        )
    }

    /// Translates an element range into a document range.
    pub(crate) fn translate_range(&self, range: &OffsetRange) -> TextRange {
        TextRange::from_positions(
            self.translate_offset(range.start),
            self.translate_offset(range.end),
        )
    }

    /// Finds the maximal alphanumeric run containing the given offset.
    pub(crate) fn find_word_containing(&self, offset: isize) -> Option<OffsetRange> {
        if offset < 0 || offset as usize >= self.elements.len() {
            return None;
        }
        let offset = offset as usize;
        if !is_word_char(self.elements[offset]) {
            return None;
        }
        let mut start = offset;
        while start > 0 && is_word_char(self.elements[start - 1]) {
            start -= 1;
        }
        let mut end = offset;
        while end < self.elements.len() && is_word_char(self.elements[end]) {
            end += 1;
        }
        Some(OffsetRange::new(start, end))
    }

    /// The text covered by an element range.
    pub(crate) fn get_text(&self, range: &OffsetRange) -> String {
        self.elements[range.start..range.end].iter().collect()
    }

    /// The number of line boundaries an element range spans.
    pub(crate) fn count_lines_in(&self, range: &OffsetRange) -> usize {
        self.translate_offset(range.end).line - self.translate_offset(range.start).line
    }
}

impl Sequence for CharSequence {
    type Element = char;

    fn len(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, offset: usize) -> char {
        self.elements[offset]
    }
}

impl BoundaryScored for CharSequence {
    fn boundary_score(&self, offset: usize) -> i64 {
        let prev_category = category(if offset > 0 {
            Some(self.elements[offset - 1])
        } else {
            None
        });
        let next_category = category(if offset < self.elements.len() {
            Some(self.elements[offset])
        } else {
            None
        });
        if prev_category == CharCategory::LineBreakCr && next_category == CharCategory::LineBreakLf
        {
            // A boundary inside "\r\n" is never a good one.
            return 0;
        }
        let mut score = 0;
        if prev_category != next_category {
            score += 10;
            if next_category == CharCategory::WordUpper {
                score += 1;
            }
        }
        score + category_bonus(prev_category) + category_bonus(next_category)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharCategory {
    WordLower,
    WordUpper,
    WordNumber,
    End,
    Other,
    Space,
    LineBreakCr,
    LineBreakLf,
}

fn category(c: Option<char>) -> CharCategory {
    match c {
        Some('\n') => CharCategory::LineBreakLf,
        Some('\r') => CharCategory::LineBreakCr,
        Some(' ') | Some('\t') => CharCategory::Space,
        Some(c) if c.is_ascii_lowercase() => CharCategory::WordLower,
        Some(c) if c.is_ascii_uppercase() => CharCategory::WordUpper,
        Some(c) if c.is_ascii_digit() => CharCategory::WordNumber,
        Some(_) => CharCategory::Other,
        None => CharCategory::End,
    }
}

fn category_bonus(category: CharCategory) -> i64 {
    match category {
        CharCategory::WordLower | CharCategory::WordUpper | CharCategory::WordNumber => 0,
        CharCategory::End => 10,
        CharCategory::Other => 2,
        CharCategory::Space => 3,
        CharCategory::LineBreakCr | CharCategory::LineBreakLf => 10,
    }
}

pub(crate) fn char_count(line: &str) -> usize {
    line.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_sequence_interning() {
        let mut interner = HashMap::new();
        let seq1 = LineSequence::new(&["foo", "  bar", "foo"], &mut interner);
        let seq2 = LineSequence::new(&["bar  ", "baz"], &mut interner);
        assert_eq!(seq1.element(0), seq1.element(2));
        // "  bar" and "bar  " trim to the same element.
        assert_eq!(seq1.element(1), seq2.element(0));
        assert_ne!(seq1.element(0), seq2.element(1));
    }

    #[test]
    fn test_line_boundary_score_prefers_flat_lines() {
        let mut interner = HashMap::new();
        let seq = LineSequence::new(&["fn main() {", "    body();", "}"], &mut interner);
        assert!(seq.boundary_score(0) > seq.boundary_score(2));
    }

    #[test]
    fn test_char_sequence_translation() {
        let lines = &["ab", "cde", "f"];
        let seq = CharSequence::new(lines, OffsetRange::new(0, 2), true);
        // Elements: a b \n c d e \n
        assert_eq!(seq.len(), 7);
        assert_eq!(seq.translate_offset(0), Position::new(1, 1));
        assert_eq!(seq.translate_offset(2), Position::new(1, 3));
        assert_eq!(seq.translate_offset(3), Position::new(2, 1));
        assert_eq!(seq.translate_offset(5), Position::new(2, 3));
        assert_eq!(
            seq.translate_range(&OffsetRange::new(1, 4)),
            TextRange::new(1, 2, 2, 2)
        );
        assert_eq!(seq.count_lines_in(&OffsetRange::new(0, 5)), 1);
    }

    #[test]
    fn test_char_sequence_trimming() {
        let lines = &["  ab  ", "c"];
        let seq = CharSequence::new(lines, OffsetRange::new(0, 1), false);
        // Only the trimmed "ab" plus the newline remain.
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.element(0), 'a');
        // Columns still point into the untrimmed line.
        assert_eq!(seq.translate_offset(0), Position::new(1, 3));
        assert_eq!(seq.translate_offset(2), Position::new(1, 5));
    }

    #[test]
    fn test_char_sequence_widens_at_document_end() {
        let lines = &["ab", "cd"];
        let seq = CharSequence::new(lines, OffsetRange::new(1, 2), true);
        // The range is widened one line up with the first line blanked, so
        // the elements are just "\ncd" and offset 0 addresses the end of
        // the first line.
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.element(0), '\n');
        assert_eq!(seq.translate_offset(0), Position::new(1, 3));
        assert_eq!(seq.translate_offset(1), Position::new(2, 1));
        assert_eq!(seq.translate_offset(3), Position::new(2, 3));
    }

    #[test]
    fn test_find_word_containing() {
        let lines = &["foo bar42 baz"];
        let seq = CharSequence::new(lines, OffsetRange::new(0, 1), true);
        assert_eq!(seq.find_word_containing(5), Some(OffsetRange::new(4, 9)));
        assert_eq!(seq.find_word_containing(3), None);
        assert_eq!(seq.find_word_containing(-1), None);
        assert_eq!(seq.find_word_containing(13), None);
    }

    #[test]
    fn test_boundary_score_favors_word_edges() {
        let lines = &["fooBar baz"];
        let seq = CharSequence::new(lines, OffsetRange::new(0, 1), true);
        // Inside "foo" there is no category change at all.
        assert_eq!(seq.boundary_score(2), 0);
        // "o|B" is a camel-case boundary, "r| " a word/space one.
        assert_eq!(seq.boundary_score(3), 11);
        assert_eq!(seq.boundary_score(6), 13);
        // The sequence ends score highest.
        assert_eq!(seq.boundary_score(0), 20);
    }
}
