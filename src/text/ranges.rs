//! Coordinate types for text documents.
use std::fmt;

/// A position in a document.
///
/// Lines and columns are 1-based; columns count characters, not bytes.
/// Column `len + 1` addresses the end of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Creates a new position.
    pub fn new(line: usize, column: usize) -> Position {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.line, self.column)
    }
}

/// A range in a document expressed in line/column coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextRange {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl TextRange {
    /// Creates a new range from its four coordinates.
    pub fn new(
        start_line: usize,
        start_column: usize,
        end_line: usize,
        end_column: usize,
    ) -> TextRange {
        TextRange {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Creates a range between two positions.
    pub fn from_positions(start: Position, end: Position) -> TextRange {
        TextRange::new(start.line, start.column, end.line, end.column)
    }

    /// The start position of the range.
    pub fn start(&self) -> Position {
        Position::new(self.start_line, self.start_column)
    }

    /// The end position of the range.
    pub fn end(&self) -> Position {
        Position::new(self.end_line, self.end_column)
    }

    /// Returns `true` if start and end coincide.
    pub fn is_empty(&self) -> bool {
        self.start() == self.end()
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{},{} -> {},{}]",
            self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

/// A half-open range of lines `[start, end)`, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    /// Creates a new line range.
    pub fn new(start: usize, end: usize) -> LineRange {
        debug_assert!(start <= end, "invalid line range: [{},{})", start, end);
        LineRange { start, end }
    }

    /// Returns `true` if the range contains no lines.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The number of lines in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// The smallest range containing both ranges.
    pub fn join(&self, other: &LineRange) -> LineRange {
        LineRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Returns `true` if the ranges overlap or are directly adjacent.
    pub fn overlap_or_touch(&self, other: &LineRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{},{})", self.start, self.end)
    }
}

#[test]
fn test_line_range_join() {
    let a = LineRange::new(1, 3);
    let b = LineRange::new(5, 8);
    assert_eq!(a.join(&b), LineRange::new(1, 8));
}

#[test]
fn test_line_range_overlap_or_touch() {
    let a = LineRange::new(1, 3);
    assert!(a.overlap_or_touch(&LineRange::new(3, 4)));
    assert!(a.overlap_or_touch(&LineRange::new(2, 2)));
    assert!(!a.overlap_or_touch(&LineRange::new(4, 5)));
}

#[test]
fn test_display() {
    assert_eq!(LineRange::new(2, 4).to_string(), "[2,4)");
    assert_eq!(Position::new(1, 5).to_string(), "(1,5)");
    assert_eq!(TextRange::new(1, 1, 2, 4).to_string(), "[1,1 -> 2,4]");
}
