//! This crate implements an editor-grade diff engine: the diff you see in a
//! code editor's side-by-side view rather than the diff you see in a
//! terminal.  Changes are computed at the line level first, refined with
//! character-level inner changes, and post-processed so that edit boundaries
//! land where a reader expects them.
//!
//! The crate is split into two levels:
//!
//! * [`algorithms`]: This implements the raw diffing algorithms over a
//!   minimal sequence abstraction, together with the generic heuristic
//!   passes that rewrite a mechanically correct diff into a readable one.
//! * [`text`]: This extends the algorithms to text.  It splits documents
//!   into lines, orchestrates the two-level (line then character) diff and
//!   exposes the results as line/column mappings.
//!
//! # Example
//!
//! ```rust
//! use editdiff::{LineRange, LinesDiff};
//!
//! let diff = LinesDiff::compute(&["foo", "bar", "baz"], &["foo", "baz"]);
//! assert_eq!(diff.changes.len(), 1);
//! assert_eq!(diff.changes[0].original, LineRange::new(2, 3));
//! assert_eq!(diff.changes[0].modified, LineRange::new(2, 2));
//! assert!(!diff.hit_timeout);
//! ```
//!
//! All computation is synchronous and pure.  Long-running computations can
//! be bounded with a soft time budget; when the budget is exceeded the
//! differ returns a coarse whole-document diff flagged as
//! [`hit_timeout`](crate::text::LinesDiff::hit_timeout) instead of failing.
pub mod algorithms;
mod deadline_support;
pub mod ranges;
#[cfg(feature = "text")]
pub mod text;

pub use crate::ranges::OffsetRange;
#[cfg(feature = "text")]
pub use crate::text::{
    split_lines, DiffConfig, LineRange, LineRangeMapping, LinesDiff, MovedText, Position,
    RangeMapping, TextRange,
};
