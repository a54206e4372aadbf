//! Source location spans and diagnostic locations.
//!
//! `Span` is the compact byte-range representation produced by the lexer.
//! `Location` is the human-facing `file:line:column` form attached to every
//! AST node at construction time. Locations are write-once: nothing in the
//! compiler mutates a location after the node is built, and nothing outside
//! diagnostics reads one.

use std::fmt;
use std::sync::Arc;

/// Source location span in byte offsets.
///
/// Layout: 8 bytes total
/// - start: u32 - byte offset from file start
/// - end: u32 - byte offset (exclusive)
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Dummy span for synthesized nodes (auto-filled enumerator values,
    /// auto-assigned ids).
    pub const DUMMY: Span = Span { start: 0, end: 0 };

    /// Create a new span.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Create from a byte range.
    ///
    /// # Panics
    /// Panics if the range exceeds `u32::MAX` bytes. Input files are
    /// length-checked before lexing, so this is an internal invariant.
    #[inline]
    pub fn from_range(range: std::ops::Range<usize>) -> Self {
        let start = u32::try_from(range.start)
            .unwrap_or_else(|_| panic!("span start {} exceeds u32::MAX", range.start));
        let end = u32::try_from(range.end)
            .unwrap_or_else(|_| panic!("span end {} exceeds u32::MAX", range.end));
        Span { start, end }
    }

    /// Length of the span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Merge two spans to create one covering both.
    #[inline]
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Convert to a `std::ops::Range`.
    #[inline]
    pub fn to_range(&self) -> std::ops::Range<usize> {
        self.start as usize..self.end as usize
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Line/column lookup table for one source file.
///
/// Built once per file from the raw text; converts byte offsets from `Span`
/// into 1-based line/column pairs for `Location` construction.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    /// Byte offset of the start of each line, in ascending order.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build the index for a source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// 1-based (line, column) for a byte offset.
    ///
    /// Offsets past the last line clamp to the final line.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let col = offset - self.line_starts[line];
        (line as u32 + 1, col + 1)
    }
}

/// Human-facing source location: `file:line:column`.
///
/// Attached to every AST node when it is built and never mutated afterwards.
/// Locations carry no semantic meaning; they exist purely for diagnostics.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Location {
    /// Path of the source file, shared across all nodes of one document.
    pub file: Arc<str>,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl Location {
    /// Create a location directly from its parts.
    pub fn new(file: Arc<str>, line: u32, column: u32) -> Self {
        Location { file, line, column }
    }

    /// Create a location from a span's start offset using a line index.
    pub fn from_span(file: &Arc<str>, index: &LineIndex, span: Span) -> Self {
        let (line, column) = index.line_col(span.start);
        Location {
            file: Arc::clone(file),
            line,
            column,
        }
    }

    /// Location for synthesized nodes that have no source form.
    pub fn generated(file: &Arc<str>) -> Self {
        Location {
            file: Arc::clone(file),
            line: 0,
            column: 0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}
