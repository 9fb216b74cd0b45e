//! Source location tracking for diagnostics.
//!
//! Positions pair a zero-origin byte offset with a one-origin
//! (line, column); a [`Span`] is the half-open range `[start, end)`
//! covering a lexeme or an AST subtree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from start of the buffer (0-indexed)
    pub offset: usize,
}

impl SourceLocation {
    /// Create a new source location.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A half-open span `[start, end)` in source code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start line (1-indexed)
    pub start_line: usize,
    /// Start column (1-indexed)
    pub start_column: usize,
    /// End line (1-indexed)
    pub end_line: usize,
    /// End column (1-indexed, exclusive)
    pub end_column: usize,
    /// Byte offset of start (inclusive)
    pub start_offset: usize,
    /// Byte offset of end (exclusive)
    pub end_offset: usize,
}

impl Span {
    /// Create a span from start and end locations.
    pub fn from_locations(start: SourceLocation, end: SourceLocation) -> Self {
        Self {
            start_line: start.line,
            start_column: start.column,
            end_line: end.line,
            end_column: end.column,
            start_offset: start.offset,
            end_offset: end.offset,
        }
    }

    /// A zero-width span (used for synthesized entities such as builtins).
    pub fn dummy() -> Self {
        Self::default()
    }

    /// Get the start location.
    pub fn start(&self) -> SourceLocation {
        SourceLocation {
            line: self.start_line,
            column: self.start_column,
            offset: self.start_offset,
        }
    }

    /// Get the end location.
    pub fn end(&self) -> SourceLocation {
        SourceLocation {
            line: self.end_line,
            column: self.end_column,
            offset: self.end_offset,
        }
    }

    /// The union of two spans: the smallest span covering both.
    pub fn merge(&self, other: &Span) -> Span {
        let start = if self.start_offset <= other.start_offset {
            self.start()
        } else {
            other.start()
        };
        let end = if self.end_offset >= other.end_offset {
            self.end()
        } else {
            other.end()
        };
        Span::from_locations(start, end)
    }

    /// Whether `other` lies entirely within this span.
    pub fn contains(&self, other: &Span) -> bool {
        self.start_offset <= other.start_offset && other.end_offset <= self.end_offset
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}-{}", self.start_line, self.start_column, self.end_column)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.start_line, self.start_column, self.end_line, self.end_column
            )
        }
    }
}

/// An owned copy of the source plus an index of line starts. The lexer
/// builds one per buffer and derives every span location through it;
/// the host can reuse it to put source lines next to diagnostics.
#[derive(Debug, Clone)]
pub struct SourceMap {
    text: String,
    line_starts: Vec<usize>,
}

impl SourceMap {
    /// Build a source map for the given buffer.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    /// The underlying source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The location of a byte offset. Offsets at or past the end of the
    /// buffer land on the last line.
    pub fn location(&self, offset: usize) -> SourceLocation {
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        SourceLocation::new(line + 1, offset - self.line_starts[line] + 1, offset)
    }

    /// The text a span projects to.
    pub fn span_text(&self, span: &Span) -> &str {
        &self.text[span.start_offset..span.end_offset]
    }

    /// A single line of source, without its trailing newline.
    pub fn line(&self, line_number: usize) -> Option<&str> {
        let start = *self.line_starts.get(line_number.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line_number)
            .copied()
            .unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\n'))
    }

    /// Number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
