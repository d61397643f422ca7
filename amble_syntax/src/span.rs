//! Source positions for tokens, syntax nodes, and diagnostics.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A region of the source buffer.
///
/// `start`/`end` are byte offsets (end exclusive); `line`/`column` are 1-based
/// and describe where the span begins. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Zero-width span at the very beginning of a document.
    pub const fn at_start() -> Self {
        Self::new(0, 0, 1, 1)
    }

    /// Span from the start of `self` to the end of `other`.
    #[must_use]
    pub fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.start),
            line: self.line,
            column: self.column,
        }
    }

    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The text this span covers in `source`, or "" if the span lies outside it.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Line index over a source buffer, used to recover line text for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceMap<'src> {
    line_starts: Vec<usize>,
    src: &'src str,
}

impl<'src> SourceMap<'src> {
    pub fn new(src: &'src str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, ch) in src.char_indices() {
            if ch == '\n' {
                line_starts.push(i + 1);
            }
        }
        Self { line_starts, src }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based (line, column) for a byte offset. Offsets past the end clamp to the last line.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(idx).copied().unwrap_or(0);
        let end = offset.min(self.src.len());
        let col = self
            .src
            .get(line_start..end)
            .map_or(0, |prefix| prefix.chars().count());
        (idx + 1, col + 1)
    }

    /// Text of a 1-based line without its terminator.
    pub fn line_snippet(&self, line_no: usize) -> &'src str {
        let Some(&start) = self.line_starts.get(line_no.saturating_sub(1)) else {
            return "";
        };
        let end = self.line_starts.get(line_no).copied().unwrap_or(self.src.len());
        self.src[start..end].trim_end_matches(['\r', '\n'])
    }
}
