//! Source buffers and positions.
//!
//! A [`SourceBuffer`] is the immutable text plus identifying metadata (directory,
//! name, language tag) that every downstream phase — scanner, parser, analyzer,
//! evaluator — references by shared identity rather than by copying the text.
//! [`SourcePosition`] is a half-open span into a buffer; it is value-typed and
//! merges with `to`/`until` the way the original bootstrap interpreter's
//! `SourcePosition::to`/`until` do.

use std::{rc::Rc, sync::atomic::{AtomicUsize, Ordering}};

/// Immutable source text plus metadata identifying where it came from.
///
/// Two buffers are never compared for equality by content; identity is what
/// `SourcePosition` carries forward, so each buffer is tagged with a process-unique
/// id assigned on construction.
#[derive(Debug)]
pub struct SourceBuffer {
    id: usize,
    pub directory: String,
    pub name: String,
    pub language: String,
    pub text: String,
}

static NEXT_BUFFER_ID: AtomicUsize = AtomicUsize::new(0);

impl SourceBuffer {
    pub fn new(directory: impl Into<String>, name: impl Into<String>, language: impl Into<String>, text: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            directory: directory.into(),
            name: name.into(),
            language: language.into(),
            text: text.into(),
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The raw character slice spanned by a position, by byte offset.
    pub fn slice(&self, start: usize, end: usize) -> &str {
        &self.text[start..end]
    }
}

/// A half-open span `[startIndex, endIndex)` within a [`SourceBuffer`], carrying the
/// line/column of both endpoints. Line and column are 1-based to match the
/// diagnostic format in the external interface contract.
#[derive(Debug, Clone)]
pub struct SourcePosition {
    pub buffer: Rc<SourceBuffer>,
    pub start_index: usize,
    pub end_index: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl SourcePosition {
    /// The zero-width position at the very start of `buffer`.
    pub fn initial(buffer: Rc<SourceBuffer>) -> Self {
        Self {
            buffer,
            start_index: 0,
            end_index: 0,
            start_line: 1,
            start_column: 1,
            end_line: 1,
            end_column: 1,
        }
    }

    /// The text spanned by this position.
    pub fn value<'a>(&'a self) -> &'a str {
        self.buffer.slice(self.start_index, self.end_index)
    }

    /// Convex hull: `[self.start, other.end)`.
    pub fn to(&self, other: &SourcePosition) -> SourcePosition {
        SourcePosition {
            buffer: self.buffer.clone(),
            start_index: self.start_index,
            start_line: self.start_line,
            start_column: self.start_column,
            end_index: other.end_index,
            end_line: other.end_line,
            end_column: other.end_column,
        }
    }

    /// `[self.start, other.start)` — useful for spanning "everything up to where
    /// the next token begins" without including that token.
    pub fn until(&self, other: &SourcePosition) -> SourcePosition {
        SourcePosition {
            buffer: self.buffer.clone(),
            start_index: self.start_index,
            start_line: self.start_line,
            start_column: self.start_column,
            end_index: other.start_index,
            end_line: other.start_line,
            end_column: other.start_column,
        }
    }

    /// Format as `"<dir><name>:<line>.<col>-<line>.<col>"`, matching the external
    /// diagnostic contract verbatim — no separator between directory and name.
    pub fn format(&self) -> String {
        format!(
            "{}{}:{}.{}-{}.{}",
            self.buffer.directory, self.buffer.name, self.start_line, self.start_column, self.end_line, self.end_column
        )
    }
}

impl std::fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf() -> Rc<SourceBuffer> {
        SourceBuffer::new("", "t", "sysmel", "hello world")
    }

    #[test]
    fn to_spans_from_self_start_to_other_end() {
        let buffer = buf();
        let a = SourcePosition { buffer: buffer.clone(), start_index: 0, end_index: 2, start_line: 1, start_column: 1, end_line: 1, end_column: 3 };
        let b = SourcePosition { buffer, start_index: 6, end_index: 11, start_line: 1, start_column: 7, end_line: 1, end_column: 12 };
        let merged = a.to(&b);
        assert_eq!(merged.start_index, a.start_index);
        assert_eq!(merged.end_index, b.end_index);
    }

    #[test]
    fn until_ends_where_other_begins() {
        let buffer = buf();
        let a = SourcePosition { buffer: buffer.clone(), start_index: 0, end_index: 2, start_line: 1, start_column: 1, end_line: 1, end_column: 3 };
        let b = SourcePosition { buffer, start_index: 6, end_index: 11, start_line: 1, start_column: 7, end_line: 1, end_column: 12 };
        let merged = a.until(&b);
        assert_eq!(merged.end_index, b.start_index);
        assert_eq!(merged.end_column, b.start_column);
    }

    #[test]
    fn format_has_no_separator_between_directory_and_name() {
        let buffer = SourceBuffer::new("/tmp/", "cli", "sysmel", "x");
        let pos = SourcePosition::initial(buffer);
        assert_eq!(pos.format(), "/tmp/cli:1.1-1.1");
    }
}
