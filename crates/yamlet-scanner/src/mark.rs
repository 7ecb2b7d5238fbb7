//! Source positions for diagnostics.

use std::fmt;
use std::sync::Arc;

/// A position in the source stream.
///
/// Marks are only used to report errors; they never influence how a document
/// is parsed. All counters are zero-based and count characters, not bytes.
#[derive(Clone, Default)]
pub struct Mark {
    /// Character offset from the start of the stream.
    pub index: usize,
    /// Line number.
    pub line: usize,
    /// Column number.
    pub column: usize,
    buffer: Option<Arc<[char]>>,
}

impl Mark {
    /// Create a mark without a source buffer. Such marks render without a snippet.
    #[inline]
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        Self {
            index,
            line,
            column,
            buffer: None,
        }
    }

    /// Create a mark that can render a snippet of `buffer`.
    #[inline]
    pub fn with_buffer(index: usize, line: usize, column: usize, buffer: Arc<[char]>) -> Self {
        Self {
            index,
            line,
            column,
            buffer: Some(buffer),
        }
    }

    /// Render the line containing this mark, with a caret under the column.
    ///
    /// Lines longer than `max_length` are cut around the mark and the cut
    /// sides are replaced by ` ... `.
    pub fn snippet(&self, indent: usize, max_length: usize) -> Option<String> {
        let buffer = self.buffer.as_ref()?;
        let pointer = self.index.min(buffer.len());
        let half = max_length / 2;

        let mut head = "";
        let mut start = pointer;
        while start > 0 && !is_snippet_break(buffer[start - 1]) {
            start -= 1;
            if pointer - start > half.saturating_sub(1) {
                head = " ... ";
                start += 5;
                break;
            }
        }

        let mut tail = "";
        let mut end = pointer;
        while end < buffer.len() && !is_snippet_break(buffer[end]) {
            end += 1;
            if end - pointer > half.saturating_sub(1) {
                tail = " ... ";
                end -= 5;
                break;
            }
        }

        let line: String = buffer[start..end.max(start)].iter().collect();
        let caret = indent + pointer.saturating_sub(start) + head.len();
        Some(format!(
            "{}{}{}{}\n{}^",
            " ".repeat(indent),
            head,
            line,
            tail,
            " ".repeat(caret)
        ))
    }
}

fn is_snippet_break(c: char) -> bool {
    matches!(c, '\0' | '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.line == other.line && self.column == other.column
    }
}

impl Eq for Mark {}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.line, self.column, self.index)
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  on line {}, column {}", self.line + 1, self.column + 1)?;
        if let Some(snippet) = self.snippet(4, 75) {
            write!(f, ":\n{snippet}")?;
        }
        Ok(())
    }
}
