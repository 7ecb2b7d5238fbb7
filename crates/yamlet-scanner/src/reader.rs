//! Character source for the scanner.

use std::sync::Arc;

use crate::{Error, ErrorKind, Mark, Result};

/// Validated source text with a forward-only cursor.
///
/// The whole input is checked for printable characters up front, then a `\0`
/// sentinel is appended so lookahead past the end never needs a bounds check.
#[derive(Debug, Clone)]
pub struct Reader {
    buffer: Arc<[char]>,
    pointer: usize,
    line: usize,
    column: usize,
}

impl Reader {
    /// Create a reader over `source`.
    pub fn new(source: &str) -> Result<Self> {
        let buffer: Arc<[char]> = source.chars().chain(std::iter::once('\0')).collect();
        let reader = Self {
            buffer,
            pointer: 0,
            line: 0,
            column: 0,
        };
        reader.check_printable()?;
        Ok(reader)
    }

    /// Create a reader over raw bytes.
    ///
    /// A UTF-16 byte order mark selects UTF-16 decoding; anything else must be UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let decoded = match bytes {
            [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes)?,
            [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes)?,
            _ => std::str::from_utf8(bytes)
                .map_err(|err| {
                    Error::new(ErrorKind::Reader, format!("invalid UTF-8 input: {err}"))
                        .with_mark(Mark::new(err.valid_up_to(), 0, 0))
                })?
                .to_owned(),
        };
        Self::new(&decoded)
    }

    /// The character `index` positions ahead of the cursor, or `\0` past the end.
    #[inline]
    pub fn peek(&self, index: usize) -> char {
        self.buffer
            .get(self.pointer + index)
            .copied()
            .unwrap_or('\0')
    }

    /// The next `length` characters.
    pub fn prefix(&self, length: usize) -> String {
        let end = (self.pointer + length).min(self.buffer.len());
        self.buffer[self.pointer..end].iter().collect()
    }

    /// Advance by `length` characters, tracking lines and columns.
    pub fn forward(&mut self, length: usize) {
        let last = self.buffer.len().saturating_sub(1);
        for _ in 0..length {
            if self.pointer >= last {
                break;
            }
            let ch = self.buffer[self.pointer];
            self.pointer += 1;
            if matches!(ch, '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
                || (ch == '\r' && self.buffer[self.pointer] != '\n')
            {
                self.line += 1;
                self.column = 0;
            } else if ch != '\u{FEFF}' {
                self.column += 1;
            }
        }
    }

    /// The current position.
    #[inline]
    pub fn mark(&self) -> Mark {
        Mark::with_buffer(self.pointer, self.line, self.column, self.buffer.clone())
    }

    /// Character offset of the cursor.
    #[inline]
    pub fn index(&self) -> usize {
        self.pointer
    }

    /// Line of the cursor.
    #[inline]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Column of the cursor.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    fn check_printable(&self) -> Result<()> {
        let body = &self.buffer[..self.buffer.len() - 1];
        let Some(position) = body.iter().position(|&c| !is_printable(c)) else {
            return Ok(());
        };
        let mut probe = self.clone();
        probe.forward(position);
        let ch = body[position];
        Err(Error::new(
            ErrorKind::Reader,
            format!(
                "unacceptable character #x{:04x}: special characters are not allowed",
                ch as u32
            ),
        )
        .with_mark(probe.mark()))
    }
}

fn is_printable(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{7E}'
        | '\u{85}'
        | '\u{A0}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::new(
            ErrorKind::Reader,
            "invalid UTF-16 input: odd number of bytes",
        ));
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|err| Error::new(ErrorKind::Reader, format!("invalid UTF-16 input: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_peek_past_end_is_sentinel() {
        let reader = Reader::new("ab").unwrap();
        assert_eq!(reader.peek(0), 'a');
        assert_eq!(reader.peek(2), '\0');
        assert_eq!(reader.peek(50), '\0');
        assert_eq!(reader.prefix(10), "ab\0");
    }

    #[test]
    fn test_forward_tracks_lines() {
        let mut reader = Reader::new("a\r\nb\rc\u{2028}d").unwrap();
        reader.forward(3);
        assert_eq!((reader.line(), reader.column()), (1, 0));
        reader.forward(2);
        assert_eq!((reader.line(), reader.column()), (2, 0));
        reader.forward(2);
        assert_eq!((reader.line(), reader.column()), (3, 0));
        assert_eq!(reader.peek(0), 'd');
    }

    #[test]
    fn test_forward_stops_at_sentinel() {
        let mut reader = Reader::new("a").unwrap();
        reader.forward(10);
        assert_eq!(reader.index(), 1);
        assert_eq!(reader.peek(0), '\0');
    }

    #[test]
    fn test_rejects_control_characters() {
        let err = Reader::new("ok\nbad\u{7}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Reader);
        assert!(err.problem.contains("#x0007"));
        let mark = err.problem_mark.unwrap();
        assert_eq!((mark.line, mark.column), (1, 3));
    }

    #[test]
    fn test_utf16_bom() {
        let bytes = [0xFF, 0xFE, b'h', 0, b'i', 0];
        let reader = Reader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.prefix(2), "hi");
    }
}
