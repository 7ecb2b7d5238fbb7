//! Scalar analysis and the five scalar writers.

use std::fmt;

use yamlet_tree::Result;

use super::Emitter;

/// Which styles can carry a scalar's text unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct ScalarAnalysis {
    pub empty: bool,
    pub multiline: bool,
    pub allow_flow_plain: bool,
    pub allow_block_plain: bool,
    pub allow_single_quoted: bool,
    pub allow_double_quoted: bool,
    pub allow_block: bool,
}

pub(super) fn is_break(ch: char) -> bool {
    matches!(ch, '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

fn is_blank_or_break(ch: char) -> bool {
    matches!(ch, '\0' | ' ' | '\t' | '\r') || is_break(ch)
}

fn is_printable_unicode(ch: char) -> bool {
    (ch == '\u{85}'
        || ('\u{A0}'..='\u{D7FF}').contains(&ch)
        || ('\u{E000}'..='\u{FFFD}').contains(&ch)
        || ('\u{10000}'..'\u{10FFFF}').contains(&ch))
        && ch != '\u{FEFF}'
}

impl ScalarAnalysis {
    pub(super) fn analyze(scalar: &str, allow_unicode: bool) -> Self {
        let chars: Vec<char> = scalar.chars().collect();
        if chars.is_empty() {
            return Self {
                empty: true,
                multiline: false,
                allow_flow_plain: false,
                allow_block_plain: true,
                allow_single_quoted: true,
                allow_double_quoted: true,
                allow_block: false,
            };
        }

        let mut block_indicators = false;
        let mut flow_indicators = false;
        let mut line_breaks = false;
        let mut special_characters = false;

        let mut leading_space = false;
        let mut leading_break = false;
        let mut trailing_space = false;
        let mut trailing_break = false;
        let mut break_space = false;
        let mut space_break = false;

        if scalar.starts_with("---") || scalar.starts_with("...") {
            block_indicators = true;
            flow_indicators = true;
        }

        let mut preceded_by_whitespace = true;
        let mut followed_by_whitespace = chars.len() == 1 || is_blank_or_break(chars[1]);
        let mut previous_space = false;
        let mut previous_break = false;
        let last = chars.len() - 1;

        for (index, &ch) in chars.iter().enumerate() {
            if index == 0 {
                if "#,[]{}&*!|>'\"%@`".contains(ch) {
                    flow_indicators = true;
                    block_indicators = true;
                }
                if ch == '?' || ch == ':' {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                if ch == '-' && followed_by_whitespace {
                    flow_indicators = true;
                    block_indicators = true;
                }
            } else {
                if ",?[]{}".contains(ch) {
                    flow_indicators = true;
                }
                if ch == ':' {
                    flow_indicators = true;
                    if followed_by_whitespace {
                        block_indicators = true;
                    }
                }
                if ch == '#' && preceded_by_whitespace {
                    flow_indicators = true;
                    block_indicators = true;
                }
            }

            if is_break(ch) {
                line_breaks = true;
            }
            if !(ch == '\n' || (' '..='~').contains(&ch))
                && (!is_printable_unicode(ch) || !allow_unicode)
            {
                special_characters = true;
            }

            if ch == ' ' {
                if index == 0 {
                    leading_space = true;
                }
                if index == last {
                    trailing_space = true;
                }
                if previous_break {
                    break_space = true;
                }
                previous_space = true;
                previous_break = false;
            } else if is_break(ch) {
                if index == 0 {
                    leading_break = true;
                }
                if index == last {
                    trailing_break = true;
                }
                if previous_space {
                    space_break = true;
                }
                previous_space = false;
                previous_break = true;
            } else {
                previous_space = false;
                previous_break = false;
            }

            preceded_by_whitespace = is_blank_or_break(ch);
            followed_by_whitespace = chars.get(index + 2).is_none_or(|&next| is_blank_or_break(next));
        }

        let mut analysis = Self {
            empty: false,
            multiline: line_breaks,
            allow_flow_plain: true,
            allow_block_plain: true,
            allow_single_quoted: true,
            allow_double_quoted: true,
            allow_block: true,
        };
        if leading_space || leading_break || trailing_space || trailing_break {
            analysis.allow_flow_plain = false;
            analysis.allow_block_plain = false;
        }
        if trailing_space {
            analysis.allow_block = false;
        }
        if break_space {
            analysis.allow_flow_plain = false;
            analysis.allow_block_plain = false;
            analysis.allow_single_quoted = false;
        }
        if space_break || special_characters {
            analysis.allow_flow_plain = false;
            analysis.allow_block_plain = false;
            analysis.allow_single_quoted = false;
            analysis.allow_block = false;
        }
        if line_breaks {
            analysis.allow_flow_plain = false;
            analysis.allow_block_plain = false;
        }
        if flow_indicators {
            analysis.allow_flow_plain = false;
        }
        if block_indicators {
            analysis.allow_block_plain = false;
        }
        analysis
    }
}

/// Short escape for `ch` inside double quotes, without the backslash.
fn short_escape(ch: char) -> Option<char> {
    Some(match ch {
        '\0' => '0',
        '\x07' => 'a',
        '\x08' => 'b',
        '\t' => 't',
        '\n' => 'n',
        '\x0B' => 'v',
        '\x0C' => 'f',
        '\r' => 'r',
        '\x1B' => 'e',
        '"' => '"',
        '\\' => '\\',
        '\u{85}' => 'N',
        '\u{A0}' => '_',
        '\u{2028}' => 'L',
        '\u{2029}' => 'P',
        _ => return None,
    })
}

fn escape(ch: char) -> String {
    match short_escape(ch) {
        Some(short) => format!("\\{short}"),
        None if (ch as u32) <= 0xFF => format!("\\x{:02X}", ch as u32),
        None if (ch as u32) <= 0xFFFF => format!("\\u{:04X}", ch as u32),
        None => format!("\\U{:08X}", ch as u32),
    }
}

impl<W: fmt::Write> Emitter<W> {
    fn needs_escape(&self, ch: char) -> bool {
        matches!(ch, '"' | '\\' | '\u{85}' | '\u{2028}' | '\u{2029}' | '\u{FEFF}')
            || !((' '..='~').contains(&ch)
                || (self.allow_unicode
                    && (('\u{A0}'..='\u{D7FF}').contains(&ch)
                        || ('\u{E000}'..='\u{FFFD}').contains(&ch))))
    }

    /// Write a break copied from the scalar, normalizing `\n` to the
    /// configured line break.
    fn write_break_char(&mut self, brk: char) -> Result<()> {
        if brk == '\n' {
            self.write_line_break(None)
        } else {
            self.write_line_break(Some(brk))
        }
    }

    /// Indentation indicator and chomping indicator for a block scalar.
    fn block_hints(&self, text: &[char]) -> String {
        let mut hints = String::new();
        let (Some(&first), Some(&last)) = (text.first(), text.last()) else {
            return hints;
        };
        if first == ' ' || is_break(first) {
            hints.push_str(&self.best_indent.to_string());
        }
        if !is_break(last) {
            hints.push('-');
        } else if text.len() == 1 || is_break(text[text.len() - 2]) {
            hints.push('+');
        }
        hints
    }

    pub(super) fn write_plain(&mut self, text: &[char], split: bool) -> Result<()> {
        if self.root_context {
            self.open_ended = true;
        }
        if text.is_empty() {
            return Ok(());
        }
        if !self.whitespace {
            self.write_chunk(&[' '])?;
        }
        self.whitespace = false;
        self.indention = false;

        let mut spaces = false;
        let mut breaks = false;
        let mut start = 0;
        let mut end = 0;
        while end <= text.len() {
            let ch = text.get(end).copied();
            if spaces {
                if ch != Some(' ') {
                    if start + 1 == end && self.column > self.best_width && split {
                        self.write_indent()?;
                        self.whitespace = false;
                        self.indention = false;
                    } else {
                        self.write_chunk(&text[start..end])?;
                    }
                    start = end;
                }
            } else if breaks {
                if !ch.is_some_and(is_break) {
                    if text[start] == '\n' {
                        self.write_line_break(None)?;
                    }
                    for &brk in &text[start..end] {
                        self.write_break_char(brk)?;
                    }
                    self.write_indent()?;
                    self.whitespace = false;
                    self.indention = false;
                    start = end;
                }
            } else if ch.is_none_or(|c| c == ' ' || is_break(c)) {
                self.write_chunk(&text[start..end])?;
                start = end;
            }
            if let Some(c) = ch {
                spaces = c == ' ';
                breaks = is_break(c);
            }
            end += 1;
        }
        Ok(())
    }

    pub(super) fn write_single_quoted(&mut self, text: &[char], split: bool) -> Result<()> {
        self.write_indicator("'", true, false, false)?;
        let mut spaces = false;
        let mut breaks = false;
        let mut start = 0;
        let mut end = 0;
        while end <= text.len() {
            let ch = text.get(end).copied();
            if spaces {
                if ch != Some(' ') {
                    if start + 1 == end
                        && self.column > self.best_width
                        && split
                        && start != 0
                        && end != text.len()
                    {
                        self.write_indent()?;
                    } else {
                        self.write_chunk(&text[start..end])?;
                    }
                    start = end;
                }
            } else if breaks {
                if !ch.is_some_and(is_break) {
                    if text[start] == '\n' {
                        self.write_line_break(None)?;
                    }
                    for &brk in &text[start..end] {
                        self.write_break_char(brk)?;
                    }
                    self.write_indent()?;
                    start = end;
                }
            } else if ch.is_none_or(|c| c == ' ' || c == '\'' || is_break(c)) && start < end {
                self.write_chunk(&text[start..end])?;
                start = end;
            }
            if ch == Some('\'') {
                self.write_chunk(&['\'', '\''])?;
                start = end + 1;
            }
            if let Some(c) = ch {
                spaces = c == ' ';
                breaks = is_break(c);
            }
            end += 1;
        }
        self.write_indicator("'", false, false, false)
    }

    pub(super) fn write_double_quoted(&mut self, text: &[char], split: bool) -> Result<()> {
        self.write_indicator("\"", true, false, false)?;
        let mut start = 0;
        let mut end = 0;
        while end <= text.len() {
            let ch = text.get(end).copied();
            if ch.is_none_or(|c| self.needs_escape(c)) {
                if start < end {
                    self.write_chunk(&text[start..end])?;
                    start = end;
                }
                if let Some(c) = ch {
                    let data = escape(c);
                    self.column += data.len();
                    self.write_raw(&data)?;
                    start = end + 1;
                }
            }
            // `start` is one past `end` right after an escape.
            if 0 < end
                && end + 1 < text.len()
                && (ch == Some(' ') || start >= end)
                && self.column + end > self.best_width + start
                && split
            {
                let mut data: String = if start < end {
                    text[start..end].iter().collect()
                } else {
                    String::new()
                };
                data.push('\\');
                if start < end {
                    start = end;
                }
                self.column += data.chars().count();
                self.write_raw(&data)?;
                self.write_indent()?;
                self.whitespace = false;
                self.indention = false;
                if text.get(start) == Some(&' ') {
                    self.write_chunk(&['\\'])?;
                }
            }
            end += 1;
        }
        self.write_indicator("\"", false, false, false)
    }

    pub(super) fn write_folded(&mut self, text: &[char]) -> Result<()> {
        let hints = self.block_hints(text);
        self.write_indicator(&format!(">{hints}"), true, false, false)?;
        if hints.ends_with('+') {
            self.open_ended = true;
        }
        self.write_line_break(None)?;

        let mut leading_space = true;
        let mut spaces = false;
        let mut breaks = true;
        let mut start = 0;
        let mut end = 0;
        while end <= text.len() {
            let ch = text.get(end).copied();
            if breaks {
                if !ch.is_some_and(is_break) {
                    if !leading_space
                        && ch.is_some_and(|c| c != ' ')
                        && text.get(start) == Some(&'\n')
                    {
                        self.write_line_break(None)?;
                    }
                    leading_space = ch == Some(' ');
                    for &brk in &text[start..end] {
                        self.write_break_char(brk)?;
                    }
                    if ch.is_some() {
                        self.write_indent()?;
                    }
                    start = end;
                }
            } else if spaces {
                if ch != Some(' ') {
                    if start + 1 == end && self.column > self.best_width {
                        self.write_indent()?;
                    } else {
                        self.write_chunk(&text[start..end])?;
                    }
                    start = end;
                }
            } else if ch.is_none_or(|c| c == ' ' || is_break(c)) {
                self.write_chunk(&text[start..end])?;
                if ch.is_none() {
                    self.write_line_break(None)?;
                }
                start = end;
            }
            if let Some(c) = ch {
                breaks = is_break(c);
                spaces = c == ' ';
            }
            end += 1;
        }
        Ok(())
    }

    pub(super) fn write_literal(&mut self, text: &[char]) -> Result<()> {
        let hints = self.block_hints(text);
        self.write_indicator(&format!("|{hints}"), true, false, false)?;
        if hints.ends_with('+') {
            self.open_ended = true;
        }
        self.write_line_break(None)?;

        let mut breaks = true;
        let mut start = 0;
        let mut end = 0;
        while end <= text.len() {
            let ch = text.get(end).copied();
            if breaks {
                if !ch.is_some_and(is_break) {
                    for &brk in &text[start..end] {
                        self.write_break_char(brk)?;
                    }
                    if ch.is_some() {
                        self.write_indent()?;
                    }
                    start = end;
                }
            } else if ch.is_none_or(is_break) {
                self.write_chunk(&text[start..end])?;
                if ch.is_none() {
                    self.write_line_break(None)?;
                }
                start = end;
            }
            if let Some(c) = ch {
                breaks = is_break(c);
            }
            end += 1;
        }
        Ok(())
    }
}
