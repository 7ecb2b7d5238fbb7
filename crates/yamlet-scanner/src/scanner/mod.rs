//! Tokenizer for YAML 1.1 streams.
//!
//! The scanner is pull-driven: tokens are only produced when a consumer asks
//! for one, and only as far ahead as needed to decide whether a scalar,
//! alias, tag or flow collection started a simple mapping key.

use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::{Error, ErrorKind, Mark, Reader, Result, ScalarStyle, Token, TokenData, TokenKind};

#[cfg(test)]
mod tests;

/// Simple keys longer than this many characters are never recognised.
const MAX_SIMPLE_KEY_LENGTH: usize = 1024;

/// Pull protocol over a token stream.
pub trait TokenSource {
    /// Whether the next token is one of `kinds`. An empty slice matches any token.
    fn check_token(&mut self, kinds: &[TokenKind]) -> Result<bool>;

    /// The next token without consuming it.
    fn peek_token(&mut self) -> Result<Option<&Token>>;

    /// Consume and return the next token.
    fn get_token(&mut self) -> Result<Option<Token>>;
}

/// A place where a simple key could have started.
#[derive(Debug, Clone)]
struct SimpleKey {
    token_number: usize,
    required: bool,
    index: usize,
    line: usize,
    column: usize,
    mark: Mark,
}

/// Converts YAML text into tokens.
pub struct Scanner {
    reader: Reader,
    /// Set once STREAM-END has been queued.
    done: bool,
    flow_level: usize,
    tokens: VecDeque<Token>,
    /// Number of tokens already handed out.
    tokens_taken: usize,
    indent: isize,
    indents: Vec<isize>,
    allow_simple_key: bool,
    /// Candidate simple keys, one per flow level.
    possible_simple_keys: BTreeMap<usize, SimpleKey>,
}

impl Scanner {
    /// Create a scanner reading from `reader`.
    pub fn new(reader: Reader) -> Self {
        let mut scanner = Self {
            reader,
            done: false,
            flow_level: 0,
            tokens: VecDeque::new(),
            tokens_taken: 0,
            indent: -1,
            indents: Vec::new(),
            allow_simple_key: true,
            possible_simple_keys: BTreeMap::new(),
        };
        scanner.fetch_stream_start();
        scanner
    }

    /// Create a scanner over source text.
    pub fn from_source(source: &str) -> Result<Self> {
        Ok(Self::new(Reader::new(source)?))
    }

    /// Scan everything that is left into a vector.
    pub fn scan_to_vec(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.get_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    // ─── Reader shortcuts ───

    #[inline]
    fn peek(&self) -> char {
        self.reader.peek(0)
    }

    #[inline]
    fn peek_nth(&self, n: usize) -> char {
        self.reader.peek(n)
    }

    #[inline]
    fn forward(&mut self, n: usize) {
        self.reader.forward(n);
    }

    #[inline]
    fn mark(&self) -> Mark {
        self.reader.mark()
    }

    fn error(&self, context: &str, context_mark: Mark, problem: impl Into<String>) -> Error {
        Error::new(ErrorKind::Scanner, problem)
            .with_context(context, context_mark)
            .with_mark(self.mark())
    }

    fn push(&mut self, data: TokenData, start_mark: Mark, end_mark: Mark) {
        self.tokens.push_back(Token::new(data, start_mark, end_mark));
    }

    // ─── Token queue ───

    fn fill(&mut self) -> Result<()> {
        while self.need_more_tokens()? {
            self.fetch_more_tokens()?;
        }
        Ok(())
    }

    fn need_more_tokens(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        if self.tokens.is_empty() {
            return Ok(true);
        }
        // The head token may still turn out to be preceded by KEY.
        self.stale_possible_simple_keys()?;
        Ok(self.next_possible_simple_key() == Some(self.tokens_taken))
    }

    fn fetch_more_tokens(&mut self) -> Result<()> {
        self.scan_to_next_token();
        self.stale_possible_simple_keys()?;
        self.unwind_indent(self.reader.column() as isize);

        let ch = self.peek();
        match ch {
            '\0' => self.fetch_stream_end(),
            '%' if self.check_directive() => self.fetch_directive(),
            '-' if self.check_document_start() => {
                self.fetch_document_indicator(TokenData::DocumentStart)
            }
            '.' if self.check_document_end() => {
                self.fetch_document_indicator(TokenData::DocumentEnd)
            }
            '[' => self.fetch_flow_collection_start(TokenData::FlowSequenceStart),
            '{' => self.fetch_flow_collection_start(TokenData::FlowMappingStart),
            ']' => self.fetch_flow_collection_end(TokenData::FlowSequenceEnd),
            '}' => self.fetch_flow_collection_end(TokenData::FlowMappingEnd),
            ',' => self.fetch_flow_entry(),
            '-' if self.check_block_entry() => self.fetch_block_entry(),
            '?' if self.check_key() => self.fetch_key(),
            ':' if self.check_value() => self.fetch_value(),
            '*' => self.fetch_anchor(true),
            '&' => self.fetch_anchor(false),
            '!' => self.fetch_tag(),
            '|' if self.flow_level == 0 => self.fetch_block_scalar(ScalarStyle::Literal),
            '>' if self.flow_level == 0 => self.fetch_block_scalar(ScalarStyle::Folded),
            '\'' => self.fetch_flow_scalar(ScalarStyle::SingleQuoted),
            '"' => self.fetch_flow_scalar(ScalarStyle::DoubleQuoted),
            _ if self.check_plain() => self.fetch_plain(),
            _ => Err(Error::new(
                ErrorKind::Scanner,
                format!("found character {ch:?} that cannot start any token"),
            )
            .with_context("while scanning for the next token", self.mark())
            .with_mark(self.mark())),
        }
    }

    // ─── Simple keys ───

    fn next_possible_simple_key(&self) -> Option<usize> {
        self.possible_simple_keys
            .values()
            .map(|key| key.token_number)
            .min()
    }

    /// Drop candidates that can no longer be keys: a key must fit on one
    /// line and within [`MAX_SIMPLE_KEY_LENGTH`] characters.
    fn stale_possible_simple_keys(&mut self) -> Result<()> {
        let line = self.reader.line();
        let index = self.reader.index();
        let stale: Vec<usize> = self
            .possible_simple_keys
            .iter()
            .filter(|(_, key)| key.line != line || index - key.index > MAX_SIMPLE_KEY_LENGTH)
            .map(|(level, _)| *level)
            .collect();
        for level in stale {
            if let Some(key) = self.possible_simple_keys.remove(&level)
                && key.required
            {
                return Err(self.error(
                    "while scanning a simple key",
                    key.mark,
                    "could not find expected ':'",
                ));
            }
        }
        Ok(())
    }

    fn save_possible_simple_key(&mut self) -> Result<()> {
        // A key flush with the block indentation is the only way to continue
        // the mapping, so it must be followed by ':'.
        let required =
            self.flow_level == 0 && self.indent == self.reader.column() as isize;
        if self.allow_simple_key {
            self.remove_possible_simple_key()?;
            let key = SimpleKey {
                token_number: self.tokens_taken + self.tokens.len(),
                required,
                index: self.reader.index(),
                line: self.reader.line(),
                column: self.reader.column(),
                mark: self.mark(),
            };
            self.possible_simple_keys.insert(self.flow_level, key);
        }
        Ok(())
    }

    fn remove_possible_simple_key(&mut self) -> Result<()> {
        if let Some(key) = self.possible_simple_keys.remove(&self.flow_level)
            && key.required
        {
            return Err(self.error(
                "while scanning a simple key",
                key.mark,
                "could not find expected ':'",
            ));
        }
        Ok(())
    }

    // ─── Indentation ───

    fn unwind_indent(&mut self, column: isize) {
        if self.flow_level > 0 {
            return;
        }
        while self.indent > column {
            let mark = self.mark();
            self.indent = self.indents.pop().unwrap_or(-1);
            self.push(TokenData::BlockEnd, mark.clone(), mark);
        }
    }

    fn add_indent(&mut self, column: isize) -> bool {
        if self.indent < column {
            self.indents.push(self.indent);
            self.indent = column;
            true
        } else {
            false
        }
    }

    // ─── Fetchers ───

    fn fetch_stream_start(&mut self) {
        let mark = self.mark();
        self.push(TokenData::StreamStart, mark.clone(), mark);
    }

    fn fetch_stream_end(&mut self) -> Result<()> {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        self.possible_simple_keys.clear();
        let mark = self.mark();
        self.push(TokenData::StreamEnd, mark.clone(), mark);
        self.done = true;
        Ok(())
    }

    fn fetch_directive(&mut self) -> Result<()> {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_directive()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_document_indicator(&mut self, data: TokenData) -> Result<()> {
        self.unwind_indent(-1);
        self.remove_possible_simple_key()?;
        self.allow_simple_key = false;
        let start = self.mark();
        self.forward(3);
        let end = self.mark();
        self.push(data, start, end);
        Ok(())
    }

    fn fetch_flow_collection_start(&mut self, data: TokenData) -> Result<()> {
        self.save_possible_simple_key()?;
        self.flow_level += 1;
        self.allow_simple_key = true;
        let start = self.mark();
        self.forward(1);
        let end = self.mark();
        self.push(data, start, end);
        Ok(())
    }

    fn fetch_flow_collection_end(&mut self, data: TokenData) -> Result<()> {
        self.remove_possible_simple_key()?;
        self.flow_level = self.flow_level.saturating_sub(1);
        self.allow_simple_key = false;
        let start = self.mark();
        self.forward(1);
        let end = self.mark();
        self.push(data, start, end);
        Ok(())
    }

    fn fetch_flow_entry(&mut self) -> Result<()> {
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let start = self.mark();
        self.forward(1);
        let end = self.mark();
        self.push(TokenData::FlowEntry, start, end);
        Ok(())
    }

    fn fetch_block_entry(&mut self) -> Result<()> {
        if self.flow_level == 0 {
            if !self.allow_simple_key {
                return Err(Error::new(
                    ErrorKind::Scanner,
                    "sequence entries are not allowed here",
                )
                .with_mark(self.mark()));
            }
            if self.add_indent(self.reader.column() as isize) {
                let mark = self.mark();
                self.push(TokenData::BlockSequenceStart, mark.clone(), mark);
            }
        }
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let start = self.mark();
        self.forward(1);
        let end = self.mark();
        self.push(TokenData::BlockEntry, start, end);
        Ok(())
    }

    fn fetch_key(&mut self) -> Result<()> {
        if self.flow_level == 0 {
            if !self.allow_simple_key {
                return Err(
                    Error::new(ErrorKind::Scanner, "mapping keys are not allowed here")
                        .with_mark(self.mark()),
                );
            }
            if self.add_indent(self.reader.column() as isize) {
                let mark = self.mark();
                self.push(TokenData::BlockMappingStart, mark.clone(), mark);
            }
        }
        self.allow_simple_key = self.flow_level == 0;
        self.remove_possible_simple_key()?;
        let start = self.mark();
        self.forward(1);
        let end = self.mark();
        self.push(TokenData::Key, start, end);
        Ok(())
    }

    fn fetch_value(&mut self) -> Result<()> {
        if let Some(key) = self.possible_simple_keys.remove(&self.flow_level) {
            // Splice KEY (and possibly BLOCK-MAPPING-START) in front of the
            // token that started the key.
            let at = key.token_number - self.tokens_taken;
            self.tokens.insert(
                at,
                Token::new(TokenData::Key, key.mark.clone(), key.mark.clone()),
            );
            if self.flow_level == 0 && self.add_indent(key.column as isize) {
                self.tokens.insert(
                    at,
                    Token::new(
                        TokenData::BlockMappingStart,
                        key.mark.clone(),
                        key.mark.clone(),
                    ),
                );
            }
            self.allow_simple_key = false;
        } else {
            if self.flow_level == 0 {
                if !self.allow_simple_key {
                    return Err(Error::new(
                        ErrorKind::Scanner,
                        "mapping values are not allowed here",
                    )
                    .with_mark(self.mark()));
                }
                if self.add_indent(self.reader.column() as isize) {
                    let mark = self.mark();
                    self.push(TokenData::BlockMappingStart, mark.clone(), mark);
                }
            }
            self.allow_simple_key = self.flow_level == 0;
            self.remove_possible_simple_key()?;
        }
        let start = self.mark();
        self.forward(1);
        let end = self.mark();
        self.push(TokenData::Value, start, end);
        Ok(())
    }

    fn fetch_anchor(&mut self, alias: bool) -> Result<()> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_anchor(alias)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_tag(&mut self) -> Result<()> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_tag()?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_block_scalar(&mut self, style: ScalarStyle) -> Result<()> {
        self.allow_simple_key = true;
        self.remove_possible_simple_key()?;
        let token = self.scan_block_scalar(style)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_flow_scalar(&mut self, style: ScalarStyle) -> Result<()> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_flow_scalar(style)?;
        self.tokens.push_back(token);
        Ok(())
    }

    fn fetch_plain(&mut self) -> Result<()> {
        self.save_possible_simple_key()?;
        self.allow_simple_key = false;
        let token = self.scan_plain()?;
        self.tokens.push_back(token);
        Ok(())
    }

    // ─── Checkers ───

    fn check_directive(&self) -> bool {
        self.reader.column() == 0
    }

    fn check_document_start(&self) -> bool {
        self.reader.column() == 0 && self.reader.prefix(3) == "---" && is_blankz(self.peek_nth(3))
    }

    fn check_document_end(&self) -> bool {
        self.reader.column() == 0 && self.reader.prefix(3) == "..." && is_blankz(self.peek_nth(3))
    }

    fn check_block_entry(&self) -> bool {
        is_blankz(self.peek_nth(1))
    }

    fn check_key(&self) -> bool {
        self.flow_level > 0 || is_blankz(self.peek_nth(1))
    }

    fn check_value(&self) -> bool {
        self.flow_level > 0 || is_blankz(self.peek_nth(1))
    }

    /// A plain scalar may start with any non-indicator character, and with
    /// `-`, `?` or `:` when they are not followed by a space.
    fn check_plain(&self) -> bool {
        let ch = self.peek();
        let indicator = is_blankz(ch)
            || matches!(
                ch,
                '-' | '?' | ':' | ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|'
                    | '>' | '\'' | '"' | '%' | '@' | '`'
            );
        !indicator
            || (!is_blankz(self.peek_nth(1))
                && (ch == '-' || (self.flow_level == 0 && matches!(ch, '?' | ':'))))
    }

    // ─── Scanners ───

    fn scan_to_next_token(&mut self) {
        if self.reader.index() == 0 && self.peek() == '\u{FEFF}' {
            self.forward(1);
        }
        loop {
            while self.peek() == ' ' {
                self.forward(1);
            }
            if self.peek() == '#' {
                while !is_breakz(self.peek()) {
                    self.forward(1);
                }
            }
            if self.scan_line_break().is_some() {
                if self.flow_level == 0 {
                    self.allow_simple_key = true;
                }
            } else {
                break;
            }
        }
    }

    fn scan_directive(&mut self) -> Result<Token> {
        let start = self.mark();
        self.forward(1);
        let name = self.scan_directive_name(&start)?;
        let data = match name.as_str() {
            "YAML" => {
                let (major, minor) = self.scan_yaml_directive_value(&start)?;
                TokenData::VersionDirective { major, minor }
            }
            "TAG" => {
                let (handle, prefix) = self.scan_tag_directive_value(&start)?;
                TokenData::TagDirective { handle, prefix }
            }
            _ => {
                while !is_breakz(self.peek()) {
                    self.forward(1);
                }
                TokenData::ReservedDirective { name }
            }
        };
        let end = self.mark();
        self.scan_directive_ignored_line(&start)?;
        Ok(Token::new(data, start, end))
    }

    fn scan_directive_name(&mut self, start: &Mark) -> Result<String> {
        let mut length = 0;
        while is_word(self.peek_nth(length)) {
            length += 1;
        }
        if length == 0 {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!(
                    "expected alphabetic or numeric character, but found {:?}",
                    self.peek()
                ),
            ));
        }
        let value = self.reader.prefix(length);
        self.forward(length);
        let ch = self.peek();
        if !is_spacez(ch) {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!("expected alphabetic or numeric character, but found {ch:?}"),
            ));
        }
        Ok(value)
    }

    fn scan_yaml_directive_value(&mut self, start: &Mark) -> Result<(u32, u32)> {
        while self.peek() == ' ' {
            self.forward(1);
        }
        let major = self.scan_yaml_directive_number(start)?;
        if self.peek() != '.' {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!("expected a digit or '.', but found {:?}", self.peek()),
            ));
        }
        self.forward(1);
        let minor = self.scan_yaml_directive_number(start)?;
        if !is_spacez(self.peek()) {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!("expected a digit or ' ', but found {:?}", self.peek()),
            ));
        }
        Ok((major, minor))
    }

    fn scan_yaml_directive_number(&mut self, start: &Mark) -> Result<u32> {
        if !self.peek().is_ascii_digit() {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!("expected a digit, but found {:?}", self.peek()),
            ));
        }
        let mut length = 0;
        while self.peek_nth(length).is_ascii_digit() {
            length += 1;
        }
        let digits = self.reader.prefix(length);
        let value = digits.parse::<u32>().map_err(|_| {
            self.error(
                "while scanning a directive",
                start.clone(),
                format!("version number {digits} is out of range"),
            )
        })?;
        self.forward(length);
        Ok(value)
    }

    fn scan_tag_directive_value(&mut self, start: &Mark) -> Result<(String, String)> {
        while self.peek() == ' ' {
            self.forward(1);
        }
        let handle = self.scan_tag_handle("directive", start)?;
        if self.peek() != ' ' {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!("expected ' ', but found {:?}", self.peek()),
            ));
        }
        while self.peek() == ' ' {
            self.forward(1);
        }
        let prefix = self.scan_tag_uri("directive", start)?;
        if !is_spacez(self.peek()) {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!("expected ' ', but found {:?}", self.peek()),
            ));
        }
        Ok((handle, prefix))
    }

    fn scan_directive_ignored_line(&mut self, start: &Mark) -> Result<()> {
        while self.peek() == ' ' {
            self.forward(1);
        }
        if self.peek() == '#' {
            while !is_breakz(self.peek()) {
                self.forward(1);
            }
        }
        if !is_breakz(self.peek()) {
            return Err(self.error(
                "while scanning a directive",
                start.clone(),
                format!(
                    "expected a comment or a line break, but found {:?}",
                    self.peek()
                ),
            ));
        }
        self.scan_line_break();
        Ok(())
    }

    fn scan_anchor(&mut self, alias: bool) -> Result<Token> {
        let start = self.mark();
        let context = if alias {
            "while scanning an alias"
        } else {
            "while scanning an anchor"
        };
        self.forward(1);
        let mut length = 0;
        while is_word(self.peek_nth(length)) {
            length += 1;
        }
        if length == 0 {
            return Err(self.error(
                context,
                start,
                format!(
                    "expected alphabetic or numeric character, but found {:?}",
                    self.peek()
                ),
            ));
        }
        let value = self.reader.prefix(length);
        self.forward(length);
        let ch = self.peek();
        if !is_blankz(ch) && !matches!(ch, '?' | ':' | ',' | ']' | '}' | '%' | '@' | '`') {
            return Err(self.error(
                context,
                start,
                format!("expected alphabetic or numeric character, but found {ch:?}"),
            ));
        }
        let end = self.mark();
        let data = if alias {
            TokenData::Alias(value)
        } else {
            TokenData::Anchor(value)
        };
        Ok(Token::new(data, start, end))
    }

    fn scan_tag(&mut self) -> Result<Token> {
        let start = self.mark();
        let ch = self.peek_nth(1);
        let (handle, suffix) = if ch == '<' {
            self.forward(2);
            let suffix = self.scan_tag_uri("tag", &start)?;
            if self.peek() != '>' {
                return Err(self.error(
                    "while parsing a tag",
                    start,
                    format!("expected '>', but found {:?}", self.peek()),
                ));
            }
            self.forward(1);
            (None, suffix)
        } else if is_blankz(ch) {
            self.forward(1);
            (None, "!".to_string())
        } else {
            let mut length = 1;
            let mut use_handle = false;
            let mut ch = ch;
            while !is_spacez(ch) {
                if ch == '!' {
                    use_handle = true;
                    break;
                }
                length += 1;
                ch = self.peek_nth(length);
            }
            let handle = if use_handle {
                self.scan_tag_handle("tag", &start)?
            } else {
                self.forward(1);
                "!".to_string()
            };
            let suffix = self.scan_tag_uri("tag", &start)?;
            (Some(handle), suffix)
        };
        if !is_spacez(self.peek()) {
            return Err(self.error(
                "while scanning a tag",
                start,
                format!("expected ' ', but found {:?}", self.peek()),
            ));
        }
        let end = self.mark();
        Ok(Token::new(TokenData::Tag { handle, suffix }, start, end))
    }

    fn scan_block_scalar(&mut self, style: ScalarStyle) -> Result<Token> {
        let folded = style == ScalarStyle::Folded;
        let mut chunks = String::new();
        let start = self.mark();

        self.forward(1);
        let (chomping, increment) = self.scan_block_scalar_indicators(&start)?;
        self.scan_block_scalar_ignored_line(&start)?;

        let min_indent = (self.indent + 1).max(1) as usize;
        let (mut breaks, mut end, indent) = match increment {
            None => {
                let (breaks, max_indent, end) = self.scan_block_scalar_indentation();
                (breaks, end, min_indent.max(max_indent))
            }
            Some(increment) => {
                let indent = min_indent + increment - 1;
                let (breaks, end) = self.scan_block_scalar_breaks(indent);
                (breaks, end, indent)
            }
        };

        let mut line_break = String::new();
        while self.reader.column() == indent && self.peek() != '\0' {
            chunks.push_str(&breaks);
            let leading_non_space = !matches!(self.peek(), ' ' | '\t');
            let mut length = 0;
            while !is_breakz(self.peek_nth(length)) {
                length += 1;
            }
            chunks.push_str(&self.reader.prefix(length));
            self.forward(length);
            line_break = self.scan_line_break().map(String::from).unwrap_or_default();
            let (next_breaks, next_end) = self.scan_block_scalar_breaks(indent);
            breaks = next_breaks;
            end = next_end;
            if self.reader.column() == indent && self.peek() != '\0' {
                // Folding: a single line break between two lines that do not
                // start with whitespace becomes a space.
                if folded
                    && line_break == "\n"
                    && leading_non_space
                    && !matches!(self.peek(), ' ' | '\t')
                {
                    if breaks.is_empty() {
                        chunks.push(' ');
                    }
                } else {
                    chunks.push_str(&line_break);
                }
            } else {
                break;
            }
        }

        match chomping {
            Chomping::Strip => {}
            Chomping::Clip => chunks.push_str(&line_break),
            Chomping::Keep => {
                chunks.push_str(&line_break);
                chunks.push_str(&breaks);
            }
        }

        Ok(Token::new(
            TokenData::Scalar {
                value: chunks,
                plain: false,
                style,
            },
            start,
            end,
        ))
    }

    fn scan_block_scalar_indicators(&mut self, start: &Mark) -> Result<(Chomping, Option<usize>)> {
        let mut chomping = Chomping::Clip;
        let mut increment = None;
        let ch = self.peek();
        if matches!(ch, '+' | '-') {
            chomping = Chomping::from_indicator(ch);
            self.forward(1);
            if let Some(digit) = self.peek().to_digit(10) {
                increment = Some(self.check_indentation_indicator(digit, start)?);
                self.forward(1);
            }
        } else if let Some(digit) = ch.to_digit(10) {
            increment = Some(self.check_indentation_indicator(digit, start)?);
            self.forward(1);
            let ch = self.peek();
            if matches!(ch, '+' | '-') {
                chomping = Chomping::from_indicator(ch);
                self.forward(1);
            }
        }
        if !is_spacez(self.peek()) {
            return Err(self.error(
                "while scanning a block scalar",
                start.clone(),
                format!(
                    "expected chomping or indentation indicators, but found {:?}",
                    self.peek()
                ),
            ));
        }
        Ok((chomping, increment))
    }

    fn check_indentation_indicator(&self, digit: u32, start: &Mark) -> Result<usize> {
        if digit == 0 {
            return Err(self.error(
                "while scanning a block scalar",
                start.clone(),
                "expected indentation indicator in the range 1-9, but found 0",
            ));
        }
        Ok(digit as usize)
    }

    fn scan_block_scalar_ignored_line(&mut self, start: &Mark) -> Result<()> {
        while self.peek() == ' ' {
            self.forward(1);
        }
        if self.peek() == '#' {
            while !is_breakz(self.peek()) {
                self.forward(1);
            }
        }
        if !is_breakz(self.peek()) {
            return Err(self.error(
                "while scanning a block scalar",
                start.clone(),
                format!(
                    "expected a comment or a line break, but found {:?}",
                    self.peek()
                ),
            ));
        }
        self.scan_line_break();
        Ok(())
    }

    /// Skip leading empty lines and find the indentation of the first
    /// non-empty one.
    fn scan_block_scalar_indentation(&mut self) -> (String, usize, Mark) {
        let mut chunks = String::new();
        let mut max_indent = 0;
        let mut end = self.mark();
        while self.peek() == ' ' || is_break(self.peek()) {
            if self.peek() != ' ' {
                if let Some(line_break) = self.scan_line_break() {
                    chunks.push(line_break);
                }
                end = self.mark();
            } else {
                self.forward(1);
                max_indent = max_indent.max(self.reader.column());
            }
        }
        (chunks, max_indent, end)
    }

    fn scan_block_scalar_breaks(&mut self, indent: usize) -> (String, Mark) {
        let mut chunks = String::new();
        let mut end = self.mark();
        while self.reader.column() < indent && self.peek() == ' ' {
            self.forward(1);
        }
        while is_break(self.peek()) {
            if let Some(line_break) = self.scan_line_break() {
                chunks.push(line_break);
            }
            end = self.mark();
            while self.reader.column() < indent && self.peek() == ' ' {
                self.forward(1);
            }
        }
        (chunks, end)
    }

    fn scan_flow_scalar(&mut self, style: ScalarStyle) -> Result<Token> {
        let double = style == ScalarStyle::DoubleQuoted;
        let mut chunks = String::new();
        let start = self.mark();
        let quote = self.peek();
        self.forward(1);
        self.scan_flow_scalar_non_spaces(double, &start, &mut chunks)?;
        while self.peek() != quote {
            self.scan_flow_scalar_spaces(&start, &mut chunks)?;
            self.scan_flow_scalar_non_spaces(double, &start, &mut chunks)?;
        }
        self.forward(1);
        let end = self.mark();
        Ok(Token::new(
            TokenData::Scalar {
                value: chunks,
                plain: false,
                style,
            },
            start,
            end,
        ))
    }

    fn scan_flow_scalar_non_spaces(
        &mut self,
        double: bool,
        start: &Mark,
        chunks: &mut String,
    ) -> Result<()> {
        loop {
            let mut length = 0;
            while !matches!(self.peek_nth(length), '\'' | '"' | '\\') && !is_blankz(self.peek_nth(length)) {
                length += 1;
            }
            if length > 0 {
                chunks.push_str(&self.reader.prefix(length));
                self.forward(length);
            }
            let ch = self.peek();
            if !double && ch == '\'' && self.peek_nth(1) == '\'' {
                chunks.push('\'');
                self.forward(2);
            } else if (double && ch == '\'') || (!double && matches!(ch, '"' | '\\')) {
                chunks.push(ch);
                self.forward(1);
            } else if double && ch == '\\' {
                self.forward(1);
                let ch = self.peek();
                if let Some(replacement) = escape_replacement(ch) {
                    chunks.push(replacement);
                    self.forward(1);
                } else if let Some(length) = escape_code_length(ch) {
                    self.forward(1);
                    for k in 0..length {
                        if !self.peek_nth(k).is_ascii_hexdigit() {
                            return Err(self.error(
                                "while scanning a double-quoted scalar",
                                start.clone(),
                                format!(
                                    "expected escape sequence of {length} hexdecimal numbers, but found {:?}",
                                    self.peek_nth(k)
                                ),
                            ));
                        }
                    }
                    let digits = self.reader.prefix(length);
                    let decoded = u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32);
                    let Some(decoded) = decoded else {
                        return Err(self.error(
                            "while scanning a double-quoted scalar",
                            start.clone(),
                            format!("found invalid Unicode character escape code {digits}"),
                        ));
                    };
                    chunks.push(decoded);
                    self.forward(length);
                } else if is_break(ch) {
                    self.scan_line_break();
                    self.scan_flow_scalar_breaks(start, chunks)?;
                } else {
                    return Err(self.error(
                        "while scanning a double-quoted scalar",
                        start.clone(),
                        format!("found unknown escape character {ch:?}"),
                    ));
                }
            } else {
                return Ok(());
            }
        }
    }

    fn scan_flow_scalar_spaces(&mut self, start: &Mark, chunks: &mut String) -> Result<()> {
        let mut length = 0;
        while matches!(self.peek_nth(length), ' ' | '\t') {
            length += 1;
        }
        let whitespaces = self.reader.prefix(length);
        self.forward(length);
        let ch = self.peek();
        if ch == '\0' {
            return Err(self.error(
                "while scanning a quoted scalar",
                start.clone(),
                "found unexpected end of stream",
            ));
        }
        if is_break(ch) {
            let line_break = self.scan_line_break();
            let mut breaks = String::new();
            self.scan_flow_scalar_breaks(start, &mut breaks)?;
            match line_break {
                Some('\n') if breaks.is_empty() => chunks.push(' '),
                Some('\n') | None => {}
                Some(other) => chunks.push(other),
            }
            chunks.push_str(&breaks);
        } else {
            chunks.push_str(&whitespaces);
        }
        Ok(())
    }

    fn scan_flow_scalar_breaks(&mut self, start: &Mark, chunks: &mut String) -> Result<()> {
        loop {
            if self.at_document_separator() {
                return Err(self.error(
                    "while scanning a quoted scalar",
                    start.clone(),
                    "found unexpected document separator",
                ));
            }
            while matches!(self.peek(), ' ' | '\t') {
                self.forward(1);
            }
            if is_break(self.peek()) {
                if let Some(line_break) = self.scan_line_break() {
                    chunks.push(line_break);
                }
            } else {
                return Ok(());
            }
        }
    }

    fn scan_plain(&mut self) -> Result<Token> {
        let mut chunks = String::new();
        let start = self.mark();
        let mut end = start.clone();
        let indent = (self.indent + 1) as usize;
        let mut spaces = String::new();
        loop {
            if self.peek() == '#' {
                break;
            }
            let mut length = 0;
            let mut ch;
            loop {
                ch = self.peek_nth(length);
                if is_blankz(ch)
                    || (self.flow_level == 0 && ch == ':' && is_blankz(self.peek_nth(length + 1)))
                    || (self.flow_level > 0 && matches!(ch, ',' | ':' | '?' | '[' | ']' | '{' | '}'))
                {
                    break;
                }
                length += 1;
            }
            if self.flow_level > 0
                && ch == ':'
                && !is_blankz(self.peek_nth(length + 1))
                && !matches!(self.peek_nth(length + 1), ',' | '[' | ']' | '{' | '}')
            {
                self.forward(length);
                return Err(self
                    .error(
                        "while scanning a plain scalar",
                        start,
                        "found unexpected ':'",
                    )
                    .with_note(
                        "quote the scalar, or follow the : with a space inside flow collections",
                    ));
            }
            if length == 0 {
                break;
            }
            self.allow_simple_key = false;
            chunks.push_str(&spaces);
            chunks.push_str(&self.reader.prefix(length));
            self.forward(length);
            end = self.mark();
            match self.scan_plain_spaces() {
                Some(next) if !next.is_empty() => spaces = next,
                _ => break,
            }
            if self.peek() == '#' || (self.flow_level == 0 && self.reader.column() < indent) {
                break;
            }
        }
        Ok(Token::new(
            TokenData::Scalar {
                value: chunks,
                plain: true,
                style: ScalarStyle::Plain,
            },
            start,
            end,
        ))
    }

    /// Whitespace between two parts of a plain scalar, folded. `None` when a
    /// document separator ends the scalar.
    fn scan_plain_spaces(&mut self) -> Option<String> {
        let mut chunks = String::new();
        let mut length = 0;
        while self.peek_nth(length) == ' ' {
            length += 1;
        }
        let whitespaces = self.reader.prefix(length);
        self.forward(length);
        let ch = self.peek();
        if is_break(ch) {
            let line_break = self.scan_line_break();
            self.allow_simple_key = true;
            if self.at_document_separator() {
                return None;
            }
            let mut breaks = String::new();
            while self.peek() == ' ' || is_break(self.peek()) {
                if self.peek() == ' ' {
                    self.forward(1);
                } else {
                    if let Some(line_break) = self.scan_line_break() {
                        breaks.push(line_break);
                    }
                    if self.at_document_separator() {
                        return None;
                    }
                }
            }
            match line_break {
                Some('\n') if breaks.is_empty() => chunks.push(' '),
                Some('\n') | None => {}
                Some(other) => chunks.push(other),
            }
            chunks.push_str(&breaks);
        } else if !whitespaces.is_empty() {
            chunks.push_str(&whitespaces);
        }
        Some(chunks)
    }

    fn scan_tag_handle(&mut self, name: &str, start: &Mark) -> Result<String> {
        let ch = self.peek();
        if ch != '!' {
            return Err(self.error(
                &format!("while scanning a {name}"),
                start.clone(),
                format!("expected '!', but found {ch:?}"),
            ));
        }
        let mut length = 1;
        let mut ch = self.peek_nth(length);
        if ch != ' ' {
            while is_word(ch) {
                length += 1;
                ch = self.peek_nth(length);
            }
            if ch != '!' {
                self.forward(length);
                return Err(self.error(
                    &format!("while scanning a {name}"),
                    start.clone(),
                    format!("expected '!', but found {ch:?}"),
                ));
            }
            length += 1;
        }
        let value = self.reader.prefix(length);
        self.forward(length);
        Ok(value)
    }

    fn scan_tag_uri(&mut self, name: &str, start: &Mark) -> Result<String> {
        let mut chunks = String::new();
        let mut length = 0;
        let mut ch = self.peek_nth(length);
        while is_word(ch) || is_uri_char(ch) {
            if ch == '%' {
                chunks.push_str(&self.reader.prefix(length));
                self.forward(length);
                length = 0;
                let decoded = self.scan_uri_escapes(name, start)?;
                chunks.push_str(&decoded);
            } else {
                length += 1;
            }
            ch = self.peek_nth(length);
        }
        if length > 0 {
            chunks.push_str(&self.reader.prefix(length));
            self.forward(length);
        }
        if chunks.is_empty() {
            return Err(self.error(
                &format!("while parsing a {name}"),
                start.clone(),
                format!("expected URI, but found {ch:?}"),
            ));
        }
        Ok(chunks)
    }

    /// Decode a run of `%XX` escapes as UTF-8.
    fn scan_uri_escapes(&mut self, name: &str, start: &Mark) -> Result<String> {
        let mut bytes = Vec::new();
        while self.peek() == '%' {
            self.forward(1);
            for k in 0..2 {
                if !self.peek_nth(k).is_ascii_hexdigit() {
                    return Err(self.error(
                        &format!("while scanning a {name}"),
                        start.clone(),
                        format!(
                            "expected URI escape sequence of 2 hexdecimal numbers, but found {:?}",
                            self.peek_nth(k)
                        ),
                    ));
                }
            }
            let digits = self.reader.prefix(2);
            bytes.push(u8::from_str_radix(&digits, 16).unwrap_or_default());
            self.forward(2);
        }
        String::from_utf8(bytes).map_err(|err| {
            self.error(&format!("while scanning a {name}"), start.clone(), err.to_string())
        })
    }

    /// Consume one line break. `\r\n`, `\r` and `\x85` all read as `\n`;
    /// the Unicode line and paragraph separators are kept as they are.
    fn scan_line_break(&mut self) -> Option<char> {
        let ch = self.peek();
        match ch {
            '\r' | '\n' | '\u{85}' => {
                if self.reader.prefix(2) == "\r\n" {
                    self.forward(2);
                } else {
                    self.forward(1);
                }
                Some('\n')
            }
            '\u{2028}' | '\u{2029}' => {
                self.forward(1);
                Some(ch)
            }
            _ => None,
        }
    }

    fn at_document_separator(&self) -> bool {
        let prefix = self.reader.prefix(3);
        (prefix == "---" || prefix == "...") && is_blankz(self.peek_nth(3))
    }
}

impl TokenSource for Scanner {
    fn check_token(&mut self, kinds: &[TokenKind]) -> Result<bool> {
        self.fill()?;
        Ok(match self.tokens.front() {
            Some(token) => kinds.is_empty() || kinds.contains(&token.kind()),
            None => false,
        })
    }

    fn peek_token(&mut self) -> Result<Option<&Token>> {
        self.fill()?;
        Ok(self.tokens.front())
    }

    fn get_token(&mut self) -> Result<Option<Token>> {
        self.fill()?;
        let token = self.tokens.pop_front();
        if let Some(token) = &token {
            self.tokens_taken += 1;
            trace!(
                "Token {:?} at {:?}..{:?}",
                token.data, token.start_mark, token.end_mark
            );
        }
        Ok(token)
    }
}

impl Iterator for Scanner {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.get_token() {
            Ok(token) => token.map(Ok),
            Err(err) => {
                // Errors are fatal; stop the stream.
                self.done = true;
                self.tokens.clear();
                Some(Err(err))
            }
        }
    }
}

/// Block scalar trailing line break handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomping {
    /// `-`: drop the final line break.
    Strip,
    /// No indicator: keep a single final line break.
    Clip,
    /// `+`: keep the final line break and any trailing empty lines.
    Keep,
}

impl Chomping {
    fn from_indicator(ch: char) -> Self {
        if ch == '+' { Chomping::Keep } else { Chomping::Strip }
    }
}

fn escape_replacement(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '\0',
        'a' => '\u{07}',
        'b' => '\u{08}',
        't' | '\t' => '\t',
        'n' => '\n',
        'v' => '\u{0B}',
        'f' => '\u{0C}',
        'r' => '\r',
        'e' => '\u{1B}',
        ' ' => ' ',
        '"' => '"',
        '\\' => '\\',
        'N' => '\u{85}',
        '_' => '\u{A0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        _ => return None,
    })
}

fn escape_code_length(ch: char) -> Option<usize> {
    match ch {
        'x' => Some(2),
        'u' => Some(4),
        'U' => Some(8),
        _ => None,
    }
}

#[inline]
fn is_break(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

#[inline]
fn is_breakz(c: char) -> bool {
    c == '\0' || is_break(c)
}

/// Space, line break or end of stream.
#[inline]
fn is_spacez(c: char) -> bool {
    c == ' ' || is_breakz(c)
}

/// Space, tab, line break or end of stream.
#[inline]
fn is_blankz(c: char) -> bool {
    c == ' ' || c == '\t' || is_breakz(c)
}

#[inline]
fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

#[inline]
fn is_uri_char(c: char) -> bool {
    matches!(
        c,
        ';' | '/' | '?' | ':' | '@' | '&' | '=' | '+' | '$' | ',' | '.' | '!' | '~' | '*' | '\''
            | '(' | ')' | '[' | ']' | '%'
    )
}
