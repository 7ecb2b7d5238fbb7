//! Token types produced by the scanner.

use std::fmt;

use crate::Mark;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    StreamStart,
    StreamEnd,
    /// `%YAML`, `%TAG` or an unknown directive.
    Directive,
    /// `---`
    DocumentStart,
    /// `...`
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    BlockEnd,
    /// `[`
    FlowSequenceStart,
    /// `{`
    FlowMappingStart,
    /// `]`
    FlowSequenceEnd,
    /// `}`
    FlowMappingEnd,
    /// `?`, or inserted before a simple key.
    Key,
    /// `:`
    Value,
    /// `-`
    BlockEntry,
    /// `,`
    FlowEntry,
    /// `*name`
    Alias,
    /// `&name`
    Anchor,
    /// `!handle!suffix`
    Tag,
    Scalar,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::StreamStart => "<stream start>",
            TokenKind::StreamEnd => "<stream end>",
            TokenKind::Directive => "<directive>",
            TokenKind::DocumentStart => "<document start>",
            TokenKind::DocumentEnd => "<document end>",
            TokenKind::BlockSequenceStart => "<block sequence start>",
            TokenKind::BlockMappingStart => "<block mapping start>",
            TokenKind::BlockEnd => "<block end>",
            TokenKind::FlowSequenceStart => "'['",
            TokenKind::FlowMappingStart => "'{'",
            TokenKind::FlowSequenceEnd => "']'",
            TokenKind::FlowMappingEnd => "'}'",
            TokenKind::Key => "'?'",
            TokenKind::Value => "':'",
            TokenKind::BlockEntry => "'-'",
            TokenKind::FlowEntry => "','",
            TokenKind::Alias => "<alias>",
            TokenKind::Anchor => "<anchor>",
            TokenKind::Tag => "<tag>",
            TokenKind::Scalar => "<scalar>",
        };
        f.write_str(name)
    }
}

/// How a scalar was written in the source (or should be written on output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|`
    Literal,
    /// `>`
    Folded,
}

impl ScalarStyle {
    /// The indicator character that introduces this style, if any.
    pub fn indicator(self) -> Option<char> {
        match self {
            ScalarStyle::Plain => None,
            ScalarStyle::SingleQuoted => Some('\''),
            ScalarStyle::DoubleQuoted => Some('"'),
            ScalarStyle::Literal => Some('|'),
            ScalarStyle::Folded => Some('>'),
        }
    }
}

/// Kind-specific token payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenData {
    StreamStart,
    StreamEnd,
    /// `%YAML major.minor`
    VersionDirective { major: u32, minor: u32 },
    /// `%TAG handle prefix`
    TagDirective { handle: String, prefix: String },
    /// Any other directive; its parameters are skipped.
    ReservedDirective { name: String },
    DocumentStart,
    DocumentEnd,
    BlockSequenceStart,
    BlockMappingStart,
    BlockEnd,
    FlowSequenceStart,
    FlowMappingStart,
    FlowSequenceEnd,
    FlowMappingEnd,
    Key,
    Value,
    BlockEntry,
    FlowEntry,
    Alias(String),
    Anchor(String),
    /// `handle` is `None` for verbatim tags (`!<...>`) and the lone `!`.
    Tag {
        handle: Option<String>,
        suffix: String,
    },
    Scalar {
        value: String,
        plain: bool,
        style: ScalarStyle,
    },
}

/// A token with its source range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub data: TokenData,
    pub start_mark: Mark,
    pub end_mark: Mark,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub fn new(data: TokenData, start_mark: Mark, end_mark: Mark) -> Self {
        Self {
            data,
            start_mark,
            end_mark,
        }
    }

    /// The kind of this token.
    pub fn kind(&self) -> TokenKind {
        match &self.data {
            TokenData::StreamStart => TokenKind::StreamStart,
            TokenData::StreamEnd => TokenKind::StreamEnd,
            TokenData::VersionDirective { .. }
            | TokenData::TagDirective { .. }
            | TokenData::ReservedDirective { .. } => TokenKind::Directive,
            TokenData::DocumentStart => TokenKind::DocumentStart,
            TokenData::DocumentEnd => TokenKind::DocumentEnd,
            TokenData::BlockSequenceStart => TokenKind::BlockSequenceStart,
            TokenData::BlockMappingStart => TokenKind::BlockMappingStart,
            TokenData::BlockEnd => TokenKind::BlockEnd,
            TokenData::FlowSequenceStart => TokenKind::FlowSequenceStart,
            TokenData::FlowMappingStart => TokenKind::FlowMappingStart,
            TokenData::FlowSequenceEnd => TokenKind::FlowSequenceEnd,
            TokenData::FlowMappingEnd => TokenKind::FlowMappingEnd,
            TokenData::Key => TokenKind::Key,
            TokenData::Value => TokenKind::Value,
            TokenData::BlockEntry => TokenKind::BlockEntry,
            TokenData::FlowEntry => TokenKind::FlowEntry,
            TokenData::Alias(_) => TokenKind::Alias,
            TokenData::Anchor(_) => TokenKind::Anchor,
            TokenData::Tag { .. } => TokenKind::Tag,
            TokenData::Scalar { .. } => TokenKind::Scalar,
        }
    }
}
