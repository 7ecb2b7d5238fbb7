//! Event parser for YAML 1.1.
//!
//! Consumes tokens from a [`TokenSource`] and produces the event stream
//! described by the grammar
//! `stream ::= STREAM-START document* STREAM-END`,
//! `document ::= DOCUMENT-START node DOCUMENT-END`.

pub use yamlet_scanner::{
    Error, ErrorKind, Mark, Reader, Result, ScalarStyle, Scanner, Token, TokenData, TokenKind,
    TokenSource,
};

mod event;
pub use event::{Event, EventData, EventKind};

mod parser;
pub use parser::{DEFAULT_TAG_HANDLES, EventSource, Parser};
