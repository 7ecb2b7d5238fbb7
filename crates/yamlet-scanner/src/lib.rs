//! Reader and scanner for YAML 1.1.
//!
//! This crate turns source text into a stream of [`Token`]s. It also owns the
//! pieces every later stage shares: source positions ([`Mark`]) and the
//! marked [`Error`] type.

mod error;
pub use error::{Error, ErrorKind, Result};

mod mark;
pub use mark::Mark;

mod reader;
pub use reader::Reader;

mod token;
pub use token::{ScalarStyle, Token, TokenData, TokenKind};

mod scanner;
pub use scanner::{Scanner, TokenSource};
