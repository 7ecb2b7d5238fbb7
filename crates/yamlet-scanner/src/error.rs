//! The error type shared by every pipeline stage.

use std::fmt;

use crate::Mark;

/// Result type alias for YAML operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Non-printable character in the input.
    Reader,
    /// Malformed token.
    Scanner,
    /// Event grammar violation.
    Parser,
    /// Anchor problems, or more than one document where one was expected.
    Composer,
    /// No usable constructor for a node, or a malformed node for its tag.
    Constructor,
    /// A native value that cannot be turned into a node.
    Representer,
    /// Serializer used out of order.
    Serializer,
    /// Event stream that cannot be rendered.
    Emitter,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Reader => "reader error",
            ErrorKind::Scanner => "scanner error",
            ErrorKind::Parser => "parser error",
            ErrorKind::Composer => "composer error",
            ErrorKind::Constructor => "constructor error",
            ErrorKind::Representer => "representer error",
            ErrorKind::Serializer => "serializer error",
            ErrorKind::Emitter => "emitter error",
        };
        f.write_str(name)
    }
}

/// An error with optional context and source positions.
///
/// The rendered form lists, one per line: the context, the context mark (only
/// when it points somewhere other than the problem), the problem, the problem
/// mark and a closing note.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    /// Stage that raised the error.
    pub kind: ErrorKind,
    /// What was being done when the problem was found.
    pub context: Option<String>,
    /// Where the context started.
    pub context_mark: Option<Mark>,
    /// What went wrong.
    pub problem: String,
    /// Where it went wrong.
    pub problem_mark: Option<Mark>,
    /// Extra hint for the reader.
    pub note: Option<String>,
}

impl Error {
    /// Create an error with just a problem description.
    pub fn new(kind: ErrorKind, problem: impl Into<String>) -> Self {
        Self {
            kind,
            context: None,
            context_mark: None,
            problem: problem.into(),
            problem_mark: None,
            note: None,
        }
    }

    /// Attach the position of the problem.
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.problem_mark = Some(mark);
        self
    }

    /// Attach what was being done, and where it began.
    pub fn with_context(mut self, context: impl Into<String>, mark: Mark) -> Self {
        self.context = Some(context.into());
        self.context_mark = Some(mark);
        self
    }

    /// Attach a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    fn shows_context_mark(&self) -> bool {
        match (&self.context_mark, &self.problem_mark) {
            (Some(context), Some(problem)) => {
                context.line != problem.line || context.column != problem.column
            }
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = Vec::new();
        if let Some(context) = &self.context {
            lines.push(context.clone());
        }
        if self.shows_context_mark()
            && let Some(mark) = &self.context_mark
        {
            lines.push(mark.to_string());
        }
        lines.push(self.problem.clone());
        if let Some(mark) = &self.problem_mark {
            lines.push(mark.to_string());
        }
        if let Some(note) = &self.note {
            lines.push(note.clone());
        }
        f.write_str(&lines.join("\n"))
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_problem_only() {
        let err = Error::new(ErrorKind::Serializer, "serializer is not opened");
        assert_eq!(err.to_string(), "serializer is not opened");
    }

    #[test]
    fn test_context_mark_hidden_when_same_position() {
        let err = Error::new(ErrorKind::Scanner, "could not find expected ':'")
            .with_context("while scanning a simple key", Mark::new(4, 0, 4))
            .with_mark(Mark::new(4, 0, 4));
        assert_eq!(
            err.to_string(),
            "while scanning a simple key\ncould not find expected ':'\n  on line 1, column 5"
        );
    }

    #[test]
    fn test_full_layout() {
        let err = Error::new(ErrorKind::Parser, "expected ',' or ']', but got <stream end>")
            .with_context("while parsing a flow sequence", Mark::new(0, 0, 0))
            .with_mark(Mark::new(7, 1, 2))
            .with_note("check the brackets");
        assert_eq!(
            err.to_string(),
            "while parsing a flow sequence\n  on line 1, column 1\nexpected ',' or ']', but got <stream end>\n  on line 2, column 3\ncheck the brackets"
        );
    }
}
