//! Diagnostic rendering for pipeline errors.

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::{Error, Mark};

/// Source-annotated rendering of an [`Error`].
pub trait ErrorReport {
    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    fn render(&self, filename: &str, source: &str) -> String;

    /// Write the error report to a writer.
    fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W);
}

impl ErrorReport for Error {
    fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let len = source.chars().count();
        let range = self
            .problem_mark
            .as_ref()
            .or(self.context_mark.as_ref())
            .map(|mark| char_range(mark, len))
            .unwrap_or(0..0);

        let mut report = Report::build(ReportKind::Error, (filename, range.clone()))
            .with_message(format!("{}: {}", self.kind, self.problem));
        if let Some(context) = &self.context {
            let context_range = self
                .context_mark
                .as_ref()
                .map(|mark| char_range(mark, len))
                .unwrap_or_else(|| range.clone());
            report = report.with_label(
                Label::new((filename, context_range))
                    .with_message(context)
                    .with_color(Color::Blue),
            );
        }
        if self.problem_mark.is_some() {
            report = report.with_label(
                Label::new((filename, range))
                    .with_message(&self.problem)
                    .with_color(Color::Red),
            );
        }
        if let Some(note) = &self.note {
            report = report.with_help(note);
        }
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }
}

/// One character at `mark`, clamped to the source.
fn char_range(mark: &Mark, len: usize) -> Range<usize> {
    let start = mark.index.min(len);
    start..(start + 1).min(len).max(start)
}
