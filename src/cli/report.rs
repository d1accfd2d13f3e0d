use std::io::{self, Stderr, Stdout, Write};

use crate::error::TesterError;
use crate::runner::{FileReport, ReportSink, RunSummary};

/// Progress lines: `Checking "NAME" ... ` followed by `OK` on stdout, or
/// `FAILED` and the failure messages on stderr.
pub struct TextReporter<O, E> {
    out: O,
    err: E,
}

impl TextReporter<Stdout, Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TextReporter<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

fn write_failed(error: io::Error) -> TesterError {
    TesterError::ReportWrite { source: error }
}

impl<O: Write, E: Write> ReportSink for TextReporter<O, E> {
    fn started(&mut self, name: &str) -> Result<(), TesterError> {
        write!(self.out, "Checking \"{name}\" ... ").map_err(write_failed)?;
        self.out.flush().map_err(write_failed)
    }

    fn finished(&mut self, report: &FileReport) -> Result<(), TesterError> {
        if !report.is_failure() {
            return writeln!(self.out, "OK").map_err(write_failed);
        }

        // Finish the progress line before switching streams.
        self.out.flush().map_err(write_failed)?;
        writeln!(self.err, "FAILED").map_err(write_failed)?;
        for message in &report.messages {
            writeln!(self.err, "{message}").map_err(write_failed)?;
        }
        self.err.flush().map_err(write_failed)
    }
}

/// Sink for `--json`, where only the final summary is printed.
pub struct SilentSink;

impl ReportSink for SilentSink {
    fn started(&mut self, _name: &str) -> Result<(), TesterError> {
        Ok(())
    }

    fn finished(&mut self, _report: &FileReport) -> Result<(), TesterError> {
        Ok(())
    }
}

pub fn render_json(summary: &RunSummary) -> Result<String, TesterError> {
    serde_json::to_string_pretty(summary)
        .map_err(|source| TesterError::ReportSerialization { source })
}
