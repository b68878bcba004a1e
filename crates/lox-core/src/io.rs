//! Output abstraction for the `print` statement.
//!
//! Mirrors the teacher's `PrintWriter` split between a real stdout writer and
//! an in-memory collector, so interpreter tests can assert on `print` output
//! without capturing the process's actual stdout.

use std::fmt::Write as _;

/// Receives the text produced by `print` statements.
pub trait PrintWriter {
    /// Writes `text` followed by a newline.
    fn print_line(&mut self, text: &str);
}

/// Writes directly to the process's stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn print_line(&mut self, text: &str) {
        println!("{text}");
    }
}

/// Collects printed lines into an owned `String`, one per call with a
/// trailing `\n`, for tests that assert on interpreter output.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn print_line(&mut self, text: &str) {
        let _ = writeln!(self.0, "{text}");
    }
}

/// Discards everything printed to it.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn print_line(&mut self, _text: &str) {}
}
