//! Diagnostic reporting.
//!
//! The scanner, parser, resolver, and interpreter never write to stderr
//! directly; they report through a [`DiagnosticSink`], which keeps error
//! formatting in one place and lets tests collect diagnostics instead of
//! printing them, the same way [`crate::io::PrintWriter`] decouples `print`
//! output from stdout.

use std::cell::RefCell;

use crate::token::{Token, TokenKind};

/// Receives scan/parse/resolve/runtime errors as they are discovered.
///
/// Implementations decide where the formatted message goes; callers never
/// format the message themselves, so the `"[line N] Error: MSG"` shape stays
/// consistent across every error site.
pub trait DiagnosticSink {
    /// A scan or parse error anchored at a source line with no token context.
    fn error(&self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// A parse or resolve error anchored at a specific token.
    fn token_error(&self, token: &Token, message: &str) {
        if token.kind == TokenKind::Endof {
            self.report(token.line, " at end", message);
        } else {
            self.report(token.line, &format!(" at '{}'", token.lexeme), message);
        }
    }

    /// A runtime error raised while executing already-resolved code.
    fn runtime_error(&self, line: usize, message: &str) {
        self.report_runtime(line, message);
    }

    /// Formats and emits a compile-time (scan/parse/resolve) diagnostic.
    fn report(&self, line: usize, location: &str, message: &str);

    /// Formats and emits a runtime diagnostic.
    ///
    /// Given a default implementation distinct from [`Self::report`] because
    /// runtime errors omit the `Error<WHERE>` shape entirely: `"[line N] MSG"`.
    fn report_runtime(&self, line: usize, message: &str) {
        self.report(line, "", message);
    }

    /// Whether any diagnostic has been reported since the sink was created
    /// or last reset. The REPL and file runner use this to pick an exit
    /// status without tracking their own error flags.
    fn had_error(&self) -> bool;

    /// Whether a runtime error specifically has been reported.
    fn had_runtime_error(&self) -> bool;
}

/// Writes diagnostics to stderr, the sink used by the CLI outside of tests.
#[derive(Debug, Default)]
pub struct StdErrSink {
    had_error: RefCell<bool>,
    had_runtime_error: RefCell<bool>,
}

impl StdErrSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the error flags so a REPL can keep accepting input after a
    /// line that failed.
    pub fn reset(&self) {
        *self.had_error.borrow_mut() = false;
        *self.had_runtime_error.borrow_mut() = false;
    }
}

impl DiagnosticSink for StdErrSink {
    fn report(&self, line: usize, location: &str, message: &str) {
        eprintln!("[line {line}] Error{location}: {message}");
        *self.had_error.borrow_mut() = true;
    }

    fn report_runtime(&self, line: usize, message: &str) {
        eprintln!("[line {line}] {message}");
        *self.had_runtime_error.borrow_mut() = true;
    }

    fn had_error(&self) -> bool {
        *self.had_error.borrow()
    }

    fn had_runtime_error(&self) -> bool {
        *self.had_runtime_error.borrow()
    }
}

/// Collects formatted diagnostics into a `Vec<String>` instead of printing
/// them, for tests that assert on error text.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: RefCell<Vec<String>>,
    had_error: RefCell<bool>,
    had_runtime_error: RefCell<bool>,
}

impl CollectingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Clears the error flags, leaving previously collected messages intact.
    /// Mirrors [`StdErrSink::reset`] for tests that drive several lines
    /// against one sink the way the REPL drives several lines of input.
    pub fn reset(&self) {
        *self.had_error.borrow_mut() = false;
        *self.had_runtime_error.borrow_mut() = false;
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, line: usize, location: &str, message: &str) {
        self.messages
            .borrow_mut()
            .push(format!("[line {line}] Error{location}: {message}"));
        *self.had_error.borrow_mut() = true;
    }

    fn report_runtime(&self, line: usize, message: &str) {
        self.messages.borrow_mut().push(format!("[line {line}] {message}"));
        *self.had_runtime_error.borrow_mut() = true;
    }

    fn had_error(&self) -> bool {
        *self.had_error.borrow()
    }

    fn had_runtime_error(&self) -> bool {
        *self.had_runtime_error.borrow()
    }
}
