//! Parser diagnostics with colored terminal output.
//!
//! Every problem the parser notices is turned into a [`Diagnostic`] and handed
//! to a [`Logger`]. The parser never prints anything itself; what happens to a
//! diagnostic is entirely up to the sink.

use std::collections::HashSet;
use std::fmt;

use owo_colors::OwoColorize;
use serde::Serialize;
use strum_macros::Display;

/// How serious a reported problem is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum Severity {
    /// Stylistic or legacy-tolerance notice. Parsing is unaffected.
    #[strum(serialize = "warning")]
    Warning,
    /// Recoverable syntax error. The parser applied a fallback and continued.
    #[strum(serialize = "error")]
    Error,
}

/// A single reported problem, positioned in the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    /// System identifier of the document being parsed.
    pub system_ident: String,
    /// Line number, starting at 1.
    pub line: u64,
    /// Column index, starting at 0.
    pub column: u64,
    /// Warning or error.
    pub severity: Severity,
    /// Human readable description.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ident = if self.system_ident.is_empty() {
            "<input>"
        } else {
            self.system_ident.as_str()
        };
        write!(
            f,
            "{ident}:{}:{}: {}: {}",
            self.line, self.column, self.severity, self.message
        )
    }
}

/// Receiver of parser diagnostics.
pub trait Logger {
    /// Accept one diagnostic.
    fn log(&mut self, diagnostic: Diagnostic);
}

/// Writes diagnostics to stderr, yellow for warnings and red for errors.
///
/// With deduplication enabled, a message that was already printed at any
/// position is suppressed.
#[derive(Debug, Default)]
pub struct ConsoleLogger {
    dedupe: bool,
    seen: HashSet<(Severity, String)>,
}

impl ConsoleLogger {
    /// Create a logger that prints every diagnostic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logger that prints each distinct message only once.
    #[must_use]
    pub fn deduplicating() -> Self {
        Self {
            dedupe: true,
            seen: HashSet::new(),
        }
    }
}

impl Logger for ConsoleLogger {
    fn log(&mut self, diagnostic: Diagnostic) {
        if self.dedupe && !self.seen.insert((diagnostic.severity, diagnostic.message.clone())) {
            return;
        }
        match diagnostic.severity {
            Severity::Warning => eprintln!("{}", diagnostic.yellow()),
            Severity::Error => eprintln!("{}", diagnostic.red()),
        }
    }
}

/// Keeps every diagnostic in memory, in the order it was reported.
#[derive(Debug, Default, Clone)]
pub struct CollectingLogger {
    /// Collected diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl CollectingLogger {
    /// Create an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of collected diagnostics with [`Severity::Error`].
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Number of collected diagnostics with [`Severity::Warning`].
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Messages of all collected diagnostics.
    #[must_use]
    pub fn messages(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }
}

impl Logger for CollectingLogger {
    fn log(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
