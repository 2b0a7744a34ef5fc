//! Non-fatal import diagnostics
//!
//! Unknown tags and unregistered child elements do not abort an import. They
//! are reported through a host-provided [`Diagnostics`] sink and parsing
//! continues.

use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational notice, e.g. an unknown leaf tag
    Warning,
    /// A start tag with no registered handler under the active element
    Error,
}

/// A single diagnostic message with its source location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Human readable message
    pub message: String,
    /// Design file being imported
    pub file: String,
    /// 1-based line of the triggering event
    pub line: usize,
}

impl Diagnostic {
    /// Create a warning
    pub fn warning(message: impl Into<String>, file: &str, line: usize) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            file: file.to_string(),
            line,
        }
    }

    /// Create an error
    pub fn error(message: impl Into<String>, file: &str, line: usize) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            file: file.to_string(),
            line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.message)
    }
}

/// Host messaging facility
pub trait Diagnostics {
    /// Deliver one diagnostic
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in memory
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics in report order
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Warnings only
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Errors only
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was reported
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Diagnostics for DiagnosticLog {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{}", diagnostic),
            Severity::Error => log::error!("{}", diagnostic),
        }
    }
}
