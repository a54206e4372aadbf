//! Core diagnostic types for structured error reporting.
//!
//! Defines [`Diagnostic`] and [`Severity`] — the building blocks every
//! compiler phase uses to report problems. Diagnostics are values; nothing
//! prints or aborts here.

use crate::ErrorCode;
use bidl_ir::Location;
use std::fmt;

/// Severity level for diagnostics.
///
/// There is no fatal severity: contract violations between compiler
/// components panic instead of producing diagnostics, because they are bugs
/// in the compiler rather than mistakes in the input.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic with everything needed to render one `file:line:column` line.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "diagnostics should be reported to a collector, not silently dropped"]
pub struct Diagnostic {
    /// Error code for searchability.
    pub code: ErrorCode,
    pub severity: Severity,
    /// Main message.
    pub message: String,
    /// Where the problem is.
    pub location: Location,
    /// Additional notes providing context.
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn new_with_severity(code: ErrorCode, severity: Severity, location: Location) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            location,
            notes: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    #[cold]
    pub fn error(code: ErrorCode, location: Location) -> Self {
        Self::new_with_severity(code, Severity::Error, location)
    }

    /// Create a new warning diagnostic.
    #[cold]
    pub fn warning(code: ErrorCode, location: Location) -> Self {
        Self::new_with_severity(code, Severity::Warning, location)
    }

    /// Set the main message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a note providing additional context.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}[{}]: {}",
            self.location, self.severity, self.code, self.message
        )?;
        for note in &self.notes {
            write!(f, "\n  = note: {note}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn renders_file_line_column() {
        let loc = Location::new(Arc::from("p/IFoo.bidl"), 4, 9);
        let diag = Diagnostic::error(ErrorCode::E2001, loc)
            .with_message("unknown type `Data`")
            .with_note("did you forget an import?");
        assert_eq!(
            diag.to_string(),
            "p/IFoo.bidl:4:9: error[E2001]: unknown type `Data`\n  = note: did you forget an import?"
        );
    }
}
