//! Accumulating diagnostics collector.
//!
//! Replaces any notion of a process-wide error flag: every pass takes
//! `&mut Diagnostics`, reports into it, and keeps going where it can so a
//! single run surfaces as many problems as possible. The caller inspects
//! `has_errors()` before handing the tree to anything downstream.

use crate::{Diagnostic, Severity};

/// Collected diagnostics for one pipeline run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
    error_count: usize,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Record a diagnostic.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.items.push(diagnostic);
    }

    /// Move every diagnostic from `other` into this collector.
    pub fn absorb(&mut self, mut other: Diagnostics) {
        self.error_count += other.error_count;
        self.items.append(&mut other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// Errors only, skipping warnings.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    /// Render every diagnostic, one per line, in report order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&item.to_string());
            out.push('\n');
        }
        out
    }

    /// Emit every diagnostic to stderr.
    pub fn emit_to_stderr(&self) {
        for item in &self.items {
            eprintln!("{item}");
        }
    }

    /// True if any diagnostic of the given severity was reported.
    pub fn has_severity(&self, severity: Severity) -> bool {
        self.items.iter().any(|d| d.severity == severity)
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
