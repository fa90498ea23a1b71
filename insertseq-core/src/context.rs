//! Per-invocation generation context and diagnostics
//!
//! Everything one command needs is bundled here and passed explicitly: the
//! original selections, the settings snapshot, the compiled segment table and
//! the diagnostics record. Nothing is shared between invocations.

use crate::grammar::SegmentTable;
use crate::sandbox::{Budget, Sandbox};
use crate::settings::Settings;
use std::cell::RefCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Record of what happened during one invocation.
///
/// Every entry is also emitted as a `tracing` event. Debug entries are only
/// kept when the record was created verbose (the `debug` setting).
#[derive(Debug, Default)]
pub struct Diagnostics {
    verbose: bool,
    entries: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            entries: RefCell::new(Vec::new()),
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "insertseq", "{message}");
        if self.verbose {
            self.push(Severity::Debug, message);
        }
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "insertseq", "{message}");
        self.push(Severity::Warning, message);
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.message.clone())
            .collect()
    }

    fn push(&self, severity: Severity, message: String) {
        self.entries
            .borrow_mut()
            .push(Diagnostic { severity, message });
    }
}

/// Immutable inputs of one invocation.
#[derive(Debug)]
pub struct GenerationContext {
    selections: Vec<String>,
    settings: Settings,
    delimiter: Option<String>,
    segments: SegmentTable,
    diagnostics: Diagnostics,
}

impl GenerationContext {
    pub fn new(selections: Vec<String>, settings: Settings) -> Self {
        Self::with_delimiter(selections, settings, None)
    }

    /// Build a context whose grammar also treats `delimiter` as a boundary.
    pub fn with_delimiter(
        selections: Vec<String>,
        settings: Settings,
        delimiter: Option<String>,
    ) -> Self {
        let diagnostics = Diagnostics::new(settings.debug);
        let segments = SegmentTable::compile(delimiter.as_deref(), &diagnostics);
        Self {
            selections,
            settings,
            delimiter,
            segments,
            diagnostics,
        }
    }

    pub fn selections(&self) -> &[String] {
        &self.selections
    }

    /// Original text at `index`, empty past the last selection.
    pub fn selection(&self, index: usize) -> &str {
        self.selections.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn selection_count(&self) -> usize {
        self.selections.len()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn delimiter(&self) -> Option<&str> {
        self.delimiter.as_deref()
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// A fresh sandbox with the configured time budget.
    pub fn sandbox(&self) -> Sandbox {
        Sandbox::new(Budget::from_millis(self.settings.eval_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_past_end_is_empty() {
        let ctx = GenerationContext::new(vec!["a".into()], Settings::default());
        assert_eq!(ctx.selection(0), "a");
        assert_eq!(ctx.selection(5), "");
        assert_eq!(ctx.selection_count(), 1);
    }

    #[test]
    fn debug_entries_need_verbose() {
        let quiet = Diagnostics::new(false);
        quiet.debug("hidden");
        quiet.warn("shown");
        assert_eq!(quiet.entries().len(), 1);
        assert_eq!(quiet.warnings(), vec!["shown".to_string()]);

        let verbose = Diagnostics::new(true);
        verbose.debug("kept");
        assert_eq!(verbose.entries()[0].severity, Severity::Debug);
    }
}
