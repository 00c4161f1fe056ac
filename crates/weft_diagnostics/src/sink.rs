//! Thread-safe diagnostic accumulator shared by all flow stages.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// An accumulator for diagnostics emitted during a flow run.
///
/// Stages emit diagnostics concurrently-safely via [`emit`](Self::emit).
/// Error and warning counts are tracked atomically so `has_errors` checks
/// never lock the record vector.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
    warning_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
            warning_count: AtomicUsize::new(0),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Warning => {
                self.warning_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Note => {}
        }
        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.push(diag);
    }

    /// Shorthand for emitting a warning.
    pub fn warn(&self, stage: impl Into<String>, message: impl Into<String>) {
        self.emit(Diagnostic::warning(stage, message));
    }

    /// Shorthand for emitting a note.
    pub fn note(&self, stage: impl Into<String>, message: impl Into<String>) {
        self.emit(Diagnostic::note(stage, message));
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns the number of warning-severity diagnostics emitted so far.
    pub fn warning_count(&self) -> usize {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    ///
    /// The error and warning counters are reset together with the records.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap();
        self.error_count.store(0, Ordering::Relaxed);
        self.warning_count.store(0, Ordering::Relaxed);
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.warning_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn emit_error() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error("place", "capacity exhausted"));
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn warn_does_not_count_as_error() {
        let sink = DiagnosticSink::new();
        sink.warn("eco", "unknown cell type");
        assert!(!sink.has_errors());
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn take_all_drains_and_resets() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error("cts", "x"));
        sink.warn("cts", "y");
        let all = sink.take_all();
        assert_eq!(all.len(), 2);
        assert!(sink.diagnostics().is_empty());
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn snapshot_does_not_drain() {
        let sink = DiagnosticSink::new();
        sink.note("viz", "stage skipped");
        assert_eq!(sink.diagnostics().len(), 1);
        assert_eq!(sink.diagnostics().len(), 1);
    }

    #[test]
    fn shared_across_threads() {
        let sink = std::sync::Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();
        for i in 0..4 {
            let s = sink.clone();
            handles.push(std::thread::spawn(move || {
                s.warn("t", format!("warning {i}"));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.warning_count(), 4);
    }
}
