//! Rendering of accumulated diagnostics to a terminal.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Renders diagnostics as one line each, `severity[stage]: message`.
pub struct TerminalRenderer {
    /// Minimum severity to render; anything below is dropped.
    pub min_severity: Severity,
}

impl TerminalRenderer {
    /// Creates a renderer that shows everything from `min_severity` up.
    pub fn new(min_severity: Severity) -> Self {
        Self { min_severity }
    }

    /// Renders a single diagnostic into a formatted line (no trailing newline).
    pub fn render(&self, diag: &Diagnostic) -> Option<String> {
        if diag.severity < self.min_severity {
            return None;
        }
        Some(format!("{}[{}]: {}", diag.severity, diag.stage, diag.message))
    }

    /// Renders a batch of diagnostics to stderr.
    pub fn render_all(&self, diags: &[Diagnostic]) {
        for diag in diags {
            if let Some(line) = self.render(diag) {
                eprintln!("{line}");
            }
        }
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(Severity::Warning)
    }
}
