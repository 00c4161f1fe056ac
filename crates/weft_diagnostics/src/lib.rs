//! Diagnostics for the weft flow.
//!
//! Stages report soft failures — an ECO candidate with no known pin list, a
//! CTS subtree with no reachable buffer, a missing optional input — as
//! [`Diagnostic`] records emitted into a shared [`DiagnosticSink`] instead of
//! printing. The CLI renders the accumulated records once at the end of each
//! command and decides the exit code from the counts.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use renderer::TerminalRenderer;
pub use severity::Severity;
pub use sink::DiagnosticSink;
