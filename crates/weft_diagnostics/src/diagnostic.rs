//! The diagnostic record type.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A single diagnostic message emitted by a flow stage.
///
/// Weft diagnostics have no source spans: the inputs are databases, not text
/// the user wrote, so a record is a severity, the stage that produced it, and
/// the message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// How severe the condition is.
    pub severity: Severity,
    /// The flow stage that emitted the record (e.g. `"cts"`, `"eco"`).
    pub stage: String,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Creates an error diagnostic.
    pub fn error(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates a warning diagnostic.
    pub fn warning(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Creates a note diagnostic.
    pub fn note(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            stage: stage.into(),
            message: message.into(),
        }
    }
}
