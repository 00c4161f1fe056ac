//! Error types for the emitters.

/// Errors that can occur while emitting or reloading flow outputs.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// An I/O error while writing or reading an artifact.
    #[error("emitter I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A required input artifact is absent.
    #[error("missing input: {what}")]
    MissingInput {
        /// Description of the absent artifact.
        what: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_input() {
        let err = EmitError::MissingInput {
            what: "placement map build/6502/6502.map".into(),
        };
        assert!(format!("{err}").starts_with("missing input:"));
    }
}
