//! Common result and error types for the weft flow.

/// The standard result type for operations that can only fail on a weft bug.
///
/// Stage-specific failure modes (parse errors, capacity exhaustion, …) have
/// their own typed errors in the owning crate. `WeftResult` is reserved for
/// invariant violations — a placement whose two maps disagree, a net whose
/// closure does not match the cell pin tables — which indicate a logic error
/// in the flow itself.
pub type WeftResult<T> = Result<T, InternalError>;

/// An internal flow error indicating a bug in weft, not a user input problem.
#[derive(Debug, thiserror::Error)]
#[error("internal flow error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("site claimed twice");
        assert_eq!(format!("{err}"), "internal flow error: site claimed twice");
    }

    #[test]
    fn from_string() {
        let err: InternalError = "map mismatch".to_string().into();
        assert_eq!(err.message, "map mismatch");
    }

    #[test]
    fn ok_path() {
        let r: WeftResult<u32> = Ok(7);
        assert_eq!(r.ok(), Some(7));
    }
}
