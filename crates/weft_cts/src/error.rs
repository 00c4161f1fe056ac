//! Error types for clock-tree synthesis.

/// Errors that can occur during CTS.
#[derive(Debug, thiserror::Error)]
pub enum CtsError {
    /// The explicitly requested clock port does not exist in the design.
    #[error("clock port '{port}' not found in the design")]
    UnknownClockPort {
        /// The requested port name.
        port: String,
    },
}
