//! Error types for LEF reading.

/// Errors that can occur while reading LEF or TLEF files.
#[derive(Debug, thiserror::Error)]
pub enum LefError {
    /// An I/O error occurred while reading the file.
    #[error("failed to read LEF file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
