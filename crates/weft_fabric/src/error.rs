//! Error types for fabric loading.

/// Errors that can occur while building the fabric database.
#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// An I/O error occurred while reading a fabric file.
    #[error("failed to read fabric file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML content could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// The file that could not be parsed.
        path: String,
        /// Parser error description.
        message: String,
    },

    /// A required section is missing from one of the fabric files.
    #[error("missing required section '{section}' in {path}")]
    MissingSection {
        /// The file the section was expected in.
        path: String,
        /// The missing section name.
        section: String,
    },
}
