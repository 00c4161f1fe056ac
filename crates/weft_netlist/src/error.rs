//! Error types for netlist loading.

/// Errors that can occur while loading the design netlist.
#[derive(Debug, thiserror::Error)]
pub enum NetlistError {
    /// An I/O error occurred while reading the design file.
    #[error("failed to read design file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON content could not be parsed.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// The file that could not be parsed.
        path: String,
        /// Parser error description.
        message: String,
    },

    /// The design file contains no modules at all.
    #[error("no modules found in {path}")]
    NoModules {
        /// The offending file.
        path: String,
    },
}
