//! Error types for Liberty parsing.

/// Errors that can occur while reading leakage data.
#[derive(Debug, thiserror::Error)]
pub enum LibertyError {
    /// An I/O error occurred while reading the library file.
    #[error("failed to read liberty file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file was read but contained no usable leakage stanzas.
    ///
    /// Distinguished from a missing file so callers can tell a wrong input
    /// apart from an absent one.
    #[error("no leakage_power data found in {path}")]
    MissingData {
        /// The offending file.
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_data() {
        let err = LibertyError::MissingData {
            path: "tech/lib.lib".into(),
        };
        assert_eq!(format!("{err}"), "no leakage_power data found in tech/lib.lib");
    }
}
