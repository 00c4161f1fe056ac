//! Error types for placement.

/// Errors that can occur while placing the design.
#[derive(Debug, thiserror::Error)]
pub enum PlaceError {
    /// More instances of a cell type than the fabric has compatible sites.
    ///
    /// Raised before any instance is bound, so no partial placement escapes.
    #[error("fabric capacity exhausted for '{cell_type}': {required} instances, {available} sites")]
    CapacityExhausted {
        /// The over-subscribed cell type.
        cell_type: String,
        /// Instances of this type in the design.
        required: usize,
        /// Compatible sites in the fabric.
        available: usize,
    },

    /// A top-level port has no pad pin in the fabric pin ring.
    #[error("port '{port}' not found in the fabric pin ring")]
    MissingPin {
        /// The unmatched port name.
        port: String,
    },

    /// No free compatible site remained for an instance.
    ///
    /// Cannot happen once the capacity pre-check has passed.
    #[error("no free site of type '{cell_type}' left for instance '{inst}'")]
    NoFreeSite {
        /// The instance that could not be bound.
        inst: String,
        /// Its cell type.
        cell_type: String,
    },
}
