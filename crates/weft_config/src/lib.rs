//! Project configuration for the weft flow.
//!
//! A `weft.toml` at the project root names the design and overrides the
//! conventional file layout (`fabric/*.yaml`, `designs/<name>_mapped.json`,
//! `tech/*.lib|.lef|.tlef`, `build/<design>/`) and the annealer knobs.
//! Every field has a default, so the file is optional; CLI flags override
//! file values.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use types::{CtsSection, PathsSection, ProjectConfig, ProjectSection, SaSection};
