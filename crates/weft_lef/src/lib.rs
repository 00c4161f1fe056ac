//! LEF and technology-LEF extraction.
//!
//! The flow needs very little from LEF: per-macro pin name sets (to validate
//! Verilog port connections and normalize output pin names), and from the
//! technology LEF the `SITE` dimensions and routing `LAYER` list for DEF
//! ROW/TRACKS generation. Both parsers are line-oriented scanners that skip
//! everything they do not recognize.

#![warn(missing_docs)]

pub mod error;
pub mod lef;
pub mod tlef;

pub use error::LefError;
pub use lef::LefLibrary;
pub use tlef::{TechLayer, TechSite, TlefData};
