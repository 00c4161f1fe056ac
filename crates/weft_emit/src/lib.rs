//! Output emitters: placement map, Verilog netlist, DEF 5.8.
//!
//! Everything the flow writes to disk goes through this crate. The placement
//! map is also re-parsed here (later stages and standalone CLI runs reload
//! it), so writer and parser live side by side and round-trip exactly.

#![warn(missing_docs)]

pub mod def;
pub mod error;
pub mod map;
pub mod verilog;

pub use def::{validate_def, write_def, DefOptions};
pub use error::EmitError;
pub use map::PlacementMap;
pub use verilog::{generate_verilog, rename_instances};
