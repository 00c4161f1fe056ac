//! Fabric database for the weft structured-ASIC flow.
//!
//! The fabric is a pre-fabricated grid of typed standard-cell sites. This
//! crate merges the three fabric description files — `fabric_cells.yaml`
//! (tile → site layout), `pins.yaml` (die, core, pin ring, units) and
//! `fabric.yaml` (cell-type definitions and site dimensions) — into an
//! immutable [`FabricDb`] that the rest of the flow queries but never
//! mutates.

#![warn(missing_docs)]

pub mod builder;
pub mod db;
pub mod error;
pub mod types;
pub mod yaml;

pub use builder::build_fabric_db;
pub use db::FabricDb;
pub use error::FabricError;
pub use types::{Pin, Side, Site, Tile};
