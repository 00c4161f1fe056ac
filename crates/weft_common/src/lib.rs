//! Shared foundational types for the weft structured-ASIC flow.
//!
//! This crate provides the opaque ID newtypes used across every stage,
//! 2-D geometry primitives in microns, the cell-type interning table with
//! name-based classification helpers, and the common internal-error result
//! type.

#![warn(missing_docs)]

pub mod celltype;
pub mod direction;
pub mod geom;
pub mod ids;
pub mod result;

pub use celltype::TypeTable;
pub use direction::Direction;
pub use geom::{BBox, Orient, Point};
pub use ids::{CellTypeId, InstId, NetId, PortId, SiteId, TileId};
pub use result::{InternalError, WeftResult};
