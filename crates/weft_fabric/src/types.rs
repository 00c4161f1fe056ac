//! Structural elements of the fabric: tiles, sites and the pin ring.

use serde::{Deserialize, Serialize};
use weft_common::{CellTypeId, Direction, Orient, Point, SiteId, TileId};

/// Which edge of the die a pad pin sits on.
///
/// The side decides which way the DEF pin rectangle extends into the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Top edge.
    North,
    /// Bottom edge.
    South,
    /// Right edge.
    East,
    /// Left edge.
    West,
}

/// A single placement seat in the fabric.
///
/// Sites are fixed at manufacture: their position, master cell type and
/// orientation never change. Placement binds logical instances to sites of
/// the identical type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// The unique ID of this site.
    pub id: SiteId,
    /// The fabric name of this site (e.g. `T2_1_R0_NAND2_3`).
    pub name: String,
    /// The interned master cell type this site can host.
    pub cell_type: CellTypeId,
    /// Lower-left position in microns.
    pub pos: Point,
    /// Width in microns.
    pub width_um: f64,
    /// Height in microns.
    pub height_um: f64,
    /// Placement orientation.
    pub orient: Orient,
    /// The tile containing this site.
    pub tile: TileId,
    /// Row index of this site within its tile.
    pub row: u16,
}

/// A rectangular group of sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    /// The unique ID of this tile.
    pub id: TileId,
    /// The fabric name of this tile (e.g. `T2_1`).
    pub name: String,
    /// The sites contained in this tile, in layout order.
    pub sites: Vec<SiteId>,
}

/// A pad pin on the die boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    /// Port name this pin realizes.
    pub name: String,
    /// Signal direction.
    pub direction: Direction,
    /// Pin position in microns.
    pub pos: Point,
    /// Metal layer the pin shape is drawn on.
    pub layer: String,
    /// Die edge the pin sits on.
    pub side: Side,
    /// Pin orientation.
    pub orient: Orient,
    /// Pin shape width in microns.
    pub width_um: f64,
    /// Pin shape height in microns.
    pub height_um: f64,
}
