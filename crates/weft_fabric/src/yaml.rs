//! Raw serde views of the three fabric description files.
//!
//! These structs mirror the YAML on disk as closely as possible; all
//! normalization (malformed dimension entries, template extraction, unit
//! defaults) happens in [`crate::builder`].

use crate::types::Side;
use serde::Deserialize;
use std::collections::BTreeMap;
use weft_common::Direction;

/// Top level of `fabric_cells.yaml`.
#[derive(Debug, Deserialize)]
pub struct FabricCellsFile {
    /// The tile → site-list layout section.
    pub fabric_cells_by_tile: FabricCellsByTile,
}

/// The `fabric_cells_by_tile` section.
#[derive(Debug, Deserialize)]
pub struct FabricCellsByTile {
    /// Tiles keyed by name. `BTreeMap` keeps tile iteration deterministic.
    pub tiles: BTreeMap<String, TileCells>,
}

/// One tile's site list.
#[derive(Debug, Deserialize)]
pub struct TileCells {
    /// The sites of this tile, in layout order.
    #[serde(default)]
    pub cells: Vec<RawSite>,
}

/// A site row as it appears in `fabric_cells.yaml`.
///
/// Older fabric generators emitted bare name strings; newer ones emit
/// mappings with coordinates.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawSite {
    /// Full entry with coordinates.
    Entry(RawSiteEntry),
    /// Bare site name (no coordinates; dropped with a warning).
    Name(String),
}

/// A full site entry.
#[derive(Debug, Deserialize)]
pub struct RawSiteEntry {
    /// Site name.
    pub name: Option<String>,
    /// Explicit template name, if the generator recorded one.
    pub template_name: Option<String>,
    /// Lower-left X in microns.
    pub x: Option<f64>,
    /// Lower-left Y in microns.
    pub y: Option<f64>,
    /// Placement orientation keyword.
    pub orient: Option<String>,
}

/// Top level of `pins.yaml`.
#[derive(Debug, Deserialize)]
pub struct PinsFile {
    /// The pin-ring section.
    pub pin_placement: PinPlacement,
}

/// The `pin_placement` section.
#[derive(Debug, Deserialize)]
pub struct PinPlacement {
    /// Die extent in microns.
    pub die_area_um: DieArea,
    /// Uniform inset from die to core box, in microns.
    #[serde(default = "default_core_margin")]
    pub core_margin_um: f64,
    /// Distance units.
    #[serde(default)]
    pub units: Option<Units>,
    /// The pad pins.
    #[serde(default)]
    pub pins: Vec<RawPin>,
}

fn default_core_margin() -> f64 {
    10.0
}

/// Die extent in microns.
#[derive(Debug, Deserialize)]
pub struct DieArea {
    /// Die width.
    pub width: f64,
    /// Die height.
    pub height: f64,
}

/// The `units` block of `pins.yaml`.
#[derive(Debug, Deserialize)]
pub struct Units {
    /// Database units per micron for DEF output.
    pub dbu_per_micron: u32,
    /// Coordinate system name (informational).
    #[serde(default)]
    pub coords: Option<String>,
}

/// A pad pin row.
#[derive(Debug, Deserialize)]
pub struct RawPin {
    /// Port name.
    pub name: String,
    /// Signal direction.
    pub direction: Direction,
    /// Pin X in microns.
    pub x_um: f64,
    /// Pin Y in microns.
    pub y_um: f64,
    /// Metal layer.
    #[serde(default)]
    pub layer: Option<String>,
    /// Die edge.
    pub side: Side,
    /// Orientation keyword.
    #[serde(default)]
    pub orient: Option<String>,
    /// Shape width in microns.
    #[serde(default)]
    pub width_um: Option<f64>,
    /// Shape height in microns.
    #[serde(default)]
    pub height_um: Option<f64>,
}

/// Top level of `fabric.yaml`.
#[derive(Debug, Deserialize)]
pub struct FabricDefFile {
    /// Cell-type definitions. Values are left untyped: generator bugs have
    /// produced strings and inline-mapping keys here, normalized in the
    /// builder.
    pub cell_definitions: BTreeMap<String, serde_yaml::Value>,
    /// Fabric-wide information (site dimensions).
    #[serde(default)]
    pub fabric_info: Option<FabricInfo>,
    /// The tile template definition.
    #[serde(default)]
    pub tile_definition: Option<TileDefinition>,
}

/// The `fabric_info` block.
#[derive(Debug, Deserialize)]
pub struct FabricInfo {
    /// The unit site dimensions.
    #[serde(default)]
    pub site_dimensions_um: Option<SiteDimensions>,
}

/// Unit site dimensions in microns.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SiteDimensions {
    /// Site width.
    pub width: f64,
    /// Site height.
    pub height: f64,
}

/// The `tile_definition` block.
#[derive(Debug, Deserialize)]
pub struct TileDefinition {
    /// The template cells of one tile.
    #[serde(default)]
    pub cells: Vec<TemplateCell>,
    /// Tile dimensions in sites.
    #[serde(default)]
    pub dimensions_sites: Option<DimensionsSites>,
}

/// One template cell row of `tile_definition`.
#[derive(Debug, Deserialize)]
pub struct TemplateCell {
    /// Template name (e.g. `R0_NAND2_3`).
    pub template_name: Option<String>,
    /// The master cell type the template instantiates.
    pub cell_type: Option<String>,
}

/// Tile width/height in unit sites.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct DimensionsSites {
    /// Tile width in sites.
    pub width: u32,
    /// Tile height in rows.
    pub height: u32,
}
