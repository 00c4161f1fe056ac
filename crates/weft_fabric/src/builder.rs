//! Merging the three fabric description files into a [`FabricDb`].

use crate::db::FabricDb;
use crate::error::FabricError;
use crate::types::{Pin, Site, Tile};
use crate::yaml::{FabricCellsFile, FabricDefFile, PinsFile, RawSite, SiteDimensions};
use std::collections::HashMap;
use std::path::Path;
use weft_common::{celltype, BBox, Orient, Point, SiteId, TileId, TypeTable};
use weft_diagnostics::DiagnosticSink;

const STAGE: &str = "fabric";

/// Builds the fabric database from the three fabric description files.
///
/// `types` is the shared cell-type table; every site's master name is
/// interned into it. Recoverable problems (malformed dimension rows, sites
/// without coordinates, unmapped templates) are reported to `sink` and the
/// affected site is dropped; only I/O, YAML syntax and missing required
/// sections are hard errors.
pub fn build_fabric_db(
    fabric_cells_path: &Path,
    pins_path: &Path,
    fabric_def_path: &Path,
    types: &mut TypeTable,
    sink: &DiagnosticSink,
) -> Result<FabricDb, FabricError> {
    let cells = read_to_string(fabric_cells_path)?;
    let pins = read_to_string(pins_path)?;
    let def = read_to_string(fabric_def_path)?;
    build_fabric_db_from_strs(
        &cells,
        &pins,
        &def,
        fabric_def_path.to_string_lossy().as_ref(),
        types,
        sink,
    )
}

/// Builds the fabric database from in-memory YAML strings.
///
/// Useful for testing without filesystem dependencies; `def_path` is only
/// used in error messages.
pub fn build_fabric_db_from_strs(
    fabric_cells_yaml: &str,
    pins_yaml: &str,
    fabric_def_yaml: &str,
    def_path: &str,
    types: &mut TypeTable,
    sink: &DiagnosticSink,
) -> Result<FabricDb, FabricError> {
    let cells_file: FabricCellsFile = parse_yaml(fabric_cells_yaml, "fabric_cells.yaml")?;
    let pins_file: PinsFile = parse_yaml(pins_yaml, "pins.yaml")?;
    let def_file: FabricDefFile = parse_yaml(fabric_def_yaml, "fabric.yaml")?;

    if def_file.cell_definitions.is_empty() {
        return Err(FabricError::MissingSection {
            path: def_path.to_string(),
            section: "cell_definitions".to_string(),
        });
    }
    let site_dims = def_file
        .fabric_info
        .as_ref()
        .and_then(|i| i.site_dimensions_um)
        .ok_or_else(|| FabricError::MissingSection {
            path: def_path.to_string(),
            section: "fabric_info.site_dimensions_um".to_string(),
        })?;
    let tile_def = def_file
        .tile_definition
        .as_ref()
        .ok_or_else(|| FabricError::MissingSection {
            path: def_path.to_string(),
            section: "tile_definition".to_string(),
        })?;

    let dims = normalize_cell_definitions(&def_file, sink);

    // template_name -> master cell type
    let mut template_to_type: HashMap<String, String> = HashMap::new();
    for cell in &tile_def.cells {
        if let (Some(t), Some(ty)) = (&cell.template_name, &cell.cell_type) {
            template_to_type.insert(t.clone(), ty.clone());
        }
    }

    let mut sites: Vec<Site> = Vec::new();
    let mut tiles: Vec<Tile> = Vec::new();

    for (tile_name, tile_cells) in &cells_file.fabric_cells_by_tile.tiles {
        let tile_id = TileId::from_raw(tiles.len() as u32);
        let mut tile_sites: Vec<SiteId> = Vec::new();

        for raw in &tile_cells.cells {
            let entry = match raw {
                RawSite::Entry(e) => e,
                RawSite::Name(n) => {
                    sink.warn(STAGE, format!("site '{n}' has no coordinates, dropped"));
                    continue;
                }
            };
            let name = match entry.name.as_deref().or(entry.template_name.as_deref()) {
                Some(n) => n.to_string(),
                None => {
                    sink.warn(STAGE, format!("unnamed site in tile '{tile_name}', dropped"));
                    continue;
                }
            };
            let (x, y) = match (entry.x, entry.y) {
                (Some(x), Some(y)) => (x, y),
                _ => {
                    sink.warn(STAGE, format!("site '{name}' has no coordinates, dropped"));
                    continue;
                }
            };
            let (template, row) = match find_template(&name) {
                Some(t) => t,
                None => {
                    sink.warn(STAGE, format!("site '{name}' has no template suffix, dropped"));
                    continue;
                }
            };
            let cell_type = match template_to_type.get(template) {
                Some(ty) => ty.clone(),
                None => {
                    sink.warn(
                        STAGE,
                        format!("no cell type mapped for template '{template}', site '{name}' dropped"),
                    );
                    continue;
                }
            };
            let width_sites = match dims.get(cell_type.as_str()) {
                Some(&w) => w,
                None if celltype::is_tap(&cell_type) => 1,
                None => {
                    sink.warn(
                        STAGE,
                        format!("no dimensions for cell type '{cell_type}', site '{name}' dropped"),
                    );
                    continue;
                }
            };
            let orient = entry
                .orient
                .as_deref()
                .and_then(Orient::parse)
                .unwrap_or_default();

            let id = SiteId::from_raw(sites.len() as u32);
            sites.push(Site {
                id,
                name,
                cell_type: types.intern(&cell_type),
                pos: Point::new(x, y),
                width_um: width_sites as f64 * site_dims.width,
                height_um: site_dims.height,
                orient,
                tile: tile_id,
                row,
            });
            tile_sites.push(id);
        }

        tiles.push(Tile {
            id: tile_id,
            name: tile_name.clone(),
            sites: tile_sites,
        });
    }

    let placement = &pins_file.pin_placement;
    let die_bbox = BBox::new(
        0.0,
        0.0,
        placement.die_area_um.width,
        placement.die_area_um.height,
    );
    let margin = placement.core_margin_um;
    let core_bbox = BBox::new(
        margin,
        margin,
        placement.die_area_um.width - margin,
        placement.die_area_um.height - margin,
    );
    let dbu = placement
        .units
        .as_ref()
        .map(|u| u.dbu_per_micron)
        .unwrap_or(1000);

    let pins: Vec<Pin> = placement
        .pins
        .iter()
        .map(|p| Pin {
            name: p.name.clone(),
            direction: p.direction,
            pos: Point::new(p.x_um, p.y_um),
            layer: p.layer.clone().unwrap_or_else(|| "met2".to_string()),
            side: p.side,
            orient: p
                .orient
                .as_deref()
                .and_then(Orient::parse)
                .unwrap_or_default(),
            width_um: p.width_um.unwrap_or(0.3),
            height_um: p.height_um.unwrap_or(0.3),
        })
        .collect();

    sink.note(
        STAGE,
        format!(
            "fabric: {} sites in {} tiles, {} pad pins",
            sites.len(),
            tiles.len(),
            pins.len()
        ),
    );

    Ok(FabricDb::from_parts(
        sites,
        tiles,
        pins,
        die_bbox,
        core_bbox,
        dbu,
        site_dims.width,
        site_dims.height,
    ))
}

fn read_to_string(path: &Path) -> Result<String, FabricError> {
    std::fs::read_to_string(path).map_err(|source| FabricError::Io {
        path: path.to_string_lossy().into_owned(),
        source,
    })
}

fn parse_yaml<T: serde::de::DeserializeOwned>(content: &str, path: &str) -> Result<T, FabricError> {
    serde_yaml::from_str(content).map_err(|e| FabricError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })
}

/// Normalizes the `cell_definitions` section into `type name -> width_sites`.
///
/// Fabric generators have emitted malformed rows here: keys with inline
/// mapping text, string values, or rows missing `width_sites` entirely.
/// Tap cells default to one site wide; any other unusable row is dropped
/// with a warning.
fn normalize_cell_definitions(
    def_file: &FabricDefFile,
    sink: &DiagnosticSink,
) -> HashMap<String, u32> {
    let mut dims = HashMap::new();
    for (raw_key, value) in &def_file.cell_definitions {
        let cell_type = clean_type_key(raw_key);
        if cell_type.is_empty() {
            sink.warn(STAGE, format!("unusable cell definition key '{raw_key}'"));
            continue;
        }

        let width_sites = value
            .as_mapping()
            .and_then(|m| m.get("width_sites"))
            .and_then(|v| v.as_u64())
            .map(|w| w as u32)
            .or_else(|| extract_width_sites(raw_key))
            .or_else(|| value.as_str().and_then(extract_width_sites));

        let width_sites = match width_sites {
            Some(w) => w,
            None if celltype::is_tap(&cell_type) => 1,
            None => {
                sink.warn(
                    STAGE,
                    format!("no width_sites for cell type '{cell_type}', definition dropped"),
                );
                continue;
            }
        };
        dims.insert(cell_type, width_sites);
    }
    dims
}

/// Truncates a cell-definition key at the first character that cannot be
/// part of a master name (colon, whitespace, quote, brace).
fn clean_type_key(raw: &str) -> String {
    raw.chars()
        .take_while(|c| !matches!(c, ':' | '\'' | '{') && !c.is_whitespace())
        .collect()
}

/// Extracts the first integer following a `width_sites` token, if any.
fn extract_width_sites(s: &str) -> Option<u32> {
    let idx = s.find("width_sites")?;
    let rest = &s[idx + "width_sites".len()..];
    let digits: String = rest
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Finds the `R<row>_...` template suffix in a fabric site name.
///
/// Site names embed their tile-row template, e.g. `T2_1_R0_NAND2_3` uses
/// template `R0_NAND2_3` in row 0. Returns the template slice and the row.
fn find_template(name: &str) -> Option<(&str, u16)> {
    let bytes = name.as_bytes();
    for i in 0..bytes.len().saturating_sub(2) {
        if bytes[i] == b'R' && bytes[i + 1].is_ascii_digit() && bytes[i + 2] == b'_' {
            let row = (bytes[i + 1] - b'0') as u16;
            if row <= 3 {
                return Some((&name[i..], row));
            }
        }
    }
    None
}
