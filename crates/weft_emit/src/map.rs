//! The line-oriented placement map.
//!
//! Two sections in one file: one line per port (`name x y`), then one line
//! per fabric site (`site type x y -> inst-or-UNUSED`), both sorted by name.
//! The format survives a write → parse → write round trip byte for byte.

use std::collections::BTreeMap;
use weft_common::{Point, TypeTable};
use weft_fabric::FabricDb;
use weft_netlist::LogicalDb;
use weft_place::Placement;

/// The reserved mapping value for an unclaimed site.
const UNUSED: &str = "UNUSED";

/// One site row of the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSite {
    /// The site's master cell type.
    pub cell_type: String,
    /// Site X in microns.
    pub x: f64,
    /// Site Y in microns.
    pub y: f64,
    /// The logical instance bound to the site, or `None` for `UNUSED`.
    pub mapped: Option<String>,
}

/// An in-memory placement map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementMap {
    /// Port pseudo-positions keyed by port name.
    pub ports: BTreeMap<String, (f64, f64)>,
    /// Site rows keyed by site name.
    pub sites: BTreeMap<String, MapSite>,
}

impl PlacementMap {
    /// Captures the current placement state of the flow.
    pub fn from_flow(
        fabric: &FabricDb,
        types: &TypeTable,
        db: &LogicalDb,
        placement: &Placement,
    ) -> Self {
        let mut map = Self::default();
        for port in db.ports() {
            if let Some(pos) = placement.port_pos(port.id) {
                map.ports.insert(port.name.clone(), (pos.x, pos.y));
            }
        }
        for site in fabric.sites() {
            let mapped = placement
                .inst_at(site.id)
                .map(|inst| db.cell(inst).name.clone());
            map.sites.insert(
                site.name.clone(),
                MapSite {
                    cell_type: types.name(site.cell_type).to_string(),
                    x: site.pos.x,
                    y: site.pos.y,
                    mapped,
                },
            );
        }
        map
    }

    /// Parses map text. Malformed rows are skipped individually.
    pub fn parse(content: &str) -> Self {
        let mut map = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some((left, right)) = line.split_once("->") {
                let fields: Vec<&str> = left.split_whitespace().collect();
                if fields.len() < 4 {
                    continue;
                }
                let (Ok(x), Ok(y)) = (fields[2].parse::<f64>(), fields[3].parse::<f64>()) else {
                    continue;
                };
                let mapped = right.trim();
                map.sites.insert(
                    fields[0].to_string(),
                    MapSite {
                        cell_type: fields[1].to_string(),
                        x,
                        y,
                        mapped: (mapped != UNUSED).then(|| mapped.to_string()),
                    },
                );
            } else {
                let fields: Vec<&str> = line.split_whitespace().collect();
                if fields.len() < 3 {
                    continue;
                }
                let (Ok(x), Ok(y)) = (fields[1].parse::<f64>(), fields[2].parse::<f64>()) else {
                    continue;
                };
                map.ports.insert(fields[0].to_string(), (x, y));
            }
        }
        map
    }

    /// Renders the map in its on-disk format.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, (x, y)) in &self.ports {
            out.push_str(&format!("{name} {x:.2} {y:.2}\n"));
        }
        for (name, site) in &self.sites {
            let mapped = site.mapped.as_deref().unwrap_or(UNUSED);
            out.push_str(&format!(
                "{name}  {}  {:.2}  {:.2}  ->  {mapped}\n",
                site.cell_type, site.x, site.y
            ));
        }
        out
    }

    /// Rebuilds a live [`Placement`] against the given databases.
    ///
    /// Rows naming unknown sites, instances or ports are ignored.
    pub fn to_placement(&self, fabric: &FabricDb, db: &LogicalDb) -> Placement {
        let mut placement = Placement::new();
        for (name, (x, y)) in &self.ports {
            if let Some(port) = db.port_by_name(name) {
                placement.set_port(port.id, Point::new(*x, *y));
            }
        }
        for (site_name, row) in &self.sites {
            let Some(mapped) = &row.mapped else {
                continue;
            };
            let Some(site) = fabric.site_by_name(site_name) else {
                continue;
            };
            let Some(cell) = db.cell_by_name(mapped) else {
                continue;
            };
            // Ignore rows that would double-claim.
            let _ = placement.place(cell.id, site);
        }
        placement
    }

    /// The instances bound in the map: `logical name -> site name`.
    pub fn logical_to_site(&self) -> BTreeMap<String, String> {
        self.sites
            .iter()
            .filter_map(|(site, row)| row.mapped.clone().map(|m| (m, site.clone())))
            .collect()
    }
}
