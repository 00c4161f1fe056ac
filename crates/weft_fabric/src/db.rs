//! The merged, read-only fabric database.

use crate::types::{Pin, Site, Tile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_common::{BBox, CellTypeId, SiteId, TileId};

/// The immutable fabric database.
///
/// Built once by [`crate::build_fabric_db`] and read-shared by every later
/// stage. All lookup indexes are materialized at build time; nothing here
/// mutates after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricDb {
    sites: Vec<Site>,
    tiles: Vec<Tile>,
    pins: Vec<Pin>,
    die_bbox: BBox,
    core_bbox: BBox,
    dbu_per_micron: u32,
    site_width_um: f64,
    site_height_um: f64,
    #[serde(skip)]
    site_by_name: HashMap<String, SiteId>,
    #[serde(skip)]
    sites_by_type: HashMap<CellTypeId, Vec<SiteId>>,
    #[serde(skip)]
    site_at: HashMap<(u64, u64), SiteId>,
    #[serde(skip)]
    tile_by_name: HashMap<String, TileId>,
    #[serde(skip)]
    pin_by_name: HashMap<String, usize>,
}

impl FabricDb {
    /// Assembles a database from already-merged parts and builds the indexes.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        sites: Vec<Site>,
        tiles: Vec<Tile>,
        pins: Vec<Pin>,
        die_bbox: BBox,
        core_bbox: BBox,
        dbu_per_micron: u32,
        site_width_um: f64,
        site_height_um: f64,
    ) -> Self {
        let mut db = Self {
            sites,
            tiles,
            pins,
            die_bbox,
            core_bbox,
            dbu_per_micron,
            site_width_um,
            site_height_um,
            site_by_name: HashMap::new(),
            sites_by_type: HashMap::new(),
            site_at: HashMap::new(),
            tile_by_name: HashMap::new(),
            pin_by_name: HashMap::new(),
        };
        db.rebuild_indices();
        db
    }

    /// Rebuilds the lookup indexes (needed after deserialization).
    pub fn rebuild_indices(&mut self) {
        self.site_by_name.clear();
        self.sites_by_type.clear();
        self.site_at.clear();
        for site in &self.sites {
            self.site_by_name.insert(site.name.clone(), site.id);
            self.sites_by_type
                .entry(site.cell_type)
                .or_default()
                .push(site.id);
            self.site_at
                .insert((site.pos.x.to_bits(), site.pos.y.to_bits()), site.id);
        }
        self.tile_by_name.clear();
        for tile in &self.tiles {
            self.tile_by_name.insert(tile.name.clone(), tile.id);
        }
        self.pin_by_name.clear();
        for (i, pin) in self.pins.iter().enumerate() {
            self.pin_by_name.insert(pin.name.clone(), i);
        }
    }

    /// Returns the site with the given ID.
    pub fn site(&self, id: SiteId) -> &Site {
        &self.sites[id.as_raw() as usize]
    }

    /// Iterates all sites in ID order.
    pub fn sites(&self) -> impl Iterator<Item = &Site> {
        self.sites.iter()
    }

    /// Number of sites in the fabric.
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Iterates the sites of the given cell type, in ascending site ID.
    pub fn sites_of_type(&self, ty: CellTypeId) -> impl Iterator<Item = &Site> {
        self.sites_by_type
            .get(&ty)
            .into_iter()
            .flatten()
            .map(|&id| self.site(id))
    }

    /// Number of sites of the given cell type.
    pub fn site_count_of_type(&self, ty: CellTypeId) -> usize {
        self.sites_by_type.get(&ty).map_or(0, |v| v.len())
    }

    /// Looks up a site by its fabric name.
    pub fn site_by_name(&self, name: &str) -> Option<&Site> {
        self.site_by_name.get(name).map(|&id| self.site(id))
    }

    /// Looks up a site at the exact micron position `(x, y)`.
    pub fn site_at(&self, x: f64, y: f64) -> Option<&Site> {
        self.site_at
            .get(&(x.to_bits(), y.to_bits()))
            .map(|&id| self.site(id))
    }

    /// Returns the tile with the given ID.
    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id.as_raw() as usize]
    }

    /// Iterates all tiles in ID order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// Looks up a tile by name.
    pub fn tile_by_name(&self, name: &str) -> Option<&Tile> {
        self.tile_by_name.get(name).map(|&id| self.tile(id))
    }

    /// Iterates the pad pins.
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    /// Looks up the pad pin realizing the given top-level port.
    pub fn pin_of_port(&self, name: &str) -> Option<&Pin> {
        self.pin_by_name.get(name).map(|&i| &self.pins[i])
    }

    /// The die bounding box in microns.
    pub fn die_bbox(&self) -> BBox {
        self.die_bbox
    }

    /// The core (placement) bounding box in microns.
    pub fn core_bbox(&self) -> BBox {
        self.core_bbox
    }

    /// Database units per micron for DEF output.
    pub fn dbu_per_micron(&self) -> u32 {
        self.dbu_per_micron
    }

    /// Width of the unit placement site in microns.
    pub fn site_width_um(&self) -> f64 {
        self.site_width_um
    }

    /// Height of the unit placement site in microns.
    pub fn site_height_um(&self) -> f64 {
        self.site_height_um
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;
    use weft_common::{Direction, Orient, Point};

    fn tiny_db() -> (FabricDb, CellTypeId, CellTypeId) {
        let nand = CellTypeId::from_raw(0);
        let buf = CellTypeId::from_raw(1);
        let mk_site = |id: u32, name: &str, ty: CellTypeId, x: f64, y: f64| Site {
            id: SiteId::from_raw(id),
            name: name.into(),
            cell_type: ty,
            pos: Point::new(x, y),
            width_um: 1.38,
            height_um: 2.72,
            orient: Orient::N,
            tile: TileId::from_raw(0),
            row: 0,
        };
        let sites = vec![
            mk_site(0, "T0_0_R0_NAND2_0", nand, 10.0, 10.0),
            mk_site(1, "T0_0_R0_NAND2_1", nand, 12.0, 10.0),
            mk_site(2, "T0_0_R1_BUF_0", buf, 10.0, 12.72),
        ];
        let tiles = vec![Tile {
            id: TileId::from_raw(0),
            name: "T0_0".into(),
            sites: vec![SiteId::from_raw(0), SiteId::from_raw(1), SiteId::from_raw(2)],
        }];
        let pins = vec![Pin {
            name: "clk".into(),
            direction: Direction::Input,
            pos: Point::new(0.0, 20.0),
            layer: "met2".into(),
            side: Side::West,
            orient: Orient::N,
            width_um: 0.3,
            height_um: 0.3,
        }];
        let db = FabricDb::from_parts(
            sites,
            tiles,
            pins,
            BBox::new(0.0, 0.0, 100.0, 100.0),
            BBox::new(10.0, 10.0, 90.0, 90.0),
            1000,
            0.46,
            2.72,
        );
        (db, nand, buf)
    }

    #[test]
    fn query_by_name_and_position() {
        let (db, _, _) = tiny_db();
        assert!(db.site_by_name("T0_0_R0_NAND2_1").is_some());
        assert!(db.site_by_name("nope").is_none());
        assert_eq!(
            db.site_at(12.0, 10.0).unwrap().name,
            "T0_0_R0_NAND2_1"
        );
        assert!(db.site_at(12.1, 10.0).is_none());
    }

    #[test]
    fn sites_of_type_in_id_order() {
        let (db, nand, buf) = tiny_db();
        let ids: Vec<u32> = db.sites_of_type(nand).map(|s| s.id.as_raw()).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(db.site_count_of_type(buf), 1);
        assert_eq!(db.site_count_of_type(CellTypeId::from_raw(9)), 0);
    }

    #[test]
    fn pin_of_port() {
        let (db, _, _) = tiny_db();
        assert_eq!(db.pin_of_port("clk").unwrap().pos.y, 20.0);
        assert!(db.pin_of_port("rst").is_none());
    }

    #[test]
    fn bboxes_and_units() {
        let (db, _, _) = tiny_db();
        assert_eq!(db.die_bbox().urx, 100.0);
        assert_eq!(db.core_bbox().llx, 10.0);
        assert_eq!(db.dbu_per_micron(), 1000);
    }
}
