//! The two-way placement map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_common::{CellTypeId, InstId, InternalError, Point, PortId, SiteId, WeftResult};
use weft_fabric::{FabricDb, Site};
use weft_netlist::NetNode;

/// Where a placed instance sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedInst {
    /// The bound site.
    pub site: SiteId,
    /// The site's (and instance's) cell type.
    pub cell_type: CellTypeId,
    /// The site position in microns.
    pub pos: Point,
}

/// A bijection between placed instances and claimed sites, plus the fixed
/// pseudo-positions of the top-level ports.
///
/// Both directions are materialized and kept consistent by the mutation
/// methods; [`verify`](Self::verify) checks the invariants for tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Placement {
    by_inst: HashMap<InstId, PlacedInst>,
    by_site: HashMap<SiteId, InstId>,
    port_pos: HashMap<PortId, Point>,
}

impl Placement {
    /// Creates an empty placement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixes a port's pseudo-position (no site is consumed).
    pub fn set_port(&mut self, port: PortId, pos: Point) {
        self.port_pos.insert(port, pos);
    }

    /// The pseudo-position of a port, if fixed.
    pub fn port_pos(&self, port: PortId) -> Option<Point> {
        self.port_pos.get(&port).copied()
    }

    /// Binds `inst` to `site`.
    ///
    /// Fails if the instance is already placed or the site already claimed.
    pub fn place(&mut self, inst: InstId, site: &Site) -> WeftResult<()> {
        if self.by_inst.contains_key(&inst) {
            return Err(InternalError::new(format!(
                "instance {} is already placed",
                inst.as_raw()
            )));
        }
        if self.by_site.contains_key(&site.id) {
            return Err(InternalError::new(format!(
                "site '{}' is already claimed",
                site.name
            )));
        }
        self.by_inst.insert(
            inst,
            PlacedInst {
                site: site.id,
                cell_type: site.cell_type,
                pos: site.pos,
            },
        );
        self.by_site.insert(site.id, inst);
        Ok(())
    }

    /// Unbinds `inst`, freeing its site. Returns the freed site.
    pub fn unplace(&mut self, inst: InstId) -> Option<SiteId> {
        let placed = self.by_inst.remove(&inst)?;
        self.by_site.remove(&placed.site);
        Some(placed.site)
    }

    /// Swaps the sites of two placed instances.
    pub fn swap(&mut self, a: InstId, b: InstId) -> WeftResult<()> {
        let pa = *self.by_inst.get(&a).ok_or_else(|| {
            InternalError::new(format!("swap of unplaced instance {}", a.as_raw()))
        })?;
        let pb = *self.by_inst.get(&b).ok_or_else(|| {
            InternalError::new(format!("swap of unplaced instance {}", b.as_raw()))
        })?;
        self.by_inst.insert(a, pb);
        self.by_inst.insert(b, pa);
        self.by_site.insert(pa.site, b);
        self.by_site.insert(pb.site, a);
        Ok(())
    }

    /// Moves a placed instance to a free site.
    pub fn relocate(&mut self, inst: InstId, site: &Site) -> WeftResult<()> {
        if self.by_site.contains_key(&site.id) {
            return Err(InternalError::new(format!(
                "relocation target '{}' is already claimed",
                site.name
            )));
        }
        let placed = self.by_inst.get_mut(&inst).ok_or_else(|| {
            InternalError::new(format!("relocation of unplaced instance {}", inst.as_raw()))
        })?;
        self.by_site.remove(&placed.site);
        placed.site = site.id;
        placed.pos = site.pos;
        self.by_site.insert(site.id, inst);
        Ok(())
    }

    /// Where `inst` is placed, if anywhere.
    pub fn site_of(&self, inst: InstId) -> Option<&PlacedInst> {
        self.by_inst.get(&inst)
    }

    /// The instance claiming `site`, if any.
    pub fn inst_at(&self, site: SiteId) -> Option<InstId> {
        self.by_site.get(&site).copied()
    }

    /// Returns `true` if no instance claims `site`.
    pub fn is_free(&self, site: SiteId) -> bool {
        !self.by_site.contains_key(&site)
    }

    /// Number of placed instances.
    pub fn placed_count(&self) -> usize {
        self.by_inst.len()
    }

    /// Iterates placed instances (unordered).
    pub fn placed(&self) -> impl Iterator<Item = (InstId, &PlacedInst)> {
        self.by_inst.iter().map(|(&i, p)| (i, p))
    }

    /// The position of a graph node: a placed instance or a fixed port.
    pub fn node_pos(&self, node: NetNode) -> Option<Point> {
        match node {
            NetNode::Inst(i) => self.by_inst.get(&i).map(|p| p.pos),
            NetNode::Port(p) => self.port_pos(p),
        }
    }

    /// Checks both maps against each other and against the fabric.
    ///
    /// Verifies map consistency, site-claim uniqueness (injectivity) and
    /// type compatibility of every binding.
    pub fn verify(&self, fabric: &FabricDb) -> WeftResult<()> {
        if self.by_inst.len() != self.by_site.len() {
            return Err(InternalError::new(format!(
                "placement maps disagree: {} instances vs {} sites",
                self.by_inst.len(),
                self.by_site.len()
            )));
        }
        for (&inst, placed) in &self.by_inst {
            match self.by_site.get(&placed.site) {
                Some(&back) if back == inst => {}
                _ => {
                    return Err(InternalError::new(format!(
                        "site map does not point back at instance {}",
                        inst.as_raw()
                    )))
                }
            }
            let site = fabric.site(placed.site);
            if site.cell_type != placed.cell_type {
                return Err(InternalError::new(format!(
                    "instance {} bound to site '{}' of a different type",
                    inst.as_raw(),
                    site.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::{BBox, Orient, TileId};
    use weft_fabric::Tile;

    fn site(id: u32, ty: u32, x: f64, y: f64) -> Site {
        Site {
            id: SiteId::from_raw(id),
            name: format!("S{id}"),
            cell_type: CellTypeId::from_raw(ty),
            pos: Point::new(x, y),
            width_um: 1.38,
            height_um: 2.72,
            orient: Orient::N,
            tile: TileId::from_raw(0),
            row: 0,
        }
    }

    fn fabric(sites: Vec<Site>) -> FabricDb {
        let tile = Tile {
            id: TileId::from_raw(0),
            name: "T0_0".into(),
            sites: sites.iter().map(|s| s.id).collect(),
        };
        FabricDb::from_parts(
            sites,
            vec![tile],
            vec![],
            BBox::new(0.0, 0.0, 100.0, 100.0),
            BBox::new(5.0, 5.0, 95.0, 95.0),
            1000,
            0.46,
            2.72,
        )
    }

    #[test]
    fn place_and_query() {
        let s0 = site(0, 0, 1.0, 2.0);
        let fab = fabric(vec![s0.clone()]);
        let mut p = Placement::new();
        let inst = InstId::from_raw(0);
        p.place(inst, &s0).unwrap();
        assert_eq!(p.site_of(inst).unwrap().site, s0.id);
        assert_eq!(p.inst_at(s0.id), Some(inst));
        assert!(!p.is_free(s0.id));
        assert!(p.verify(&fab).is_ok());
    }

    #[test]
    fn double_claim_rejected() {
        let s0 = site(0, 0, 1.0, 2.0);
        let mut p = Placement::new();
        p.place(InstId::from_raw(0), &s0).unwrap();
        assert!(p.place(InstId::from_raw(1), &s0).is_err());
    }

    #[test]
    fn double_place_rejected() {
        let s0 = site(0, 0, 1.0, 2.0);
        let s1 = site(1, 0, 3.0, 2.0);
        let mut p = Placement::new();
        p.place(InstId::from_raw(0), &s0).unwrap();
        assert!(p.place(InstId::from_raw(0), &s1).is_err());
    }

    #[test]
    fn swap_exchanges_sites() {
        let s0 = site(0, 0, 1.0, 2.0);
        let s1 = site(1, 0, 9.0, 2.0);
        let fab = fabric(vec![s0.clone(), s1.clone()]);
        let mut p = Placement::new();
        let a = InstId::from_raw(0);
        let b = InstId::from_raw(1);
        p.place(a, &s0).unwrap();
        p.place(b, &s1).unwrap();
        p.swap(a, b).unwrap();
        assert_eq!(p.site_of(a).unwrap().site, s1.id);
        assert_eq!(p.site_of(b).unwrap().site, s0.id);
        assert_eq!(p.inst_at(s0.id), Some(b));
        assert!(p.verify(&fab).is_ok());
    }

    #[test]
    fn relocate_moves_and_frees() {
        let s0 = site(0, 0, 1.0, 2.0);
        let s1 = site(1, 0, 9.0, 2.0);
        let fab = fabric(vec![s0.clone(), s1.clone()]);
        let mut p = Placement::new();
        let a = InstId::from_raw(0);
        p.place(a, &s0).unwrap();
        p.relocate(a, &s1).unwrap();
        assert!(p.is_free(s0.id));
        assert_eq!(p.site_of(a).unwrap().pos, s1.pos);
        assert!(p.verify(&fab).is_ok());
    }

    #[test]
    fn relocate_to_claimed_site_rejected() {
        let s0 = site(0, 0, 1.0, 2.0);
        let s1 = site(1, 0, 9.0, 2.0);
        let mut p = Placement::new();
        p.place(InstId::from_raw(0), &s0).unwrap();
        p.place(InstId::from_raw(1), &s1).unwrap();
        assert!(p.relocate(InstId::from_raw(0), &s1).is_err());
    }

    #[test]
    fn unplace_frees_site() {
        let s0 = site(0, 0, 1.0, 2.0);
        let mut p = Placement::new();
        let a = InstId::from_raw(0);
        p.place(a, &s0).unwrap();
        assert_eq!(p.unplace(a), Some(s0.id));
        assert!(p.is_free(s0.id));
        assert_eq!(p.unplace(a), None);
    }

    #[test]
    fn port_positions() {
        let mut p = Placement::new();
        let port = PortId::from_raw(0);
        p.set_port(port, Point::new(0.0, 50.0));
        assert_eq!(p.port_pos(port), Some(Point::new(0.0, 50.0)));
        assert_eq!(p.node_pos(NetNode::Port(port)), Some(Point::new(0.0, 50.0)));
        assert_eq!(p.node_pos(NetNode::Inst(InstId::from_raw(5))), None);
    }

    #[test]
    fn type_mismatch_detected_by_verify() {
        let s0 = site(0, 0, 1.0, 2.0);
        let mut s0_other = s0.clone();
        s0_other.cell_type = CellTypeId::from_raw(7);
        // Fabric says the site is type 7, but the binding recorded type 0.
        let fab = fabric(vec![s0_other]);
        let mut p = Placement::new();
        p.place(InstId::from_raw(0), &s0).unwrap();
        assert!(p.verify(&fab).is_err());
    }

    #[test]
    fn clone_is_deep() {
        let s0 = site(0, 0, 1.0, 2.0);
        let s1 = site(1, 0, 9.0, 2.0);
        let mut p = Placement::new();
        let a = InstId::from_raw(0);
        p.place(a, &s0).unwrap();
        let snapshot = p.clone();
        p.relocate(a, &s1).unwrap();
        assert_eq!(snapshot.site_of(a).unwrap().site, s0.id);
        assert_eq!(p.site_of(a).unwrap().site, s1.id);
    }
}
