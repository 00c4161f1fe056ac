//! The greedy seeded placer.
//!
//! Three stages: fix the port pseudo-positions from the fabric pin ring,
//! seed every cell that is directly connected to a port at the barycenter of
//! its port neighbors, then grow outward by repeatedly placing the unplaced
//! cell with the most already-placed neighbors at the barycenter of those
//! neighbors. Each cell binds to the nearest unoccupied, type-compatible
//! site.

use crate::error::PlaceError;
use crate::placement::Placement;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use weft_common::{CellTypeId, InstId, Point, TypeTable};
use weft_diagnostics::DiagnosticSink;
use weft_fabric::{FabricDb, Site};
use weft_netlist::{LogicalDb, NetGraph, NetNode};

const STAGE: &str = "place";

/// Fixes every port's pseudo-position from the fabric pin ring.
///
/// No site is consumed. Fails on the first port without a pad pin.
pub fn place_pins(
    fabric: &FabricDb,
    db: &LogicalDb,
    placement: &mut Placement,
) -> Result<(), PlaceError> {
    for port in db.ports() {
        let pin = fabric
            .pin_of_port(&port.name)
            .ok_or_else(|| PlaceError::MissingPin {
                port: port.name.clone(),
            })?;
        placement.set_port(port.id, pin.pos);
    }
    Ok(())
}

/// Produces the initial placement for the whole design.
///
/// Fails with [`PlaceError::CapacityExhausted`] before binding anything if
/// any cell type has more instances than compatible sites.
pub fn initial_placement(
    fabric: &FabricDb,
    db: &LogicalDb,
    graph: &NetGraph,
    types: &TypeTable,
    sink: &DiagnosticSink,
) -> Result<Placement, PlaceError> {
    check_capacity(fabric, db, types)?;

    let mut placement = Placement::new();
    place_pins(fabric, db, &mut placement)?;

    // Stage 2: seed cells with at least one port neighbor, in instance order.
    let mut seeds: Vec<InstId> = Vec::new();
    for cell in db.cells() {
        let has_port_neighbor = graph
            .neighbors(NetNode::Inst(cell.id))
            .iter()
            .any(|n| matches!(n, NetNode::Port(_)));
        if has_port_neighbor {
            seeds.push(cell.id);
        }
    }
    for &inst in &seeds {
        let target = port_barycenter(graph, &placement, inst)
            .unwrap_or(Point::new(0.0, 0.0));
        bind_nearest(fabric, db, types, &mut placement, inst, target)?;
    }
    sink.note(STAGE, format!("seeded {} port-adjacent cells", seeds.len()));

    // Stage 3: grow outward, most-connected cell first.
    let mut remaining: BTreeSet<InstId> = db
        .cells()
        .map(|c| c.id)
        .filter(|id| placement.site_of(*id).is_none())
        .collect();
    let mut placed_neighbors: HashMap<InstId, usize> = remaining
        .iter()
        .map(|&inst| {
            let count = graph
                .neighbors(NetNode::Inst(inst))
                .iter()
                .filter(|&&n| placement.node_pos(n).is_some())
                .count();
            (inst, count)
        })
        .collect();

    while !remaining.is_empty() {
        // Highest placed-neighbor count, ties to the lowest instance ID.
        let (&best, _) = remaining
            .iter()
            .map(|inst| (inst, placed_neighbors.get(inst).copied().unwrap_or(0)))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .expect("remaining checked non-empty");

        let target = if placed_neighbors.get(&best).copied().unwrap_or(0) > 0 {
            placed_barycenter(graph, &placement, best).unwrap_or(Point::new(0.0, 0.0))
        } else {
            Point::new(0.0, 0.0)
        };
        bind_nearest(fabric, db, types, &mut placement, best, target)?;
        remaining.remove(&best);

        for neighbor in graph.neighbors(NetNode::Inst(best)) {
            if let NetNode::Inst(n) = neighbor {
                if remaining.contains(&n) {
                    *placed_neighbors.entry(n).or_insert(0) += 1;
                }
            }
        }
    }

    sink.note(
        STAGE,
        format!("initial placement bound {} instances", placement.placed_count()),
    );
    Ok(placement)
}

/// Rejects the design before binding anything if any type is over-subscribed.
fn check_capacity(
    fabric: &FabricDb,
    db: &LogicalDb,
    types: &TypeTable,
) -> Result<(), PlaceError> {
    let mut required: BTreeMap<&str, (CellTypeId, usize)> = BTreeMap::new();
    for cell in db.cells() {
        required
            .entry(types.name(cell.cell_type))
            .or_insert((cell.cell_type, 0))
            .1 += 1;
    }
    for (name, (ty, count)) in required {
        let available = fabric.site_count_of_type(ty);
        if count > available {
            return Err(PlaceError::CapacityExhausted {
                cell_type: name.to_string(),
                required: count,
                available,
            });
        }
    }
    Ok(())
}

/// Barycenter of the port neighbors of `inst`.
fn port_barycenter(graph: &NetGraph, placement: &Placement, inst: InstId) -> Option<Point> {
    barycenter(
        graph
            .neighbors(NetNode::Inst(inst))
            .into_iter()
            .filter(|n| matches!(n, NetNode::Port(_)))
            .filter_map(|n| placement.node_pos(n)),
    )
}

/// Barycenter of every placed neighbor (cells and ports) of `inst`.
fn placed_barycenter(graph: &NetGraph, placement: &Placement, inst: InstId) -> Option<Point> {
    barycenter(
        graph
            .neighbors(NetNode::Inst(inst))
            .into_iter()
            .filter_map(|n| placement.node_pos(n)),
    )
}

fn barycenter(points: impl Iterator<Item = Point>) -> Option<Point> {
    let mut sum = Point::new(0.0, 0.0);
    let mut count = 0usize;
    for p in points {
        sum.x += p.x;
        sum.y += p.y;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(Point::new(sum.x / count as f64, sum.y / count as f64))
    }
}

/// Binds `inst` to the nearest free site of its type (ties to lowest ID).
fn bind_nearest(
    fabric: &FabricDb,
    db: &LogicalDb,
    types: &TypeTable,
    placement: &mut Placement,
    inst: InstId,
    target: Point,
) -> Result<(), PlaceError> {
    let ty = db.cell(inst).cell_type;
    let site = nearest_free_site(fabric, placement, ty, target).ok_or_else(|| {
        PlaceError::NoFreeSite {
            inst: db.cell(inst).name.clone(),
            cell_type: types.name(ty).to_string(),
        }
    })?;
    placement
        .place(inst, site)
        .expect("site checked free and instance unplaced");
    Ok(())
}

/// The nearest unoccupied site of `ty` to `target` by Euclidean distance.
///
/// Site iteration is in ascending ID order and the comparison is strict, so
/// distance ties resolve to the lowest site ID.
pub fn nearest_free_site<'f>(
    fabric: &'f FabricDb,
    placement: &Placement,
    ty: CellTypeId,
    target: Point,
) -> Option<&'f Site> {
    let mut best: Option<(&Site, f64)> = None;
    for site in fabric.sites_of_type(ty) {
        if !placement.is_free(site.id) {
            continue;
        }
        let dist = site.pos.distance(target);
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((site, dist));
        }
    }
    best.map(|(s, _)| s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::total_hpwl;
    use weft_common::{BBox, Direction, NetId, Orient, SiteId, TileId};
    use weft_fabric::{Pin, Side, Tile};
    use weft_netlist::load_design_from_str;

    fn mk_site(id: u32, name: &str, ty: CellTypeId, x: f64, y: f64) -> Site {
        Site {
            id: SiteId::from_raw(id),
            name: name.into(),
            cell_type: ty,
            pos: Point::new(x, y),
            width_um: 1.38,
            height_um: 2.72,
            orient: Orient::N,
            tile: TileId::from_raw(0),
            row: 0,
        }
    }

    fn mk_pin(name: &str, direction: Direction, x: f64, y: f64) -> Pin {
        Pin {
            name: name.into(),
            direction,
            pos: Point::new(x, y),
            layer: "met2".into(),
            side: Side::West,
            orient: Orient::N,
            width_um: 0.3,
            height_um: 0.3,
        }
    }

    fn mk_fabric(sites: Vec<Site>, pins: Vec<Pin>) -> FabricDb {
        let tile = Tile {
            id: TileId::from_raw(0),
            name: "T0_0".into(),
            sites: sites.iter().map(|s| s.id).collect(),
        };
        FabricDb::from_parts(
            sites,
            vec![tile],
            pins,
            BBox::new(0.0, 0.0, 100.0, 100.0),
            BBox::new(5.0, 5.0, 95.0, 95.0),
            1000,
            0.46,
            2.72,
        )
    }

    const NAND_DESIGN: &str = r#"{
      "modules": {
        "top": {
          "ports": {
            "in1": { "direction": "input", "bits": [2] },
            "in2": { "direction": "input", "bits": [3] },
            "out1": { "direction": "output", "bits": [4] }
          },
          "cells": {
            "U0": {
              "type": "nand2",
              "connections": { "A": [2], "B": [3], "Y": [4] }
            }
          }
        }
      }
    }"#;

    #[test]
    fn single_gate_lands_on_nearest_nand_site() {
        let mut types = TypeTable::new();
        let sink = DiagnosticSink::new();
        let (db, graph) =
            load_design_from_str(NAND_DESIGN, "s1.json", &mut types, &sink).unwrap();
        let nand = types.get("nand2").unwrap();

        // Pins at (0,40), (0,60), (100,50): barycenter (100/3, 50).
        // Site 0 at (30, 50) is nearest; site 1 at (80, 50) is not.
        let fabric = mk_fabric(
            vec![
                mk_site(0, "T0_0_R0_NAND2_0", nand, 30.0, 50.0),
                mk_site(1, "T0_0_R0_NAND2_1", nand, 80.0, 50.0),
            ],
            vec![
                mk_pin("in1", Direction::Input, 0.0, 40.0),
                mk_pin("in2", Direction::Input, 0.0, 60.0),
                mk_pin("out1", Direction::Output, 100.0, 50.0),
            ],
        );

        let placement = initial_placement(&fabric, &db, &graph, &types, &sink).unwrap();
        let u0 = db.cell_by_name("U0").unwrap().id;
        assert_eq!(placement.site_of(u0).unwrap().site, SiteId::from_raw(0));
        assert!(placement.verify(&fabric).is_ok());

        // Three 2-point nets between the site and each pin.
        let expected = (30.0 + 10.0) + (30.0 + 10.0) + (70.0 + 0.0);
        assert!((total_hpwl(&db, &placement) - expected).abs() < 1e-9);
    }

    #[test]
    fn capacity_exhausted_before_any_binding() {
        let mut types = TypeTable::new();
        let sink = DiagnosticSink::new();
        // Ten instances, eight sites.
        let mut cells = String::new();
        for i in 0..10 {
            if i > 0 {
                cells.push(',');
            }
            cells.push_str(&format!(
                r#""U{i}": {{ "type": "nand2", "connections": {{ "A": [2], "Y": [{}] }} }}"#,
                10 + i
            ));
        }
        let json = format!(
            r#"{{ "modules": {{ "top": {{
                 "ports": {{ "in1": {{ "direction": "input", "bits": [2] }} }},
                 "cells": {{ {cells} }} }} }} }}"#
        );
        let (db, graph) = load_design_from_str(&json, "s5.json", &mut types, &sink).unwrap();
        let nand = types.get("nand2").unwrap();

        let sites: Vec<Site> = (0..8)
            .map(|i| mk_site(i, &format!("S{i}"), nand, i as f64 * 2.0, 10.0))
            .collect();
        let fabric = mk_fabric(sites, vec![mk_pin("in1", Direction::Input, 0.0, 50.0)]);

        let err = initial_placement(&fabric, &db, &graph, &types, &sink).unwrap_err();
        match err {
            PlaceError::CapacityExhausted {
                cell_type,
                required,
                available,
            } => {
                assert_eq!(cell_type, "nand2");
                assert_eq!(required, 10);
                assert_eq!(available, 8);
            }
            other => panic!("expected CapacityExhausted, got {other}"),
        }
    }

    #[test]
    fn missing_pin_is_reported() {
        let mut types = TypeTable::new();
        let sink = DiagnosticSink::new();
        let (db, graph) =
            load_design_from_str(NAND_DESIGN, "x.json", &mut types, &sink).unwrap();
        let nand = types.get("nand2").unwrap();
        let fabric = mk_fabric(
            vec![mk_site(0, "S0", nand, 30.0, 50.0)],
            vec![mk_pin("in1", Direction::Input, 0.0, 40.0)],
        );
        let err = initial_placement(&fabric, &db, &graph, &types, &sink).unwrap_err();
        assert!(matches!(err, PlaceError::MissingPin { .. }));
    }

    #[test]
    fn grow_places_chain_near_its_neighbors() {
        let mut types = TypeTable::new();
        let sink = DiagnosticSink::new();
        // in1 -> U0 -> U1 -> out1; U1 reaches a port, so both are seeds? No:
        // U0 touches in1, U1 touches out1; the middle net links them.
        let json = r#"{
          "modules": {
            "top": {
              "ports": {
                "in1": { "direction": "input", "bits": [2] },
                "out1": { "direction": "output", "bits": [5] }
              },
              "cells": {
                "U0": { "type": "inv", "connections": { "A": [2], "Y": [3] } },
                "U1": { "type": "inv", "connections": { "A": [3], "Y": [4] } },
                "U2": { "type": "inv", "connections": { "A": [4], "Y": [5] } }
              }
            }
          }
        }"#;
        let (db, graph) = load_design_from_str(json, "chain.json", &mut types, &sink).unwrap();
        let inv = types.get("inv").unwrap();

        let sites: Vec<Site> = (0..5)
            .map(|i| mk_site(i, &format!("S{i}"), inv, 10.0 + 20.0 * i as f64, 50.0))
            .collect();
        let fabric = mk_fabric(
            sites,
            vec![
                mk_pin("in1", Direction::Input, 0.0, 50.0),
                mk_pin("out1", Direction::Output, 100.0, 50.0),
            ],
        );

        let placement = initial_placement(&fabric, &db, &graph, &types, &sink).unwrap();
        assert_eq!(placement.placed_count(), 3);
        assert!(placement.verify(&fabric).is_ok());

        // U0 seeds near in1 (x=0), U2 seeds near out1 (x=100); the middle
        // inverter grows between them.
        let x0 = placement.site_of(db.cell_by_name("U0").unwrap().id).unwrap().pos.x;
        let x1 = placement.site_of(db.cell_by_name("U1").unwrap().id).unwrap().pos.x;
        let x2 = placement.site_of(db.cell_by_name("U2").unwrap().id).unwrap().pos.x;
        assert!(x0 < x1 && x1 < x2, "expected {x0} < {x1} < {x2}");
    }

    #[test]
    fn empty_design_places_nothing() {
        let mut types = TypeTable::new();
        let sink = DiagnosticSink::new();
        let (db, graph) = load_design_from_str(
            r#"{ "modules": { "top": { "cells": {} } } }"#,
            "empty.json",
            &mut types,
            &sink,
        )
        .unwrap();
        let fabric = mk_fabric(vec![], vec![]);
        let placement = initial_placement(&fabric, &db, &graph, &types, &sink).unwrap();
        assert_eq!(placement.placed_count(), 0);
    }

    #[test]
    fn nearest_site_tie_breaks_to_lowest_id() {
        let mut types = TypeTable::new();
        let ty = types.intern("inv");
        let fabric = mk_fabric(
            vec![
                mk_site(0, "S0", ty, 10.0, 50.0),
                mk_site(1, "S1", ty, 30.0, 50.0),
            ],
            vec![],
        );
        let placement = Placement::new();
        // Target equidistant from both sites.
        let site = nearest_free_site(&fabric, &placement, ty, Point::new(20.0, 50.0)).unwrap();
        assert_eq!(site.id, SiteId::from_raw(0));
    }
}
