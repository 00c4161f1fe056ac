//! The power-down ECO pass.

use crate::pins::input_pins;
use serde::{Deserialize, Serialize};
use weft_common::{celltype, TypeTable};
use weft_diagnostics::DiagnosticSink;
use weft_fabric::FabricDb;
use weft_liberty::{LeakageDb, TieState};
use weft_netlist::{LogicalDb, NetGraph};
use weft_place::Placement;

const STAGE: &str = "eco";

/// Power-savings statistics of one ECO run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcoStats {
    /// Unused candidate sites considered.
    pub candidate_count: usize,
    /// Tiles that received a CONB and had candidates tied.
    pub tiles_processed: usize,
    /// Tiles skipped because no CONB site was free.
    pub tiles_skipped: usize,
    /// Candidates skipped because their pin list is unknown.
    pub unknown_cells: usize,
    /// Cells whose inputs were tied.
    pub total_cells_tied: usize,
    /// Individual input pins tied.
    pub total_pins_tied: usize,
    /// Cells with every input tied high.
    pub cells_tied_hi: usize,
    /// Cells with every input tied low.
    pub cells_tied_lo: usize,
    /// Cells with mixed tie polarities.
    pub cells_tied_mixed: usize,
    /// Sum of per-cell `(avg − min) / avg` leakage savings fractions.
    pub savings_sum: f64,
    /// Cells contributing to `savings_sum`.
    pub cells_with_savings: usize,
}

impl EcoStats {
    /// Mean per-cell savings fraction over cells with leakage data.
    pub fn average_savings(&self) -> f64 {
        if self.cells_with_savings > 0 {
            self.savings_sum / self.cells_with_savings as f64
        } else {
            0.0
        }
    }
}

/// One tied cell, for the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TiedCell {
    /// The fabric site (and new instance) name.
    pub name: String,
    /// The master cell type.
    pub cell_type: String,
    /// The tile the cell sits in.
    pub tile: String,
    /// Tie polarity per input pin.
    pub ties: Vec<(String, TieState)>,
}

/// What an ECO run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EcoOutcome {
    /// Aggregated statistics.
    pub stats: EcoStats,
    /// Every cell that was tied, in processing order.
    pub tied: Vec<TiedCell>,
}

/// Ties the inputs of every unused logic site to its leakage-optimal level.
///
/// Candidates are sites that host plain logic (no macros, no infrastructure),
/// are not claimed by the placement and whose name is not already a logical
/// instance. Per tile with candidates exactly one free CONB site is claimed;
/// tiles without one are skipped with a warning. Candidates whose pin list
/// cannot be determined are skipped with a warning. Nets that were already
/// driven are never modified.
pub fn run_power_down_eco(
    fabric: &FabricDb,
    types: &TypeTable,
    db: &mut LogicalDb,
    graph: &mut NetGraph,
    placement: &mut Placement,
    leakage: &LeakageDb,
    sink: &DiagnosticSink,
) -> EcoOutcome {
    let mut outcome = EcoOutcome::default();

    for tile in fabric.tiles() {
        let candidates: Vec<_> = tile
            .sites
            .iter()
            .map(|&id| fabric.site(id))
            .filter(|site| {
                let ty = types.name(site.cell_type);
                !celltype::is_macro(ty)
                    && !celltype::is_infrastructure(ty)
                    && placement.is_free(site.id)
                    && db.cell_by_name(&site.name).is_none()
            })
            .collect();
        if candidates.is_empty() {
            continue;
        }
        outcome.stats.candidate_count += candidates.len();

        let conb = tile
            .sites
            .iter()
            .map(|&id| fabric.site(id))
            .find(|site| {
                celltype::is_tie(types.name(site.cell_type))
                    && placement.is_free(site.id)
                    && db.cell_by_name(&site.name).is_none()
            });
        let Some(conb) = conb else {
            sink.warn(
                STAGE,
                format!(
                    "no free CONB in tile '{}', {} candidates left untied",
                    tile.name,
                    candidates.len()
                ),
            );
            outcome.stats.tiles_skipped += 1;
            continue;
        };

        let tie_hi = db.alloc_net(format!("{}_tie_hi", tile.name));
        let tie_lo = db.alloc_net(format!("{}_tie_lo", tile.name));
        let conb_inst = db.add_cell(
            conb.name.clone(),
            conb.cell_type,
            vec![("HI".to_string(), tie_hi), ("LO".to_string(), tie_lo)],
        );
        placement
            .place(conb_inst, conb)
            .expect("CONB site checked free");

        for site in candidates {
            let ty_name = types.name(site.cell_type);
            let Some(pins) = input_pins(ty_name) else {
                sink.warn(
                    STAGE,
                    format!("unknown cell type '{ty_name}' for site '{}', skipped", site.name),
                );
                outcome.stats.unknown_cells += 1;
                continue;
            };

            let mut ties = Vec::with_capacity(pins.len());
            let mut hi = 0usize;
            for pin in pins {
                let tie = leakage.tie_for(ty_name, &pin);
                if tie == TieState::Hi {
                    hi += 1;
                }
                ties.push((pin, tie));
            }

            let inst = db.add_cell(
                site.name.clone(),
                site.cell_type,
                ties.iter().map(|(pin, tie)| {
                    let net = match tie {
                        TieState::Hi => tie_hi,
                        TieState::Lo => tie_lo,
                    };
                    (pin.clone(), net)
                }),
            );
            placement
                .place(inst, site)
                .expect("candidate site checked free");

            outcome.stats.total_cells_tied += 1;
            outcome.stats.total_pins_tied += ties.len();
            if hi == ties.len() && !ties.is_empty() {
                outcome.stats.cells_tied_hi += 1;
            } else if hi == 0 {
                outcome.stats.cells_tied_lo += 1;
            } else {
                outcome.stats.cells_tied_mixed += 1;
            }
            if let Some(cl) = leakage.cell(ty_name) {
                outcome.stats.savings_sum += cl.savings_fraction();
                outcome.stats.cells_with_savings += 1;
            }

            outcome.tied.push(TiedCell {
                name: site.name.clone(),
                cell_type: ty_name.to_string(),
                tile: tile.name.clone(),
                ties,
            });
        }

        // Re-clique the two tie nets in the connectivity graph.
        for net_id in [tie_hi, tie_lo] {
            if let Some(net) = db.net(net_id) {
                graph.add_net_clique(net);
            }
        }
        outcome.stats.tiles_processed += 1;
    }

    sink.note(
        STAGE,
        format!(
            "power-down: {} cells / {} pins tied across {} tiles ({} skipped)",
            outcome.stats.total_cells_tied,
            outcome.stats.total_pins_tied,
            outcome.stats.tiles_processed,
            outcome.stats.tiles_skipped
        ),
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use weft_common::{BBox, CellTypeId, NetId, Orient, Point, SiteId, TileId};
    use weft_fabric::{Site, Tile};
    use weft_liberty::{CellLeakage, TieSummary};

    fn mk_site(id: u32, name: &str, ty: CellTypeId, x: f64, y: f64, tile: u32) -> Site {
        Site {
            id: SiteId::from_raw(id),
            name: name.into(),
            cell_type: ty,
            pos: Point::new(x, y),
            width_um: 1.38,
            height_um: 2.72,
            orient: Orient::N,
            tile: TileId::from_raw(tile),
            row: 0,
        }
    }

    struct Setup {
        fabric: FabricDb,
        types: TypeTable,
        db: LogicalDb,
        graph: NetGraph,
        placement: Placement,
        leakage: LeakageDb,
    }

    /// One tile: a used NAND, an unused NAND, an unused tap, and a CONB.
    fn setup(with_conb: bool) -> Setup {
        let mut types = TypeTable::new();
        let nand = types.intern("sky130_fd_sc_hd__nand2_2");
        let tap = types.intern("sky130_fd_sc_hd__tapvpwrvgnd_1");
        let conb = types.intern("sky130_fd_sc_hd__conb_1");

        let mut sites = vec![
            mk_site(0, "T0_0_R0_NAND2_0", nand, 10.0, 10.0, 0),
            mk_site(1, "T0_0_R0_NAND2_1", nand, 12.0, 10.0, 0),
            mk_site(2, "T0_0_R0_TAP_0", tap, 14.0, 10.0, 0),
        ];
        if with_conb {
            sites.push(mk_site(3, "T0_0_R1_CONB_0", conb, 10.0, 12.72, 0));
        }
        let tile = Tile {
            id: TileId::from_raw(0),
            name: "T0_0".into(),
            sites: sites.iter().map(|s| s.id).collect(),
        };
        let fabric = FabricDb::from_parts(
            sites,
            vec![tile],
            vec![],
            BBox::new(0.0, 0.0, 50.0, 50.0),
            BBox::new(0.0, 0.0, 50.0, 50.0),
            1000,
            0.46,
            2.72,
        );

        let mut db = LogicalDb::new();
        let u0 = db.add_cell(
            "u0",
            nand,
            vec![
                ("A".to_string(), NetId::from_raw(2)),
                ("B".to_string(), NetId::from_raw(3)),
                ("Y".to_string(), NetId::from_raw(4)),
            ],
        );
        let graph = NetGraph::build(&db);
        let mut placement = Placement::new();
        placement
            .place(u0, fabric.site_by_name("T0_0_R0_NAND2_0").unwrap())
            .unwrap();

        let mut leakage = LeakageDb::new();
        leakage.cells.insert(
            "sky130_fd_sc_hd__nand2_2".to_string(),
            CellLeakage {
                min_state: "!A&!B".into(),
                min_power: 0.001,
                avg_power: 0.004,
                max_power: 0.01,
                summary: TieSummary::Lo,
                input_ties: BTreeMap::from([
                    ("A".to_string(), TieState::Lo),
                    ("B".to_string(), TieState::Lo),
                ]),
            },
        );

        Setup {
            fabric,
            types,
            db,
            graph,
            placement,
            leakage,
        }
    }

    #[test]
    fn ties_unused_nand_low() {
        let mut s = setup(true);
        let sink = DiagnosticSink::new();
        let outcome = run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );

        assert_eq!(outcome.stats.total_cells_tied, 1);
        assert_eq!(outcome.stats.total_pins_tied, 2);
        assert_eq!(outcome.stats.cells_tied_lo, 1);
        assert_eq!(outcome.stats.cells_tied_hi, 0);

        let cand = s.db.cell_by_name("T0_0_R0_NAND2_1").unwrap();
        let tie_lo = s.db.net(cand.pins["A"]).unwrap();
        assert_eq!(tie_lo.name, "T0_0_tie_lo");
        assert_eq!(cand.pins["A"], cand.pins["B"]);

        // The tie-hi net carries only the CONB output.
        let conb = s.db.cell_by_name("T0_0_R1_CONB_0").unwrap();
        let tie_hi = s.db.net(conb.pins["HI"]).unwrap();
        assert_eq!(tie_hi.connections.len(), 1);
        assert!(s.db.verify_net_closure().is_ok());
    }

    #[test]
    fn used_and_infra_sites_are_not_candidates() {
        let mut s = setup(true);
        let sink = DiagnosticSink::new();
        let outcome = run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );
        // Only the one unused NAND; the used NAND and the tap are excluded.
        assert_eq!(outcome.stats.candidate_count, 1);
        // u0's nets are untouched.
        let u0 = s.db.cell_by_name("u0").unwrap();
        assert_eq!(u0.pins["A"], NetId::from_raw(2));
    }

    #[test]
    fn tile_without_conb_is_skipped() {
        let mut s = setup(false);
        let sink = DiagnosticSink::new();
        let outcome = run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );
        assert_eq!(outcome.stats.tiles_skipped, 1);
        assert_eq!(outcome.stats.total_cells_tied, 0);
        assert_eq!(sink.warning_count(), 1);
        assert!(s.db.cell_by_name("T0_0_R0_NAND2_1").is_none());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut s = setup(true);
        let sink = DiagnosticSink::new();
        run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );
        let cells = s.db.cell_count();
        let nets = s.db.net_count();

        let outcome = run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );
        assert_eq!(outcome.stats.candidate_count, 0);
        assert_eq!(s.db.cell_count(), cells);
        assert_eq!(s.db.net_count(), nets);
    }

    #[test]
    fn savings_accumulate() {
        let mut s = setup(true);
        let sink = DiagnosticSink::new();
        let outcome = run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );
        assert_eq!(outcome.stats.cells_with_savings, 1);
        assert!((outcome.stats.average_savings() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn mixed_tie_uses_both_nets() {
        let mut s = setup(true);
        s.leakage
            .cells
            .get_mut("sky130_fd_sc_hd__nand2_2")
            .unwrap()
            .input_ties
            .insert("B".to_string(), TieState::Hi);
        let sink = DiagnosticSink::new();
        let outcome = run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );
        assert_eq!(outcome.stats.cells_tied_mixed, 1);
        let cand = s.db.cell_by_name("T0_0_R0_NAND2_1").unwrap();
        assert_ne!(cand.pins["A"], cand.pins["B"]);
    }

    #[test]
    fn unknown_cell_type_is_skipped_with_warning() {
        let mut s = {
            let mut types = TypeTable::new();
            let odd = types.intern("sky130_fd_sc_hd__mystery_9");
            let conb = types.intern("sky130_fd_sc_hd__conb_1");
            let sites = vec![
                mk_site(0, "T0_0_R0_ODD_0", odd, 10.0, 10.0, 0),
                mk_site(1, "T0_0_R1_CONB_0", conb, 10.0, 12.72, 0),
            ];
            let tile = Tile {
                id: TileId::from_raw(0),
                name: "T0_0".into(),
                sites: sites.iter().map(|s| s.id).collect(),
            };
            let fabric = FabricDb::from_parts(
                sites,
                vec![tile],
                vec![],
                BBox::new(0.0, 0.0, 50.0, 50.0),
                BBox::new(0.0, 0.0, 50.0, 50.0),
                1000,
                0.46,
                2.72,
            );
            let db = LogicalDb::new();
            let graph = NetGraph::build(&db);
            Setup {
                fabric,
                types,
                db,
                graph,
                placement: Placement::new(),
                leakage: LeakageDb::new(),
            }
        };
        let sink = DiagnosticSink::new();
        let outcome = run_power_down_eco(
            &s.fabric,
            &s.types,
            &mut s.db,
            &mut s.graph,
            &mut s.placement,
            &s.leakage,
            &sink,
        );
        assert_eq!(outcome.stats.unknown_cells, 1);
        assert_eq!(outcome.stats.total_cells_tied, 0);
        assert!(sink.warning_count() >= 1);
        // The CONB was still claimed for the tile.
        assert!(s.db.cell_by_name("T0_0_R1_CONB_0").is_some());
    }
}
