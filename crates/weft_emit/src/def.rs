//! DEF 5.8 emission.
//!
//! Sections are emitted in order: header, DIEAREA, ROWs, TRACKS,
//! COMPONENTS, PINS, NETS. Every coordinate is `micron × dbu_per_micron`,
//! truncated to an integer — no halving anywhere — and component origins are
//! snapped to the site grid.

use std::io::Write;
use weft_common::TypeTable;
use weft_diagnostics::DiagnosticSink;
use weft_fabric::{FabricDb, Side};
use weft_lef::{LefLibrary, TlefData};
use weft_netlist::{Endpoint, LogicalDb};
use weft_place::Placement;

const STAGE: &str = "def";

/// Routing layers assumed when the TLEF provides none.
const DEFAULT_LAYERS: &[&str] = &["li1", "met1", "met2", "met3", "met4", "met5"];

/// DEF writer options.
#[derive(Debug, Clone, Default)]
pub struct DefOptions {
    /// The `DESIGN` name.
    pub design_name: String,
}

/// Writes the placed design as DEF 5.8.
pub fn write_def(
    out: &mut impl Write,
    fabric: &FabricDb,
    types: &TypeTable,
    db: &LogicalDb,
    placement: &Placement,
    lef: &LefLibrary,
    tlef: &TlefData,
    options: &DefOptions,
    sink: &DiagnosticSink,
) -> std::io::Result<()> {
    let dbu = fabric.dbu_per_micron() as f64;
    let to_dbu = |um: f64| (um * dbu) as i64;

    let die = fabric.die_bbox();
    let (llx, lly, urx, ury) = (
        to_dbu(die.llx),
        to_dbu(die.lly),
        to_dbu(die.urx),
        to_dbu(die.ury),
    );

    // Header.
    writeln!(out, "VERSION 5.8 ;")?;
    writeln!(out)?;
    writeln!(out, "DIVIDERCHAR \"{}\" ;", lef.dividerchar)?;
    writeln!(out, "BUSBITCHARS \"{}\" ;", lef.busbitchars)?;
    writeln!(out)?;
    writeln!(out, "DESIGN {} ;", options.design_name)?;
    writeln!(out)?;
    writeln!(out, "UNITS DISTANCE MICRONS {} ;", fabric.dbu_per_micron())?;
    writeln!(out)?;
    writeln!(out, "DIEAREA ( {llx} {lly} ) ( {urx} {ury} ) ;")?;
    writeln!(out)?;

    // ROWs sized from the TLEF site, one per site height across the core.
    let (site_name, site_w, site_h) = match tlef.row_site() {
        Some(s) => (s.name.clone(), to_dbu(s.width_um), to_dbu(s.height_um)),
        None => (
            "unithd".to_string(),
            to_dbu(fabric.site_width_um()),
            to_dbu(fabric.site_height_um()),
        ),
    };
    let core = fabric.core_bbox();
    let (core_llx, core_lly, core_urx, core_ury) = (
        to_dbu(core.llx),
        to_dbu(core.lly),
        to_dbu(core.urx),
        to_dbu(core.ury),
    );
    if site_w > 0 && site_h > 0 && core_llx < core_urx && core_lly < core_ury {
        let num_cols = (core_urx - core_llx) / site_w;
        let mut row_y = core_lly;
        let mut row_num = 0u32;
        while row_y + site_h <= core_ury {
            writeln!(
                out,
                "ROW ROW_{row_num} {site_name} {core_llx} {row_y} N DO {num_cols} BY 1 STEP {site_w} 0 ;"
            )?;
            row_y += site_h;
            row_num += 1;
        }
        writeln!(out)?;
    }

    // TRACKS per routing layer. li1 is kept sparse, signal metals run at
    // site pitch horizontally and half a site height vertically.
    let layers: Vec<String> = {
        let from_tlef: Vec<String> = tlef.routing_layers().map(|l| l.name.clone()).collect();
        if from_tlef.is_empty() {
            DEFAULT_LAYERS.iter().map(|s| s.to_string()).collect()
        } else {
            from_tlef
        }
    };
    let base_x_pitch = site_w.max(1);
    let base_y_pitch = (site_h / 2).max(1);
    for layer in &layers {
        let (x_pitch, y_pitch) = if layer == "li1" {
            (base_x_pitch * 4, base_y_pitch * 4)
        } else {
            (base_x_pitch, base_y_pitch)
        };
        let x_do = ((urx - llx) / x_pitch).max(1);
        let y_do = ((ury - lly) / y_pitch).max(1);
        writeln!(out, "TRACKS X {llx} DO {x_do} STEP {x_pitch} LAYER {layer} ;")?;
        writeln!(out, "TRACKS Y {lly} DO {y_do} STEP {y_pitch} LAYER {layer} ;")?;
    }
    writeln!(out)?;

    // COMPONENTS: every fabric site, FIXED, snapped to the site grid.
    // Component names are the fabric site names, matching the renamed
    // Verilog netlist.
    let debug_components = debug_components_enabled();
    let mut sites: Vec<_> = fabric.sites().collect();
    sites.sort_by(|a, b| a.name.cmp(&b.name));
    writeln!(out, "COMPONENTS {} ;", sites.len())?;
    for site in &sites {
        let x = snap(to_dbu(site.pos.x), site_w.max(1));
        let y = snap(to_dbu(site.pos.y), site_h.max(1));
        if debug_components {
            let occupant = placement
                .inst_at(site.id)
                .map(|i| db.cell(i).name.clone())
                .unwrap_or_else(|| "UNUSED".to_string());
            eprintln!(
                "[def] component {} {} at ({x}, {y}) <- {occupant}",
                site.name,
                types.name(site.cell_type)
            );
        }
        writeln!(
            out,
            "  - {} {} + FIXED ( {x} {y} ) {} ;",
            site.name,
            types.name(site.cell_type),
            site.orient.as_str()
        )?;
    }
    writeln!(out, "END COMPONENTS")?;
    writeln!(out)?;

    // PINS: one rectangle per pad pin, extended inward from its die edge.
    let mut pins: Vec<_> = fabric.pins().collect();
    pins.sort_by(|a, b| a.name.cmp(&b.name));
    writeln!(out, "PINS {} ;", pins.len())?;
    for pin in &pins {
        let net_name = db
            .port_by_name(&pin.name)
            .and_then(|p| db.net(p.net))
            .map(|n| n.name.clone())
            .unwrap_or_else(|| pin.name.clone());
        let use_kind = if pin.name.to_ascii_lowercase().contains("clk") {
            "CLOCK"
        } else {
            "SIGNAL"
        };
        let min_width = tlef
            .layers
            .get(&pin.layer)
            .and_then(|l| l.width_um)
            .map(to_dbu)
            .unwrap_or(100);
        let x = to_dbu(pin.pos.x);
        let y = to_dbu(pin.pos.y);
        let (x1, y1, x2, y2) = pin_rect(pin.side, x, y, min_width);
        let x1 = x1.max(llx);
        let y1 = y1.max(lly);
        let x2 = x2.min(urx);
        let y2 = y2.min(ury);

        writeln!(out, "  - {} + NET {}", pin.name, net_name)?;
        writeln!(out, "    + DIRECTION {}", pin.direction.def_keyword())?;
        writeln!(out, "    + USE {use_kind}")?;
        writeln!(out, "    + PORT")?;
        writeln!(out, "      + LAYER {}", pin.layer)?;
        writeln!(out, "        ( {x1} {y1} ) ( {x2} {y2} )")?;
        writeln!(out, "      + FIXED ( {x} {y} ) {} ;", pin.orient.as_str())?;
    }
    writeln!(out, "END PINS")?;
    writeln!(out)?;

    // NETS: every net with all of its terminals. Instance terminals use the
    // fabric site name when placed; outputs recorded as Y are normalized to
    // the LEF's output pin.
    let mut nets: Vec<_> = db.nets().collect();
    nets.sort_by(|a, b| a.name.cmp(&b.name));
    writeln!(out, "NETS {} ;", nets.len())?;
    for net in &nets {
        writeln!(out, "  - {}", net.name)?;
        let mut has_clk_pin = false;
        for conn in &net.connections {
            match conn.endpoint {
                Endpoint::Port(p) => {
                    let port_name = &db.port(p).name;
                    if port_name.to_ascii_lowercase().contains("clk") {
                        has_clk_pin = true;
                    }
                    writeln!(out, "      ( PIN {port_name} )")?;
                }
                Endpoint::Inst(i) => {
                    let cell = db.cell(i);
                    let comp_name = placement
                        .site_of(i)
                        .map(|p| fabric.site(p.site).name.clone())
                        .unwrap_or_else(|| cell.name.clone());
                    let ty = types.name(cell.cell_type);
                    let mut pin_name = conn.pin.clone();
                    if pin_name == "Y" {
                        let corrected = lef.output_pin(ty);
                        if corrected != "Y" {
                            pin_name = corrected;
                        }
                    }
                    writeln!(out, "      ( {comp_name} {pin_name} )")?;
                }
            }
        }
        if has_clk_pin || net.name.to_ascii_lowercase().starts_with("clk") {
            writeln!(out, "    + USE CLOCK ;")?;
        } else {
            writeln!(out, "    ;")?;
        }
    }
    writeln!(out, "END NETS")?;
    writeln!(out)?;
    writeln!(out, "END DESIGN")?;

    sink.note(
        STAGE,
        format!(
            "DEF: {} components, {} pins, {} nets",
            sites.len(),
            pins.len(),
            nets.len()
        ),
    );
    Ok(())
}

/// Pin rectangle by die edge: the shape extends inward from the pin point.
fn pin_rect(side: Side, x: i64, y: i64, w: i64) -> (i64, i64, i64, i64) {
    match side {
        Side::East => (x - w, y - w / 2, x, y + w / 2),
        Side::West => (x, y - w / 2, x + w, y + w / 2),
        Side::South => (x - w / 2, y, x + w / 2, y + w),
        Side::North => (x - w / 2, y - w, x + w / 2, y),
    }
}

/// Snaps a DBU coordinate to the nearest grid multiple.
fn snap(v: i64, grid: i64) -> i64 {
    if grid <= 1 {
        return v;
    }
    ((v as f64 / grid as f64).round() as i64) * grid
}

fn debug_components_enabled() -> bool {
    match std::env::var("DEBUG_COMPONENTS") {
        Ok(v) => matches!(
            v.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

/// Structurally validates an emitted DEF file.
///
/// Checks the header statements, section bracketing and that the declared
/// COMPONENTS/PINS/NETS counts match the emitted rows. Returns the list of
/// problems found, empty on success.
pub fn validate_def(content: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if !content.contains("VERSION 5.8 ;") {
        errors.push("VERSION 5.8 statement missing".to_string());
    }
    if !content.contains("DIEAREA (") {
        errors.push("DIEAREA statement missing".to_string());
    }
    if !content.contains("UNITS DISTANCE MICRONS") {
        errors.push("UNITS statement missing".to_string());
    }
    if !content.contains("END DESIGN") {
        errors.push("END DESIGN missing".to_string());
    }

    for section in ["COMPONENTS", "PINS", "NETS"] {
        let start = content
            .lines()
            .position(|l| l.starts_with(section) && l.trim_end().ends_with(';'));
        let Some(start) = start else {
            errors.push(format!("{section} section missing"));
            continue;
        };
        let declared: Option<usize> = content
            .lines()
            .nth(start)
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|n| n.parse().ok());
        let Some(declared) = declared else {
            errors.push(format!("{section} count unreadable"));
            continue;
        };
        let mut rows = 0usize;
        let mut closed = false;
        for line in content.lines().skip(start + 1) {
            if line.starts_with(&format!("END {section}")) {
                closed = true;
                break;
            }
            if line.trim_start().starts_with("- ") {
                rows += 1;
            }
        }
        if !closed {
            errors.push(format!("{section} section missing END {section}"));
        } else if rows != declared {
            errors.push(format!(
                "{section} declares {declared} rows but contains {rows}"
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::{BBox, CellTypeId, Direction, NetId, Orient, Point, SiteId, TileId};
    use weft_fabric::{Pin, Site, Tile};

    fn fixture() -> (FabricDb, TypeTable, LogicalDb, Placement) {
        let mut types = TypeTable::new();
        let nand = types.intern("sky130_fd_sc_hd__nand2_2");
        let sites = vec![
            Site {
                id: SiteId::from_raw(0),
                name: "T0_0_R0_NAND2_0".into(),
                cell_type: nand,
                pos: Point::new(10.12, 10.88),
                width_um: 1.38,
                height_um: 2.72,
                orient: Orient::N,
                tile: TileId::from_raw(0),
                row: 0,
            },
            Site {
                id: SiteId::from_raw(1),
                name: "T0_0_R1_NAND2_0".into(),
                cell_type: nand,
                pos: Point::new(10.12, 13.6),
                width_um: 1.38,
                height_um: 2.72,
                orient: Orient::FS,
                tile: TileId::from_raw(0),
                row: 1,
            },
        ];
        let tile = Tile {
            id: TileId::from_raw(0),
            name: "T0_0".into(),
            sites: vec![SiteId::from_raw(0), SiteId::from_raw(1)],
        };
        let pins = vec![
            Pin {
                name: "clk".into(),
                direction: Direction::Input,
                pos: Point::new(0.0, 50.0),
                layer: "met2".into(),
                side: Side::West,
                orient: Orient::N,
                width_um: 0.3,
                height_um: 0.3,
            },
            Pin {
                name: "dout".into(),
                direction: Direction::Output,
                pos: Point::new(100.0, 50.0),
                layer: "met2".into(),
                side: Side::East,
                orient: Orient::N,
                width_um: 0.3,
                height_um: 0.3,
            },
        ];
        let fabric = FabricDb::from_parts(
            sites,
            vec![tile],
            pins,
            BBox::new(0.0, 0.0, 100.0, 100.0),
            BBox::new(10.0, 10.0, 90.0, 90.0),
            1000,
            0.46,
            2.72,
        );

        let mut db = LogicalDb::new();
        let clk = NetId::from_raw(1);
        let dout = NetId::from_raw(2);
        db.add_port("clk", Direction::Input, clk);
        db.add_port("dout", Direction::Output, dout);
        let u0 = db.add_cell(
            "u0",
            nand,
            vec![("A".to_string(), clk), ("Y".to_string(), dout)],
        );
        let mut placement = Placement::new();
        placement
            .place(u0, fabric.site_by_name("T0_0_R0_NAND2_0").unwrap())
            .unwrap();
        (fabric, types, db, placement)
    }

    fn emit(fabric: &FabricDb, types: &TypeTable, db: &LogicalDb, placement: &Placement) -> String {
        let mut buf = Vec::new();
        let sink = DiagnosticSink::new();
        write_def(
            &mut buf,
            fabric,
            types,
            db,
            placement,
            &LefLibrary::new(),
            &TlefData::default(),
            &DefOptions {
                design_name: "tiny".into(),
            },
            &sink,
        )
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn header_and_units() {
        let (fabric, types, db, placement) = fixture();
        let def = emit(&fabric, &types, &db, &placement);
        assert!(def.starts_with("VERSION 5.8 ;\n"));
        assert!(def.contains("DESIGN tiny ;"));
        assert!(def.contains("UNITS DISTANCE MICRONS 1000 ;"));
        assert!(def.contains("DIEAREA ( 0 0 ) ( 100000 100000 ) ;"));
    }

    #[test]
    fn components_are_fixed_and_snapped() {
        let (fabric, types, db, placement) = fixture();
        let def = emit(&fabric, &types, &db, &placement);
        assert!(def.contains("COMPONENTS 2 ;"));
        // 10.12 µm = 10120 dbu snaps to the 460-dbu grid at 10120 (exact).
        assert!(def.contains("  - T0_0_R0_NAND2_0 sky130_fd_sc_hd__nand2_2 + FIXED ( 10120 10880 ) N ;"));
        assert!(def.contains("  - T0_0_R1_NAND2_0 sky130_fd_sc_hd__nand2_2 + FIXED ( 10120 13600 ) FS ;"));
    }

    #[test]
    fn pins_extend_inward_by_side() {
        let (fabric, types, db, placement) = fixture();
        let def = emit(&fabric, &types, &db, &placement);
        assert!(def.contains("PINS 2 ;"));
        assert!(def.contains("  - clk + NET clk"));
        assert!(def.contains("    + USE CLOCK"));
        // West-side pin extends right from x=0.
        assert!(def.contains("        ( 0 49950 ) ( 100 50050 )"));
        // East-side pin extends left from x=100000.
        assert!(def.contains("        ( 99900 49950 ) ( 100000 50050 )"));
    }

    #[test]
    fn nets_reference_site_names_and_mark_clock() {
        let (fabric, types, db, placement) = fixture();
        let def = emit(&fabric, &types, &db, &placement);
        assert!(def.contains("NETS 2 ;"));
        assert!(def.contains("      ( PIN clk )"));
        assert!(def.contains("      ( T0_0_R0_NAND2_0 A )"));
        assert!(def.contains("      ( T0_0_R0_NAND2_0 Y )"));
        let clk_idx = def.find("  - clk\n").unwrap();
        let use_idx = def[clk_idx..].find("+ USE CLOCK ;").unwrap();
        let next_net = def[clk_idx + 1..].find("  - ").unwrap();
        assert!(use_idx < next_net + 1);
    }

    #[test]
    fn rows_span_the_core() {
        let (fabric, types, db, placement) = fixture();
        let def = emit(&fabric, &types, &db, &placement);
        assert!(def.contains("ROW ROW_0 unithd 10000 10000 N DO"));
        // Core is 80 µm tall, site 2.72 µm: 29 rows fit.
        assert!(def.contains("ROW ROW_28 "));
        assert!(!def.contains("ROW ROW_29 "));
    }

    #[test]
    fn tracks_cover_default_layers() {
        let (fabric, types, db, placement) = fixture();
        let def = emit(&fabric, &types, &db, &placement);
        for layer in DEFAULT_LAYERS {
            assert!(def.contains(&format!("LAYER {layer} ;")), "missing {layer}");
        }
    }

    #[test]
    fn validator_accepts_own_output() {
        let (fabric, types, db, placement) = fixture();
        let def = emit(&fabric, &types, &db, &placement);
        assert_eq!(validate_def(&def), Vec::<String>::new());
    }

    #[test]
    fn validator_flags_missing_sections() {
        let errors = validate_def("VERSION 5.8 ;\n");
        assert!(errors.iter().any(|e| e.contains("DIEAREA")));
        assert!(errors.iter().any(|e| e.contains("COMPONENTS section missing")));
        assert!(errors.iter().any(|e| e.contains("END DESIGN")));
    }

    #[test]
    fn validator_flags_count_mismatch() {
        let def = "\
VERSION 5.8 ;
UNITS DISTANCE MICRONS 1000 ;
DIEAREA ( 0 0 ) ( 10 10 ) ;
COMPONENTS 2 ;
  - a b + FIXED ( 0 0 ) N ;
END COMPONENTS
PINS 0 ;
END PINS
NETS 0 ;
END NETS
END DESIGN
";
        let errors = validate_def(def);
        assert!(errors.iter().any(|e| e.contains("declares 2 rows but contains 1")));
    }
}
