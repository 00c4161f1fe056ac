//! Verilog netlist emission.
//!
//! Emits a flat structural netlist from the logical database: module header,
//! port declarations, internal wires, one instantiation per cell. Pin names
//! are validated against the LEF library (outputs normalized, unknown pins
//! dropped with a warning). A separate text pass renames instances from
//! logical to fabric-site names using the placement map.

use crate::map::PlacementMap;
use std::fmt::Write;
use weft_common::{Direction, TypeTable};
use weft_diagnostics::DiagnosticSink;
use weft_lef::LefLibrary;
use weft_netlist::LogicalDb;

const STAGE: &str = "verilog";

/// Generates the structural Verilog netlist.
pub fn generate_verilog(
    db: &LogicalDb,
    types: &TypeTable,
    design_name: &str,
    lef: &LefLibrary,
    sink: &DiagnosticSink,
) -> String {
    let mut out = String::new();

    let port_names: Vec<String> = db.ports().map(|p| vname(&p.name)).collect();
    writeln!(out, "module {} ({});", design_name, port_names.join(", ")).unwrap();
    writeln!(out).unwrap();

    let inputs: Vec<String> = db.input_ports().map(|p| vname(&p.name)).collect();
    if !inputs.is_empty() {
        writeln!(out, "  input {};", inputs.join(", ")).unwrap();
    }
    let outputs: Vec<String> = db.output_ports().map(|p| vname(&p.name)).collect();
    if !outputs.is_empty() {
        writeln!(out, "  output {};", outputs.join(", ")).unwrap();
    }
    let inouts: Vec<String> = db
        .ports()
        .filter(|p| p.direction == Direction::Inout)
        .map(|p| vname(&p.name))
        .collect();
    if !inouts.is_empty() {
        writeln!(out, "  inout {};", inouts.join(", ")).unwrap();
    }
    writeln!(out).unwrap();

    // Internal wires: every net that is not a top-level port.
    let wires: Vec<String> = db
        .nets()
        .filter(|n| db.port_by_name(&n.name).is_none())
        .map(|n| vname(&n.name))
        .collect();
    if !wires.is_empty() {
        writeln!(out, "  wire {};", wires.join(", ")).unwrap();
        writeln!(out).unwrap();
    }

    let mut cells: Vec<_> = db.cells().collect();
    cells.sort_by(|a, b| a.name.cmp(&b.name));
    for cell in cells {
        let ty = types.name(cell.cell_type);
        let mut connections: Vec<String> = Vec::new();
        for (pin, net) in &cell.pins {
            if net.is_none() {
                continue;
            }
            let Some(valid_pin) = lef.resolve_pin(ty, pin) else {
                if let Some(pins) = lef.pins_of(ty) {
                    let available: Vec<&str> = pins.iter().map(String::as_str).collect();
                    sink.warn(
                        STAGE,
                        format!(
                            "pin '{pin}' not in LEF for '{ty}' (available: {}), dropped",
                            available.join(", ")
                        ),
                    );
                }
                continue;
            };
            let net_name = db
                .net(*net)
                .map(|n| n.name.clone())
                .unwrap_or_else(|| format!("net_{}", net.as_raw()));
            connections.push(format!(".{valid_pin}({})", vname(&net_name)));
        }
        if connections.is_empty() {
            continue;
        }
        writeln!(
            out,
            "  {} {} ({});",
            ty,
            vname(&cell.name),
            connections.join(", ")
        )
        .unwrap();
    }

    writeln!(out).unwrap();
    writeln!(out, "endmodule").unwrap();
    out
}

/// Renames instance identifiers from logical to fabric-site names.
///
/// A pure text pass over the emitted netlist: every whitespace-delimited
/// token equal to a bound logical name (escaped or not) becomes the site
/// name from the placement map.
pub fn rename_instances(verilog: &str, map: &PlacementMap) -> String {
    let logical_to_site = map.logical_to_site();
    let mut out = String::with_capacity(verilog.len());
    for (i, line) in verilog.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut first = true;
        for token in line.split(' ') {
            if !first {
                out.push(' ');
            }
            first = false;
            let bare = token.strip_prefix('\\').unwrap_or(token);
            match logical_to_site.get(bare) {
                Some(site) => out.push_str(&vname(site)),
                None => out.push_str(token),
            }
        }
    }
    out.push('\n');
    out
}

/// Escapes an identifier when it is not a simple Verilog name.
///
/// Escaped identifiers carry a trailing space per IEEE 1364; the emitters
/// always follow them with a space or punctuation-after-space.
fn vname(name: &str) -> String {
    let simple = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if simple {
        name.to_string()
    } else {
        format!("\\{name} ")
    }
}
