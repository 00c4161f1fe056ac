//! Loading Yosys-style JSON netlists into the logical database.

use crate::design::LogicalDb;
use crate::error::NetlistError;
use crate::graph::NetGraph;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use weft_common::{Direction, NetId, TypeTable};
use weft_diagnostics::DiagnosticSink;

const STAGE: &str = "netlist";

#[derive(Debug, Deserialize)]
struct YosysFile {
    #[serde(default)]
    modules: BTreeMap<String, YosysModule>,
}

#[derive(Debug, Deserialize)]
struct YosysModule {
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    #[serde(default)]
    ports: BTreeMap<String, YosysPort>,
    #[serde(default)]
    cells: BTreeMap<String, YosysCell>,
}

#[derive(Debug, Deserialize)]
struct YosysPort {
    direction: Direction,
    #[serde(default)]
    bits: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct YosysCell {
    #[serde(rename = "type")]
    cell_type: String,
    #[serde(default)]
    connections: BTreeMap<String, Vec<Value>>,
}

/// Loads a Yosys JSON netlist from disk.
///
/// Returns the logical database together with its connectivity graph. Cell
/// type names are interned into `types`. Multi-bit buses collapse to their
/// first bit with a warning; constant bits (`"0"`, `"1"`, `"x"`) leave the
/// pin disconnected with a warning.
pub fn load_design_json(
    path: &Path,
    types: &mut TypeTable,
    sink: &DiagnosticSink,
) -> Result<(LogicalDb, NetGraph), NetlistError> {
    let content = std::fs::read_to_string(path).map_err(|source| NetlistError::Io {
        path: path.to_string_lossy().into_owned(),
        source,
    })?;
    load_design_from_str(&content, path.to_string_lossy().as_ref(), types, sink)
}

/// Loads a Yosys JSON netlist from a string (`path` is used in errors only).
pub fn load_design_from_str(
    content: &str,
    path: &str,
    types: &mut TypeTable,
    sink: &DiagnosticSink,
) -> Result<(LogicalDb, NetGraph), NetlistError> {
    let file: YosysFile = serde_json::from_str(content).map_err(|e| NetlistError::Parse {
        path: path.to_string(),
        message: e.to_string(),
    })?;

    if file.modules.is_empty() {
        return Err(NetlistError::NoModules {
            path: path.to_string(),
        });
    }

    let (top_name, top) = select_top_module(&file.modules);
    let mut db = LogicalDb::new();
    db.top_module = top_name.to_string();

    for (port_name, port) in &top.ports {
        let Some(net) = first_bit(&port.bits) else {
            sink.warn(
                STAGE,
                format!("port '{port_name}' has no net bits, skipped"),
            );
            continue;
        };
        if port.bits.len() > 1 {
            sink.warn(
                STAGE,
                format!(
                    "port '{port_name}' is a {}-bit bus, collapsed to bit 0",
                    port.bits.len()
                ),
            );
        }
        db.add_port(port_name.clone(), port.direction, net);
    }

    for (inst_name, cell) in &top.cells {
        let ty = types.intern(&cell.cell_type);
        let mut pins: Vec<(String, NetId)> = Vec::new();
        for (pin_name, bits) in &cell.connections {
            if bits.len() > 1 {
                sink.warn(
                    STAGE,
                    format!(
                        "pin '{inst_name}.{pin_name}' is a {}-bit bus, collapsed to bit 0",
                        bits.len()
                    ),
                );
            }
            match first_bit(bits) {
                Some(net) => pins.push((pin_name.clone(), net)),
                None => {
                    sink.warn(
                        STAGE,
                        format!("pin '{inst_name}.{pin_name}' has no routable net, left open"),
                    );
                    pins.push((pin_name.clone(), NetId::NONE));
                }
            }
        }
        db.add_cell(inst_name.clone(), ty, pins);
    }

    sink.note(
        STAGE,
        format!(
            "loaded '{top_name}': {} cells, {} nets, {} ports",
            db.cell_count(),
            db.net_count(),
            db.ports().count()
        ),
    );

    let graph = NetGraph::build(&db);
    Ok((db, graph))
}

/// Picks the module flagged `top` in its attributes, else the first module.
fn select_top_module(modules: &BTreeMap<String, YosysModule>) -> (&str, &YosysModule) {
    for (name, module) in modules {
        if module.attributes.get("top").is_some_and(is_truthy) {
            return (name, module);
        }
    }
    let (name, module) = modules.iter().next().expect("modules checked non-empty");
    (name, module)
}

/// Yosys encodes attribute values as numbers or wide binary strings.
fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s.chars().any(|c| c == '1'),
        Value::Bool(b) => *b,
        _ => false,
    }
}

/// The first routable bit of a connection: an integer net ID.
///
/// Constant and undriven bits are strings in Yosys JSON and yield `None`.
fn first_bit(bits: &[Value]) -> Option<NetId> {
    match bits.first()? {
        Value::Number(n) => n.as_u64().map(|b| NetId::from_raw(b as u32)),
        _ => None,
    }
}
