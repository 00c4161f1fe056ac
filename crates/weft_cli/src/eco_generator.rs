//! The `weft eco-generator` command: CTS + power-down ECO + final Verilog.

use std::error::Error;

use weft_cts::{run_cts, CtsOptions};
use weft_diagnostics::DiagnosticSink;
use weft_eco::{format_report, run_power_down_eco};
use weft_emit::{generate_verilog, rename_instances, PlacementMap};
use weft_lef::LefLibrary;
use weft_liberty::{parse_liberty, LeakageDb};

use crate::flow;
use crate::{EcoGeneratorArgs, GlobalArgs};

const STAGE: &str = "eco-generator";

/// Runs the full ECO flow and writes `<design>_final.v`.
pub fn run(args: &EcoGeneratorArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let sink = DiagnosticSink::new();
    let mut env = flow::load_env(global, &args.design, &sink)?;
    let out = flow::out_dir(&env, &args.design, args.output.as_deref())?;
    let mut placement =
        flow::obtain_placement(&env, &args.design, &out, args.placement.as_deref(), &sink)?;

    // Step 1: clock tree.
    let cts_options = CtsOptions {
        clock_port: env.config.cts.clock.clone(),
    };
    let outcome = run_cts(
        &env.fabric,
        &env.types,
        &mut env.db,
        &mut env.graph,
        &mut placement,
        &cts_options,
        &sink,
    )?;
    let cts_map = PlacementMap::from_flow(&env.fabric, &env.types, &env.db, &placement);
    let cts_map_path = out.join(format!("{}_cts.map", args.design));
    std::fs::write(&cts_map_path, cts_map.render())?;
    if let Some(tree) = &outcome.tree {
        let tree_path = out.join(format!("{}_clock_tree.json", args.design));
        std::fs::write(&tree_path, serde_json::to_string_pretty(tree)?)?;
    }

    // Step 2: power-down ECO.
    let liberty_path = env.root.join(&env.config.paths.liberty);
    let leakage = match parse_liberty(&liberty_path) {
        Ok(db) => db,
        Err(e) => {
            sink.warn(STAGE, format!("{e}; tie polarity falls back to heuristics"));
            LeakageDb::new()
        }
    };
    let eco_outcome = run_power_down_eco(
        &env.fabric,
        &env.types,
        &mut env.db,
        &mut env.graph,
        &mut placement,
        &leakage,
        &sink,
    );
    std::fs::write(out.join("eco_report.txt"), format_report(&eco_outcome))?;

    // Step 3: final Verilog with fabric instance names.
    let mut lef = LefLibrary::new();
    for path in &env.config.paths.lef {
        let full = env.root.join(path);
        if full.exists() {
            let parsed = LefLibrary::parse(&full)?;
            lef.macros.extend(parsed.macros);
            lef.dividerchar = parsed.dividerchar;
            lef.busbitchars = parsed.busbitchars;
        }
    }
    let verilog = generate_verilog(&env.db, &env.types, &args.design, &lef, &sink);
    let final_map = PlacementMap::from_flow(&env.fabric, &env.types, &env.db, &placement);
    let renamed = rename_instances(&verilog, &final_map);
    let verilog_path = out.join(format!("{}_final.v", args.design));
    std::fs::write(&verilog_path, renamed)?;
    sink.note(
        STAGE,
        format!("final netlist written to {}", verilog_path.display()),
    );

    flow::render_diagnostics(&sink, global);
    Ok(0)
}
