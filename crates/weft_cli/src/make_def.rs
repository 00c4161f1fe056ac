//! The `weft make-def` command: full DEF 5.8 emission.

use std::error::Error;
use std::path::PathBuf;

use weft_cts::{run_cts, CtsOptions};
use weft_diagnostics::DiagnosticSink;
use weft_eco::run_power_down_eco;
use weft_emit::{validate_def, write_def, DefOptions, PlacementMap};
use weft_lef::{LefLibrary, TlefData};
use weft_liberty::{parse_liberty, LeakageDb};

use crate::flow;
use crate::{GlobalArgs, MakeDefArgs};

const STAGE: &str = "make-def";

/// Emits `<design>.def`, optionally running CTS and the ECO first.
pub fn run(args: &MakeDefArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let sink = DiagnosticSink::new();
    let mut env = flow::load_env(global, &args.design, &sink)?;
    let out = flow::out_dir(&env, &args.design, args.output.as_deref())?;

    // A positional .map file overrides the placement search.
    let map_file: Option<PathBuf> = args
        .files
        .iter()
        .find(|f| f.extension().is_some_and(|e| e == "map"))
        .cloned();
    let mut placement =
        flow::obtain_placement(&env, &args.design, &out, map_file.as_deref(), &sink)?;

    if !args.no_cts {
        let options = CtsOptions {
            clock_port: args.clock.clone().or_else(|| env.config.cts.clock.clone()),
        };
        let outcome = run_cts(
            &env.fabric,
            &env.types,
            &mut env.db,
            &mut env.graph,
            &mut placement,
            &options,
            &sink,
        )?;
        if let Some(tree) = &outcome.tree {
            let tree_path = out.join(format!("{}_clock_tree.json", args.design));
            std::fs::write(&tree_path, serde_json::to_string_pretty(tree)?)?;
        }
    }

    if !args.no_eco {
        let liberty_path = env.root.join(&env.config.paths.liberty);
        let leakage = match parse_liberty(&liberty_path) {
            Ok(db) => db,
            Err(e) => {
                sink.warn(STAGE, format!("{e}; tie polarity falls back to heuristics"));
                LeakageDb::new()
            }
        };
        run_power_down_eco(
            &env.fabric,
            &env.types,
            &mut env.db,
            &mut env.graph,
            &mut placement,
            &leakage,
            &sink,
        );
    }

    let lef = {
        let mut lef = LefLibrary::new();
        let paths: Vec<PathBuf> = match &args.lef {
            Some(p) => vec![p.clone()],
            None => env.config.paths.lef.iter().map(|p| env.root.join(p)).collect(),
        };
        for path in paths {
            if path.exists() {
                let parsed = LefLibrary::parse(&path)?;
                lef.macros.extend(parsed.macros);
                lef.dividerchar = parsed.dividerchar;
                lef.busbitchars = parsed.busbitchars;
            } else {
                sink.warn(STAGE, format!("LEF {} not found, skipped", path.display()));
            }
        }
        lef
    };
    let tlef = {
        let path = args
            .tlef
            .clone()
            .unwrap_or_else(|| env.root.join(&env.config.paths.tlef));
        if path.exists() {
            TlefData::parse(&path)?
        } else {
            sink.warn(
                STAGE,
                format!("TLEF {} not found, using default technology", path.display()),
            );
            TlefData::default()
        }
    };

    let def_path = out.join(format!("{}.def", args.design));
    let mut file = std::fs::File::create(&def_path)?;
    write_def(
        &mut file,
        &env.fabric,
        &env.types,
        &env.db,
        &placement,
        &lef,
        &tlef,
        &DefOptions {
            design_name: args.design.clone(),
        },
        &sink,
    )?;
    sink.note(STAGE, format!("DEF written to {}", def_path.display()));

    let content = std::fs::read_to_string(&def_path)?;
    let problems = validate_def(&content);
    let failed = !problems.is_empty();
    for problem in problems {
        sink.emit(weft_diagnostics::Diagnostic::error(
            STAGE,
            format!("DEF validation: {problem}"),
        ));
    }

    flow::render_diagnostics(&sink, global);
    Ok(if failed { 1 } else { 0 })
}
