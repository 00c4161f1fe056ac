//! The `weft visualize` command.

use std::error::Error;

use weft_diagnostics::DiagnosticSink;
use weft_viz::{run_stages, VizContext};

use crate::flow;
use crate::{GlobalArgs, VisualizeArgs};

/// Runs the visualization data pipeline.
///
/// Exit code 0 on success or when only optional inputs were missing;
/// 1 on any hard error, or on any missing input under `--strict`.
pub fn run(args: &VisualizeArgs, global: &GlobalArgs) -> Result<i32, Box<dyn Error>> {
    let sink = DiagnosticSink::new();
    let env = flow::load_env(global, &args.design, &sink)?;
    let out = flow::out_dir(&env, &args.design, None)?;
    let placement =
        flow::obtain_placement(&env, &args.design, &out, args.map.as_deref(), &sink)?;

    let ctx = VizContext {
        fabric: &env.fabric,
        types: &env.types,
        db: &env.db,
        placement: &placement,
        design: args.design.clone(),
        out_dir: out.clone(),
        congestion_report: out.join(format!("{}_congestion.rpt", args.design)),
        timing_report: out.join(format!("{}_timing.rpt", args.design)),
        clock_tree: out.join(format!("{}_clock_tree.json", args.design)),
    };
    let results = run_stages(&ctx, &args.only, &args.skip, &sink);

    flow::render_diagnostics(&sink, global);

    let hard = results.iter().any(|r| r.is_hard_error());
    let soft = results.iter().any(|r| r.is_soft_skip());
    if hard || (args.strict && soft) {
        Ok(1)
    } else {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{quiet_globals, write_project};

    fn args(design: &str) -> VisualizeArgs {
        VisualizeArgs {
            design: design.into(),
            only: Vec::new(),
            skip: Vec::new(),
            map: None,
            strict: false,
        }
    }

    #[test]
    fn soft_missing_inputs_still_exit_zero() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let global = quiet_globals(dir.path());
        // Congestion/timing/clock-tree inputs are absent: soft skips only.
        let code = run(&args("tiny"), &global).unwrap();
        assert_eq!(code, 0);
        let out = dir.path().join("build/tiny");
        assert!(out.join("tiny_layout.json").exists());
        assert!(out.join("tiny_density.json").exists());
        assert!(out.join("tiny_net_length.json").exists());
        assert!(!out.join("tiny_congestion.json").exists());
    }

    #[test]
    fn strict_elevates_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let global = quiet_globals(dir.path());
        let mut a = args("tiny");
        a.strict = true;
        let code = run(&a, &global).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn only_restricts_to_data_stages() {
        let dir = tempfile::tempdir().unwrap();
        write_project(dir.path());
        let global = quiet_globals(dir.path());
        let mut a = args("tiny");
        a.only = vec!["layout".into(), "density".into()];
        a.strict = true;
        // The selected stages need no optional inputs, so strict passes.
        let code = run(&a, &global).unwrap();
        assert_eq!(code, 0);
    }
}
