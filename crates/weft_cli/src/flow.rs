//! Shared flow plumbing for the CLI commands.
//!
//! Loads the project configuration, the fabric and the design once, resolves
//! where a placement comes from (explicit map, conventional map locations,
//! or a fresh greedy + annealing run), and renders accumulated diagnostics.

use std::error::Error;
use std::path::{Path, PathBuf};

use weft_common::TypeTable;
use weft_config::{load_config, ProjectConfig, SaSection};
use weft_diagnostics::{DiagnosticSink, Severity, TerminalRenderer};
use weft_emit::PlacementMap;
use weft_fabric::{build_fabric_db, FabricDb};
use weft_netlist::{load_design_json, LogicalDb, NetGraph};
use weft_place::{initial_placement, simulated_annealing, Placement, SaConfig};

use crate::GlobalArgs;

const STAGE: &str = "flow";

/// The loaded databases of one flow invocation.
pub struct FlowEnv {
    /// Project root directory.
    pub root: PathBuf,
    /// Parsed (or defaulted) `weft.toml`.
    pub config: ProjectConfig,
    /// Shared cell-type table.
    pub types: TypeTable,
    /// The fabric.
    pub fabric: FabricDb,
    /// The logical design.
    pub db: LogicalDb,
    /// Its connectivity graph.
    pub graph: NetGraph,
}

/// Resolves the project root: `--config` (file → its directory), else the
/// nearest ancestor containing `weft.toml`, else the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            return Ok(p
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")));
        }
        return Ok(p);
    }
    let cwd = std::env::current_dir()?;
    let mut current = cwd.clone();
    loop {
        if current.join("weft.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Ok(cwd);
        }
    }
}

/// Loads configuration, fabric and design for `design`.
pub fn load_env(
    global: &GlobalArgs,
    design: &str,
    sink: &DiagnosticSink,
) -> Result<FlowEnv, Box<dyn Error>> {
    let root = resolve_project_root(global)?;
    let config = load_config(&root)?;
    let mut types = TypeTable::new();

    let fabric = build_fabric_db(
        &root.join(&config.paths.fabric_cells),
        &root.join(&config.paths.pins),
        &root.join(&config.paths.fabric),
        &mut types,
        sink,
    )?;

    let design_json = root
        .join(&config.paths.designs_dir)
        .join(format!("{design}_mapped.json"));
    let (db, graph) = load_design_json(&design_json, &mut types, sink)?;

    Ok(FlowEnv {
        root,
        config,
        types,
        fabric,
        db,
        graph,
    })
}

/// The output directory for a design, created on demand.
pub fn out_dir(
    env: &FlowEnv,
    design: &str,
    explicit: Option<&Path>,
) -> Result<PathBuf, Box<dyn Error>> {
    let dir = match explicit {
        Some(p) => p.to_path_buf(),
        None => env.root.join(&env.config.paths.build_dir).join(design),
    };
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Converts the `[sa]` config section into annealer knobs.
pub fn sa_config(section: &SaSection) -> SaConfig {
    SaConfig {
        initial_temp: section.initial_temp,
        final_temp: section.final_temp,
        cooling_rate: section.cooling_rate,
        moves_per_temp: section.moves_per_temp,
        max_iterations: section.max_iterations,
        prob_refine: section.prob_refine,
        prob_explore: section.prob_explore,
        w_initial: section.w_initial,
        seed: section.seed,
    }
}

/// Obtains the working placement.
///
/// Precedence: an explicit `.map` path (hard error if unreadable), the
/// conventional map locations for the design, then a fresh greedy placement
/// refined by annealing (written to `<out>/<design>.map`).
pub fn obtain_placement(
    env: &FlowEnv,
    design: &str,
    out: &Path,
    explicit: Option<&Path>,
    sink: &DiagnosticSink,
) -> Result<Placement, Box<dyn Error>> {
    if let Some(path) = explicit {
        let content = std::fs::read_to_string(path)?;
        let map = PlacementMap::parse(&content);
        sink.note(STAGE, format!("placement loaded from {}", path.display()));
        let mut placement = map.to_placement(&env.fabric, &env.db);
        fill_port_positions(env, &mut placement)?;
        return Ok(placement);
    }

    let candidates = [
        out.join(format!("{design}_sa_optimized.map")),
        out.join(format!("{design}.map")),
        env.root.join("placement_sa_optimized.map"),
        env.root.join("placement.map"),
    ];
    for path in &candidates {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let map = PlacementMap::parse(&content);
            sink.note(STAGE, format!("placement loaded from {}", path.display()));
            let mut placement = map.to_placement(&env.fabric, &env.db);
            fill_port_positions(env, &mut placement)?;
            return Ok(placement);
        }
    }

    sink.note(STAGE, "no placement map found, running greedy + annealing");
    let mut placement =
        initial_placement(&env.fabric, &env.db, &env.graph, &env.types, sink)?;
    let config = sa_config(&env.config.sa);
    let stats =
        simulated_annealing(&env.fabric, &env.db, &env.graph, &mut placement, &config, sink);
    std::fs::write(
        out.join(format!("{design}_sa_stats.json")),
        serde_json::to_string_pretty(&stats)?,
    )?;

    let map = PlacementMap::from_flow(&env.fabric, &env.types, &env.db, &placement);
    let path = out.join(format!("{design}.map"));
    std::fs::write(&path, map.render())?;
    sink.note(STAGE, format!("placement written to {}", path.display()));
    Ok(placement)
}

/// Re-fixes port pseudo-positions from the pin ring after a map reload.
fn fill_port_positions(env: &FlowEnv, placement: &mut Placement) -> Result<(), Box<dyn Error>> {
    weft_place::place_pins(&env.fabric, &env.db, placement)?;
    Ok(())
}

/// Renders accumulated diagnostics according to the global verbosity.
pub fn render_diagnostics(sink: &DiagnosticSink, global: &GlobalArgs) {
    let min = if global.quiet {
        Severity::Error
    } else if global.verbose {
        Severity::Note
    } else {
        Severity::Warning
    };
    TerminalRenderer::new(min).render_all(&sink.diagnostics());
}
