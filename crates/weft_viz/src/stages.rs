//! The per-stage data generators.

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use weft_common::TypeTable;
use weft_diagnostics::DiagnosticSink;
use weft_fabric::FabricDb;
use weft_netlist::LogicalDb;
use weft_place::{cost, Placement};

const STAGE: &str = "viz";

/// Density heatmap resolution per axis.
const DENSITY_BINS: usize = 10;

/// Net-length histogram bucket count.
const HPWL_BUCKETS: usize = 16;

/// The visualization stages, in run order.
pub const STAGES: &[&str] = &[
    "layout",
    "density",
    "net_length",
    "congestion",
    "slack",
    "critical_path",
    "cts",
];

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageStatus {
    /// Artifact written.
    Ok,
    /// A required input file is absent; soft skip.
    MissingInput,
    /// The input exists but yields nothing usable; soft skip.
    MissingData,
    /// Hard failure (I/O or serialization).
    Failed,
}

/// The outcome of one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    /// Stage name.
    pub stage: String,
    /// How the stage ended.
    pub status: StageStatus,
    /// Human-readable detail.
    pub detail: String,
    /// The artifact written, if any.
    pub artifact: Option<PathBuf>,
}

impl StageResult {
    /// Returns `true` for a hard failure.
    pub fn is_hard_error(&self) -> bool {
        self.status == StageStatus::Failed
    }

    /// Returns `true` for a soft (missing input/data) skip.
    pub fn is_soft_skip(&self) -> bool {
        matches!(self.status, StageStatus::MissingInput | StageStatus::MissingData)
    }
}

/// Everything the stages read.
pub struct VizContext<'a> {
    /// The fabric database.
    pub fabric: &'a FabricDb,
    /// The shared cell-type table.
    pub types: &'a TypeTable,
    /// The logical design.
    pub db: &'a LogicalDb,
    /// The placement to visualize.
    pub placement: &'a Placement,
    /// Design name, used in artifact file names.
    pub design: String,
    /// Output directory for artifacts.
    pub out_dir: PathBuf,
    /// Optional congestion report (external router output).
    pub congestion_report: PathBuf,
    /// Optional timing report (external STA output).
    pub timing_report: PathBuf,
    /// Clock tree JSON written by the CTS stage.
    pub clock_tree: PathBuf,
}

/// Runs the selected stages and returns one result per stage run.
///
/// `only` restricts the run to the named stages; `skip` removes stages.
/// Unknown stage names in either list are reported as warnings and ignored.
pub fn run_stages(
    ctx: &VizContext<'_>,
    only: &[String],
    skip: &[String],
    sink: &DiagnosticSink,
) -> Vec<StageResult> {
    for name in only.iter().chain(skip) {
        if !STAGES.contains(&name.as_str()) {
            sink.warn(STAGE, format!("unknown stage '{name}' ignored"));
        }
    }

    let mut results = Vec::new();
    for &stage in STAGES {
        if !only.is_empty() && !only.iter().any(|s| s.as_str() == stage) {
            continue;
        }
        if skip.iter().any(|s| s.as_str() == stage) {
            continue;
        }
        let result = match stage {
            "layout" => layout_stage(ctx),
            "density" => density_stage(ctx),
            "net_length" => net_length_stage(ctx),
            "congestion" => congestion_stage(ctx),
            "slack" => slack_stage(ctx),
            "critical_path" => critical_path_stage(ctx),
            "cts" => cts_stage(ctx),
            _ => unreachable!("stage list is fixed"),
        };
        match result.status {
            StageStatus::Ok => sink.note(STAGE, format!("{stage}: {}", result.detail)),
            StageStatus::Failed => sink.emit(weft_diagnostics::Diagnostic::error(
                STAGE,
                format!("{stage}: {}", result.detail),
            )),
            _ => sink.warn(STAGE, format!("{stage}: {}", result.detail)),
        }
        results.push(result);
    }
    results
}

fn artifact_path(ctx: &VizContext<'_>, suffix: &str) -> PathBuf {
    ctx.out_dir.join(format!("{}_{suffix}.json", ctx.design))
}

fn write_artifact(
    ctx: &VizContext<'_>,
    stage: &str,
    suffix: &str,
    value: serde_json::Value,
    detail: String,
) -> StageResult {
    let path = artifact_path(ctx, suffix);
    let io = std::fs::create_dir_all(&ctx.out_dir).and_then(|_| {
        std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap_or_default())
    });
    match io {
        Ok(()) => StageResult {
            stage: stage.to_string(),
            status: StageStatus::Ok,
            detail,
            artifact: Some(path),
        },
        Err(e) => StageResult {
            stage: stage.to_string(),
            status: StageStatus::Failed,
            detail: format!("cannot write {}: {e}", path.display()),
            artifact: None,
        },
    }
}

fn missing_input(stage: &str, path: &Path) -> StageResult {
    StageResult {
        stage: stage.to_string(),
        status: StageStatus::MissingInput,
        detail: format!("input {} not found", path.display()),
        artifact: None,
    }
}

fn missing_data(stage: &str, path: &Path) -> StageResult {
    StageResult {
        stage: stage.to_string(),
        status: StageStatus::MissingData,
        detail: format!("input {} contains no usable data", path.display()),
        artifact: None,
    }
}

/// Ground-truth fabric layout: die, core, per-type site counts.
fn layout_stage(ctx: &VizContext<'_>) -> StageResult {
    let mut type_counts: std::collections::BTreeMap<&str, usize> = Default::default();
    for site in ctx.fabric.sites() {
        *type_counts.entry(ctx.types.name(site.cell_type)).or_default() += 1;
    }
    let die = ctx.fabric.die_bbox();
    let core = ctx.fabric.core_bbox();
    let value = json!({
        "die": [die.llx, die.lly, die.urx, die.ury],
        "core": [core.llx, core.lly, core.urx, core.ury],
        "site_count": ctx.fabric.site_count(),
        "pin_count": ctx.fabric.pins().count(),
        "sites_by_type": type_counts,
    });
    write_artifact(
        ctx,
        "layout",
        "layout",
        value,
        format!("{} sites", ctx.fabric.site_count()),
    )
}

/// Placement density heatmap over a fixed grid.
fn density_stage(ctx: &VizContext<'_>) -> StageResult {
    let die = ctx.fabric.die_bbox();
    let (w, h) = (die.width().max(1e-9), die.height().max(1e-9));
    let mut grid = vec![vec![0u32; DENSITY_BINS]; DENSITY_BINS];
    for (_, placed) in ctx.placement.placed() {
        let bx = (((placed.pos.x - die.llx) / w) * DENSITY_BINS as f64)
            .floor()
            .clamp(0.0, (DENSITY_BINS - 1) as f64) as usize;
        let by = (((placed.pos.y - die.lly) / h) * DENSITY_BINS as f64)
            .floor()
            .clamp(0.0, (DENSITY_BINS - 1) as f64) as usize;
        grid[by][bx] += 1;
    }
    let value = json!({
        "bins": DENSITY_BINS,
        "placed": ctx.placement.placed_count(),
        "grid": grid,
    });
    write_artifact(
        ctx,
        "density",
        "density",
        value,
        format!("{} placed instances", ctx.placement.placed_count()),
    )
}

/// Per-net HPWL histogram.
fn net_length_stage(ctx: &VizContext<'_>) -> StageResult {
    let lengths: Vec<f64> = ctx
        .db
        .nets()
        .map(|n| cost::net_hpwl(n, ctx.placement))
        .collect();
    let total: f64 = lengths.iter().sum();
    let max = lengths.iter().cloned().fold(0.0f64, f64::max);
    let mut histogram = vec![0u32; HPWL_BUCKETS];
    if max > 0.0 {
        for &l in &lengths {
            let b = ((l / max) * HPWL_BUCKETS as f64)
                .floor()
                .clamp(0.0, (HPWL_BUCKETS - 1) as f64) as usize;
            histogram[b] += 1;
        }
    }
    let value = json!({
        "nets": lengths.len(),
        "total_hpwl": total,
        "max_hpwl": max,
        "histogram": histogram,
    });
    write_artifact(
        ctx,
        "net_length",
        "net_length",
        value,
        format!("total HPWL {total:.2}"),
    )
}

/// Congestion summary from an external router report.
///
/// The report is line-oriented `x y overflow`; anything else is skipped.
fn congestion_stage(ctx: &VizContext<'_>) -> StageResult {
    let path = &ctx.congestion_report;
    if !path.exists() {
        return missing_input("congestion", path);
    }
    let Ok(content) = std::fs::read_to_string(path) else {
        return missing_input("congestion", path);
    };
    let mut samples: Vec<(f64, f64, f64)> = Vec::new();
    for line in content.lines() {
        let f: Vec<&str> = line.split_whitespace().collect();
        if f.len() < 3 {
            continue;
        }
        if let (Ok(x), Ok(y), Ok(v)) = (f[0].parse(), f[1].parse(), f[2].parse()) {
            samples.push((x, y, v));
        }
    }
    if samples.is_empty() {
        return missing_data("congestion", path);
    }
    let worst = samples.iter().map(|s| s.2).fold(f64::NEG_INFINITY, f64::max);
    let value = json!({
        "samples": samples.len(),
        "worst_overflow": worst,
        "points": samples.iter().map(|(x, y, v)| json!([x, y, v])).collect::<Vec<_>>(),
    });
    write_artifact(
        ctx,
        "congestion",
        "congestion",
        value,
        format!("{} samples", samples.len()),
    )
}

/// Slack histogram from an external timing report (`endpoint slack` lines).
fn slack_stage(ctx: &VizContext<'_>) -> StageResult {
    match read_slacks(&ctx.timing_report) {
        SlackInput::Missing => missing_input("slack", &ctx.timing_report),
        SlackInput::Empty => missing_data("slack", &ctx.timing_report),
        SlackInput::Slacks(slacks) => {
            let worst = slacks
                .iter()
                .map(|s| s.1)
                .fold(f64::INFINITY, f64::min);
            let value = json!({
                "endpoints": slacks.len(),
                "worst_slack": worst,
                "violations": slacks.iter().filter(|s| s.1 < 0.0).count(),
                "slacks": slacks.iter().map(|(e, s)| json!([e, s])).collect::<Vec<_>>(),
            });
            write_artifact(
                ctx,
                "slack",
                "slack",
                value,
                format!("worst slack {worst:.3}"),
            )
        }
    }
}

/// The worst path from the same timing report.
fn critical_path_stage(ctx: &VizContext<'_>) -> StageResult {
    match read_slacks(&ctx.timing_report) {
        SlackInput::Missing => missing_input("critical_path", &ctx.timing_report),
        SlackInput::Empty => missing_data("critical_path", &ctx.timing_report),
        SlackInput::Slacks(slacks) => {
            let worst = slacks
                .iter()
                .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
                .expect("non-empty by construction");
            let value = json!({
                "endpoint": worst.0,
                "slack": worst.1,
            });
            write_artifact(
                ctx,
                "critical_path",
                "critical_path",
                value,
                format!("endpoint {}", worst.0),
            )
        }
    }
}

/// Clock-tree overlay data from the CTS JSON artifact.
fn cts_stage(ctx: &VizContext<'_>) -> StageResult {
    let path = &ctx.clock_tree;
    if !path.exists() {
        return missing_input("cts", path);
    }
    let Ok(content) = std::fs::read_to_string(path) else {
        return missing_input("cts", path);
    };
    let Ok(tree) = serde_json::from_str::<serde_json::Value>(&content) else {
        return missing_data("cts", path);
    };
    let mut buffers = 0usize;
    let mut sinks = 0usize;
    let mut depth = 0u64;
    walk_tree(&tree, &mut buffers, &mut sinks, &mut depth);
    if buffers == 0 && sinks == 0 {
        return missing_data("cts", path);
    }
    let value = json!({
        "buffers": buffers,
        "sinks": sinks,
        "depth": depth,
        "tree": tree,
    });
    write_artifact(
        ctx,
        "cts",
        "cts_overlay",
        value,
        format!("{buffers} buffers, {sinks} sinks"),
    )
}

enum SlackInput {
    Missing,
    Empty,
    Slacks(Vec<(String, f64)>),
}

fn read_slacks(path: &Path) -> SlackInput {
    if !path.exists() {
        return SlackInput::Missing;
    }
    let Ok(content) = std::fs::read_to_string(path) else {
        return SlackInput::Missing;
    };
    let mut slacks = Vec::new();
    for line in content.lines() {
        let f: Vec<&str> = line.split_whitespace().collect();
        if f.len() < 2 {
            continue;
        }
        if let Ok(s) = f[1].parse::<f64>() {
            slacks.push((f[0].to_string(), s));
        }
    }
    if slacks.is_empty() {
        SlackInput::Empty
    } else {
        SlackInput::Slacks(slacks)
    }
}

fn walk_tree(node: &serde_json::Value, buffers: &mut usize, sinks: &mut usize, depth: &mut u64) {
    let Some(obj) = node.as_object() else {
        return;
    };
    if obj.get("buffer").is_some_and(|b| !b.is_null()) {
        *buffers += 1;
    }
    if let Some(level) = obj.get("level").and_then(|l| l.as_u64()) {
        *depth = (*depth).max(level);
    }
    if let Some(s) = obj.get("sinks").and_then(|s| s.as_array()) {
        *sinks += s.len();
    }
    if let Some(children) = obj.get("children").and_then(|c| c.as_array()) {
        for child in children {
            walk_tree(child, buffers, sinks, depth);
        }
    }
}
