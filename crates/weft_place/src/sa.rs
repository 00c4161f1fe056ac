//! Simulated-annealing placement refinement.
//!
//! Starting from the greedy placement, repeatedly proposes *refine* moves
//! (swap two placed cells of identical type) or *explore* moves (shift one
//! cell to a free compatible site inside a temperature-shrinking window) and
//! accepts each with the Metropolis criterion. The best placement seen is
//! tracked across temperature blocks and restored at the end.
//!
//! All randomness draws from one seeded generator: the same seed and
//! configuration reproduce the same best placement exactly.

use crate::cost::{hpwl_of_nets, nets_of_inst, total_hpwl};
use crate::placement::Placement;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use weft_common::{InstId, NetId, Point};
use weft_diagnostics::DiagnosticSink;
use weft_fabric::{FabricDb, Site};
use weft_netlist::{LogicalDb, NetGraph, NetNode};

const STAGE: &str = "sa";

/// How many window-nearest candidate sites an explore move picks among.
const EXPLORE_CANDIDATES: usize = 5;

/// Consecutive diverged temperature steps that trigger a reheat.
const REHEAT_PATIENCE: u32 = 20;

/// Divergence threshold relative to the best cost.
const REHEAT_RATIO: f64 = 1.5;

/// Annealer knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaConfig {
    /// Starting temperature.
    pub initial_temp: f64,
    /// Temperature at which the schedule stops.
    pub final_temp: f64,
    /// Geometric cooling factor per temperature block, in (0, 1).
    pub cooling_rate: f64,
    /// Proposals evaluated per temperature block.
    pub moves_per_temp: u32,
    /// Hard cap on total proposals across all blocks.
    pub max_iterations: u64,
    /// Probability of proposing a refine (swap) move.
    pub prob_refine: f64,
    /// Probability of proposing an explore (shift) move.
    pub prob_explore: f64,
    /// Initial explore window as a fraction of `max(die width, die height)`.
    pub w_initial: f64,
    /// Seed for the injected random generator.
    pub seed: u64,
}

impl Default for SaConfig {
    fn default() -> Self {
        Self {
            initial_temp: 1000.0,
            final_temp: 0.01,
            cooling_rate: 0.97,
            moves_per_temp: 4000,
            max_iterations: 15_000,
            prob_refine: 0.5,
            prob_explore: 0.5,
            w_initial: 0.5,
            seed: 0,
        }
    }
}

/// Counters and history recorded by one annealing run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaStats {
    /// HPWL of the placement the annealer started from.
    pub initial_cost: f64,
    /// HPWL of the best placement found.
    pub best_cost: f64,
    /// Total proposals evaluated.
    pub iterations: u64,
    /// Accepted refine (swap) moves.
    pub accepted_refine: u64,
    /// Rejected refine proposals (including type-mismatched pairs).
    pub rejected_refine: u64,
    /// Accepted explore (shift) moves.
    pub accepted_explore: u64,
    /// Rejected explore proposals.
    pub rejected_explore: u64,
    /// Accepted moves that strictly lowered the cost.
    pub improvements: u64,
    /// Temperature at the end of each block.
    pub temperature_history: Vec<f64>,
    /// Current cost at the end of each block.
    pub cost_history: Vec<f64>,
}

impl SaStats {
    /// Total accepted moves across both move types.
    pub fn accepted_total(&self) -> u64 {
        self.accepted_refine + self.accepted_explore
    }

    /// Total rejected proposals across both move types.
    pub fn rejected_total(&self) -> u64 {
        self.rejected_refine + self.rejected_explore
    }
}

/// Refines `placement` in place and leaves it at the best state found.
pub fn simulated_annealing(
    fabric: &FabricDb,
    db: &LogicalDb,
    graph: &NetGraph,
    placement: &mut Placement,
    config: &SaConfig,
    sink: &DiagnosticSink,
) -> SaStats {
    let mut stats = SaStats {
        initial_cost: total_hpwl(db, placement),
        ..SaStats::default()
    };
    stats.best_cost = stats.initial_cost;

    // Movable cells in ascending instance order: index draws are stable.
    let movable: Vec<InstId> = {
        let mut v: Vec<InstId> = placement.placed().map(|(i, _)| i).collect();
        v.sort();
        v
    };
    if movable.is_empty() {
        return stats;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best = placement.clone();
    let mut best_cost = stats.initial_cost;
    let die = fabric.die_bbox();
    let die_max = die.width().max(die.height());

    let mut t = config.initial_temp;
    let mut diverged_blocks: u32 = 0;

    while t > config.final_temp && stats.iterations < config.max_iterations {
        for _ in 0..config.moves_per_temp {
            if stats.iterations >= config.max_iterations {
                break;
            }
            stats.iterations += 1;

            if rng.gen::<f64>() < config.prob_refine {
                propose_refine(db, placement, &movable, &mut rng, t, &mut stats);
            } else {
                propose_explore(
                    fabric, db, graph, placement, &movable, config, die_max, &mut rng, t,
                    &mut stats,
                );
            }
        }

        let current_cost = total_hpwl(db, placement);
        stats.temperature_history.push(t);
        stats.cost_history.push(current_cost);

        if current_cost < best_cost {
            best = placement.clone();
            best_cost = current_cost;
            diverged_blocks = 0;
        } else if current_cost > REHEAT_RATIO * best_cost {
            diverged_blocks += 1;
        } else {
            diverged_blocks = 0;
        }

        if diverged_blocks > REHEAT_PATIENCE {
            *placement = best.clone();
            t = (5.0 * t).min(0.5 * config.initial_temp);
            diverged_blocks = 0;
            continue;
        }

        t *= config.cooling_rate;
    }

    *placement = best;
    stats.best_cost = best_cost;
    sink.note(
        STAGE,
        format!(
            "annealing: {:.2} -> {:.2} in {} proposals ({} accepted)",
            stats.initial_cost,
            stats.best_cost,
            stats.iterations,
            stats.accepted_total()
        ),
    );
    stats
}

/// Swap proposal between two distinct placed cells.
///
/// Pairs of different type are discarded and counted as rejected.
fn propose_refine(
    db: &LogicalDb,
    placement: &mut Placement,
    movable: &[InstId],
    rng: &mut StdRng,
    t: f64,
    stats: &mut SaStats,
) {
    if movable.len() < 2 {
        stats.rejected_refine += 1;
        return;
    }
    let i = rng.gen_range(0..movable.len());
    let j = {
        let j = rng.gen_range(0..movable.len() - 1);
        if j >= i {
            j + 1
        } else {
            j
        }
    };
    let a = movable[i];
    let b = movable[j];

    let (ta, tb) = (
        placement.site_of(a).expect("movable cells are placed").cell_type,
        placement.site_of(b).expect("movable cells are placed").cell_type,
    );
    if ta != tb {
        stats.rejected_refine += 1;
        return;
    }

    let mut nets: BTreeSet<NetId> = nets_of_inst(db, a);
    nets.extend(nets_of_inst(db, b));
    let before = hpwl_of_nets(db, placement, nets.iter());
    placement.swap(a, b).expect("both cells placed");
    let after = hpwl_of_nets(db, placement, nets.iter());
    let delta = after - before;

    if accept(delta, t, rng) {
        stats.accepted_refine += 1;
        if delta < 0.0 {
            stats.improvements += 1;
        }
    } else {
        placement.swap(a, b).expect("swap back");
        stats.rejected_refine += 1;
    }
}

/// Shift proposal: one cell to a nearby free site of the same type.
#[allow(clippy::too_many_arguments)]
fn propose_explore(
    fabric: &FabricDb,
    db: &LogicalDb,
    graph: &NetGraph,
    placement: &mut Placement,
    movable: &[InstId],
    config: &SaConfig,
    die_max: f64,
    rng: &mut StdRng,
    t: f64,
    stats: &mut SaStats,
) {
    let inst = movable[rng.gen_range(0..movable.len())];
    let placed = *placement.site_of(inst).expect("movable cells are placed");

    let window = explore_window(config, die_max, t);
    let mut candidates: Vec<&Site> = fabric
        .sites_of_type(placed.cell_type)
        .filter(|s| placement.is_free(s.id))
        .filter(|s| s.pos.chebyshev(placed.pos) <= window)
        .collect();
    if candidates.is_empty() {
        candidates = fabric
            .sites_of_type(placed.cell_type)
            .filter(|s| placement.is_free(s.id))
            .collect();
    }
    if candidates.is_empty() {
        stats.rejected_explore += 1;
        return;
    }

    // Aim at the barycenter of the placed non-port neighbors, falling back
    // to the cell's own position.
    let target = {
        let mut sum = Point::new(0.0, 0.0);
        let mut count = 0usize;
        for n in graph.neighbors(NetNode::Inst(inst)) {
            if let NetNode::Inst(other) = n {
                if let Some(p) = placement.site_of(other) {
                    sum.x += p.pos.x;
                    sum.y += p.pos.y;
                    count += 1;
                }
            }
        }
        if count > 0 {
            Point::new(sum.x / count as f64, sum.y / count as f64)
        } else {
            placed.pos
        }
    };

    candidates.sort_by(|a, b| {
        a.pos
            .distance(target)
            .partial_cmp(&b.pos.distance(target))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.truncate(EXPLORE_CANDIDATES);
    let site = candidates[rng.gen_range(0..candidates.len())];

    let nets = nets_of_inst(db, inst);
    let before = hpwl_of_nets(db, placement, nets.iter());
    let old_site = placed.site;
    placement.relocate(inst, site).expect("candidate site is free");
    let after = hpwl_of_nets(db, placement, nets.iter());
    let delta = after - before;

    if accept(delta, t, rng) {
        stats.accepted_explore += 1;
        if delta < 0.0 {
            stats.improvements += 1;
        }
    } else {
        let back = fabric.site(old_site);
        placement.relocate(inst, back).expect("old site just vacated");
        stats.rejected_explore += 1;
    }
}

/// The range-limit window at temperature `t`, shrinking linearly to zero.
fn explore_window(config: &SaConfig, die_max: f64, t: f64) -> f64 {
    let span = config.initial_temp - config.final_temp;
    if span <= 0.0 {
        return 0.0;
    }
    let frac = ((t - config.final_temp) / span).clamp(0.0, 1.0);
    config.w_initial * die_max * frac
}

/// Metropolis criterion. Non-positive temperature rejects uphill moves.
fn accept(delta: f64, t: f64, rng: &mut StdRng) -> bool {
    if delta < 0.0 {
        return true;
    }
    if t <= 0.0 {
        return false;
    }
    rng.gen::<f64>() < (-delta / t).exp()
}
