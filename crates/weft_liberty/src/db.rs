//! The leakage database produced by the Liberty parser.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Tie polarity for one input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TieState {
    /// Tie to constant logic 1.
    Hi,
    /// Tie to constant logic 0.
    Lo,
}

/// Cell-level tie summary across all inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieSummary {
    /// Every input ties high.
    Hi,
    /// Every input ties low.
    Lo,
    /// Inputs disagree.
    Mixed,
}

impl TieSummary {
    /// Collapses the summary to a single polarity; `Mixed` falls back low.
    pub fn as_tie(self) -> TieState {
        match self {
            TieSummary::Hi => TieState::Hi,
            TieSummary::Lo | TieSummary::Mixed => TieState::Lo,
        }
    }
}

/// Leakage analysis result for one cell master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellLeakage {
    /// The minimum-leakage `when` condition as written in the library.
    pub min_state: String,
    /// Leakage in the minimum state.
    pub min_power: f64,
    /// Mean leakage over all recorded states.
    pub avg_power: f64,
    /// Worst-case leakage over all recorded states.
    pub max_power: f64,
    /// Cell-level summary of the tie direction.
    pub summary: TieSummary,
    /// Per-input tie polarity achieving the minimum state.
    pub input_ties: BTreeMap<String, TieState>,
}

impl CellLeakage {
    /// Relative saving `(avg − min) / avg` of tying optimally, in [0, 1].
    pub fn savings_fraction(&self) -> f64 {
        if self.avg_power > 0.0 {
            (self.avg_power - self.min_power) / self.avg_power
        } else {
            0.0
        }
    }
}

/// Per-cell-type leakage data keyed by master name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeakageDb {
    /// Analysis per cell master.
    pub cells: HashMap<String, CellLeakage>,
}

impl LeakageDb {
    /// Creates an empty database (every query falls through to heuristics).
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the analysis for a cell master.
    pub fn cell(&self, cell_type: &str) -> Option<&CellLeakage> {
        self.cells.get(cell_type)
    }

    /// The tie polarity for `pin` of `cell_type`.
    ///
    /// Resolution order: per-input tie state, then the cell-level summary,
    /// then low.
    pub fn tie_for(&self, cell_type: &str, pin: &str) -> TieState {
        match self.cells.get(cell_type) {
            Some(cl) => cl
                .input_ties
                .get(pin)
                .copied()
                .unwrap_or_else(|| cl.summary.as_tie()),
            None => TieState::Lo,
        }
    }

    /// Number of cell masters with leakage data.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns `true` if no master has data.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
