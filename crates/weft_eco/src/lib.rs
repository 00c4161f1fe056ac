//! Power-down ECO: tie unused fabric gates to their leakage-optimal level.
//!
//! Every fabric site that hosts plain logic but ended up unused after
//! placement and CTS leaks through its floating inputs. Per tile with such
//! candidates, one CONB tie cell is claimed; its constant-high and
//! constant-low outputs then drive every input pin of every unused gate in
//! the tile, each pin at the polarity the Liberty leakage table says
//! minimizes leakage.

#![warn(missing_docs)]

pub mod eco;
pub mod pins;
pub mod report;

pub use eco::{run_power_down_eco, EcoOutcome, EcoStats, TiedCell};
pub use report::format_report;
