//! Visualization data products.
//!
//! The plots themselves are rendered outside the flow; this crate produces
//! the *numbers* each plot is drawn from, one JSON artifact per stage under
//! `build/<design>/`. Stages whose optional inputs (congestion report,
//! timing report, clock tree) are absent fail softly with `MissingInput`;
//! inputs that exist but contain nothing usable fail with `MissingData`.
//! The CLI decides exit codes from the per-stage results.

#![warn(missing_docs)]

pub mod stages;

pub use stages::{run_stages, StageResult, StageStatus, VizContext, STAGES};
