//! Placement engines for the weft flow.
//!
//! Two stages share the [`Placement`] data structure: the greedy seeded
//! placer produces a feasible initial binding of every logical instance to a
//! type-compatible fabric site, and the simulated-annealing refiner then
//! mutates that binding in place to reduce half-perimeter wirelength.

#![warn(missing_docs)]

pub mod cost;
pub mod error;
pub mod greedy;
pub mod placement;
pub mod sa;

pub use error::PlaceError;
pub use greedy::{initial_placement, place_pins};
pub use placement::{PlacedInst, Placement};
pub use sa::{simulated_annealing, SaConfig, SaStats};
