//! H-tree clock-tree synthesis.
//!
//! Recursively partitions the placed clock sinks into quadrants around their
//! centroid, claims the nearest unused buffer site for each tree node
//! (inverters as fallback, virtual nodes when the pool runs dry), and
//! rewrites the logical netlist so the clock port drives the root buffer and
//! every flip-flop clock pin is driven by a leaf buffer output net.

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod tree;

pub use engine::{run_cts, CtsOptions, CtsOutcome};
pub use error::CtsError;
pub use tree::ClockTreeNode;
