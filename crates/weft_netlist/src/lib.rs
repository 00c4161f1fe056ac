//! Logical netlist database and connectivity graph.
//!
//! The logical database holds the technology-mapped design: cell instances
//! with their pin → net bindings, nets with their connection closures, and
//! the top-level ports. It is loaded once from a Yosys-style JSON netlist,
//! read-only through placement, then rewritten by CTS and the power-down
//! ECO.
//!
//! The [`NetGraph`] is an undirected view of the same connectivity: one node
//! per instance or port, a clique of edges per net, each edge annotated with
//! the set of nets that induced it.

#![warn(missing_docs)]

pub mod design;
pub mod error;
pub mod graph;
pub mod json;

pub use design::{Cell, Connection, Endpoint, LogicalDb, Net, Port};
pub use error::NetlistError;
pub use graph::{NetGraph, NetNode};
pub use json::{load_design_from_str, load_design_json};
