//! Half-perimeter wirelength cost.
//!
//! HPWL sums, over every net, the half-perimeter of the bounding box of the
//! net's placed endpoints. Port pseudo-positions participate; unplaced
//! endpoints are ignored. It is the standard placement proxy cost that the
//! annealer minimizes.

use crate::placement::Placement;
use std::collections::BTreeSet;
use weft_common::{BBox, InstId, NetId};
use weft_netlist::{LogicalDb, Net, NetNode};

/// HPWL of a single net over its placed endpoints.
pub fn net_hpwl(net: &Net, placement: &Placement) -> f64 {
    let mut bbox = BBox::EMPTY;
    for conn in &net.connections {
        if let Some(pos) = placement.node_pos(NetNode::from(conn.endpoint)) {
            bbox.expand(pos);
        }
    }
    bbox.half_perimeter()
}

/// Total HPWL over all nets of the design.
pub fn total_hpwl(db: &LogicalDb, placement: &Placement) -> f64 {
    db.nets().map(|net| net_hpwl(net, placement)).sum()
}

/// HPWL restricted to the given nets (the move-delta evaluation).
pub fn hpwl_of_nets<'a>(
    db: &LogicalDb,
    placement: &Placement,
    nets: impl IntoIterator<Item = &'a NetId>,
) -> f64 {
    nets.into_iter()
        .filter_map(|id| db.net(*id))
        .map(|net| net_hpwl(net, placement))
        .sum()
}

/// The distinct nets an instance's pins touch, in ascending ID order.
pub fn nets_of_inst(db: &LogicalDb, inst: InstId) -> BTreeSet<NetId> {
    db.cell(inst)
        .pins
        .values()
        .filter(|n| !n.is_none())
        .copied()
        .collect()
}
