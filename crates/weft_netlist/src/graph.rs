//! Undirected connectivity graph over the logical database.

use crate::design::{Endpoint, LogicalDb, Net};
use petgraph::graphmap::UnGraphMap;
use std::collections::BTreeSet;
use weft_common::{InstId, NetId, PortId};

/// A node of the connectivity graph: a cell instance or a top-level port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetNode {
    /// A logical instance.
    Inst(InstId),
    /// A top-level port.
    Port(PortId),
}

impl From<Endpoint> for NetNode {
    fn from(e: Endpoint) -> Self {
        match e {
            Endpoint::Inst(i) => NetNode::Inst(i),
            Endpoint::Port(p) => NetNode::Port(p),
        }
    }
}

/// The undirected netlist graph.
///
/// Every net with at least two endpoints contributes a clique over its
/// endpoints. Each edge carries the set of net IDs that induced it, so
/// removing a net removes exactly its contribution and drops edges that no
/// other net justifies.
#[derive(Debug, Default)]
pub struct NetGraph {
    graph: UnGraphMap<NetNode, BTreeSet<NetId>>,
}

impl NetGraph {
    /// Builds the graph from the current state of the logical database.
    pub fn build(db: &LogicalDb) -> Self {
        let mut g = Self::default();
        for net in db.nets() {
            g.add_net_clique(net);
        }
        g
    }

    /// Adds the clique induced by `net` (no-op for nets with < 2 endpoints).
    pub fn add_net_clique(&mut self, net: &Net) {
        let nodes: Vec<NetNode> = net
            .connections
            .iter()
            .map(|c| NetNode::from(c.endpoint))
            .collect();
        if nodes.len() < 2 {
            // Still register the lone endpoint so neighbor queries resolve.
            if let Some(&n) = nodes.first() {
                self.graph.add_node(n);
            }
            return;
        }
        for i in 0..nodes.len() {
            for j in (i + 1)..nodes.len() {
                if nodes[i] == nodes[j] {
                    continue;
                }
                match self.graph.edge_weight_mut(nodes[i], nodes[j]) {
                    Some(nets) => {
                        nets.insert(net.id);
                    }
                    None => {
                        let mut nets = BTreeSet::new();
                        nets.insert(net.id);
                        self.graph.add_edge(nodes[i], nodes[j], nets);
                    }
                }
            }
        }
    }

    /// Removes `net`'s contribution from every edge; edges left with an
    /// empty net set are deleted.
    pub fn remove_net(&mut self, net: NetId) {
        let mut empty: Vec<(NetNode, NetNode)> = Vec::new();
        for (a, b, nets) in self.graph.all_edges_mut() {
            if nets.remove(&net) && nets.is_empty() {
                empty.push((a, b));
            }
        }
        for (a, b) in empty {
            self.graph.remove_edge(a, b);
        }
    }

    /// Iterates the neighbors of `node` in deterministic (sorted) order.
    pub fn neighbors(&self, node: NetNode) -> Vec<NetNode> {
        let mut out: Vec<NetNode> = self.graph.neighbors(node).collect();
        out.sort();
        out
    }

    /// Returns `true` if the graph knows this node.
    pub fn contains_node(&self, node: NetNode) -> bool {
        self.graph.contains_node(node)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The net IDs carried by the edge between `a` and `b`, if any.
    pub fn edge_nets(&self, a: NetNode, b: NetNode) -> Option<&BTreeSet<NetId>> {
        self.graph.edge_weight(a, b)
    }
}
