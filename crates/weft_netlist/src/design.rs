//! The logical design database: cells, nets and ports.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use weft_common::{CellTypeId, Direction, InstId, InternalError, NetId, PortId, WeftResult};

/// A logical cell instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// The unique ID of this instance.
    pub id: InstId,
    /// The instance name from the synthesis netlist.
    pub name: String,
    /// The interned master cell type.
    pub cell_type: CellTypeId,
    /// Pin → net bindings. [`NetId::NONE`] marks a disconnected pin.
    /// `BTreeMap` keeps pin iteration deterministic.
    pub pins: BTreeMap<String, NetId>,
}

/// One endpoint of a net: either a cell pin or a top-level port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Endpoint {
    /// A logical instance.
    Inst(InstId),
    /// A top-level port.
    Port(PortId),
}

/// A `(endpoint, pin name)` entry in a net's connection closure.
///
/// Port endpoints carry the pseudo pin name `"PORT"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// The connected instance or port.
    pub endpoint: Endpoint,
    /// The pin name on the endpoint.
    pub pin: String,
}

/// The pseudo pin name used for port endpoints in net closures.
pub const PORT_PIN: &str = "PORT";

/// A net with its connection closure.
///
/// Invariant: `connections` is exactly the set of cell pins whose binding is
/// this net's ID, plus one entry per top-level port on this net.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Net {
    /// The unique ID of this net.
    pub id: NetId,
    /// Human-readable net name.
    pub name: String,
    /// The connection closure.
    pub connections: Vec<Connection>,
}

/// A top-level port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// The unique ID of this port.
    pub id: PortId,
    /// Port name.
    pub name: String,
    /// Signal direction.
    pub direction: Direction,
    /// The net realizing this port.
    pub net: NetId,
}

/// The logical design database.
///
/// Read-only through the greedy and annealing stages; rewritten in place by
/// CTS and the power-down ECO. All mutation goes through methods that keep
/// the net-closure invariant intact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogicalDb {
    /// Name of the top module the design was loaded from.
    pub top_module: String,
    cells: Vec<Cell>,
    nets: BTreeMap<NetId, Net>,
    ports: Vec<Port>,
    #[serde(skip)]
    cell_by_name: HashMap<String, InstId>,
    #[serde(skip)]
    cells_by_type: HashMap<CellTypeId, Vec<InstId>>,
    #[serde(skip)]
    port_by_name: HashMap<String, PortId>,
}

impl LogicalDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the name and type indexes (needed after deserialization).
    pub fn rebuild_indices(&mut self) {
        self.cell_by_name.clear();
        self.cells_by_type.clear();
        for cell in &self.cells {
            self.cell_by_name.insert(cell.name.clone(), cell.id);
            self.cells_by_type
                .entry(cell.cell_type)
                .or_default()
                .push(cell.id);
        }
        self.port_by_name.clear();
        for port in &self.ports {
            self.port_by_name.insert(port.name.clone(), port.id);
        }
    }

    /// Adds a cell instance and registers its pins in the net closures.
    ///
    /// Pins bound to [`NetId::NONE`] are recorded on the cell but produce no
    /// connection entries.
    pub fn add_cell(
        &mut self,
        name: impl Into<String>,
        cell_type: CellTypeId,
        pins: impl IntoIterator<Item = (String, NetId)>,
    ) -> InstId {
        let id = InstId::from_raw(self.cells.len() as u32);
        let name = name.into();
        let pins: BTreeMap<String, NetId> = pins.into_iter().collect();
        for (pin, &net) in &pins {
            if !net.is_none() {
                self.ensure_net(net).connections.push(Connection {
                    endpoint: Endpoint::Inst(id),
                    pin: pin.clone(),
                });
            }
        }
        self.cell_by_name.insert(name.clone(), id);
        self.cells_by_type.entry(cell_type).or_default().push(id);
        self.cells.push(Cell {
            id,
            name,
            cell_type,
            pins,
        });
        id
    }

    /// Adds a top-level port on `net`, creating the net if needed.
    ///
    /// A freshly created net takes the port's name.
    pub fn add_port(
        &mut self,
        name: impl Into<String>,
        direction: Direction,
        net: NetId,
    ) -> PortId {
        let id = PortId::from_raw(self.ports.len() as u32);
        let name = name.into();
        let entry = self.nets.entry(net).or_insert_with(|| Net {
            id: net,
            name: name.clone(),
            connections: Vec::new(),
        });
        entry.connections.push(Connection {
            endpoint: Endpoint::Port(id),
            pin: PORT_PIN.to_string(),
        });
        self.port_by_name.insert(name.clone(), id);
        self.ports.push(Port {
            id,
            name,
            direction,
            net,
        });
        id
    }

    /// Returns the net for `id`, creating an empty `net_<id>` if absent.
    pub fn ensure_net(&mut self, id: NetId) -> &mut Net {
        self.nets.entry(id).or_insert_with(|| Net {
            id,
            name: format!("net_{}", id.as_raw()),
            connections: Vec::new(),
        })
    }

    /// Allocates a fresh net above every existing ID.
    pub fn alloc_net(&mut self, name: impl Into<String>) -> NetId {
        let id = NetId::from_raw(self.max_net_id().as_raw() + 1);
        self.nets.insert(
            id,
            Net {
                id,
                name: name.into(),
                connections: Vec::new(),
            },
        );
        id
    }

    /// The highest net ID in use ([`NetId::NONE`] for an empty design).
    pub fn max_net_id(&self) -> NetId {
        self.nets.keys().next_back().copied().unwrap_or(NetId::NONE)
    }

    /// Binds `pin` of `inst` to `net`, maintaining both closures.
    ///
    /// Any previous binding of the pin is removed from its net first.
    pub fn connect_pin(&mut self, inst: InstId, pin: &str, net: NetId) {
        self.disconnect_pin(inst, pin);
        if net.is_none() {
            return;
        }
        self.cells[inst.as_raw() as usize]
            .pins
            .insert(pin.to_string(), net);
        self.ensure_net(net).connections.push(Connection {
            endpoint: Endpoint::Inst(inst),
            pin: pin.to_string(),
        });
    }

    /// Unbinds `pin` of `inst`, removing its closure entry.
    ///
    /// The pin stays on the cell, bound to [`NetId::NONE`].
    pub fn disconnect_pin(&mut self, inst: InstId, pin: &str) {
        let cell = &mut self.cells[inst.as_raw() as usize];
        let old = cell.pins.insert(pin.to_string(), NetId::NONE);
        if let Some(old) = old.filter(|n| !n.is_none()) {
            if let Some(net) = self.nets.get_mut(&old) {
                net.connections.retain(|c| {
                    !(c.endpoint == Endpoint::Inst(inst) && c.pin == pin)
                });
            }
        }
    }

    /// Strips every cell connection from `net`, leaving only port entries.
    ///
    /// Each removed pin is cleared on its cell. Returns the removed
    /// `(instance, pin)` pairs, in closure order.
    pub fn detach_net_cells(&mut self, net: NetId) -> Vec<(InstId, String)> {
        let Some(n) = self.nets.get_mut(&net) else {
            return Vec::new();
        };
        let mut removed = Vec::new();
        n.connections.retain(|c| match c.endpoint {
            Endpoint::Inst(inst) => {
                removed.push((inst, c.pin.clone()));
                false
            }
            Endpoint::Port(_) => true,
        });
        for (inst, pin) in &removed {
            self.cells[inst.as_raw() as usize]
                .pins
                .insert(pin.clone(), NetId::NONE);
        }
        removed
    }

    /// Returns the cell with the given ID.
    pub fn cell(&self, id: InstId) -> &Cell {
        &self.cells[id.as_raw() as usize]
    }

    /// Iterates all cells in ID order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// Number of cell instances.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Looks up a cell by name.
    pub fn cell_by_name(&self, name: &str) -> Option<&Cell> {
        self.cell_by_name.get(name).map(|&id| self.cell(id))
    }

    /// Iterates the instance IDs of the given cell type.
    pub fn cells_of_type(&self, ty: CellTypeId) -> impl Iterator<Item = InstId> + '_ {
        self.cells_by_type.get(&ty).into_iter().flatten().copied()
    }

    /// Number of instances of the given cell type.
    pub fn cell_count_of_type(&self, ty: CellTypeId) -> usize {
        self.cells_by_type.get(&ty).map_or(0, |v| v.len())
    }

    /// Returns the net with the given ID, if present.
    pub fn net(&self, id: NetId) -> Option<&Net> {
        self.nets.get(&id)
    }

    /// Returns the net mutably, if present.
    pub fn net_mut(&mut self, id: NetId) -> Option<&mut Net> {
        self.nets.get_mut(&id)
    }

    /// Iterates all nets in ascending ID order.
    pub fn nets(&self) -> impl Iterator<Item = &Net> {
        self.nets.values()
    }

    /// Number of nets.
    pub fn net_count(&self) -> usize {
        self.nets.len()
    }

    /// Returns the port with the given ID.
    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id.as_raw() as usize]
    }

    /// Iterates all ports in declaration order.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.iter()
    }

    /// Looks up a port by name.
    pub fn port_by_name(&self, name: &str) -> Option<&Port> {
        self.port_by_name.get(name).map(|&id| self.port(id))
    }

    /// Iterates the input ports.
    pub fn input_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == Direction::Input)
    }

    /// Iterates the output ports.
    pub fn output_ports(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == Direction::Output)
    }

    /// Checks the net-closure invariant over the whole database.
    ///
    /// For every net, the cell entries of `connections` must be exactly the
    /// pins bound to the net, and every port entry must match the port's
    /// `net` field.
    pub fn verify_net_closure(&self) -> WeftResult<()> {
        for net in self.nets.values() {
            for conn in &net.connections {
                match conn.endpoint {
                    Endpoint::Inst(inst) => {
                        let cell = self.cell(inst);
                        if cell.pins.get(&conn.pin) != Some(&net.id) {
                            return Err(InternalError::new(format!(
                                "net {} lists {}.{} but the pin is not bound to it",
                                net.id.as_raw(),
                                cell.name,
                                conn.pin
                            )));
                        }
                    }
                    Endpoint::Port(pid) => {
                        if self.port(pid).net != net.id {
                            return Err(InternalError::new(format!(
                                "net {} lists port {} but the port is on net {}",
                                net.id.as_raw(),
                                self.port(pid).name,
                                self.port(pid).net.as_raw()
                            )));
                        }
                    }
                }
            }
        }
        for cell in &self.cells {
            for (pin, &net) in &cell.pins {
                if net.is_none() {
                    continue;
                }
                let listed = self.nets.get(&net).is_some_and(|n| {
                    n.connections
                        .iter()
                        .any(|c| c.endpoint == Endpoint::Inst(cell.id) && &c.pin == pin)
                });
                if !listed {
                    return Err(InternalError::new(format!(
                        "pin {}.{} bound to net {} but missing from its closure",
                        cell.name,
                        pin,
                        net.as_raw()
                    )));
                }
            }
        }
        Ok(())
    }
}
