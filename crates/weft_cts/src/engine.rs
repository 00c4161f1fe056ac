//! The H-tree builder and netlist rewrite.

use crate::error::CtsError;
use crate::tree::ClockTreeNode;
use weft_common::{celltype, InstId, NetId, Point, SiteId, TypeTable};
use weft_diagnostics::DiagnosticSink;
use weft_fabric::FabricDb;
use weft_netlist::{LogicalDb, NetGraph};
use weft_place::Placement;

const STAGE: &str = "cts";

/// Sink count at or below which a node becomes a leaf.
const MAX_SINKS_PER_LEAF: usize = 4;

/// Recursion depth cap.
const MAX_LEVEL: u32 = 8;

/// CTS inputs beyond the shared databases.
#[derive(Debug, Clone, Default)]
pub struct CtsOptions {
    /// Clock port name; auto-detected (first port matching /clk/i) if unset.
    pub clock_port: Option<String>,
}

/// What a CTS run did.
#[derive(Debug, Clone, Default)]
pub struct CtsOutcome {
    /// The synthesized tree, or `None` when there was nothing to do.
    pub tree: Option<ClockTreeNode>,
    /// The resolved clock port name.
    pub clock_port: Option<String>,
    /// The clock net that was rewritten.
    pub clock_net: Option<NetId>,
    /// Clock sinks found on the clock net.
    pub sink_count: usize,
    /// Free buffer/inverter sites available before building.
    pub resource_count: usize,
    /// Buffer sites claimed by the tree.
    pub claimed_count: usize,
    /// Nodes that could not claim a physical buffer.
    pub virtual_count: usize,
}

impl CtsOutcome {
    /// The deepest tree level, or 0 without a tree.
    pub fn max_depth(&self) -> u32 {
        self.tree.as_ref().map_or(0, ClockTreeNode::max_depth)
    }
}

struct SinkInfo {
    inst: InstId,
    site_name: String,
    logical_name: String,
    clock_pin: String,
    pos: Point,
}

struct Resource {
    site: SiteId,
    pos: Point,
    is_buffer: bool,
    claimed: bool,
}

struct RawNode {
    level: u32,
    centroid: Point,
    resource: Option<usize>,
    sink_idx: Vec<usize>,
    children: Vec<RawNode>,
}

/// Runs clock-tree synthesis, rewriting the logical database, the netlist
/// graph and the placement in place.
///
/// Sinks are the placed flip-flops whose clock pin is currently attached to
/// the clock net; with none (including after a previous CTS run) the call is
/// a no-op. Resource exhaustion degrades nodes to virtual with a warning.
pub fn run_cts(
    fabric: &FabricDb,
    types: &TypeTable,
    db: &mut LogicalDb,
    graph: &mut NetGraph,
    placement: &mut Placement,
    options: &CtsOptions,
    sink: &DiagnosticSink,
) -> Result<CtsOutcome, CtsError> {
    let Some(clock_port) = resolve_clock_port(db, options)? else {
        sink.warn(STAGE, "no clock port found, skipping CTS");
        return Ok(CtsOutcome::default());
    };
    let port = db.port_by_name(&clock_port).expect("resolved port exists");
    let clock_net = port.net;

    let sinks = find_sinks(types, fabric, db, placement, clock_net);
    let mut outcome = CtsOutcome {
        clock_port: Some(clock_port.clone()),
        clock_net: Some(clock_net),
        sink_count: sinks.len(),
        ..CtsOutcome::default()
    };
    if sinks.is_empty() {
        sink.note(STAGE, "no sinks on the clock net, nothing to do");
        return Ok(outcome);
    }

    let mut pool = find_resources(types, fabric, placement);
    outcome.resource_count = pool.len();
    if pool.is_empty() {
        sink.warn(STAGE, "no free buffer or inverter sites, tree will be virtual");
    }

    let all_idx: Vec<usize> = (0..sinks.len()).collect();
    let mut virtual_count = 0usize;
    let root = build(&mut pool, &sinks, all_idx, 0, sink, &mut virtual_count);
    outcome.virtual_count = virtual_count;
    outcome.claimed_count = pool.iter().filter(|r| r.claimed).count();

    // Rewrite: strip the old clock net down to the port entry, then wire the
    // tree top-down with fresh nets.
    db.detach_net_cells(clock_net);
    graph.remove_net(clock_net);

    let mut new_nets: Vec<NetId> = Vec::new();
    wire(
        fabric,
        db,
        placement,
        &root,
        clock_net,
        &sinks,
        &pool,
        &mut new_nets,
    );

    if let Some(net) = db.net(clock_net) {
        graph.add_net_clique(net);
    }
    for id in &new_nets {
        if let Some(net) = db.net(*id) {
            graph.add_net_clique(net);
        }
    }

    let tree = to_tree(&root, &sinks, &pool, fabric, types);
    sink.note(
        STAGE,
        format!(
            "clock tree: {} sinks, {} claimed buffers, {} virtual nodes, depth {}",
            outcome.sink_count,
            outcome.claimed_count,
            outcome.virtual_count,
            tree.max_depth()
        ),
    );
    outcome.tree = Some(tree);
    Ok(outcome)
}

/// Resolves the clock port: explicit name (hard error if absent), else the
/// first port whose name contains `clk` case-insensitively.
fn resolve_clock_port(db: &LogicalDb, options: &CtsOptions) -> Result<Option<String>, CtsError> {
    if let Some(name) = &options.clock_port {
        return match db.port_by_name(name) {
            Some(p) => Ok(Some(p.name.clone())),
            None => Err(CtsError::UnknownClockPort { port: name.clone() }),
        };
    }
    Ok(db
        .ports()
        .find(|p| p.name.to_ascii_lowercase().contains("clk"))
        .map(|p| p.name.clone()))
}

/// The placed flip-flops whose clock pin is attached to `clock_net`.
fn find_sinks(
    types: &TypeTable,
    fabric: &FabricDb,
    db: &LogicalDb,
    placement: &Placement,
    clock_net: NetId,
) -> Vec<SinkInfo> {
    let mut sinks: Vec<SinkInfo> = Vec::new();
    for cell in db.cells() {
        if !celltype::is_dff(types.name(cell.cell_type)) {
            continue;
        }
        let Some(placed) = placement.site_of(cell.id) else {
            continue;
        };
        let clock_pin = if cell.pins.contains_key("C") {
            "C"
        } else if cell.pins.contains_key("CLK") {
            "CLK"
        } else {
            continue;
        };
        if cell.pins[clock_pin] != clock_net {
            continue;
        }
        sinks.push(SinkInfo {
            inst: cell.id,
            site_name: fabric.site(placed.site).name.clone(),
            logical_name: cell.name.clone(),
            clock_pin: clock_pin.to_string(),
            pos: placed.pos,
        });
    }
    sinks
}

/// Free buffer and inverter sites, in ascending site ID.
fn find_resources(types: &TypeTable, fabric: &FabricDb, placement: &Placement) -> Vec<Resource> {
    fabric
        .sites()
        .filter(|s| placement.is_free(s.id))
        .filter_map(|s| {
            let name = types.name(s.cell_type);
            let is_buffer = celltype::is_buffer(name);
            if is_buffer || celltype::is_inverter(name) {
                Some(Resource {
                    site: s.id,
                    pos: s.pos,
                    is_buffer,
                    claimed: false,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Claims the nearest unclaimed buffer to `p`, falling back to inverters.
fn claim_nearest(pool: &mut [Resource], p: Point) -> Option<usize> {
    for buffers_only in [true, false] {
        let mut best: Option<(usize, f64)> = None;
        for (i, r) in pool.iter().enumerate() {
            if r.claimed || (buffers_only && !r.is_buffer) {
                continue;
            }
            let dist = r.pos.distance(p);
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        if let Some((i, _)) = best {
            pool[i].claimed = true;
            return Some(i);
        }
    }
    None
}

fn centroid(sinks: &[SinkInfo], idx: &[usize]) -> Point {
    let mut sum = Point::new(0.0, 0.0);
    for &i in idx {
        sum.x += sinks[i].pos.x;
        sum.y += sinks[i].pos.y;
    }
    let n = idx.len().max(1) as f64;
    Point::new(sum.x / n, sum.y / n)
}

/// Recursive quadrant builder.
fn build(
    pool: &mut [Resource],
    sinks: &[SinkInfo],
    idx: Vec<usize>,
    level: u32,
    sink: &DiagnosticSink,
    virtual_count: &mut usize,
) -> RawNode {
    let c = centroid(sinks, &idx);
    let resource = claim_nearest(pool, c);
    if resource.is_none() {
        *virtual_count += 1;
        sink.warn(
            STAGE,
            format!(
                "no buffer available near ({:.2}, {:.2}) for {} sinks, node is virtual",
                c.x,
                c.y,
                idx.len()
            ),
        );
    }

    if idx.len() <= MAX_SINKS_PER_LEAF || level > MAX_LEVEL {
        return RawNode {
            level,
            centroid: c,
            resource,
            sink_idx: idx,
            children: Vec::new(),
        };
    }

    // Quadrants around the centroid; axis ties go to the positive side.
    let mut quadrants: [Vec<usize>; 4] = Default::default();
    for &i in &idx {
        let dx = sinks[i].pos.x - c.x;
        let dy = sinks[i].pos.y - c.y;
        let q = if dx >= 0.0 && dy >= 0.0 {
            0 // NE
        } else if dx < 0.0 && dy >= 0.0 {
            1 // NW
        } else if dx < 0.0 && dy < 0.0 {
            2 // SW
        } else {
            3 // SE
        };
        quadrants[q].push(i);
    }

    let mut children = Vec::new();
    for quad in quadrants {
        if quad.is_empty() {
            continue;
        }
        children.push(build(pool, sinks, quad, level + 1, sink, virtual_count));
    }
    RawNode {
        level,
        centroid: c,
        resource,
        sink_idx: Vec::new(),
        children,
    }
}

/// Wires the tree into the logical database, pre-order.
#[allow(clippy::too_many_arguments)]
fn wire(
    fabric: &FabricDb,
    db: &mut LogicalDb,
    placement: &mut Placement,
    node: &RawNode,
    parent_net: NetId,
    sinks: &[SinkInfo],
    pool: &[Resource],
    new_nets: &mut Vec<NetId>,
) {
    let driver_net = match node.resource {
        Some(r) => {
            let site = fabric.site(pool[r].site);
            let next = db.max_net_id().as_raw() + 1;
            let out = db.alloc_net(format!("cts_net_{next}"));
            let inst = db.add_cell(
                format!("{}_CLK", site.name),
                site.cell_type,
                vec![("A".to_string(), parent_net), ("Y".to_string(), out)],
            );
            placement
                .place(inst, site)
                .expect("claimed site was free");
            new_nets.push(out);
            out
        }
        // Virtual node: the subtree hangs off the parent net directly.
        None => parent_net,
    };

    for &i in &node.sink_idx {
        db.connect_pin(sinks[i].inst, &sinks[i].clock_pin, driver_net);
    }
    for child in &node.children {
        wire(fabric, db, placement, child, driver_net, sinks, pool, new_nets);
    }
}

fn to_tree(
    node: &RawNode,
    sinks: &[SinkInfo],
    pool: &[Resource],
    fabric: &FabricDb,
    types: &TypeTable,
) -> ClockTreeNode {
    let (buffer, buffer_pos, buffer_type) = match node.resource {
        Some(r) => {
            let site = fabric.site(pool[r].site);
            (
                Some(site.name.clone()),
                Some((site.pos.x, site.pos.y)),
                Some(types.name(site.cell_type).to_string()),
            )
        }
        None => (None, None, None),
    };
    ClockTreeNode {
        level: node.level,
        buffer,
        buffer_pos,
        buffer_type,
        centroid: (node.centroid.x, node.centroid.y),
        sinks: node
            .sink_idx
            .iter()
            .map(|&i| sinks[i].site_name.clone())
            .collect(),
        sink_logical_names: node
            .sink_idx
            .iter()
            .map(|&i| sinks[i].logical_name.clone())
            .collect(),
        children: node
            .children
            .iter()
            .map(|c| to_tree(c, sinks, pool, fabric, types))
            .collect(),
    }
}
