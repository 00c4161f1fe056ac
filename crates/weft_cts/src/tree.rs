//! The JSON-serializable clock tree.

use serde::{Deserialize, Serialize};

/// One node of the synthesized clock tree.
///
/// Leaf nodes carry sinks; internal nodes carry children. A node whose
/// `buffer` is `None` is *virtual*: no physical buffer could be claimed and
/// its subtree is driven by the parent net directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockTreeNode {
    /// Recursion depth, root = 0.
    pub level: u32,
    /// The claimed buffer site name, or `None` for a virtual node.
    pub buffer: Option<String>,
    /// The claimed buffer position `[x, y]` in microns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_pos: Option<(f64, f64)>,
    /// The claimed buffer's cell type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_type: Option<String>,
    /// Centroid `[x, y]` of the sinks below this node, in microns.
    pub centroid: (f64, f64),
    /// Fabric site names of the sinks connected at this node (leaves only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sinks: Vec<String>,
    /// Logical instance names of the same sinks, index-aligned with `sinks`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sink_logical_names: Vec<String>,
    /// Child nodes (internal nodes only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ClockTreeNode>,
}

impl ClockTreeNode {
    /// The deepest level in this subtree.
    pub fn max_depth(&self) -> u32 {
        self.children
            .iter()
            .map(ClockTreeNode::max_depth)
            .max()
            .unwrap_or(self.level)
    }

    /// Total sinks in this subtree.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
            + self
                .children
                .iter()
                .map(ClockTreeNode::sink_count)
                .sum::<usize>()
    }

    /// Total nodes (this one included).
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ClockTreeNode::node_count)
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(level: u32, sinks: &[&str]) -> ClockTreeNode {
        ClockTreeNode {
            level,
            buffer: Some(format!("B{level}")),
            buffer_pos: Some((1.0, 2.0)),
            buffer_type: Some("buf_4".into()),
            centroid: (1.0, 2.0),
            sinks: sinks.iter().map(|s| s.to_string()).collect(),
            sink_logical_names: sinks.iter().map(|s| format!("$l_{s}")).collect(),
            children: Vec::new(),
        }
    }

    #[test]
    fn depth_and_counts() {
        let root = ClockTreeNode {
            level: 0,
            buffer: Some("B0".into()),
            buffer_pos: Some((5.0, 5.0)),
            buffer_type: Some("clkbuf_4".into()),
            centroid: (5.0, 5.0),
            sinks: Vec::new(),
            sink_logical_names: Vec::new(),
            children: vec![leaf(1, &["s0", "s1"]), leaf(1, &["s2"])],
        };
        assert_eq!(root.max_depth(), 1);
        assert_eq!(root.sink_count(), 3);
        assert_eq!(root.node_count(), 3);
    }

    #[test]
    fn json_omits_empty_sections() {
        let node = leaf(0, &[]);
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("sinks"));
        assert!(!json.contains("children"));
        let restored: ClockTreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.level, 0);
    }

    #[test]
    fn virtual_node_serializes_null_buffer() {
        let node = ClockTreeNode {
            level: 2,
            buffer: None,
            buffer_pos: None,
            buffer_type: None,
            centroid: (3.0, 4.0),
            sinks: vec!["s0".into()],
            sink_logical_names: vec!["f0".into()],
            children: Vec::new(),
        };
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"buffer\":null"));
    }
}
