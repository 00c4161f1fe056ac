//! Cell-type interning and name-based classification.
//!
//! The fabric and the logical netlist both refer to standard-cell masters by
//! name (e.g. `sky130_fd_sc_hd__nand2_2`). A single [`TypeTable`] interns
//! those names once so that placement-compatibility checks are integer
//! comparisons. Classification of a type (flip-flop, buffer, tie cell, …) is
//! by substring of the lowercased master name, matching the library naming
//! conventions the fabric is generated from.

use crate::ids::CellTypeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interning table for cell-type names.
///
/// Built by the fabric loader and extended by the netlist loader; both store
/// only [`CellTypeId`] afterwards. IDs are dense and stable for the life of
/// the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTable {
    names: Vec<String>,
    #[serde(skip)]
    by_name: HashMap<String, CellTypeId>,
}

impl TypeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `name`, returning the existing ID if already present.
    pub fn intern(&mut self, name: &str) -> CellTypeId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = CellTypeId::from_raw(self.names.len() as u32);
        self.names.push(name.to_string());
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Looks up an already-interned name.
    pub fn get(&self, name: &str) -> Option<CellTypeId> {
        self.by_name.get(name).copied()
    }

    /// Returns the name for an ID.
    ///
    /// # Panics
    /// Panics if the ID did not come from this table.
    pub fn name(&self, id: CellTypeId) -> &str {
        &self.names[id.as_raw() as usize]
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no type has been interned.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates `(id, name)` pairs in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (CellTypeId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, n)| (CellTypeId::from_raw(i as u32), n.as_str()))
    }

    /// Rebuilds the name index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.by_name.clear();
        for (i, n) in self.names.iter().enumerate() {
            self.by_name
                .insert(n.clone(), CellTypeId::from_raw(i as u32));
        }
    }
}

/// Macro cell types excluded from power-down candidacy.
const MACRO_PATTERNS: &[&str] = &["dfbbp", "sram", "regfile", "dffram", "fifo"];

/// Infrastructure cell types excluded from power-down candidacy.
const INFRA_PATTERNS: &[&str] = &[
    "tap", "decap", "conb", "fill", "diode", "antenna", "endcap", "welltap",
];

fn contains_any(name: &str, patterns: &[&str]) -> bool {
    let lower = name.to_ascii_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

/// Returns `true` if `name` is a flip-flop master (a clock sink for CTS).
pub fn is_dff(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.contains("dff") || lower.contains("dfbbp")
}

/// Returns `true` if `name` is a buffer master (preferred CTS resource).
pub fn is_buffer(name: &str) -> bool {
    name.to_ascii_lowercase().contains("buf")
}

/// Returns `true` if `name` is an inverter master (fallback CTS resource).
pub fn is_inverter(name: &str) -> bool {
    name.to_ascii_lowercase().contains("inv")
}

/// Returns `true` if `name` is a tie cell (CONB, constant HI/LO driver).
pub fn is_tie(name: &str) -> bool {
    name.to_ascii_lowercase().contains("conb")
}

/// Returns `true` if `name` is a tap master.
pub fn is_tap(name: &str) -> bool {
    name.to_ascii_lowercase().contains("tap")
}

/// Returns `true` if `name` is a macro excluded from power-down.
pub fn is_macro(name: &str) -> bool {
    contains_any(name, MACRO_PATTERNS)
}

/// Returns `true` if `name` is fabric infrastructure excluded from power-down.
pub fn is_infrastructure(name: &str) -> bool {
    contains_any(name, INFRA_PATTERNS)
}
