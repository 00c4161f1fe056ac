//! Opaque ID newtypes for flow entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Ord`, `Hash`, and
//! `Serialize`/`Deserialize`. These IDs reference fabric sites, tiles,
//! logical instances, nets, top-level ports, and interned cell types.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a fabric site (a fixed-type placement seat).
    SiteId
);

define_id!(
    /// Opaque, copyable ID for a fabric tile (a rectangular group of sites).
    TileId
);

define_id!(
    /// Opaque, copyable ID for a logical instance in the design netlist.
    InstId
);

define_id!(
    /// Opaque, copyable ID for a top-level port of the design.
    PortId
);

define_id!(
    /// Opaque, copyable ID for an interned cell-type name.
    CellTypeId
);

/// Opaque ID for a net.
///
/// Unlike the other IDs, net IDs are not dense: they carry the bit indices
/// assigned by the synthesis tool, and new nets created by CTS/ECO continue
/// from the maximum existing ID. ID 0 is reserved and means "no net".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NetId(u32);

impl NetId {
    /// The reserved "no net" ID.
    pub const NONE: NetId = NetId(0);

    /// Creates a net ID from a raw `u32` value.
    pub fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw `u32` value.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns `true` if this is the reserved "no net" ID.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}
