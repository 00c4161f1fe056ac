//! 2-D geometry primitives.
//!
//! All coordinates are in microns unless a function name says otherwise.
//! DEF database-unit conversion lives with the DEF emitter, not here.

use serde::{Deserialize, Serialize};

/// A point in the die plane, in microns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate in microns.
    pub x: f64,
    /// Y coordinate in microns.
    pub y: f64,
}

impl Point {
    /// Creates a point from micron coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Chebyshev (L∞) distance to another point.
    pub fn chebyshev(self, other: Point) -> f64 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// An axis-aligned bounding box, in microns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Lower-left X.
    pub llx: f64,
    /// Lower-left Y.
    pub lly: f64,
    /// Upper-right X.
    pub urx: f64,
    /// Upper-right Y.
    pub ury: f64,
}

impl BBox {
    /// An empty box that any `expand` call will snap to its first point.
    pub const EMPTY: Self = Self {
        llx: f64::INFINITY,
        lly: f64::INFINITY,
        urx: f64::NEG_INFINITY,
        ury: f64::NEG_INFINITY,
    };

    /// Creates a box from its corners.
    pub fn new(llx: f64, lly: f64, urx: f64, ury: f64) -> Self {
        Self { llx, lly, urx, ury }
    }

    /// Returns `true` if no point has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.llx > self.urx
    }

    /// Grows the box to include `p`.
    pub fn expand(&mut self, p: Point) {
        self.llx = self.llx.min(p.x);
        self.lly = self.lly.min(p.y);
        self.urx = self.urx.max(p.x);
        self.ury = self.ury.max(p.y);
    }

    /// Box width, or 0 for an empty box.
    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.urx - self.llx
        }
    }

    /// Box height, or 0 for an empty box.
    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.ury - self.lly
        }
    }

    /// Half-perimeter `width + height`, the per-net HPWL term.
    pub fn half_perimeter(&self) -> f64 {
        self.width() + self.height()
    }

    /// Returns `true` if `p` lies inside or on the boundary.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.llx && p.x <= self.urx && p.y >= self.lly && p.y <= self.ury
    }
}

/// DEF placement orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orient {
    /// North (R0).
    #[default]
    N,
    /// South (R180).
    S,
    /// East (R270).
    E,
    /// West (R90).
    W,
    /// Flipped north (MY).
    FN,
    /// Flipped south (MX).
    FS,
    /// Flipped east (MX90).
    FE,
    /// Flipped west (MY90).
    FW,
}

impl Orient {
    /// The DEF keyword for this orientation.
    pub fn as_str(self) -> &'static str {
        match self {
            Orient::N => "N",
            Orient::S => "S",
            Orient::E => "E",
            Orient::W => "W",
            Orient::FN => "FN",
            Orient::FS => "FS",
            Orient::FE => "FE",
            Orient::FW => "FW",
        }
    }

    /// Parses a DEF orientation keyword. Unknown strings return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "N" => Some(Orient::N),
            "S" => Some(Orient::S),
            "E" => Some(Orient::E),
            "W" => Some(Orient::W),
            "FN" => Some(Orient::FN),
            "FS" => Some(Orient::FS),
            "FE" => Some(Orient::FE),
            "FW" => Some(Orient::FW),
            _ => None,
        }
    }
}
