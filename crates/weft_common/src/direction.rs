//! Signal direction, shared by fabric pins, netlist ports and the emitters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a top-level port or pad pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Signal enters the design.
    Input,
    /// Signal leaves the design.
    Output,
    /// Bidirectional signal.
    Inout,
}

impl Direction {
    /// The DEF `DIRECTION` keyword for this direction.
    pub fn def_keyword(self) -> &'static str {
        match self {
            Direction::Input => "INPUT",
            Direction::Output => "OUTPUT",
            Direction::Inout => "INOUT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
            Direction::Inout => write!(f, "inout"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn def_keywords() {
        assert_eq!(Direction::Input.def_keyword(), "INPUT");
        assert_eq!(Direction::Output.def_keyword(), "OUTPUT");
        assert_eq!(Direction::Inout.def_keyword(), "INOUT");
    }

    #[test]
    fn serde_lowercase() {
        let d: Direction = serde_json::from_str("\"input\"").unwrap();
        assert_eq!(d, Direction::Input);
        assert_eq!(serde_json::to_string(&Direction::Output).unwrap(), "\"output\"");
    }

    #[test]
    fn display() {
        assert_eq!(Direction::Inout.to_string(), "inout");
    }
}
