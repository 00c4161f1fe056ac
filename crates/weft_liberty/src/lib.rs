//! Liberty leakage-power parsing for the power-down ECO.
//!
//! Only `cell (<name>) { leakage_power { value; when; } }` stanzas are
//! consumed. For each cell the minimum-leakage `when` condition is decoded
//! into per-input tie states: a literal `A` means A is tied high in the
//! minimum state, `!A` means tied low.

#![warn(missing_docs)]

pub mod db;
pub mod error;
pub mod parser;

pub use db::{CellLeakage, LeakageDb, TieState, TieSummary};
pub use error::LibertyError;
pub use parser::{parse_liberty, parse_liberty_str};

/// Name-based fallback tie polarity when Liberty data is unavailable.
///
/// All combinational families tie low; low is also the conservative default
/// for unrecognized masters.
pub fn heuristic_tie(_cell_type: &str) -> TieState {
    TieState::Lo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_is_low_everywhere() {
        assert_eq!(heuristic_tie("sky130_fd_sc_hd__and2_2"), TieState::Lo);
        assert_eq!(heuristic_tie("sky130_fd_sc_hd__nand2_2"), TieState::Lo);
        assert_eq!(heuristic_tie("unknown_master"), TieState::Lo);
    }
}
