//! Human-readable power-down report.

use crate::eco::EcoOutcome;
use std::fmt::Write;
use weft_liberty::TieState;

/// Formats the ECO outcome as the `eco_report.txt` content.
pub fn format_report(outcome: &EcoOutcome) -> String {
    let stats = &outcome.stats;
    let mut out = String::new();
    let rule = "=".repeat(70);

    writeln!(out, "{rule}").unwrap();
    writeln!(out, "POWER-DOWN ECO REPORT").unwrap();
    writeln!(out, "{rule}").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "Candidate sites:      {}", stats.candidate_count).unwrap();
    writeln!(out, "Tiles processed:      {}", stats.tiles_processed).unwrap();
    writeln!(out, "Tiles skipped:        {}", stats.tiles_skipped).unwrap();
    writeln!(out, "Unknown cell types:   {}", stats.unknown_cells).unwrap();
    writeln!(out, "Cells tied:           {}", stats.total_cells_tied).unwrap();
    writeln!(out, "Pins tied:            {}", stats.total_pins_tied).unwrap();
    writeln!(
        out,
        "Tie polarity:         {} HI / {} LO / {} mixed",
        stats.cells_tied_hi, stats.cells_tied_lo, stats.cells_tied_mixed
    )
    .unwrap();
    writeln!(
        out,
        "Average leakage saving: {:.1}% over {} cells",
        stats.average_savings() * 100.0,
        stats.cells_with_savings
    )
    .unwrap();

    if !outcome.tied.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "{:<32} {:<32} {}", "Cell", "Type", "Input ties").unwrap();
        writeln!(out, "{}", "-".repeat(70)).unwrap();
        for cell in &outcome.tied {
            let ties = cell
                .ties
                .iter()
                .map(|(pin, tie)| {
                    let dir = match tie {
                        TieState::Hi => "HI",
                        TieState::Lo => "LO",
                    };
                    format!("{pin}={dir}")
                })
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "{:<32} {:<32} {}", cell.name, cell.cell_type, ties).unwrap();
        }
    }

    writeln!(out, "{rule}").unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eco::{EcoStats, TiedCell};

    #[test]
    fn report_lists_cells_and_summary() {
        let outcome = EcoOutcome {
            stats: EcoStats {
                candidate_count: 2,
                tiles_processed: 1,
                total_cells_tied: 1,
                total_pins_tied: 2,
                cells_tied_lo: 1,
                savings_sum: 0.5,
                cells_with_savings: 1,
                ..EcoStats::default()
            },
            tied: vec![TiedCell {
                name: "T0_0_R0_NAND2_1".into(),
                cell_type: "sky130_fd_sc_hd__nand2_2".into(),
                tile: "T0_0".into(),
                ties: vec![
                    ("A".into(), TieState::Lo),
                    ("B".into(), TieState::Lo),
                ],
            }],
        };
        let report = format_report(&outcome);
        assert!(report.contains("POWER-DOWN ECO REPORT"));
        assert!(report.contains("Cells tied:           1"));
        assert!(report.contains("A=LO, B=LO"));
        assert!(report.contains("50.0%"));
    }

    #[test]
    fn empty_outcome_renders() {
        let report = format_report(&EcoOutcome::default());
        assert!(report.contains("Cells tied:           0"));
    }
}
