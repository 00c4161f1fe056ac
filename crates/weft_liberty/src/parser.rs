//! Line-oriented scanner for Liberty `leakage_power` stanzas.
//!
//! Liberty libraries are hundreds of megabytes; this scanner extracts only
//! the three statements the flow needs (`cell (...)`, `value : ...`,
//! `when : "..."`) and ignores everything else.

use crate::db::{CellLeakage, LeakageDb, TieState, TieSummary};
use crate::error::LibertyError;
use std::collections::BTreeMap;
use std::path::Path;

/// Parses leakage data from a Liberty file on disk.
pub fn parse_liberty(path: &Path) -> Result<LeakageDb, LibertyError> {
    let content = std::fs::read_to_string(path).map_err(|source| LibertyError::Io {
        path: path.to_string_lossy().into_owned(),
        source,
    })?;
    parse_liberty_str(&content, path.to_string_lossy().as_ref())
}

/// Parses leakage data from Liberty text (`path` is used in errors only).
///
/// Returns [`LibertyError::MissingData`] when the text contains no usable
/// `leakage_power` stanza at all.
pub fn parse_liberty_str(content: &str, path: &str) -> Result<LeakageDb, LibertyError> {
    let mut states: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
    let mut current_cell: Option<String> = None;
    let mut current_value: Option<f64> = None;

    for raw in content.lines() {
        let line = raw.trim();

        if line.starts_with("cell ") || line.starts_with("cell(") {
            if let Some(name) = between(line, '(', ')') {
                let name = name.trim().trim_matches('"').to_string();
                states.entry(name.clone()).or_default();
                current_cell = Some(name);
                current_value = None;
            }
            continue;
        }

        if current_cell.is_some() && line.starts_with("value") {
            if let Some(v) = after_colon(line) {
                current_value = v.trim_end_matches(';').trim().parse::<f64>().ok();
            }
            continue;
        }

        if line.starts_with("when") {
            let (Some(cell), Some(value)) = (current_cell.as_ref(), current_value) else {
                continue;
            };
            if let Some(cond) = after_colon(line).and_then(|r| between(r, '"', '"')) {
                states
                    .get_mut(cell)
                    .expect("current cell registered")
                    .push((cond.to_string(), value));
                current_value = None;
            }
        }
    }

    let mut db = LeakageDb::new();
    for (cell, recorded) in states {
        if recorded.is_empty() {
            continue;
        }
        db.cells.insert(cell, analyze(&recorded));
    }

    if db.is_empty() {
        return Err(LibertyError::MissingData {
            path: path.to_string(),
        });
    }
    Ok(db)
}

/// Reduces the recorded `(when, value)` states of one cell.
fn analyze(states: &[(String, f64)]) -> CellLeakage {
    let (min_state, min_power) = states
        .iter()
        .min_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        })
        .map(|(s, v)| (s.clone(), *v))
        .expect("states checked non-empty");
    let avg_power = states.iter().map(|(_, v)| v).sum::<f64>() / states.len() as f64;
    let max_power = states
        .iter()
        .map(|(_, v)| *v)
        .fold(f64::NEG_INFINITY, f64::max);

    let (summary, input_ties) = ties_from_state(&min_state);
    CellLeakage {
        min_state,
        min_power,
        avg_power,
        max_power,
        summary,
        input_ties,
    }
}

/// Decodes a `when` condition into per-input tie states.
///
/// The condition is a conjunction of literals: `A&!B&C` means the minimum
/// state has A high, B low, C high.
pub fn ties_from_state(state: &str) -> (TieSummary, BTreeMap<String, TieState>) {
    let mut ties = BTreeMap::new();
    for term in state.split('&') {
        let term = term.trim().trim_matches(|c| c == '(' || c == ')').trim();
        if term.is_empty() {
            continue;
        }
        if let Some(signal) = term.strip_prefix('!') {
            ties.insert(signal.trim().to_string(), TieState::Lo);
        } else {
            ties.insert(term.to_string(), TieState::Hi);
        }
    }

    let lo = ties.values().filter(|&&t| t == TieState::Lo).count();
    let summary = if ties.is_empty() || lo == ties.len() {
        TieSummary::Lo
    } else if lo == 0 {
        TieSummary::Hi
    } else {
        TieSummary::Mixed
    };
    (summary, ties)
}

fn between(s: &str, open: char, close: char) -> Option<&str> {
    let start = s.find(open)? + open.len_utf8();
    let end = s[start..].find(close)? + start;
    Some(&s[start..end])
}

fn after_colon(s: &str) -> Option<&str> {
    s.split_once(':').map(|(_, r)| r.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIB: &str = r#"
library (sky130_fd_sc_hd__tt_025C_1v80) {
  cell ("sky130_fd_sc_hd__nand2_2") {
    leakage_power () {
      value : 0.0036338;
      when : "A&B";
    }
    leakage_power () {
      value : 0.0018727;
      when : "!A&!B";
    }
    leakage_power () {
      value : 0.0021000;
      when : "A&!B";
    }
  }
  cell ("sky130_fd_sc_hd__and2_2") {
    leakage_power () {
      value : 0.0018727;
      when : "A&B";
    }
    leakage_power () {
      value : 0.0036338;
      when : "!A&!B";
    }
  }
}
"#;

    #[test]
    fn picks_minimum_state() {
        let db = parse_liberty_str(LIB, "test.lib").unwrap();
        let nand = db.cell("sky130_fd_sc_hd__nand2_2").unwrap();
        assert_eq!(nand.min_state, "!A&!B");
        assert!((nand.min_power - 0.0018727).abs() < 1e-9);
        assert_eq!(nand.summary, TieSummary::Lo);
        assert_eq!(nand.input_ties["A"], TieState::Lo);
        assert_eq!(nand.input_ties["B"], TieState::Lo);
    }

    #[test]
    fn high_tie_cell() {
        let db = parse_liberty_str(LIB, "test.lib").unwrap();
        let and2 = db.cell("sky130_fd_sc_hd__and2_2").unwrap();
        assert_eq!(and2.summary, TieSummary::Hi);
        assert_eq!(and2.input_ties["A"], TieState::Hi);
    }

    #[test]
    fn averages_over_states() {
        let db = parse_liberty_str(LIB, "test.lib").unwrap();
        let nand = db.cell("sky130_fd_sc_hd__nand2_2").unwrap();
        let expected = (0.0036338 + 0.0018727 + 0.0021) / 3.0;
        assert!((nand.avg_power - expected).abs() < 1e-9);
        assert!((nand.max_power - 0.0036338).abs() < 1e-9);
    }

    #[test]
    fn mixed_state_decoding() {
        let (summary, ties) = ties_from_state("A&!B&C");
        assert_eq!(summary, TieSummary::Mixed);
        assert_eq!(ties["A"], TieState::Hi);
        assert_eq!(ties["B"], TieState::Lo);
        assert_eq!(ties["C"], TieState::Hi);
    }

    #[test]
    fn parenthesized_and_spaced_terms() {
        let (_, ties) = ties_from_state("(!A1) & A2");
        assert_eq!(ties["A1"], TieState::Lo);
        assert_eq!(ties["A2"], TieState::Hi);
    }

    #[test]
    fn no_stanzas_is_missing_data() {
        let err = parse_liberty_str("library (x) {}\n", "x.lib").unwrap_err();
        assert!(matches!(err, LibertyError::MissingData { .. }));
    }

    #[test]
    fn cell_without_when_is_skipped() {
        let lib = r#"
  cell ("a") {
    leakage_power () {
      value : 0.5;
    }
  }
  cell ("b") {
    leakage_power () {
      value : 0.25;
      when : "X";
    }
  }
"#;
        let db = parse_liberty_str(lib, "x.lib").unwrap();
        assert!(db.cell("a").is_none());
        assert!(db.cell("b").is_some());
    }

    #[test]
    fn value_and_when_must_pair() {
        // `when` before any `value` must not panic or record junk.
        let lib = r#"
  cell ("a") {
    leakage_power () {
      when : "A";
      value : 0.5;
    }
    leakage_power () {
      value : 0.1;
      when : "!A";
    }
  }
"#;
        let db = parse_liberty_str(lib, "x.lib").unwrap();
        let a = db.cell("a").unwrap();
        assert_eq!(a.min_state, "!A");
    }
}
