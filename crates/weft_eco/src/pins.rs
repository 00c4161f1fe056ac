//! Input-pin enumeration for standard-cell masters.
//!
//! The ECO needs the input pin list of a cell master to know what to tie.
//! A static table covers the library families the fabric is built from; a
//! name heuristic covers simple gate families it does not list. Cells
//! resolving to neither are skipped by the ECO with a warning.

/// Known master families and their input pins, matched by substring of the
/// lowercased master name. First match wins, so longer stems come first.
const PIN_TABLE: &[(&str, &[&str])] = &[
    ("dlymetal", &["A"]),
    ("dlygate", &["A"]),
    ("clkbuf", &["A"]),
    ("clkinv", &["A"]),
    ("mux4", &["A0", "A1", "A2", "A3", "S0", "S1"]),
    ("mux2", &["A0", "A1", "S"]),
    ("a211o", &["A1", "A2", "B1", "C1"]),
    ("a21bo", &["A1", "A2", "B1_N"]),
    ("a21o", &["A1", "A2", "B1"]),
    ("a22o", &["A1", "A2", "B1", "B2"]),
    ("a31o", &["A1", "A2", "A3", "B1"]),
    ("a32o", &["A1", "A2", "A3", "B1", "B2"]),
    ("o211a", &["A1", "A2", "B1", "C1"]),
    ("o21ba", &["A1", "A2", "B1_N"]),
    ("o21a", &["A1", "A2", "B1"]),
    ("o22a", &["A1", "A2", "B1", "B2"]),
    ("o31a", &["A1", "A2", "A3", "B1"]),
    ("fah", &["A", "B", "CI"]),
    ("fa", &["A", "B", "CIN"]),
    ("ha", &["A", "B"]),
];

/// Gate families whose arity is spelled in the name (`nand3` → 3 inputs).
const ARITY_FAMILIES: &[&str] = &["nand", "nor", "xnor", "xor", "and", "or"];

/// Single-input families.
const UNARY_FAMILIES: &[&str] = &["inv", "buf"];

/// The input pins of `cell_type`, or `None` for unknown masters.
pub fn input_pins(cell_type: &str) -> Option<Vec<String>> {
    let lower = cell_type.to_ascii_lowercase();

    for (stem, pins) in PIN_TABLE {
        if lower.contains(stem) {
            return Some(pins.iter().map(|p| p.to_string()).collect());
        }
    }

    for family in ARITY_FAMILIES {
        if let Some(arity) = arity_after(&lower, family) {
            // A, B, C, D for up to 4 inputs.
            if (2..=4).contains(&arity) {
                return Some(
                    (0..arity)
                        .map(|i| ((b'A' + i as u8) as char).to_string())
                        .collect(),
                );
            }
        }
    }

    for family in UNARY_FAMILIES {
        if lower.contains(family) {
            return Some(vec!["A".to_string()]);
        }
    }

    None
}

/// The digit following `family` in `name`, if `family` occurs with one.
fn arity_after(name: &str, family: &str) -> Option<usize> {
    let mut search = name;
    while let Some(idx) = search.find(family) {
        let rest = &search[idx + family.len()..];
        if let Some(c) = rest.chars().next() {
            if c.is_ascii_digit() {
                return Some(c.to_digit(10).unwrap() as usize);
            }
        }
        search = &search[idx + family.len()..];
    }
    None
}
