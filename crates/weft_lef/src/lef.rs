//! Cell-library LEF: macro pin sets and header characters.

use crate::error::LefError;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Pin-name knowledge extracted from a cell-library LEF.
#[derive(Debug, Clone, Default)]
pub struct LefLibrary {
    /// LEF `VERSION`, if stated.
    pub version: Option<String>,
    /// Hierarchy divider for the DEF header.
    pub dividerchar: String,
    /// Bus bit characters for the DEF header.
    pub busbitchars: String,
    /// Pin names per macro, keyed by master name.
    pub macros: HashMap<String, BTreeSet<String>>,
}

impl LefLibrary {
    /// An empty library with default header characters.
    pub fn new() -> Self {
        Self {
            version: None,
            dividerchar: "/".to_string(),
            busbitchars: "[]".to_string(),
            macros: HashMap::new(),
        }
    }

    /// Parses a LEF file from disk.
    pub fn parse(path: &Path) -> Result<Self, LefError> {
        let content = std::fs::read_to_string(path).map_err(|source| LefError::Io {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        Ok(Self::parse_str(&content))
    }

    /// Parses LEF text. Unknown statements are skipped.
    pub fn parse_str(content: &str) -> Self {
        let mut lib = Self::new();
        let mut current_macro: Option<String> = None;
        let mut current_pin: Option<String> = None;

        for raw in content.lines() {
            let line = raw.trim();
            let mut words = line.split_whitespace();
            match words.next() {
                Some("VERSION") => {
                    if let Some(v) = words.next() {
                        lib.version = Some(v.trim_end_matches(';').to_string());
                    }
                }
                Some("DIVIDERCHAR") => {
                    if let Some(v) = quoted_value(line) {
                        lib.dividerchar = v;
                    }
                }
                Some("BUSBITCHARS") => {
                    if let Some(v) = quoted_value(line) {
                        lib.busbitchars = v;
                    }
                }
                Some("MACRO") => {
                    if let Some(name) = words.next() {
                        let name = name.to_string();
                        lib.macros.entry(name.clone()).or_default();
                        current_macro = Some(name);
                        current_pin = None;
                    }
                }
                Some("PIN") if current_macro.is_some() => {
                    if let Some(pin) = words.next() {
                        let pin = pin.to_string();
                        if let Some(m) = current_macro.as_ref() {
                            lib.macros.get_mut(m).expect("macro registered").insert(pin.clone());
                        }
                        current_pin = Some(pin);
                    }
                }
                Some("END") => match words.next() {
                    Some(name) if current_pin.as_deref() == Some(name) => current_pin = None,
                    Some(name) if current_macro.as_deref() == Some(name) => {
                        current_macro = None;
                        current_pin = None;
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        lib
    }

    /// The pin set of a macro, if the library knows it.
    pub fn pins_of(&self, macro_name: &str) -> Option<&BTreeSet<String>> {
        self.macros.get(macro_name)
    }

    /// Resolves the pin name to use for `pin` of `macro_name`.
    ///
    /// Matches case-insensitively against the macro's LEF pins, then tries
    /// conventional aliases (`Y`→`X`/`Q`, `A`→`I`/`IN`, `B`→`IN2`). Returns
    /// `None` when the macro is known but no match exists; passes `pin`
    /// through unchanged for unknown macros.
    pub fn resolve_pin(&self, macro_name: &str, pin: &str) -> Option<String> {
        let Some(pins) = self.macros.get(macro_name) else {
            return Some(pin.to_string());
        };
        if let Some(found) = pins.iter().find(|p| p.eq_ignore_ascii_case(pin)) {
            return Some(found.clone());
        }
        let aliases: &[&str] = match pin {
            "Y" => &["X", "Q"],
            "A" => &["I", "IN"],
            "B" => &["IN2"],
            _ => &[],
        };
        for alias in aliases {
            if let Some(found) = pins.iter().find(|p| p.eq_ignore_ascii_case(alias)) {
                return Some(found.clone());
            }
        }
        None
    }

    /// The output pin name of a macro.
    ///
    /// Preference order `X`, `Q`, `QN`, `Y`, `HI`, `LO`; falls back to the
    /// last signal pin, then `Y`.
    pub fn output_pin(&self, macro_name: &str) -> String {
        let Some(pins) = self.macros.get(macro_name) else {
            return "Y".to_string();
        };
        for candidate in ["X", "Q", "QN", "Y", "HI", "LO"] {
            if pins.contains(candidate) {
                return candidate.to_string();
            }
        }
        const NON_SIGNAL: &[&str] = &["VPWR", "VGND", "VDD", "VSS", "VNB", "VPB", "A", "B", "C", "D"];
        pins.iter()
            .filter(|p| !NON_SIGNAL.contains(&p.as_str()))
            .next_back()
            .cloned()
            .unwrap_or_else(|| "Y".to_string())
    }
}

fn quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')? + 1;
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}
