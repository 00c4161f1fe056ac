//! Technology LEF: site dimensions and routing layers.

use crate::error::LefError;
use std::collections::BTreeMap;
use std::path::Path;

/// A placement site definition from the technology LEF.
#[derive(Debug, Clone, PartialEq)]
pub struct TechSite {
    /// Site name (e.g. `unithd`).
    pub name: String,
    /// Site width in microns.
    pub width_um: f64,
    /// Site height in microns.
    pub height_um: f64,
    /// Site class (`CORE`, `PAD`, …), if stated.
    pub class: Option<String>,
}

/// A layer definition from the technology LEF.
#[derive(Debug, Clone, PartialEq)]
pub struct TechLayer {
    /// Layer name (e.g. `met1`).
    pub name: String,
    /// Layer type (`ROUTING`, `CUT`, …), if stated.
    pub layer_type: Option<String>,
    /// Preferred routing direction, if stated.
    pub direction: Option<String>,
    /// Minimum width in microns, if stated.
    pub width_um: Option<f64>,
}

impl TechLayer {
    /// Returns `true` if this is a routing layer.
    pub fn is_routing(&self) -> bool {
        self.layer_type.as_deref() == Some("ROUTING")
    }
}

/// Technology information extracted from a TLEF file.
#[derive(Debug, Clone)]
pub struct TlefData {
    /// TLEF `VERSION`, if stated.
    pub version: Option<String>,
    /// Database units per micron (`UNITS { DATABASE MICRONS n }`).
    pub database_units: u32,
    /// Manufacturing grid in microns.
    pub manufacturing_grid: f64,
    /// Site definitions in declaration order.
    pub sites: BTreeMap<String, TechSite>,
    /// Layer definitions in declaration order.
    pub layers: BTreeMap<String, TechLayer>,
}

impl Default for TlefData {
    fn default() -> Self {
        Self {
            version: None,
            database_units: 1000,
            manufacturing_grid: 0.005,
            sites: BTreeMap::new(),
            layers: BTreeMap::new(),
        }
    }
}

impl TlefData {
    /// Parses a TLEF file from disk.
    pub fn parse(path: &Path) -> Result<Self, LefError> {
        let content = std::fs::read_to_string(path).map_err(|source| LefError::Io {
            path: path.to_string_lossy().into_owned(),
            source,
        })?;
        Ok(Self::parse_str(&content))
    }

    /// Parses TLEF text. Unknown statements are skipped.
    pub fn parse_str(content: &str) -> Self {
        let mut data = Self::default();
        let mut current_site: Option<String> = None;
        let mut current_layer: Option<String> = None;

        for raw in content.lines() {
            let line = raw.trim();
            let mut words = line.split_whitespace();
            match words.next() {
                Some("VERSION") => {
                    if let Some(v) = words.next() {
                        data.version = Some(v.trim_end_matches(';').to_string());
                    }
                }
                Some("DATABASE") => {
                    if words.next() == Some("MICRONS") {
                        if let Some(n) = words.next().and_then(|w| {
                            w.trim_end_matches(';').trim().parse::<u32>().ok()
                        }) {
                            data.database_units = n;
                        }
                    }
                }
                Some("MANUFACTURINGGRID") => {
                    if let Some(g) = words
                        .next()
                        .and_then(|w| w.trim_end_matches(';').parse::<f64>().ok())
                    {
                        data.manufacturing_grid = g;
                    }
                }
                Some("SITE") => {
                    if let Some(name) = words.next() {
                        let name = name.to_string();
                        data.sites.insert(
                            name.clone(),
                            TechSite {
                                name: name.clone(),
                                width_um: 0.0,
                                height_um: 0.0,
                                class: None,
                            },
                        );
                        current_site = Some(name);
                    }
                }
                Some("LAYER") => {
                    if let Some(name) = words.next() {
                        let name = name.to_string();
                        data.layers.insert(
                            name.clone(),
                            TechLayer {
                                name: name.clone(),
                                layer_type: None,
                                direction: None,
                                width_um: None,
                            },
                        );
                        current_layer = Some(name);
                    }
                }
                Some("SIZE") if current_site.is_some() => {
                    // SIZE w BY h ;
                    let w = words.next().and_then(|x| x.parse::<f64>().ok());
                    let by = words.next();
                    let h = words
                        .next()
                        .and_then(|x| x.trim_end_matches(';').trim().parse::<f64>().ok());
                    if let (Some(w), Some("BY"), Some(h)) = (w, by, h) {
                        let site = data
                            .sites
                            .get_mut(current_site.as_ref().expect("site active"))
                            .expect("site registered");
                        site.width_um = w;
                        site.height_um = h;
                    }
                }
                Some("CLASS") if current_site.is_some() => {
                    if let Some(c) = words.next() {
                        let site = data
                            .sites
                            .get_mut(current_site.as_ref().expect("site active"))
                            .expect("site registered");
                        site.class = Some(c.trim_end_matches(';').to_string());
                    }
                }
                Some("TYPE") if current_layer.is_some() => {
                    if let Some(t) = words.next() {
                        let layer = data
                            .layers
                            .get_mut(current_layer.as_ref().expect("layer active"))
                            .expect("layer registered");
                        layer.layer_type = Some(t.trim_end_matches(';').to_string());
                    }
                }
                Some("DIRECTION") if current_layer.is_some() => {
                    if let Some(d) = words.next() {
                        let layer = data
                            .layers
                            .get_mut(current_layer.as_ref().expect("layer active"))
                            .expect("layer registered");
                        layer.direction = Some(d.trim_end_matches(';').to_string());
                    }
                }
                Some("WIDTH") if current_layer.is_some() => {
                    if let Some(w) = words
                        .next()
                        .and_then(|x| x.trim_end_matches(';').parse::<f64>().ok())
                    {
                        let layer = data
                            .layers
                            .get_mut(current_layer.as_ref().expect("layer active"))
                            .expect("layer registered");
                        layer.width_um = Some(w);
                    }
                }
                Some("END") => {
                    let name = words.next();
                    if name.is_some() {
                        if name == current_layer.as_deref() {
                            current_layer = None;
                        }
                        if name == current_site.as_deref() {
                            current_site = None;
                        }
                    }
                }
                _ => {}
            }
        }
        data
    }

    /// The site to size DEF ROWs from: `unithd` if present, else the first
    /// `CORE`-class site, else any site.
    pub fn row_site(&self) -> Option<&TechSite> {
        if let Some(s) = self.sites.get("unithd") {
            return Some(s);
        }
        self.sites
            .values()
            .find(|s| s.class.as_deref() == Some("CORE"))
            .or_else(|| self.sites.values().next())
    }

    /// Iterates routing layers in declaration (name) order.
    pub fn routing_layers(&self) -> impl Iterator<Item = &TechLayer> {
        self.layers.values().filter(|l| l.is_routing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TLEF: &str = r#"
VERSION 5.7 ;
UNITS
  DATABASE MICRONS 1000 ;
END UNITS
MANUFACTURINGGRID 0.005 ;
SITE unithd
  SYMMETRY Y ;
  CLASS CORE ;
  SIZE 0.460 BY 2.720 ;
END unithd
LAYER li1
  TYPE ROUTING ;
  DIRECTION VERTICAL ;
  WIDTH 0.17 ;
END li1
LAYER met1
  TYPE ROUTING ;
  DIRECTION HORIZONTAL ;
  WIDTH 0.14 ;
END met1
LAYER mcon
  TYPE CUT ;
END mcon
"#;

    #[test]
    fn parses_units_and_grid() {
        let t = TlefData::parse_str(TLEF);
        assert_eq!(t.version.as_deref(), Some("5.7"));
        assert_eq!(t.database_units, 1000);
        assert_eq!(t.manufacturing_grid, 0.005);
    }

    #[test]
    fn parses_site() {
        let t = TlefData::parse_str(TLEF);
        let site = t.row_site().unwrap();
        assert_eq!(site.name, "unithd");
        assert!((site.width_um - 0.46).abs() < 1e-9);
        assert!((site.height_um - 2.72).abs() < 1e-9);
        assert_eq!(site.class.as_deref(), Some("CORE"));
    }

    #[test]
    fn routing_layers_exclude_cuts() {
        let t = TlefData::parse_str(TLEF);
        let names: Vec<&str> = t.routing_layers().map(|l| l.name.as_str()).collect();
        assert!(names.contains(&"li1"));
        assert!(names.contains(&"met1"));
        assert!(!names.contains(&"mcon"));
    }

    #[test]
    fn layer_properties() {
        let t = TlefData::parse_str(TLEF);
        let met1 = &t.layers["met1"];
        assert_eq!(met1.direction.as_deref(), Some("HORIZONTAL"));
        assert_eq!(met1.width_um, Some(0.14));
    }

    #[test]
    fn defaults_without_input() {
        let t = TlefData::parse_str("");
        assert_eq!(t.database_units, 1000);
        assert!(t.row_site().is_none());
    }
}
