//! Configuration data model.

use serde::{Deserialize, Serialize};

/// The parsed `weft.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identity.
    #[serde(default)]
    pub project: ProjectSection,
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsSection,
    /// Annealer knobs.
    #[serde(default)]
    pub sa: SaSection,
    /// Clock-tree options.
    #[serde(default)]
    pub cts: CtsSection,
}

/// The `[project]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSection {
    /// Default design name used when the CLI gives none.
    #[serde(default)]
    pub design: Option<String>,
}

/// The `[paths]` section. All paths are relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsSection {
    /// Tile → site layout file.
    #[serde(default = "default_fabric_cells")]
    pub fabric_cells: String,
    /// Pin ring file.
    #[serde(default = "default_pins")]
    pub pins: String,
    /// Cell-type definition file.
    #[serde(default = "default_fabric")]
    pub fabric: String,
    /// Directory holding `<design>_mapped.json` netlists.
    #[serde(default = "default_designs_dir")]
    pub designs_dir: String,
    /// Output directory root; artifacts land in `<build_dir>/<design>/`.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    /// Liberty library with leakage data.
    #[serde(default = "default_liberty")]
    pub liberty: String,
    /// Cell-library LEF files, read in order.
    #[serde(default = "default_lef")]
    pub lef: Vec<String>,
    /// Technology LEF.
    #[serde(default = "default_tlef")]
    pub tlef: String,
}

fn default_fabric_cells() -> String {
    "fabric/fabric_cells.yaml".to_string()
}
fn default_pins() -> String {
    "fabric/pins.yaml".to_string()
}
fn default_fabric() -> String {
    "fabric/fabric.yaml".to_string()
}
fn default_designs_dir() -> String {
    "designs".to_string()
}
fn default_build_dir() -> String {
    "build".to_string()
}
fn default_liberty() -> String {
    "tech/sky130_fd_sc_hd__tt_025C_1v80.lib".to_string()
}
fn default_lef() -> Vec<String> {
    vec![
        "tech/sky130_fd_sc_hd.lef".to_string(),
        "tech/fabric_cells.lef".to_string(),
    ]
}
fn default_tlef() -> String {
    "tech/sky130_fd_sc_hd.tlef".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            fabric_cells: default_fabric_cells(),
            pins: default_pins(),
            fabric: default_fabric(),
            designs_dir: default_designs_dir(),
            build_dir: default_build_dir(),
            liberty: default_liberty(),
            lef: default_lef(),
            tlef: default_tlef(),
        }
    }
}

/// The `[sa]` section. Defaults match the annealer's own defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaSection {
    /// Starting temperature.
    #[serde(default = "default_initial_temp")]
    pub initial_temp: f64,
    /// Stopping temperature.
    #[serde(default = "default_final_temp")]
    pub final_temp: f64,
    /// Geometric cooling factor, in (0, 1).
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    /// Proposals per temperature block.
    #[serde(default = "default_moves_per_temp")]
    pub moves_per_temp: u32,
    /// Hard cap on total proposals.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Probability of a refine (swap) proposal.
    #[serde(default = "default_prob_refine")]
    pub prob_refine: f64,
    /// Probability of an explore (shift) proposal.
    #[serde(default = "default_prob_explore")]
    pub prob_explore: f64,
    /// Initial explore window as a fraction of the die span.
    #[serde(default = "default_w_initial")]
    pub w_initial: f64,
    /// Random generator seed.
    #[serde(default)]
    pub seed: u64,
}

fn default_initial_temp() -> f64 {
    1000.0
}
fn default_final_temp() -> f64 {
    0.01
}
fn default_cooling_rate() -> f64 {
    0.97
}
fn default_moves_per_temp() -> u32 {
    4000
}
fn default_max_iterations() -> u64 {
    15_000
}
fn default_prob_refine() -> f64 {
    0.5
}
fn default_prob_explore() -> f64 {
    0.5
}
fn default_w_initial() -> f64 {
    0.5
}

impl Default for SaSection {
    fn default() -> Self {
        Self {
            initial_temp: default_initial_temp(),
            final_temp: default_final_temp(),
            cooling_rate: default_cooling_rate(),
            moves_per_temp: default_moves_per_temp(),
            max_iterations: default_max_iterations(),
            prob_refine: default_prob_refine(),
            prob_explore: default_prob_explore(),
            w_initial: default_w_initial(),
            seed: 0,
        }
    }
}

/// The `[cts]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CtsSection {
    /// Clock port name; auto-detected when unset.
    #[serde(default)]
    pub clock: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_annealer() {
        let sa = SaSection::default();
        assert_eq!(sa.initial_temp, 1000.0);
        assert_eq!(sa.final_temp, 0.01);
        assert_eq!(sa.cooling_rate, 0.97);
        assert_eq!(sa.moves_per_temp, 4000);
        assert_eq!(sa.max_iterations, 15_000);
        assert_eq!(sa.prob_refine, 0.5);
        assert_eq!(sa.prob_explore, 0.5);
        assert_eq!(sa.w_initial, 0.5);
    }

    #[test]
    fn default_paths_follow_convention() {
        let paths = PathsSection::default();
        assert_eq!(paths.fabric_cells, "fabric/fabric_cells.yaml");
        assert_eq!(paths.build_dir, "build");
        assert_eq!(paths.lef.len(), 2);
    }
}
