//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Loads `<project_dir>/weft.toml`, falling back to defaults when the file
/// does not exist.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join("weft.toml");
    if !config_path.exists() {
        return Ok(ProjectConfig::default());
    }
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `weft.toml` from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates value ranges the annealer relies on.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    let sa = &config.sa;
    if !(sa.cooling_rate > 0.0 && sa.cooling_rate < 1.0) {
        return Err(ConfigError::ValidationError(
            "sa.cooling_rate must be in (0, 1)".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&sa.prob_refine) || !(0.0..=1.0).contains(&sa.prob_explore) {
        return Err(ConfigError::ValidationError(
            "sa.prob_refine and sa.prob_explore must be in [0, 1]".to_string(),
        ));
    }
    if (sa.prob_refine + sa.prob_explore - 1.0).abs() > 1e-9 {
        return Err(ConfigError::ValidationError(
            "sa.prob_refine + sa.prob_explore must equal 1".to_string(),
        ));
    }
    if !(sa.w_initial > 0.0 && sa.w_initial <= 1.0) {
        return Err(ConfigError::ValidationError(
            "sa.w_initial must be in (0, 1]".to_string(),
        ));
    }
    Ok(())
}
