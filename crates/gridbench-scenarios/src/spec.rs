//! Loading synthetic scenario descriptions from YAML or JSON files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::synthetic::SyntheticGridConfig;

/// Read a [`SyntheticGridConfig`] from `path`. The format follows the file
/// extension; unknown extensions are tried as YAML first, then JSON.
pub fn load_scenario_config(path: &Path) -> Result<SyntheticGridConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scenario config '{}'", path.display()))?;
    let config: SyntheticGridConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing scenario config yaml")?
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing scenario config json")?
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing scenario config")?,
    };
    config
        .validate()
        .with_context(|| format!("validating scenario config '{}'", path.display()))?;
    Ok(config)
}
