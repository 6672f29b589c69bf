//! Loading and saving the variations config.

use std::path::Path;

use anyhow::{Context, Result};
use cache_key_variations::VariationConfig;

/// Config file names searched for, in order.
pub const CONFIG_NAMES: [&str; 3] = ["variations.toml", ".variations.toml", "variations.json"];

/// Load config from a file. `.json` files are read as JSON, anything else
/// as TOML.
pub fn load(path: &Path) -> Result<VariationConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse(&content, is_json(path))
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Parse config text and validate it.
pub fn parse(content: &str, json: bool) -> Result<VariationConfig> {
    if json {
        let config: VariationConfig =
            serde_json::from_str(content).context("Failed to parse JSON config")?;
        config.validate()?;
        Ok(config)
    } else {
        Ok(VariationConfig::from_toml_str(content)?)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
