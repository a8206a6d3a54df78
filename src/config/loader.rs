use std::path::Path;

use anyhow::{Context, Result};

use super::types::Config;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".fixtainer.yml";

/// Load `.fixtainer.yml` from `dir`. `Ok(None)` if the file does not exist.
pub fn load(dir: &Path) -> Result<Option<Config>> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    load_file(&path).map(Some)
}

/// Load a config file from an explicit path.
pub fn load_file(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(config)
}
