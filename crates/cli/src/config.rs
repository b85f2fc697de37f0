//! Ledger configuration stored as `config.json` in the data directory.

use anyhow::{Context, Result};
use gichain_chain::LedgerConfig;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Directory holding the sled database.
pub fn ledger_path(data_dir: &Path) -> PathBuf {
    data_dir.join("ledger")
}

/// Load the config, falling back to defaults when none was written.
pub fn load(data_dir: &Path) -> Result<LedgerConfig> {
    let path = config_path(data_dir);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(LedgerConfig::default());
    }
    let contents = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
}

pub fn save(data_dir: &Path, config: &LedgerConfig) -> Result<PathBuf> {
    let path = config_path(data_dir);
    fs::write(&path, serde_json::to_string_pretty(config)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
