//! Sensor fleet discovery – reads per-sensor TOML files from a config
//! directory.
//!
//! One file per sensor. Discovery sorts paths lexicographically so the
//! fleet order — and with it the deterministic `worker{i}` naming — is
//! stable across runs.

use std::fs;
use std::path::{Path, PathBuf};

use vantage_hal::SensorConfig;
use vantage_types::VantageError;

/// Directory scanned when no path is given on the command line.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Discover sensor configurations under `dir`.
///
/// Files with a `.toml` extension are parsed as [`SensorConfig`];
/// everything else is ignored. A config whose `name` field is empty
/// inherits its file stem.
///
/// # Errors
///
/// Returns [`VantageError::Config`] when the directory cannot be read or
/// any `.toml` file fails to parse.
pub fn discover(dir: &Path) -> Result<Vec<SensorConfig>, VantageError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        VantageError::Config(format!(
            "cannot read config directory {}: {e}",
            dir.display()
        ))
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    let mut configs = Vec::with_capacity(paths.len());
    for path in &paths {
        configs.push(load_config(path)?);
    }
    Ok(configs)
}

fn load_config(path: &Path) -> Result<SensorConfig, VantageError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| VantageError::Config(format!("cannot read {}: {e}", path.display())))?;
    let mut config: SensorConfig = toml::from_str(&raw)
        .map_err(|e| VantageError::Config(format!("cannot parse {}: {e}", path.display())))?;
    if config.name.is_empty() {
        config.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    }
    Ok(config)
}
