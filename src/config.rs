//! Optional JSON configuration file. Every field has a default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::fetch::{DEFAULT_BASE_URL, DEFAULT_DATA_PATH, DEFAULT_DATA_REF};
use crate::map::MapOptions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raw-content root the data files are fetched from.
    pub base_url: String,
    /// Data file used when neither `--input` nor `--date` is given.
    pub data_path: String,
    /// Branch holding the data files.
    pub data_ref: String,
    pub map: MapOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_path: DEFAULT_DATA_PATH.to_string(),
            data_ref: DEFAULT_DATA_REF.to_string(),
            map: MapOptions::default(),
        }
    }
}

impl Config {
    /// Read `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(cfg)
    }
}
