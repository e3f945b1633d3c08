//! Configuration for the ledger CLI

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the ledger document
    pub state_path: PathBuf,

    /// Hold an advisory lock around each mutation
    pub lock: bool,

    /// Log level used when --log-level is not given
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from(crate::DEFAULT_STATE_PATH),
            lock: false,
            log_level: None,
        }
    }
}

impl Config {
    /// Load config from file, or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(config_path)
                .context(format!("Failed to load config from {}", config_path.display()));
        }

        // Try default locations
        let default_paths = [
            Some(PathBuf::from("swarmledger.yml")),
            dirs::config_dir().map(|p| p.join("swarmledger").join("swarmledger.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_from_file(path);
            }
        }

        Ok(Config::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
