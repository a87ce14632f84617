use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::definer::DefinerConfig;
use self::hub::HubConfig;
use self::sync::SyncConfig;

pub mod definer;
pub mod hub;
pub mod sync;

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub hub: HubConfig,
    pub sync: SyncConfig,
    pub definer: DefinerConfig,

    /// Language used when a command does not name one
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub: HubConfig::default(),
            sync: SyncConfig::default(),
            definer: DefinerConfig::default(),
            default_language: default_language(),
        }
    }
}

impl Config {
    /// Defaults overridden by `LEXI_*` environment variables
    pub fn new() -> Self {
        let default_language = env::var("LEXI_DEFAULT_LANGUAGE")
            .map(|v| v.to_lowercase())
            .unwrap_or_else(|_| default_language());

        Config {
            hub: HubConfig::new(),
            sync: SyncConfig::new(),
            definer: DefinerConfig::new(),
            default_language,
        }
    }

    /// Load a JSON config file. Missing sections fall back to their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|e| ConfigError::Read(path.display().to_string(), e))?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Read(String, std::io::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
}
