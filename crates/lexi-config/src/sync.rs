use std::env;

use serde::{Deserialize, Serialize};

fn default_timeout_seconds() -> u64 {
    300
}

fn default_user_agent() -> String {
    concat!("lexi/", env!("CARGO_PKG_VERSION")).to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    /// Whole-request timeout for dictionary downloads
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        let timeout_seconds = env::var("LEXI_SYNC_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_seconds);

        Self {
            timeout_seconds,
            user_agent: default_user_agent(),
        }
    }
}
