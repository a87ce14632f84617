use std::env;

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    false
}

fn default_api_url() -> String {
    "http://localhost:8787/define".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_persist_results() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DefinerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Language definitions are written in
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Save AI definitions into the user dictionary
    #[serde(default = "default_persist_results")]
    pub persist_results: bool,
}

impl Default for DefinerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_url: default_api_url(),
            api_key: String::new(),
            target_language: default_target_language(),
            persist_results: default_persist_results(),
        }
    }
}

impl DefinerConfig {
    pub fn new() -> Self {
        let api_url = env::var("LEXI_DEFINER_URL").ok();
        let api_key = env::var("LEXI_DEFINER_API_KEY").unwrap_or_default();

        Self {
            // An explicit endpoint turns the definer on
            enabled: api_url.is_some(),
            api_url: api_url.unwrap_or_else(default_api_url),
            api_key,
            ..Self::default()
        }
    }
}
