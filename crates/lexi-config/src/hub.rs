use std::env;

use serde::{Deserialize, Serialize};

fn default_database_path() -> String {
    "lexi.sqlite3".to_string()
}

fn default_bloom_bits() -> usize {
    2_000_000
}

fn default_batch_size() -> usize {
    2000
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_channel_capacity() -> usize {
    8
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HubConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Size of the process-wide Bloom filter in bits
    #[serde(default = "default_bloom_bits")]
    pub bloom_bits: usize,
    /// Entries per parser batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Bytes read per chunk when importing a file
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Capacity of the parser command/event channels
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            bloom_bits: default_bloom_bits(),
            batch_size: default_batch_size(),
            chunk_size: default_chunk_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        let defaults = Self::default();

        let database_path = env::var("LEXI_DB_PATH").unwrap_or(defaults.database_path);

        let bloom_bits = env::var("LEXI_BLOOM_BITS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.bloom_bits);

        let batch_size = env::var("LEXI_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &usize| *v > 0)
            .unwrap_or(defaults.batch_size);

        let chunk_size = env::var("LEXI_CHUNK_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|v: &usize| *v > 0)
            .unwrap_or(defaults.chunk_size);

        Self {
            database_path,
            bloom_bits,
            batch_size,
            chunk_size,
            channel_capacity: defaults.channel_capacity,
        }
    }
}
