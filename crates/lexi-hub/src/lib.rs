//! Dictionary Hub: prioritized sources per language, the streaming import
//! pipeline and the cascading lookup.

pub mod error;
mod hub;
mod import;
mod legacy;

pub use error::{HubError, Result};
pub use hub::DictionaryHub;
pub use import::{ImportProgress, ImportReport};

/// Languages are keyed case-insensitively ("EN" and "en" are one language)
pub fn language_key(language: &str) -> String {
    language.trim().to_lowercase()
}

#[cfg(test)]
pub(crate) fn test_hub() -> DictionaryHub {
    use lexi_config::hub::HubConfig;
    use lexi_core::BloomFilter;
    use lexi_store::Store;

    let config = HubConfig {
        bloom_bits: 8192,
        batch_size: 2,
        chunk_size: 5,
        ..HubConfig::default()
    };
    DictionaryHub::new(
        Store::open_in_memory().unwrap(),
        BloomFilter::new(config.bloom_bits).shared(),
        config,
    )
}
