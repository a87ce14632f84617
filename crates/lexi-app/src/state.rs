use std::sync::Arc;

use anyhow::Context;
use lexi_config::Config;
use lexi_core::{BloomFilter, LemmaRouter, SharedBloom};
use lexi_hub::DictionaryHub;
use lexi_lang_english::EnglishLemmatizer;
use lexi_store::Store;
use lexi_translator::{Definer, HttpDefiner};
use tokio::sync::RwLock;

use crate::vocabulary::Vocabulary;
use crate::waterfall::WaterfallResolver;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    /// Process-wide membership filter shared with the hub
    pub bloom: SharedBloom,
    pub hub: DictionaryHub,
    pub vocabulary: Arc<RwLock<Vocabulary>>,
    pub resolver: WaterfallResolver,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::open(&config.hub.database_path)
            .with_context(|| format!("opening database {}", config.hub.database_path))?;
        Self::with_store(config, store).await
    }

    /// Build the state around an already opened store: run the legacy
    /// migration and fill the Bloom filter from disk.
    pub async fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let bloom = BloomFilter::new(config.hub.bloom_bits).shared();
        let hub = DictionaryHub::new(store, Arc::clone(&bloom), config.hub.clone());

        let migrated = hub.migrate_legacy().await.context("legacy migration")?;
        if migrated > 0 {
            tracing::info!("Moved {} legacy entries into user dictionaries", migrated);
        }
        hub.rebuild_bloom().await.context("loading bloom filter")?;

        let lemmas = LemmaRouter::new().register("en", Arc::new(EnglishLemmatizer::new()));
        tracing::debug!("Lemma providers: {:?}", lemmas.languages());

        let definer: Option<Arc<dyn Definer>> = if config.definer.enabled {
            let definer = HttpDefiner::from_config(&config.definer);
            tracing::info!(
                "Definer '{}' enabled at {}",
                definer.metadata().name,
                config.definer.api_url
            );
            Some(Arc::new(definer))
        } else {
            tracing::warn!("Definer disabled, unknown words stay undefined");
            None
        };

        let vocabulary = Arc::new(RwLock::new(Vocabulary::new()));
        let resolver = WaterfallResolver::new(
            hub.clone(),
            Arc::clone(&vocabulary),
            Arc::new(lemmas),
            definer,
            config.definer.persist_results,
        );

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            bloom,
            hub,
            vocabulary,
            resolver,
        })
    }
}
