use std::collections::{HashMap, HashSet};

use lexi_config::hub::HubConfig;
use lexi_core::{
    CascadeHit, DictionaryEntry, DictionarySource, EntryMetadata, MoveDirection, NewEntry,
    SharedBloom, SourceKind, contains_cjk, normalize_word,
};
use lexi_parser::ParserOptions;
use lexi_store::Store;

use crate::error::{HubError, Result};
use crate::language_key;

/// Multi-source dictionary with a priority cascade per language.
///
/// The hub owns no global state: the store and the process-wide Bloom filter
/// are handed in by whoever builds it.
#[derive(Clone)]
pub struct DictionaryHub {
    pub(crate) store: Store,
    pub(crate) bloom: SharedBloom,
    pub(crate) config: HubConfig,
}

impl DictionaryHub {
    pub fn new(store: Store, bloom: SharedBloom, config: HubConfig) -> Self {
        Self {
            store,
            bloom,
            config,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn bloom(&self) -> &SharedBloom {
        &self.bloom
    }

    pub(crate) fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            batch_size: self.config.batch_size,
            bloom_bits: self.config.bloom_bits,
            channel_capacity: self.config.channel_capacity,
        }
    }

    /// New source at the lowest precedence of its language
    pub async fn create_source(
        &self,
        name: &str,
        language: &str,
        kind: SourceKind,
    ) -> Result<DictionarySource> {
        let source = self
            .store
            .create_source(name.trim(), &language_key(language), kind)
            .await?;
        tracing::info!(
            "Created source '{}' ({}) for '{}' at priority {}",
            source.name,
            source.id,
            source.language,
            source.priority
        );
        Ok(source)
    }

    pub async fn ensure_user_source(&self, language: &str) -> Result<DictionarySource> {
        Ok(self.store.ensure_user_source(&language_key(language)).await?)
    }

    pub async fn source(&self, id: &str) -> Result<DictionarySource> {
        self.store
            .source(id)
            .await?
            .ok_or_else(|| HubError::SourceNotFound(id.to_string()))
    }

    /// Sources of `language` in cascade order
    pub async fn sources(&self, language: &str) -> Result<Vec<DictionarySource>> {
        Ok(self.store.sources(&language_key(language)).await?)
    }

    pub async fn all_sources(&self) -> Result<Vec<DictionarySource>> {
        Ok(self.store.all_sources().await?)
    }

    /// Upsert one batch into a source and record its words in the global filter.
    /// Returns how many words were new to the source.
    pub async fn import_batch(&self, source_id: &str, entries: Vec<NewEntry>) -> Result<u64> {
        self.write_batch(source_id, entries, true).await
    }

    /// Add only the words the source does not hold yet
    pub(crate) async fn insert_missing(
        &self,
        source_id: &str,
        entries: Vec<NewEntry>,
    ) -> Result<u64> {
        self.write_batch(source_id, entries, false).await
    }

    async fn write_batch(
        &self,
        source_id: &str,
        entries: Vec<NewEntry>,
        overwrite: bool,
    ) -> Result<u64> {
        let words: Vec<String> = entries
            .iter()
            .filter(|e| e.has_word())
            .map(|e| e.word.clone())
            .collect();
        let inserted = if overwrite {
            self.store.import_batch(source_id, entries).await?
        } else {
            self.store.insert_missing(source_id, entries).await?
        };

        let mut bloom = self.bloom.write().await;
        for word in &words {
            bloom.add(word);
        }
        tracing::debug!("Batch of {} into {}: {} new", words.len(), source_id, inserted);
        Ok(inserted)
    }

    /// Move a source one step and renumber its language densely
    pub async fn reorder(
        &self,
        source_id: &str,
        direction: MoveDirection,
    ) -> Result<Vec<DictionarySource>> {
        Ok(self.store.move_source(source_id, direction).await?)
    }

    pub async fn set_enabled(&self, source_id: &str, enabled: bool) -> Result<DictionarySource> {
        Ok(self.store.set_enabled(source_id, enabled).await?)
    }

    /// Remove a source with all of its entries. USER sources are refused.
    pub async fn delete_source(&self, source_id: &str) -> Result<()> {
        let source = self.source(source_id).await?;
        if source.kind == SourceKind::User {
            return Err(HubError::UserSourceNotDeletable(source.id));
        }
        self.store.delete_source(source_id).await?;
        Ok(())
    }

    /// Empty a source but keep its metadata. Words stay in the Bloom filter
    /// until the next rebuild.
    pub async fn clear_entries(&self, source_id: &str) -> Result<u64> {
        let removed = self.store.clear_entries(source_id).await?;
        tracing::info!("Cleared {} entries from {}", removed, source_id);
        Ok(removed)
    }

    /// Every definition of `word` from enabled sources of `language`, best
    /// first. The root-script index is consulted too, so a Hanja/Kanji query
    /// also finds the entries annotated with it.
    pub async fn lookup_cascade(&self, language: &str, word: &str) -> Result<Vec<CascadeHit>> {
        let word = normalize_word(word);
        if word.is_empty() {
            return Ok(Vec::new());
        }

        let enabled: HashMap<String, (usize, DictionarySource)> = self
            .sources(language)
            .await?
            .into_iter()
            .filter(|s| s.enabled)
            .enumerate()
            .map(|(rank, s)| (s.id.clone(), (rank, s)))
            .collect();
        if enabled.is_empty() {
            return Ok(Vec::new());
        }

        let mut entries = self.store.entries_by_word(&word).await?;
        if contains_cjk(&word) {
            entries.extend(self.store.entries_by_root_script(&word).await?);
        }

        let mut seen = HashSet::new();
        let mut hits: Vec<(usize, CascadeHit)> = entries
            .into_iter()
            .filter_map(|entry| {
                let (rank, source) = enabled.get(&entry.dict_id)?;
                seen.insert((entry.dict_id.clone(), entry.word.clone()))
                    .then(|| (*rank, CascadeHit { entry, source: source.clone() }))
            })
            .collect();
        hits.sort_by_key(|(rank, _)| *rank);

        Ok(hits.into_iter().map(|(_, hit)| hit).collect())
    }

    /// Save a definition into the USER source of `language`
    pub async fn save_user_definition(
        &self,
        language: &str,
        word: &str,
        translation: &str,
        metadata: EntryMetadata,
    ) -> Result<DictionaryEntry> {
        let user = self.ensure_user_source(language).await?;
        let entry = NewEntry::new(word, translation.trim()).with_metadata(metadata);
        if !entry.has_word() {
            return Err(HubError::EmptyWord);
        }
        let key = entry.word.clone();
        self.import_batch(&user.id, vec![entry]).await?;

        self.store
            .entry(&user.id, &key)
            .await?
            .ok_or(HubError::SourceNotFound(user.id))
    }

    /// Bloom-only membership check; may report false positives
    pub async fn is_probably_known(&self, word: &str) -> bool {
        let word = normalize_word(word);
        !word.is_empty() && self.bloom.read().await.test(&word)
    }

    /// Repopulate the global filter from every stored word. Returns the
    /// number of bits set.
    pub async fn rebuild_bloom(&self) -> Result<usize> {
        let size = self.bloom.read().await.size();
        let fresh = self.store.build_bloom(size).await?;
        let bits = fresh.bits_set();

        *self.bloom.write().await = fresh;
        tracing::info!("Bloom filter rebuilt: {} of {} bits set", bits, size);
        Ok(bits)
    }
}
