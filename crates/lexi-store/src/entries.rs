use lexi_core::{BloomFilter, DictionaryEntry, EntryMetadata, NewEntry};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{Result, StoreError};
use crate::sources::source_by_id;
use crate::Store;

const ENTRY_COLUMNS: &str = "dict_id, word, original, translation, metadata, audio_path";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<DictionaryEntry> {
    let metadata: String = row.get(4)?;
    let metadata: EntryMetadata = serde_json::from_str(&metadata)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    Ok(DictionaryEntry {
        dict_id: row.get(0)?,
        word: row.get(1)?,
        original: row.get(2)?,
        translation: row.get(3)?,
        metadata,
        audio_path: row.get(5)?,
    })
}

impl Store {
    /// Upsert `entries` into one source inside a single transaction.
    ///
    /// Entries without a word are dropped. The source's `count` grows by the
    /// number of words that were not yet present, which is returned.
    pub async fn import_batch(&self, dict_id: &str, entries: Vec<NewEntry>) -> Result<u64> {
        self.write_batch(dict_id, entries, true).await
    }

    /// Like [`Store::import_batch`] but words already in the source keep
    /// their stored definition.
    pub async fn insert_missing(&self, dict_id: &str, entries: Vec<NewEntry>) -> Result<u64> {
        self.write_batch(dict_id, entries, false).await
    }

    async fn write_batch(
        &self,
        dict_id: &str,
        entries: Vec<NewEntry>,
        overwrite: bool,
    ) -> Result<u64> {
        let dict_id = dict_id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            if source_by_id(&tx, &dict_id)?.is_none() {
                return Err(StoreError::SourceNotFound(dict_id));
            }

            let mut inserted = 0u64;
            {
                let mut insert = tx.prepare_cached(
                    "INSERT OR IGNORE INTO dict_entries
                        (dict_id, word, original, translation, metadata, audio_path, root_script)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?;
                let mut update = tx.prepare_cached(
                    "UPDATE dict_entries
                     SET original = ?3, translation = ?4, metadata = ?5,
                         audio_path = COALESCE(?6, audio_path), root_script = ?7
                     WHERE dict_id = ?1 AND word = ?2",
                )?;

                for entry in entries.iter().filter(|e| e.has_word()) {
                    let metadata = serde_json::to_string(&entry.metadata)?;
                    let row = params![
                        dict_id,
                        entry.word,
                        entry.original,
                        entry.translation,
                        metadata,
                        entry.audio_path,
                        entry.metadata.root_script,
                    ];
                    if insert.execute(row)? == 1 {
                        inserted += 1;
                    } else if overwrite {
                        update.execute(row)?;
                    }
                }
            }

            tx.execute(
                "UPDATE dict_meta SET count = count + ?2 WHERE id = ?1",
                params![dict_id, inserted as i64],
            )?;
            tx.commit()?;
            Ok(inserted)
        })
        .await
    }

    /// Every entry whose key is `word`, across all sources (single index scan)
    pub async fn entries_by_word(&self, word: &str) -> Result<Vec<DictionaryEntry>> {
        let word = word.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {ENTRY_COLUMNS} FROM dict_entries WHERE word = ?1"
            ))?;
            let rows = stmt.query_map([&word], entry_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    /// Entries annotated with `root_script` (Hanja, Kanji, ...)
    pub async fn entries_by_root_script(&self, root_script: &str) -> Result<Vec<DictionaryEntry>> {
        let root_script = root_script.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {ENTRY_COLUMNS} FROM dict_entries WHERE root_script = ?1"
            ))?;
            let rows = stmt.query_map([&root_script], entry_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    pub async fn entry(&self, dict_id: &str, word: &str) -> Result<Option<DictionaryEntry>> {
        let (dict_id, word) = (dict_id.to_string(), word.to_string());
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    &format!(
                        "SELECT {ENTRY_COLUMNS} FROM dict_entries WHERE dict_id = ?1 AND word = ?2"
                    ),
                    [&dict_id, &word],
                    entry_from_row,
                )
                .optional()?)
        })
        .await
    }

    /// Entries of one source in key order, `limit` rows from `offset`
    pub async fn entries_page(
        &self,
        dict_id: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<DictionaryEntry>> {
        let dict_id = dict_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {ENTRY_COLUMNS} FROM dict_entries WHERE dict_id = ?1
                 ORDER BY word LIMIT ?2 OFFSET ?3"
            ))?;
            let rows =
                stmt.query_map(params![dict_id, limit as i64, offset as i64], entry_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    /// Authoritative row count of one source, independent of the cached count
    pub async fn count_entries(&self, dict_id: &str) -> Result<u64> {
        let dict_id = dict_id.to_string();
        self.call(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM dict_entries WHERE dict_id = ?1",
                [&dict_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
        .await
    }

    /// Filter of `size` bits holding every stored word
    pub async fn build_bloom(&self, size: usize) -> Result<BloomFilter> {
        self.call(move |conn| {
            let mut bloom = BloomFilter::new(size);
            let mut stmt = conn.prepare("SELECT DISTINCT word FROM dict_entries")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let word: String = row.get(0)?;
                bloom.add(&word);
            }
            Ok(bloom)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use lexi_core::SourceKind;

    use super::*;

    fn entry(word: &str, translation: &str) -> NewEntry {
        NewEntry::new(word, translation)
    }

    #[tokio::test]
    async fn import_counts_only_entries_with_words() {
        let store = Store::open_in_memory().unwrap();
        let source = store.create_source("T", "en", SourceKind::Imported).await.unwrap();

        let batch = vec![
            entry("cat", "猫"),
            entry("  ", "nothing"),
            entry("Dog", "狗"),
            entry("", "empty"),
        ];
        let inserted = store.import_batch(&source.id, batch).await.unwrap();

        assert_eq!(inserted, 2);
        let source = store.source(&source.id).await.unwrap().unwrap();
        assert_eq!(source.count, 2);
        assert_eq!(store.count_entries(&source.id).await.unwrap(), 2);

        let dog = store.entry(&source.id, "dog").await.unwrap().unwrap();
        assert_eq!(dog.original.as_deref(), Some("Dog"));
        assert_eq!(dog.display_word(), "Dog");
    }

    #[tokio::test]
    async fn reimport_updates_without_recounting() {
        let store = Store::open_in_memory().unwrap();
        let source = store.create_source("T", "en", SourceKind::Imported).await.unwrap();

        store.import_batch(&source.id, vec![entry("cat", "猫")]).await.unwrap();
        let inserted = store
            .import_batch(&source.id, vec![entry("cat", "貓"), entry("bird", "鸟")])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        let cat = store.entry(&source.id, "cat").await.unwrap().unwrap();
        assert_eq!(cat.translation, "貓");
        assert_eq!(store.source(&source.id).await.unwrap().unwrap().count, 2);
    }

    #[tokio::test]
    async fn insert_missing_keeps_existing_words() {
        let store = Store::open_in_memory().unwrap();
        let source = store.create_source("T", "en", SourceKind::Imported).await.unwrap();

        store.import_batch(&source.id, vec![entry("cat", "newer")]).await.unwrap();
        let inserted = store
            .insert_missing(&source.id, vec![entry("Cat", "older"), entry("dog", "狗")])
            .await
            .unwrap();

        assert_eq!(inserted, 1);
        let cat = store.entry(&source.id, "cat").await.unwrap().unwrap();
        assert_eq!(cat.translation, "newer");
        assert_eq!(cat.original, None);
        assert_eq!(store.source(&source.id).await.unwrap().unwrap().count, 2);
    }

    #[tokio::test]
    async fn import_into_missing_source_fails() {
        let store = Store::open_in_memory().unwrap();
        let err = store.import_batch("ghost", vec![entry("cat", "猫")]).await.unwrap_err();
        assert!(matches!(err, StoreError::SourceNotFound(_)));
    }

    #[tokio::test]
    async fn word_and_root_script_scans() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_source("A", "ko", SourceKind::Imported).await.unwrap();
        let b = store.create_source("B", "ko", SourceKind::Imported).await.unwrap();

        let school = entry("학교", "school")
            .with_metadata(EntryMetadata::default().with_root_script("學校"));
        store.import_batch(&a.id, vec![school]).await.unwrap();
        store.import_batch(&b.id, vec![entry("학교", "school (B)")]).await.unwrap();

        assert_eq!(store.entries_by_word("학교").await.unwrap().len(), 2);
        let by_root = store.entries_by_root_script("學校").await.unwrap();
        assert_eq!(by_root.len(), 1);
        assert_eq!(by_root[0].dict_id, a.id);
        assert_eq!(by_root[0].metadata.root_script.as_deref(), Some("學校"));
    }

    #[tokio::test]
    async fn delete_and_clear_remove_entries() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_source("A", "en", SourceKind::Imported).await.unwrap();
        let b = store.create_source("B", "en", SourceKind::Imported).await.unwrap();
        store.import_batch(&a.id, vec![entry("cat", "1"), entry("dog", "2")]).await.unwrap();
        store.import_batch(&b.id, vec![entry("cat", "3")]).await.unwrap();

        assert_eq!(store.clear_entries(&a.id).await.unwrap(), 2);
        let a_meta = store.source(&a.id).await.unwrap().unwrap();
        assert_eq!(a_meta.count, 0);
        assert_eq!(store.count_entries(&a.id).await.unwrap(), 0);

        store.delete_source(&b.id).await.unwrap();
        assert!(store.source(&b.id).await.unwrap().is_none());
        assert!(store.entries_by_word("cat").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bloom_from_store_knows_every_word() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_source("A", "en", SourceKind::Imported).await.unwrap();
        store.import_batch(&a.id, vec![entry("cat", "1"), entry("Dog", "2")]).await.unwrap();

        let bloom = store.build_bloom(4096).await.unwrap();
        assert!(bloom.test("cat"));
        assert!(bloom.test("dog"));
    }

    #[tokio::test]
    async fn pages_are_key_ordered() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_source("A", "en", SourceKind::Imported).await.unwrap();
        store
            .import_batch(&a.id, vec![entry("c", "3"), entry("a", "1"), entry("b", "2")])
            .await
            .unwrap();

        let page = store.entries_page(&a.id, 1, 5).await.unwrap();
        let words: Vec<_> = page.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["b", "c"]);
    }
}
