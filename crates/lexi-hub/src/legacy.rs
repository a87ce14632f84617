use std::collections::BTreeMap;

use lexi_core::{EntryMetadata, NewEntry};
use lexi_store::{CURRENT_SCHEMA_VERSION, LegacyEntry};
use serde_json::Value;

use crate::error::Result;
use crate::hub::DictionaryHub;
use crate::language_key;

/// Best-effort read of a metadata blob written by the old schema. Known keys
/// go through the validating constructors; anything else becomes a note.
fn legacy_metadata(raw: Option<&str>) -> EntryMetadata {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return EntryMetadata::default();
    };
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) else {
        return EntryMetadata::default().with_note(raw);
    };

    let mut metadata = EntryMetadata::from_pairs(
        map.iter()
            .filter_map(|(key, value)| value.as_str().map(|v| (key.as_str(), v))),
    );
    if let Some(Value::Array(notes)) = map.get("notes") {
        for note in notes.iter().filter_map(Value::as_str) {
            metadata = metadata.with_note(note);
        }
    }
    metadata
}

fn to_new_entry(row: &LegacyEntry) -> NewEntry {
    NewEntry::new(&row.word, row.translation.trim())
        .with_metadata(legacy_metadata(row.metadata.as_deref()))
}

impl DictionaryHub {
    /// Move rows of the pre-hub single-table layout into each language's USER
    /// source, then stamp the schema version. Words the USER source already
    /// holds keep their definition. Runs once; later calls return 0.
    pub async fn migrate_legacy(&self) -> Result<u64> {
        let version = self.store.schema_version().await?;
        if version >= CURRENT_SCHEMA_VERSION {
            return Ok(0);
        }

        let rows = self.store.legacy_entries().await?;
        let mut by_language: BTreeMap<String, Vec<NewEntry>> = BTreeMap::new();
        for row in &rows {
            let entry = to_new_entry(row);
            if entry.has_word() {
                by_language.entry(language_key(&row.language)).or_default().push(entry);
            }
        }

        let mut migrated = 0u64;
        for (language, entries) in by_language {
            let user = self.ensure_user_source(&language).await?;
            let batch_size = self.config.batch_size.max(1);
            let mut entries = entries.into_iter().peekable();
            while entries.peek().is_some() {
                let batch: Vec<NewEntry> = entries.by_ref().take(batch_size).collect();
                migrated += self.insert_missing(&user.id, batch).await?;
            }
            tracing::info!("Migrated legacy '{}' entries into {}", language, user.id);
        }

        let dropped = self.store.finish_legacy_migration().await?;
        tracing::info!(
            "Legacy migration done: {} of {} rows moved, schema at version {}",
            migrated,
            dropped,
            CURRENT_SCHEMA_VERSION
        );
        Ok(migrated)
    }
}
