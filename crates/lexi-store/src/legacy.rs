use rusqlite::params;

use crate::error::Result;
use crate::{CURRENT_SCHEMA_VERSION, Store};

/// Row of the pre-hub single-table dictionary
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyEntry {
    pub word: String,
    pub language: String,
    pub translation: String,
    /// Raw JSON as written by the old schema, if any
    pub metadata: Option<String>,
}

impl Store {
    pub async fn legacy_entries(&self) -> Result<Vec<LegacyEntry>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT word, language, translation, metadata FROM legacy_dictionary
                 ORDER BY language, rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(LegacyEntry {
                    word: row.get(0)?,
                    language: row.get(1)?,
                    translation: row.get(2)?,
                    metadata: row.get(3)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    /// Write rows in the old single-table layout (restoring old backups)
    pub async fn insert_legacy_entries(&self, entries: Vec<LegacyEntry>) -> Result<()> {
        self.call(move |conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO legacy_dictionary (word, language, translation, metadata)
                     VALUES (?1, ?2, ?3, ?4)",
                )?;
                for entry in &entries {
                    stmt.execute(params![
                        entry.word,
                        entry.language,
                        entry.translation,
                        entry.metadata
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Drop migrated legacy rows and stamp the current schema version
    pub async fn finish_legacy_migration(&self) -> Result<u64> {
        self.call(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute("DELETE FROM legacy_dictionary", [])?;
            tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
            tx.commit()?;
            Ok(removed as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn legacy_rows_roundtrip_and_finish() {
        let store = Store::open_in_memory().unwrap();
        let row = LegacyEntry {
            word: "cat".into(),
            language: "en".into(),
            translation: "猫".into(),
            metadata: None,
        };
        store.insert_legacy_entries(vec![row.clone()]).await.unwrap();
        assert_eq!(store.legacy_entries().await.unwrap(), vec![row]);

        assert_eq!(store.finish_legacy_migration().await.unwrap(), 1);
        assert!(store.legacy_entries().await.unwrap().is_empty());
        assert_eq!(store.schema_version().await.unwrap(), CURRENT_SCHEMA_VERSION);
    }
}
