use lexi_core::{DictionarySource, MoveDirection, SourceKind, now_millis};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::{Result, StoreError};
use crate::Store;

const SOURCE_COLUMNS: &str = "id, name, language, priority, enabled, count, imported_at, kind";

pub(crate) fn source_from_row(row: &Row<'_>) -> rusqlite::Result<DictionarySource> {
    let kind: String = row.get(7)?;
    let kind = kind.parse::<SourceKind>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, Type::Text, e.into())
    })?;
    Ok(DictionarySource {
        id: row.get(0)?,
        name: row.get(1)?,
        language: row.get(2)?,
        priority: row.get(3)?,
        enabled: row.get(4)?,
        count: row.get::<_, i64>(5)?.max(0) as u64,
        imported_at: row.get(6)?,
        kind,
    })
}

/// Sources of one language in cascade order
pub(crate) fn sources_in(conn: &Connection, language: &str) -> rusqlite::Result<Vec<DictionarySource>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {SOURCE_COLUMNS} FROM dict_meta WHERE language = ?1 ORDER BY priority, rowid"
    ))?;
    let rows = stmt.query_map([language], source_from_row)?;
    rows.collect()
}

pub(crate) fn source_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<DictionarySource>> {
    conn.query_row(
        &format!("SELECT {SOURCE_COLUMNS} FROM dict_meta WHERE id = ?1"),
        [id],
        source_from_row,
    )
    .optional()
}

fn insert_source(
    conn: &Connection,
    id: &str,
    name: &str,
    language: &str,
    kind: SourceKind,
) -> rusqlite::Result<DictionarySource> {
    let priority: i64 = conn.query_row(
        "SELECT COALESCE(MAX(priority) + 1, 0) FROM dict_meta WHERE language = ?1",
        [language],
        |row| row.get(0),
    )?;
    let imported_at = now_millis();
    conn.execute(
        "INSERT INTO dict_meta (id, name, language, priority, enabled, count, imported_at, kind)
         VALUES (?1, ?2, ?3, ?4, 1, 0, ?5, ?6)",
        params![id, name, language, priority, imported_at, kind.as_str()],
    )?;
    Ok(DictionarySource {
        id: id.to_string(),
        name: name.to_string(),
        language: language.to_string(),
        priority,
        enabled: true,
        count: 0,
        imported_at,
        kind,
    })
}

impl Store {
    /// Append a source at the lowest precedence of its language
    pub async fn create_source(
        &self,
        name: &str,
        language: &str,
        kind: SourceKind,
    ) -> Result<DictionarySource> {
        let id = uuid::Uuid::new_v4().to_string();
        let (name, language) = (name.to_string(), language.to_string());
        self.call(move |conn| {
            let tx = conn.transaction()?;
            let source = insert_source(&tx, &id, &name, &language, kind)?;
            tx.commit()?;
            Ok(source)
        })
        .await
    }

    /// The USER source of `language`, created on first use
    pub async fn ensure_user_source(&self, language: &str) -> Result<DictionarySource> {
        let language = language.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            let id = DictionarySource::user_id(&language);
            let source = match source_by_id(&tx, &id)? {
                Some(source) => source,
                None => {
                    tracing::info!("Creating user dictionary for '{}'", language);
                    insert_source(&tx, &id, "User", &language, SourceKind::User)?
                }
            };
            tx.commit()?;
            Ok(source)
        })
        .await
    }

    pub async fn source(&self, id: &str) -> Result<Option<DictionarySource>> {
        let id = id.to_string();
        self.call(move |conn| Ok(source_by_id(conn, &id)?)).await
    }

    /// Sources of `language` ordered by priority, then insertion
    pub async fn sources(&self, language: &str) -> Result<Vec<DictionarySource>> {
        let language = language.to_string();
        self.call(move |conn| Ok(sources_in(conn, &language)?)).await
    }

    pub async fn all_sources(&self) -> Result<Vec<DictionarySource>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SOURCE_COLUMNS} FROM dict_meta ORDER BY language, priority, rowid"
            ))?;
            let rows = stmt.query_map([], source_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<DictionarySource> {
        let id = id.to_string();
        self.call(move |conn| {
            let updated = conn.execute(
                "UPDATE dict_meta SET enabled = ?2 WHERE id = ?1",
                params![id, enabled],
            )?;
            if updated == 0 {
                return Err(StoreError::SourceNotFound(id));
            }
            source_by_id(conn, &id)?.ok_or(StoreError::SourceNotFound(id))
        })
        .await
    }

    /// Swap the source with its neighbour and renumber the language densely.
    /// Returns the language's sources in their new order. Moving past either
    /// end only renumbers.
    pub async fn move_source(
        &self,
        id: &str,
        direction: MoveDirection,
    ) -> Result<Vec<DictionarySource>> {
        let id = id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            let source =
                source_by_id(&tx, &id)?.ok_or_else(|| StoreError::SourceNotFound(id.clone()))?;

            let mut ordered = sources_in(&tx, &source.language)?;
            if let Some(index) = ordered.iter().position(|s| s.id == id) {
                let neighbour = match direction {
                    MoveDirection::Up => index.checked_sub(1),
                    MoveDirection::Down => Some(index + 1).filter(|i| *i < ordered.len()),
                };
                if let Some(neighbour) = neighbour {
                    ordered.swap(index, neighbour);
                }
            }

            {
                let mut stmt = tx.prepare_cached("UPDATE dict_meta SET priority = ?2 WHERE id = ?1")?;
                for (priority, source) in ordered.iter_mut().enumerate() {
                    source.priority = priority as i64;
                    stmt.execute(params![source.id, source.priority])?;
                }
            }
            tx.commit()?;
            Ok(ordered)
        })
        .await
    }

    /// Remove the source and every entry it owns
    pub async fn delete_source(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            let removed_entries = tx.execute("DELETE FROM dict_entries WHERE dict_id = ?1", [&id])?;
            let removed = tx.execute("DELETE FROM dict_meta WHERE id = ?1", [&id])?;
            if removed == 0 {
                return Err(StoreError::SourceNotFound(id));
            }
            tx.commit()?;
            tracing::info!("Deleted source {} with {} entries", id, removed_entries);
            Ok(())
        })
        .await
    }

    /// Remove every entry of the source and reset its count
    pub async fn clear_entries(&self, id: &str) -> Result<u64> {
        let id = id.to_string();
        self.call(move |conn| {
            let tx = conn.transaction()?;
            let updated = tx.execute("UPDATE dict_meta SET count = 0 WHERE id = ?1", [&id])?;
            if updated == 0 {
                return Err(StoreError::SourceNotFound(id));
            }
            let removed = tx.execute("DELETE FROM dict_entries WHERE dict_id = ?1", [&id])?;
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
    async fn priorities_append_per_language() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_source("A", "en", SourceKind::Imported).await.unwrap();
        let b = store.create_source("B", "en", SourceKind::Imported).await.unwrap();
        let k = store.create_source("K", "ko", SourceKind::Imported).await.unwrap();

        assert_eq!((a.priority, b.priority, k.priority), (0, 1, 0));
        assert!(a.enabled);
        assert_eq!(a.count, 0);

        let names: Vec<_> = store
            .sources("en")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn user_source_is_created_once() {
        let store = Store::open_in_memory().unwrap();
        let first = store.ensure_user_source("en").await.unwrap();
        let second = store.ensure_user_source("en").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.id, "user:en");
        assert_eq!(first.kind, SourceKind::User);
        assert_eq!(store.sources("en").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn move_renumbers_densely() {
        let store = Store::open_in_memory().unwrap();
        let a = store.create_source("A", "en", SourceKind::Imported).await.unwrap();
        let b = store.create_source("B", "en", SourceKind::Imported).await.unwrap();
        let c = store.create_source("C", "en", SourceKind::Imported).await.unwrap();

        // leave a gap behind
        store.delete_source(&b.id).await.unwrap();
        let d = store.create_source("D", "en", SourceKind::Imported).await.unwrap();
        assert_eq!(d.priority, 3);

        let ordered = store.move_source(&d.id, MoveDirection::Up).await.unwrap();
        let view: Vec<_> = ordered.iter().map(|s| (s.name.as_str(), s.priority)).collect();
        assert_eq!(view, vec![("A", 0), ("D", 1), ("C", 2)]);

        let ordered = store.move_source(&a.id, MoveDirection::Up).await.unwrap();
        let view: Vec<_> = ordered.iter().map(|s| (s.name.as_str(), s.priority)).collect();
        assert_eq!(view, vec![("A", 0), ("D", 1), ("C", 2)]);

        let stored = store.source(&c.id).await.unwrap().unwrap();
        assert_eq!(stored.priority, 2);
    }

    #[tokio::test]
    async fn unknown_source_operations_fail() {
        let store = Store::open_in_memory().unwrap();
        assert!(matches!(
            store.set_enabled("nope", false).await,
            Err(StoreError::SourceNotFound(_))
        ));
        assert!(matches!(
            store.move_source("nope", MoveDirection::Down).await,
            Err(StoreError::SourceNotFound(_))
        ));
        assert!(matches!(
            store.clear_entries("nope").await,
            Err(StoreError::SourceNotFound(_))
        ));
        assert!(store.source("nope").await.unwrap().is_none());
    }
}
