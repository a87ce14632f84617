//! SQLite-backed persistent store.
//!
//! One connection guarded by a mutex; every public operation is `async` and
//! runs its SQL on the blocking pool, so callers on the runtime never block.
//! Writes that belong together (one import batch, one reorder) run in a
//! single transaction.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

mod entries;
pub mod error;
mod legacy;
mod logs;
mod sources;

pub use error::{Result, StoreError};
pub use legacy::LegacyEntry;

/// Schema version written once the legacy single-table data has been moved
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dict_meta (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    language    TEXT NOT NULL,
    priority    INTEGER NOT NULL,
    enabled     INTEGER NOT NULL DEFAULT 1,
    count       INTEGER NOT NULL DEFAULT 0,
    imported_at INTEGER NOT NULL,
    kind        TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS dict_meta_language ON dict_meta(language);

CREATE TABLE IF NOT EXISTS dict_entries (
    dict_id     TEXT NOT NULL,
    word        TEXT NOT NULL,
    original    TEXT,
    translation TEXT NOT NULL,
    metadata    TEXT NOT NULL DEFAULT '{}',
    audio_path  TEXT,
    root_script TEXT,
    PRIMARY KEY (dict_id, word)
);
CREATE INDEX IF NOT EXISTS dict_entries_word ON dict_entries(word);
CREATE INDEX IF NOT EXISTS dict_entries_dict_id ON dict_entries(dict_id);
CREATE INDEX IF NOT EXISTS dict_entries_root_script ON dict_entries(root_script);

CREATE TABLE IF NOT EXISTS study_logs (
    id        TEXT PRIMARY KEY,
    user_id   TEXT,
    kind      TEXT NOT NULL,
    language  TEXT NOT NULL,
    score     REAL NOT NULL,
    duration  INTEGER NOT NULL,
    timestamp INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS study_logs_user_id ON study_logs(user_id);
CREATE INDEX IF NOT EXISTS study_logs_language ON study_logs(language);

CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    native_language TEXT NOT NULL,
    target_language TEXT NOT NULL,
    created_at      INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS audio_cache (
    key  TEXT PRIMARY KEY,
    data TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS legacy_dictionary (
    word        TEXT NOT NULL,
    language    TEXT NOT NULL,
    translation TEXT NOT NULL,
    metadata    TEXT
);
";

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening store at {}", path.display());
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn call<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut guard)
        })
        .await?
    }

    pub async fn schema_version(&self) -> Result<i64> {
        self.call(|conn| Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?))
            .await
    }

    pub async fn set_schema_version(&self, version: i64) -> Result<()> {
        self.call(move |conn| Ok(conn.pragma_update(None, "user_version", version)?))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_store_starts_at_version_zero() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.schema_version().await.unwrap(), 0);

        store.set_schema_version(CURRENT_SCHEMA_VERSION).await.unwrap();
        assert_eq!(store.schema_version().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexi.sqlite3");

        {
            let store = Store::open(&path).unwrap();
            store.set_schema_version(7).await.unwrap();
        }

        let store = Store::open(&path).unwrap();
        assert_eq!(store.schema_version().await.unwrap(), 7);
    }
}
