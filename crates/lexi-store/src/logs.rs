use lexi_core::{StudyKind, StudyLog, UserProfile};
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use crate::error::Result;
use crate::Store;

const LOG_COLUMNS: &str = "id, user_id, kind, language, score, duration, timestamp";

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<StudyLog> {
    let kind: String = row.get(2)?;
    let kind = kind
        .parse::<StudyKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, e.into()))?;
    Ok(StudyLog {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind,
        language: row.get(3)?,
        score: row.get(4)?,
        duration: row.get::<_, i64>(5)?.max(0) as u64,
        timestamp: row.get(6)?,
    })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserProfile> {
    Ok(UserProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        native_language: row.get(2)?,
        target_language: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl Store {
    /// Study logs are append-only; an existing id is an error
    pub async fn append_study_log(&self, log: StudyLog) -> Result<()> {
        self.call(move |conn| {
            conn.execute(
                &format!("INSERT INTO study_logs ({LOG_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                params![
                    log.id,
                    log.user_id,
                    log.kind.as_str(),
                    log.language,
                    log.score,
                    log.duration as i64,
                    log.timestamp
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn study_logs_for_user(&self, user_id: &str) -> Result<Vec<StudyLog>> {
        let user_id = user_id.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {LOG_COLUMNS} FROM study_logs WHERE user_id = ?1 ORDER BY timestamp, rowid"
            ))?;
            let rows = stmt.query_map([&user_id], log_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    pub async fn study_logs_for_language(&self, language: &str) -> Result<Vec<StudyLog>> {
        let language = language.to_string();
        self.call(move |conn| {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT {LOG_COLUMNS} FROM study_logs WHERE language = ?1 ORDER BY timestamp, rowid"
            ))?;
            let rows = stmt.query_map([&language], log_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    pub async fn put_user(&self, user: UserProfile) -> Result<()> {
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, name, native_language, target_language, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    native_language = excluded.native_language,
                    target_language = excluded.target_language",
                params![
                    user.id,
                    user.name,
                    user.native_language,
                    user.target_language,
                    user.created_at
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserProfile>> {
        let id = id.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row(
                    "SELECT id, name, native_language, target_language, created_at
                     FROM users WHERE id = ?1",
                    [&id],
                    user_from_row,
                )
                .optional()?)
        })
        .await
    }

    /// Cache a data URI (or blob reference) under `key`
    pub async fn put_audio(&self, key: &str, data: &str) -> Result<()> {
        let (key, data) = (key.to_string(), data.to_string());
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO audio_cache (key, data) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET data = excluded.data",
                [&key, &data],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_audio(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.call(move |conn| {
            Ok(conn
                .query_row("SELECT data FROM audio_cache WHERE key = ?1", [&key], |row| {
                    row.get(0)
                })
                .optional()?)
        })
        .await
    }
}
