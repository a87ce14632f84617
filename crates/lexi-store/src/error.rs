#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Storage connection poisoned by an earlier panic")]
    Poisoned,

    #[error("Dictionary source not found: {0}")]
    SourceNotFound(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
