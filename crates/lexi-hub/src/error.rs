use lexi_parser::ParseError;
use lexi_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("Storage error: {0}")]
    Store(StoreError),

    #[error("Import error: {0}")]
    Parse(#[from] ParseError),

    #[error("Dictionary source not found: {0}")]
    SourceNotFound(String),

    #[error("User dictionary '{0}' cannot be deleted, only cleared")]
    UserSourceNotDeletable(String),

    #[error("Nothing to save: the word is empty")]
    EmptyWord,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Import task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<StoreError> for HubError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SourceNotFound(id) => HubError::SourceNotFound(id),
            other => HubError::Store(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, HubError>;
