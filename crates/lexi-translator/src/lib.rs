use lexi_core::EntryMetadata;

mod http;

pub use http::HttpDefiner;

/// Source of definitions for words no dictionary knows
#[async_trait::async_trait]
pub trait Definer: Send + Sync {
    /// Define `word` as used in `context` (the surrounding sentence, may be empty)
    async fn define(
        &self,
        word: &str,
        context: &str,
        language: &str,
    ) -> Result<Definition, DefineError>;

    /// Provider metadata
    fn metadata(&self) -> DefinerMetadata;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub translation: String,
    pub metadata: EntryMetadata,
    /// Provider name, for display next to the definition
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct DefinerMetadata {
    pub name: String,
    pub requires_api_key: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DefineError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication error")]
    AuthenticationError,

    #[error("No definition returned for '{0}'")]
    Empty(String),
}
