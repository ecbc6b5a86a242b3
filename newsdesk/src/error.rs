use thiserror::Error;

/// Failures surfaced by the article store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid article data: missing url")]
    InvalidArticle,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt article file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

/// Failures of a single feed retrieval. These never leave the fetcher:
/// they are logged and the source yields zero items for the cycle.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed fetch failed with status: {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to parse feed: {0}")]
    Parse(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
