//! Custom error types for sqlbot

use thiserror::Error;

/// Main error type for sqlbot operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Qdrant error: {0}")]
    Qdrant(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Embedding failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Semantic and keyword search both failed: {0}")]
    Retrieval(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Query not found: {0}")]
    QueryNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not initialized: run 'sqlbot init' first")]
    NotInitialized,
}

impl Error {
    /// True for lookups by name or id that did not resolve
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::TableNotFound(_) | Error::QueryNotFound(_))
    }
}

/// Result type alias for sqlbot
pub type Result<T> = std::result::Result<T, Error>;

/// Convert qdrant errors
impl From<qdrant_client::QdrantError> for Error {
    fn from(err: qdrant_client::QdrantError) -> Self {
        Error::Qdrant(err.to_string())
    }
}
