//! Embedding generation
//!
//! This module provides an abstraction over embedding providers with:
//! - A trait implemented once per backend, selected at configuration time
//! - A shared retry policy for transient provider failures
//! - Tolerant decoding of the response shapes providers return

mod http_backend;
mod huggingface;
mod openai;
pub mod retry;

pub use http_backend::HttpEmbedder;
pub use huggingface::HuggingFaceEmbedder;
pub use openai::OpenAiEmbedder;
pub use retry::{AttemptError, RetryPolicy};

use crate::config::{EmbeddingConfig, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::models::Table;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed the textual rendering of a table
    async fn embed_table(&self, table: &Table) -> Result<Vec<f32>> {
        self.embed(&table.embedding_text()).await
    }

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProvider::Http => Arc::new(HttpEmbedder::new(config)?),
        EmbeddingProvider::OpenAi | EmbeddingProvider::Qwen => Arc::new(OpenAiEmbedder::new(config)?),
        EmbeddingProvider::HuggingFace => Arc::new(HuggingFaceEmbedder::new(config)?),
    };
    Ok(embedder)
}

/// HTTP client for provider calls. Deadlines are enforced per attempt by
/// [`RetryPolicy`], this timeout only backs them up.
fn http_client(config: &EmbeddingConfig) -> Result<reqwest::Client> {
    let timeout = config.attempt_timeout() + Duration::from_secs(5);
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Response bodies seen across providers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Embeddings { embeddings: Vec<Vec<f32>> },
    Vectors { vectors: Vec<Vec<f32>> },
    Data { data: Vec<EmbeddingData> },
    Single { embedding: Vec<f32> },
    Records(Vec<EmbeddingData>),
    Nested(Vec<Vec<f32>>),
    Flat(Vec<f32>),
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_embeddings(self) -> Vec<Vec<f32>> {
        match self {
            EmbeddingResponse::Embeddings { embeddings } => embeddings,
            EmbeddingResponse::Vectors { vectors } => vectors,
            EmbeddingResponse::Data { data } | EmbeddingResponse::Records(data) => {
                data.into_iter().map(|d| d.embedding).collect()
            }
            EmbeddingResponse::Single { embedding } | EmbeddingResponse::Flat(embedding) => {
                vec![embedding]
            }
            EmbeddingResponse::Nested(vectors) => vectors,
        }
    }

    /// The first vector, which must be non-empty and of the expected size
    fn into_first(self, model: &str, dimension: usize) -> Result<Vec<f32>> {
        let vector = self
            .into_embeddings()
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Embedding(format!("No embedding returned by '{}'", model)))?;

        if vector.len() != dimension {
            return Err(Error::Embedding(format!(
                "Embedding dimension mismatch for model '{}': expected {}, got {}",
                model,
                dimension,
                vector.len()
            )));
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &str) -> Vec<Vec<f32>> {
        serde_json::from_str::<EmbeddingResponse>(body)
            .unwrap()
            .into_embeddings()
    }

    #[test]
    fn test_response_shapes() {
        assert_eq!(decode(r#"{"data": [{"embedding": [1.0, 2.0], "index": 0}]}"#), vec![vec![1.0, 2.0]]);
        assert_eq!(decode(r#"{"embedding": [0.5]}"#), vec![vec![0.5]]);
        assert_eq!(decode(r#"[{"embedding": [0.5]}]"#), vec![vec![0.5]]);
        assert_eq!(decode(r#"[[0.1, 0.2]]"#), vec![vec![0.1, 0.2]]);
        assert_eq!(decode(r#"[0.1, 0.2]"#), vec![vec![0.1, 0.2]]);
        assert_eq!(decode(r#"{"embeddings": [[3.0]]}"#), vec![vec![3.0]]);
    }

    #[test]
    fn test_first_vector_checks_dimension() {
        let response: EmbeddingResponse = serde_json::from_str("[[0.1, 0.2]]").unwrap();
        assert!(response.clone().into_first("m", 2).is_ok());
        assert!(matches!(response.into_first("m", 3), Err(Error::Embedding(_))));

        let empty: EmbeddingResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(empty.into_first("m", 2).is_err());
    }

    #[test]
    fn test_factory_selects_backend() {
        let mut config = EmbeddingConfig::default();
        for (provider, model) in [
            (EmbeddingProvider::Http, "BAAI/bge-small-en-v1.5"),
            (EmbeddingProvider::OpenAi, "text-embedding-3-small"),
            (EmbeddingProvider::Qwen, "text-embedding-v1"),
            (EmbeddingProvider::HuggingFace, "sentence-transformers/all-MiniLM-L6-v2"),
        ] {
            config.provider = provider;
            config.model = model.to_string();
            let embedder = create_embedder(&config).unwrap();
            assert_eq!(embedder.model_name(), model);
            assert_eq!(embedder.dimension(), config.resolved_dimension());
        }
    }
}
