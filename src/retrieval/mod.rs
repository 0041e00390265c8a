//! Table retrieval
//!
//! Semantic search through the vector store is tried first. Keyword search
//! in the catalog is the fallback whenever embedding fails, the vector store
//! fails, or the vector store has nothing to offer. Only a failure of both
//! paths reaches the caller.

use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::meta::SchemaStore;
use crate::models::Table;
use crate::store::VectorStore;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which path produced a retrieval result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalSource {
    Semantic,
    Keyword,
}

impl fmt::Display for RetrievalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalSource::Semantic => write!(f, "semantic"),
            RetrievalSource::Keyword => write!(f, "keyword"),
        }
    }
}

/// Ranked tables plus the path that found them
#[derive(Debug, Clone, Serialize)]
pub struct Retrieval {
    pub tables: Vec<Table>,
    pub source: RetrievalSource,
}

pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    vectors: Arc<dyn VectorStore>,
    store: Arc<dyn SchemaStore>,
}

impl RetrievalEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        vectors: Arc<dyn VectorStore>,
        store: Arc<dyn SchemaStore>,
    ) -> Self {
        Self {
            embedder,
            vectors,
            store,
        }
    }

    /// Tables relevant to `phrase`, best first, at most `top_k`
    pub async fn retrieve(&self, phrase: &str, top_k: usize) -> Result<Retrieval> {
        let semantic_failure = match self.semantic(phrase, top_k).await {
            Ok(tables) if !tables.is_empty() => {
                debug!("Semantic search returned {} tables", tables.len());
                return Ok(Retrieval {
                    tables,
                    source: RetrievalSource::Semantic,
                });
            }
            Ok(_) => {
                warn!("Semantic search returned no tables, falling back to keyword search");
                "no results".to_string()
            }
            Err(e) => {
                warn!("Semantic search failed, falling back to keyword search: {}", e);
                e.to_string()
            }
        };

        match self.store.search_tables(phrase, top_k, 0).await {
            Ok(tables) => {
                debug!("Keyword search returned {} tables", tables.len());
                Ok(Retrieval {
                    tables,
                    source: RetrievalSource::Keyword,
                })
            }
            Err(e) => Err(Error::Retrieval(format!(
                "semantic: {}; keyword: {}",
                semantic_failure, e
            ))),
        }
    }

    async fn semantic(&self, phrase: &str, top_k: usize) -> Result<Vec<Table>> {
        let vector = self.embedder.embed(phrase).await?;
        self.vectors.search_tables(vector, top_k).await
    }
}
