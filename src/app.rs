//! Collaborator bundle constructed once per process and handed to the
//! retrieval and generation layers.

use crate::config::Config;
use crate::context::ContextAssembler;
use crate::embed::{create_embedder, Embedder};
use crate::error::Result;
use crate::generate::SqlGenerator;
use crate::llm::{create_generator, Generator};
use crate::meta::SchemaStore;
use crate::retrieval::RetrievalEngine;
use crate::store::VectorStore;
use std::sync::Arc;

/// Shared handles for one invocation. The caller owns their lifecycle.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn SchemaStore>,
    pub vectors: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
}

impl AppContext {
    pub fn new(
        config: Config,
        store: Arc<dyn SchemaStore>,
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            config,
            store,
            vectors,
            embedder,
            generator,
        }
    }

    /// Build the provider backends from configuration around existing stores
    pub fn with_stores(
        config: Config,
        store: Arc<dyn SchemaStore>,
        vectors: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let generator = create_generator(&config.llm)?;
        Ok(Self::new(config, store, vectors, embedder, generator))
    }

    pub fn retrieval(&self) -> RetrievalEngine {
        RetrievalEngine::new(
            self.embedder.clone(),
            self.vectors.clone(),
            self.store.clone(),
        )
    }

    pub fn sql_generator(&self) -> SqlGenerator {
        SqlGenerator::new(
            self.store.clone(),
            self.retrieval(),
            self.generator.clone(),
            ContextAssembler::new(self.config.context.max_chars),
        )
        .with_top_k(self.config.retrieval.top_k)
        .with_sampling(self.config.llm.max_tokens, self.config.llm.temperature)
    }
}
