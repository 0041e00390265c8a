//! In-process collaborators for unit tests

use crate::app::AppContext;
use crate::config::Config;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::llm::Generator;
use crate::meta::{clamp_limit, SchemaStore};
use crate::models::{Query, Table};
use crate::store::VectorStore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Table and query records kept in memory
#[derive(Default)]
pub struct MemorySchemaStore {
    tables: Mutex<Vec<Table>>,
    queries: Mutex<Vec<Query>>,
    fail_search: bool,
}

impl MemorySchemaStore {
    pub fn with_tables(tables: Vec<Table>) -> Self {
        Self {
            tables: Mutex::new(tables),
            ..Default::default()
        }
    }

    /// Store whose keyword search always errors
    pub fn failing_search() -> Self {
        Self {
            fail_search: true,
            ..Default::default()
        }
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables
            .lock()
            .unwrap()
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }
}

#[async_trait]
impl SchemaStore for MemorySchemaStore {
    async fn get_table(&self, name: &str) -> Result<Table> {
        self.tables
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    async fn list_tables(&self, limit: usize, offset: usize) -> Result<Vec<Table>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .iter()
            .skip(offset)
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }

    async fn search_tables(&self, keyword: &str, limit: usize, offset: usize) -> Result<Vec<Table>> {
        if self.fail_search {
            return Err(Error::InvalidInput("search disabled".to_string()));
        }
        let needle = keyword.to_lowercase();
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .iter()
            .filter(|t| {
                needle
                    .split_whitespace()
                    .any(|w| t.name.to_lowercase().contains(w) || t.description.to_lowercase().contains(w))
            })
            .skip(offset)
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }

    async fn create_table(&self, table: &Table) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        if tables.iter().any(|t| t.name == table.name) {
            return Err(Error::TableExists(table.name.clone()));
        }
        tables.push(table.clone());
        Ok(())
    }

    async fn update_table(&self, table: &Table) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables
            .iter_mut()
            .find(|t| t.name == table.name)
            .ok_or_else(|| Error::TableNotFound(table.name.clone()))?;
        existing.description = table.description.clone();
        existing.columns = table.columns.clone();
        Ok(())
    }

    async fn delete_table(&self, name: &str) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.len();
        tables.retain(|t| t.name != name);
        if tables.len() == before {
            return Err(Error::TableNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn create_query(&self, query: &Query) -> Result<()> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(())
    }

    async fn get_query(&self, id: &str) -> Result<Query> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| Error::QueryNotFound(id.to_string()))
    }

    async fn list_queries(&self, limit: usize, offset: usize) -> Result<Vec<Query>> {
        let queries = self.queries.lock().unwrap();
        Ok(queries
            .iter()
            .rev()
            .skip(offset)
            .take(clamp_limit(limit))
            .cloned()
            .collect())
    }
}

/// Embedder returning a constant vector, or failing every call
pub struct FakeEmbedder {
    vector: Option<Vec<f32>>,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vector.clone().ok_or_else(|| Error::RetriesExhausted {
            attempts: 3,
            last_error: "HTTP 503: model is loading".to_string(),
        })
    }

    fn dimension(&self) -> usize {
        self.vector.as_ref().map_or(3, Vec::len)
    }

    fn model_name(&self) -> &str {
        "fake-embedder"
    }
}

/// Vector store answering every search with a fixed hit list
#[derive(Default)]
pub struct FakeVectorStore {
    hits: Vec<Table>,
    fail: bool,
    indexed: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeVectorStore {
    pub fn with_hits(hits: Vec<Table>) -> Self {
        Self {
            hits,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn indexed(&self) -> Vec<String> {
        self.indexed.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for FakeVectorStore {
    async fn index_table(&self, table: &Table, _vector: Vec<f32>) -> Result<()> {
        if self.fail {
            return Err(Error::Qdrant("connection refused".to_string()));
        }
        self.indexed.lock().unwrap().push(table.name.clone());
        Ok(())
    }

    async fn search_tables(&self, _vector: Vec<f32>, top_k: usize) -> Result<Vec<Table>> {
        if self.fail {
            return Err(Error::Qdrant("connection refused".to_string()));
        }
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }

    async fn delete_table_vectors(&self, name: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Qdrant("connection refused".to_string()));
        }
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

/// Generator replying with a canned completion and recording prompts
pub struct FakeGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    async fn complete(&self, prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| Error::Generation("API request failed with status 500".to_string()))
    }

    fn model_name(&self) -> &str {
        "fake-generator"
    }
}

/// Collaborators handed to an [`AppContext`], kept for assertions
pub struct Fakes {
    pub store: Arc<MemorySchemaStore>,
    pub vectors: Arc<FakeVectorStore>,
    pub embedder: Arc<FakeEmbedder>,
    pub generator: Arc<FakeGenerator>,
}

impl Fakes {
    pub fn new(store: MemorySchemaStore, vectors: FakeVectorStore, embedder: FakeEmbedder, generator: FakeGenerator) -> Self {
        Self {
            store: Arc::new(store),
            vectors: Arc::new(vectors),
            embedder: Arc::new(embedder),
            generator: Arc::new(generator),
        }
    }

    pub fn context(&self) -> AppContext {
        AppContext::new(
            Config::default(),
            self.store.clone(),
            self.vectors.clone(),
            self.embedder.clone(),
            self.generator.clone(),
        )
    }
}
