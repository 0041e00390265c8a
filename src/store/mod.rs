//! Qdrant vector database integration
//!
//! This module wraps the Qdrant client and provides:
//! - Collection management
//! - One point per table, keyed by table name
//! - Nearest-neighbour search returning table records

mod payload;

pub use payload::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::Table;
use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, GetCollectionInfoResponse, PointId,
    SearchPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Vector index over table records
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace the vector for a table
    async fn index_table(&self, table: &Table, vector: Vec<f32>) -> Result<()>;

    /// Nearest tables to `vector`, best first
    async fn search_tables(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<Table>>;

    /// Remove the vector stored for a table name
    async fn delete_table_vectors(&self, name: &str) -> Result<()>;
}

/// Information about a Qdrant collection
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
    pub indexed_vectors_count: u64,
    pub status: String,
}

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
}

impl QdrantStore {
    /// Connect to Qdrant using config
    pub fn connect(config: &Config) -> Result<Self> {
        Self::new(
            &config.qdrant_url,
            &config.collection_name,
            config.embedding.resolved_dimension(),
            config.qdrant_api_key(),
        )
    }

    /// Create a new store handle directly with URL and collection name.
    /// No request is made until the first operation.
    pub fn new(
        url: &str,
        collection: &str,
        dimension: usize,
        api_key: Option<String>,
    ) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let client = Qdrant::from_url(url)
            .api_key(api_key)
            .skip_compatibility_check()
            .build()
            .map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
            dimension,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Get the expected vector dimension for this store
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Ensure the collection exists with correct configuration
    pub async fn ensure_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            debug!("Collection {} already exists", self.collection);

            let info = self.client.collection_info(&self.collection).await?;
            if let Some(size) = vector_size(&info) {
                if size as usize != self.dimension {
                    return Err(Error::Qdrant(format!(
                        "Collection '{}' has vector size {}, but the embedding model produces {}. Remediation: set a new collection name or run 'sqlbot db reset' and reindex.",
                        self.collection, size, self.dimension
                    )));
                }
            }
            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            self.collection, self.dimension
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                ),
            )
            .await?;

        info!("Collection {} created successfully", self.collection);
        Ok(())
    }

    /// Reset the collection (delete and recreate)
    pub async fn reset_collection(&self) -> Result<()> {
        if self.client.collection_exists(&self.collection).await? {
            info!("Deleting existing collection {}", self.collection);
            self.client.delete_collection(&self.collection).await?;
        }

        self.ensure_collection().await
    }

    /// Get collection info (point count, etc)
    pub async fn get_collection_info(&self) -> Result<Option<CollectionInfo>> {
        if !self.client.collection_exists(&self.collection).await? {
            return Ok(None);
        }

        let info = self.client.collection_info(&self.collection).await?;
        Ok(info.result.map(|result| CollectionInfo {
            points_count: result.points_count.unwrap_or(0),
            indexed_vectors_count: result.indexed_vectors_count.unwrap_or(0),
            status: format!("{:?}", result.status()),
        }))
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(Error::Qdrant(format!(
                "Vector dimension mismatch for collection '{}': expected {}, got {}",
                self.collection,
                self.dimension,
                vector.len()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn index_table(&self, table: &Table, vector: Vec<f32>) -> Result<()> {
        self.check_dimension(&vector)?;

        let point = TablePoint::new(table, vector)?;
        debug!(
            "Upserting point {} for table {} to collection {}",
            point.id, table.name, self.collection
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(
                &self.collection,
                vec![point.to_point_struct()],
            ))
            .await?;
        Ok(())
    }

    async fn search_tables(&self, vector: Vec<f32>, top_k: usize) -> Result<Vec<Table>> {
        self.check_dimension(&vector)?;
        debug!(
            "Searching collection {} with limit {}",
            self.collection, top_k
        );

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, vector, top_k as u64).with_payload(true),
            )
            .await?;

        let tables = response
            .result
            .into_iter()
            .filter_map(|point| {
                let map: Map<String, Value> = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_from_qdrant_value(v)))
                    .collect();
                match TablePayload::table_from_map(&map) {
                    Ok(table) => Some(table),
                    Err(e) => {
                        warn!("Skipping undecodable search hit: {}", e);
                        None
                    }
                }
            })
            .collect();

        Ok(tables)
    }

    async fn delete_table_vectors(&self, name: &str) -> Result<()> {
        let id = table_point_id(name);
        debug!("Deleting point {} for table {}", id, name);

        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(vec![PointId::from(id.to_string())]),
            )
            .await?;
        Ok(())
    }
}

fn vector_size(info: &GetCollectionInfoResponse) -> Option<u64> {
    let result = info.result.as_ref()?;
    let config = result.config.as_ref()?;
    let params = config.params.as_ref()?;
    let vectors_config = params.vectors_config.as_ref()?;

    match vectors_config.config.as_ref()? {
        qdrant_client::qdrant::vectors_config::Config::Params(params) => Some(params.size),
        qdrant_client::qdrant::vectors_config::Config::ParamsMap(map) => {
            map.map.values().next().map(|params| params.size)
        }
    }
}
