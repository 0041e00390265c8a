//! Status command implementation

use crate::config::Config;
use crate::error::Result;
use crate::meta::{CatalogStats, MetaDb};
use crate::store::QdrantStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub qdrant_url: String,
    pub collection_name: String,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub llm_model: String,
    pub qdrant_connected: bool,
    pub collection_exists: bool,
    pub qdrant_points: u64,
    pub db_stats: CatalogStats,
}

/// Get system status
pub async fn cmd_status(config: &Config, db: &MetaDb, store: &QdrantStore) -> Result<StatusInfo> {
    info!("Getting status");

    let db_stats = db.get_stats().await?;

    let (qdrant_connected, collection_exists, qdrant_points) = match store.get_collection_info().await {
        Ok(Some(info)) => (true, true, info.points_count),
        Ok(None) => (true, false, 0),
        Err(e) => {
            debug!("Qdrant connection error: {:?}", e);
            (false, false, 0)
        }
    };

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        qdrant_url: config.qdrant_url.clone(),
        collection_name: config.collection_name.clone(),
        embedding_provider: config.embedding.provider.to_string(),
        embedding_model: config.embedding.model.clone(),
        llm_model: config.llm.model.clone(),
        qdrant_connected,
        collection_exists,
        qdrant_points,
        db_stats,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 sqlbot Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("\nQdrant:");
    println!("  URL: {}", status.qdrant_url);
    println!("  Collection: {}", status.collection_name);

    let connection_status = if status.qdrant_connected {
        if status.collection_exists {
            "✓ Connected"
        } else {
            "⚠ Connected (collection not created - run 'sqlbot db init' to create)"
        }
    } else {
        "✗ Not connected (keyword search only)"
    };
    println!("  Status: {}", connection_status);
    println!("  Points: {}", status.qdrant_points);
    println!(
        "\nEmbedding: {} ({})",
        status.embedding_model, status.embedding_provider
    );
    println!("Generation: {}", status.llm_model);
    println!("\nCatalog:");
    println!("  Tables: {}", status.db_stats.table_count);
    println!("  Columns: {}", status.db_stats.column_count);
    println!("  Queries: {}", status.db_stats.query_count);
}
