//! Catalog writes that keep the vector index in step with the store
//!
//! The store write decides success. Embedding and indexing happen afterwards
//! and only log a warning when they fail; `sqlbot reindex` repairs the gap.

use crate::app::AppContext;
use crate::error::{Error, Result};
use crate::models::Table;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Ingestion statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub tables_parsed: usize,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub indexed: usize,
    pub index_failures: usize,
    /// One line per table that could not be stored
    pub errors: Vec<String>,
}

/// Embed and index one table. Returns whether the vector was written.
pub async fn index_table(ctx: &AppContext, table: &Table) -> bool {
    let vector = match ctx.embedder.embed_table(table).await {
        Ok(vector) => vector,
        Err(e) => {
            warn!("Failed to embed table '{}': {}", table.name, e);
            return false;
        }
    };

    match ctx.vectors.index_table(table, vector).await {
        Ok(()) => {
            debug!("Indexed table '{}'", table.name);
            true
        }
        Err(e) => {
            warn!("Failed to index table '{}': {}", table.name, e);
            false
        }
    }
}

/// Store a new table and index it
pub async fn cmd_create_table(ctx: &AppContext, table: &Table) -> Result<bool> {
    ctx.store.create_table(table).await?;
    info!("Created table '{}'", table.name);
    Ok(index_table(ctx, table).await)
}

/// Replace an existing table and re-index it
pub async fn cmd_update_table(ctx: &AppContext, table: &Table) -> Result<bool> {
    ctx.store.update_table(table).await?;
    info!("Updated table '{}'", table.name);

    if let Err(e) = ctx.vectors.delete_table_vectors(&table.name).await {
        warn!("Failed to delete old vectors for '{}': {}", table.name, e);
    }
    Ok(index_table(ctx, table).await)
}

/// Remove a table and its vectors
pub async fn cmd_delete_table(ctx: &AppContext, name: &str) -> Result<()> {
    ctx.store.delete_table(name).await?;
    info!("Deleted table '{}'", name);

    if let Err(e) = ctx.vectors.delete_table_vectors(name).await {
        warn!("Failed to delete vectors for '{}': {}", name, e);
    }
    Ok(())
}

/// Store every table, continuing past per-table failures.
/// With `replace`, tables that already exist are updated instead of failing.
pub async fn ingest_tables(ctx: &AppContext, tables: Vec<Table>, replace: bool) -> IngestStats {
    let mut stats = IngestStats {
        tables_parsed: tables.len(),
        ..Default::default()
    };

    for mut table in tables {
        table.ensure_identity(Utc::now());

        let outcome = match cmd_create_table(ctx, &table).await {
            Err(Error::TableExists(_)) if replace => cmd_update_table(ctx, &table)
                .await
                .map(|indexed| (indexed, true)),
            other => other.map(|indexed| (indexed, false)),
        };

        match outcome {
            Ok((indexed, updated)) => {
                if updated {
                    stats.updated += 1;
                } else {
                    stats.created += 1;
                }
                if indexed {
                    stats.indexed += 1;
                } else {
                    stats.index_failures += 1;
                }
            }
            Err(e) => {
                warn!("Failed to store table '{}': {}", table.name, e);
                stats.failed += 1;
                stats.errors.push(format!("{}: {}", table.name, e));
            }
        }
    }

    info!(
        "Ingested {} tables ({} created, {} updated, {} failed)",
        stats.tables_parsed, stats.created, stats.updated, stats.failed
    );
    stats
}

/// Print ingestion statistics
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("\n✓ Ingestion complete");
    println!("  Tables parsed: {}", stats.tables_parsed);
    println!("  Created: {}", stats.created);
    println!("  Updated: {}", stats.updated);
    println!("  Failed: {}", stats.failed);
    println!("  Indexed: {}", stats.indexed);

    if stats.index_failures > 0 {
        println!(
            "  ⚠ {} tables stored without vectors (run 'sqlbot reindex' once the embedding service is reachable)",
            stats.index_failures
        );
    }
    for error in &stats.errors {
        println!("  ✗ {}", error);
    }
}
