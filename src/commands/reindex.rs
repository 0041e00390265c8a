//! Reindex command - re-embed every stored table

use super::catalog::index_table;
use crate::app::AppContext;
use crate::error::Result;
use crate::meta::MAX_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Reindex statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReindexStats {
    pub tables_processed: usize,
    pub tables_indexed: usize,
    pub errors: usize,
}

/// Page through the catalog and (re)index each table. Embedding or index
/// failures are counted and skipped.
pub async fn cmd_reindex(ctx: &AppContext) -> Result<ReindexStats> {
    info!("Starting reindex operation");

    let mut stats = ReindexStats::default();
    let mut offset = 0;

    loop {
        let page = ctx.store.list_tables(MAX_PAGE_SIZE, offset).await?;
        let page_len = page.len();

        for table in &page {
            stats.tables_processed += 1;
            if let Err(e) = ctx.vectors.delete_table_vectors(&table.name).await {
                warn!(table = %table.name, error = %e, "Failed to delete old vectors");
            }
            if index_table(ctx, table).await {
                stats.tables_indexed += 1;
            } else {
                stats.errors += 1;
            }
        }

        if page_len < MAX_PAGE_SIZE {
            break;
        }
        offset += page_len;
    }

    info!(
        tables = stats.tables_processed,
        indexed = stats.tables_indexed,
        errors = stats.errors,
        "Reindex complete"
    );

    Ok(stats)
}

/// Print reindex statistics
pub fn print_reindex_stats(stats: &ReindexStats) {
    println!("\n✓ Reindex complete");
    println!("  Tables processed: {}", stats.tables_processed);
    println!("  Tables indexed: {}", stats.tables_indexed);
    if stats.errors > 0 {
        println!("  Errors: {}", stats.errors);
    }
}
