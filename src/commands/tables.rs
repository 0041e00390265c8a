//! Table catalog commands

use crate::app::AppContext;
use crate::ddl::render_create_table;
use crate::error::Result;
use crate::models::Table;
use crate::retrieval::Retrieval;
use tracing::info;

/// List stored tables, one page at a time
pub async fn cmd_list_tables(ctx: &AppContext, limit: usize, offset: usize) -> Result<Vec<Table>> {
    info!("Listing tables (limit {}, offset {})", limit, offset);
    ctx.store.list_tables(limit, offset).await
}

pub async fn cmd_show_table(ctx: &AppContext, name: &str) -> Result<Table> {
    ctx.store.get_table(name).await
}

/// Find tables relevant to a phrase, semantic first with keyword fallback
pub async fn cmd_search_tables(ctx: &AppContext, phrase: &str, limit: usize) -> Result<Retrieval> {
    info!("Searching tables: {}", phrase);
    ctx.retrieval().retrieve(phrase, limit).await
}

/// Print a table list to console
pub fn print_tables(tables: &[Table]) {
    if tables.is_empty() {
        println!("No tables found. Use 'sqlbot ingest <file>' to add table definitions.");
        return;
    }

    for table in tables {
        if table.description.is_empty() {
            println!("• {} ({} columns)", table.name, table.columns.len());
        } else {
            println!(
                "• {} ({} columns) - {}",
                table.name,
                table.columns.len(),
                table.description
            );
        }
    }
}

/// Print one table, either as a column listing or as DDL
pub fn print_table(table: &Table, as_ddl: bool) {
    if as_ddl {
        println!("{}", render_create_table(table));
        return;
    }

    println!("\nTable: {}", table.name);
    if !table.description.is_empty() {
        println!("Description: {}", table.description);
    }
    println!("ID: {}", table.id);
    println!("Updated: {}", table.updated_at.to_rfc3339());
    println!("\nColumns:");
    for column in &table.columns {
        let mut flags = Vec::new();
        if column.is_primary {
            flags.push("PK");
        }
        if column.is_required {
            flags.push("NOT NULL");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };

        if column.description.is_empty() {
            println!("  {} {}{}", column.name, column.data_type, flags);
        } else {
            println!(
                "  {} {}{} - {}",
                column.name, column.data_type, flags, column.description
            );
        }
    }
}

/// Print search results to console
pub fn print_search_results(result: &Retrieval) {
    println!("\n🔍 {} tables ({} search)\n", result.tables.len(), result.source);
    print_tables(&result.tables);
}
