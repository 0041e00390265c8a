//! Generate command implementation

use crate::app::AppContext;
use crate::error::Result;
use crate::generate::Generation;
use tracing::info;

/// Generate SQL for a natural-language description
pub async fn cmd_generate(ctx: &AppContext, description: &str, tables: &[String]) -> Result<Generation> {
    info!("Generating SQL: {}", description);
    ctx.sql_generator().generate(description, tables).await
}

/// Print a generation result to console
pub fn print_generation(generation: &Generation) {
    println!("{}", generation.query.sql);
    println!();
    println!("Query ID: {}", generation.query.id);
    if generation.tables.is_empty() {
        println!("Tables: (none matched)");
    } else {
        println!("Tables ({}): {}", generation.selection, generation.tables.join(", "));
    }
    if generation.context_truncated {
        println!("⚠ Schema context was truncated to fit the prompt budget");
    }
}
