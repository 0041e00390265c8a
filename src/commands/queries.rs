//! Generated query history commands

use crate::app::AppContext;
use crate::error::Result;
use crate::models::Query;

/// Most recent queries first
pub async fn cmd_list_queries(ctx: &AppContext, limit: usize, offset: usize) -> Result<Vec<Query>> {
    ctx.store.list_queries(limit, offset).await
}

pub async fn cmd_show_query(ctx: &AppContext, id: &str) -> Result<Query> {
    ctx.store.get_query(id).await
}

/// Print query history to console
pub fn print_queries(queries: &[Query]) {
    if queries.is_empty() {
        println!("No queries yet. Use 'sqlbot generate \"...\"' to create one.");
        return;
    }

    for query in queries {
        println!(
            "• {} [{}] {}",
            query.id,
            query.created_at.format("%Y-%m-%d %H:%M"),
            query.description
        );
    }
}

pub fn print_query(query: &Query) {
    println!("ID: {}", query.id);
    println!("Created: {}", query.created_at.to_rfc3339());
    println!("Description: {}", query.description);
    println!("\n{}", query.sql);
}
