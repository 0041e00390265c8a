//! Ingest command implementation

use super::catalog::{ingest_tables, IngestStats};
use crate::app::AppContext;
use crate::ddl::{parse_ddl, DdlOptions};
use crate::error::{Error, Result};
use crate::models::Table;
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Input format for table definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestFormat {
    /// `CREATE TABLE` statements
    Ddl,
    /// JSON array of table objects
    Json,
}

impl IngestFormat {
    /// `.sql` and `.ddl` files are DDL, anything else is JSON
    pub fn detect(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("sql") | Some("ddl") => IngestFormat::Ddl,
            _ => IngestFormat::Json,
        }
    }
}

/// Turn input text into table records
pub fn parse_tables(text: &str, format: IngestFormat, options: &DdlOptions) -> Result<Vec<Table>> {
    match format {
        IngestFormat::Ddl => Ok(parse_ddl(text, options)),
        IngestFormat::Json => Table::from_json_array(text),
    }
}

/// Ingest table definitions from a file
pub async fn cmd_ingest(
    ctx: &AppContext,
    path: &Path,
    format: Option<IngestFormat>,
    replace: bool,
) -> Result<IngestStats> {
    let format = format.unwrap_or_else(|| IngestFormat::detect(path));
    info!("Ingesting {:?} as {:?}", path, format);

    let text = std::fs::read_to_string(path)?;
    let tables = parse_tables(&text, format, &ctx.config.ddl)?;
    if tables.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no table definitions found in {}",
            path.display()
        )));
    }

    Ok(ingest_tables(ctx, tables, replace).await)
}
