//! Catalog storage using SQLite
//!
//! This module handles the persistent records:
//! - Tables (schema descriptions, columns stored as JSON)
//! - Queries (generated SQL history)
//!
//! It also provides the keyword search used when semantic search is
//! unavailable.

mod schema;

pub use schema::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{Column, Query, Table};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder, Sqlite};
use std::path::Path;
use tracing::{debug, info};

/// Page size used when a caller passes 0
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page a single list or search returns
pub const MAX_PAGE_SIZE: usize = 100;

/// Persistent store for table and query records
#[async_trait]
pub trait SchemaStore: Send + Sync {
    /// Fetch a table by name; [`Error::TableNotFound`] when absent
    async fn get_table(&self, name: &str) -> Result<Table>;

    async fn list_tables(&self, limit: usize, offset: usize) -> Result<Vec<Table>>;

    /// Keyword search over names, descriptions and columns, best match first
    async fn search_tables(&self, keyword: &str, limit: usize, offset: usize) -> Result<Vec<Table>>;

    /// Insert a new table; [`Error::TableExists`] when the name is taken
    async fn create_table(&self, table: &Table) -> Result<()>;

    /// Replace description and columns of an existing table
    async fn update_table(&self, table: &Table) -> Result<()>;

    async fn delete_table(&self, name: &str) -> Result<()>;

    async fn create_query(&self, query: &Query) -> Result<()>;

    /// Fetch a query by id; [`Error::QueryNotFound`] when absent
    async fn get_query(&self, id: &str) -> Result<Query>;

    /// Most recent first
    async fn list_queries(&self, limit: usize, offset: usize) -> Result<Vec<Query>>;
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`, 0 meaning default
pub fn clamp_limit(limit: usize) -> usize {
    match limit {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    }
}

#[derive(Debug, Clone, FromRow)]
struct TableRow {
    id: String,
    name: String,
    description: String,
    columns_json: String,
    created_at: String,
    updated_at: String,
}

impl TableRow {
    fn from_table(table: &Table) -> Result<Self> {
        Ok(Self {
            id: table.id.clone(),
            name: table.name.clone(),
            description: table.description.clone(),
            columns_json: serde_json::to_string(&table.columns)?,
            created_at: table.created_at.to_rfc3339(),
            updated_at: table.updated_at.to_rfc3339(),
        })
    }

    fn into_table(self) -> Result<Table> {
        let columns: Vec<Column> = serde_json::from_str(&self.columns_json)?;
        Ok(Table {
            id: self.id,
            name: self.name,
            description: self.description,
            columns,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
struct QueryRow {
    id: String,
    description: String,
    sql_text: String,
    created_at: String,
}

impl QueryRow {
    fn into_query(self) -> Result<Query> {
        Ok(Query {
            id: self.id,
            description: self.description,
            sql: self.sql_text,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Database(sqlx::Error::Decode(Box::new(e))))
}

/// Search terms of a phrase: lower-cased words of two or more characters
fn search_terms(keyword: &str) -> Vec<String> {
    let mut terms: Vec<String> = keyword
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect();
    terms.dedup();
    terms
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Relevance of a table for the given terms; names weigh most
fn keyword_score(table: &Table, terms: &[String]) -> usize {
    let name = table.name.to_lowercase();
    let description = table.description.to_lowercase();
    terms
        .iter()
        .map(|term| {
            let mut score = 0;
            if name.contains(term.as_str()) {
                score += 3;
            }
            if description.contains(term.as_str()) {
                score += 2;
            }
            if table.columns.iter().any(|c| {
                c.name.to_lowercase().contains(term.as_str())
                    || c.description.to_lowercase().contains(term.as_str())
            }) {
                score += 1;
            }
            score
        })
        .sum()
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Catalog database handle
#[derive(Clone)]
pub struct MetaDb {
    pool: SqlitePool,
}

impl MetaDb {
    /// Connect to the catalog database
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    /// Open a database file directly, creating it if missing
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::raw_sql(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_tables'",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(result.is_some())
    }

    /// Drop every record (schema is kept)
    pub async fn clear(&self) -> Result<()> {
        info!("Clearing catalog database");
        sqlx::query("DELETE FROM queries").execute(&self.pool).await?;
        sqlx::query("DELETE FROM schema_tables").execute(&self.pool).await?;
        Ok(())
    }

    /// Get catalog statistics
    pub async fn get_stats(&self) -> Result<CatalogStats> {
        let table_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_tables")
            .fetch_one(&self.pool)
            .await?;
        let column_count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(json_array_length(columns_json)), 0) FROM schema_tables",
        )
        .fetch_one(&self.pool)
        .await?;
        let query_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queries")
            .fetch_one(&self.pool)
            .await?;

        Ok(CatalogStats {
            table_count: table_count as usize,
            column_count: column_count as usize,
            query_count: query_count as usize,
        })
    }
}

#[async_trait]
impl SchemaStore for MetaDb {
    async fn get_table(&self, name: &str) -> Result<Table> {
        let row = sqlx::query_as::<_, TableRow>("SELECT * FROM schema_tables WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| Error::TableNotFound(name.to_string()))?
            .into_table()
    }

    async fn list_tables(&self, limit: usize, offset: usize) -> Result<Vec<Table>> {
        let rows = sqlx::query_as::<_, TableRow>(
            "SELECT * FROM schema_tables ORDER BY name LIMIT ? OFFSET ?",
        )
        .bind(clamp_limit(limit) as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(TableRow::into_table).collect()
    }

    async fn search_tables(&self, keyword: &str, limit: usize, offset: usize) -> Result<Vec<Table>> {
        let terms = search_terms(keyword);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM schema_tables WHERE ");
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            let pattern = format!("%{}%", escape_like(term));
            builder
                .push("(name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR description LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR columns_json LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        let rows = builder
            .build_query_as::<TableRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut scored = rows
            .into_iter()
            .map(|row| {
                let table = row.into_table()?;
                Ok((keyword_score(&table, &terms), table))
            })
            .collect::<Result<Vec<_>>>()?;

        // JSON keys can match a LIKE without any real hit
        scored.retain(|(score, _)| *score > 0);
        scored.sort_by(|(a, ta), (b, tb)| b.cmp(a).then_with(|| ta.name.cmp(&tb.name)));

        debug!("Keyword search '{}' matched {} tables", keyword, scored.len());

        Ok(scored
            .into_iter()
            .skip(offset)
            .take(clamp_limit(limit))
            .map(|(_, table)| table)
            .collect())
    }

    async fn create_table(&self, table: &Table) -> Result<()> {
        table.validate()?;
        let row = TableRow::from_table(table)?;

        sqlx::query(
            r#"
            INSERT INTO schema_tables (id, name, description, columns_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.columns_json)
        .bind(&row.created_at)
        .bind(&row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::TableExists(table.name.clone())
            } else {
                Error::Database(e)
            }
        })?;

        Ok(())
    }

    async fn update_table(&self, table: &Table) -> Result<()> {
        table.validate()?;
        let row = TableRow::from_table(table)?;

        let result = sqlx::query(
            r#"
            UPDATE schema_tables
            SET description = ?, columns_json = ?, updated_at = ?
            WHERE name = ?
            "#,
        )
        .bind(&row.description)
        .bind(&row.columns_json)
        .bind(Utc::now().to_rfc3339())
        .bind(&row.name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::TableNotFound(table.name.clone()));
        }
        Ok(())
    }

    async fn delete_table(&self, name: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM schema_tables WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::TableNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn create_query(&self, query: &Query) -> Result<()> {
        sqlx::query(
            "INSERT INTO queries (id, description, sql_text, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&query.id)
        .bind(&query.description)
        .bind(&query.sql)
        .bind(query.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_query(&self, id: &str) -> Result<Query> {
        let row = sqlx::query_as::<_, QueryRow>("SELECT * FROM queries WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.ok_or_else(|| Error::QueryNotFound(id.to_string()))?
            .into_query()
    }

    async fn list_queries(&self, limit: usize, offset: usize) -> Result<Vec<Query>> {
        let rows = sqlx::query_as::<_, QueryRow>(
            "SELECT * FROM queries ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(clamp_limit(limit) as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(QueryRow::into_query).collect()
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub table_count: usize,
    pub column_count: usize,
    pub query_count: usize,
}
