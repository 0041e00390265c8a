//! SQLite schema definition

/// SQL schema for the catalog database
pub const SCHEMA_SQL: &str = r#"
-- Tables: one row per described relational table
CREATE TABLE IF NOT EXISTS schema_tables (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    columns_json TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Queries: generated SQL, immutable once written
CREATE TABLE IF NOT EXISTS queries (
    id TEXT PRIMARY KEY,
    description TEXT NOT NULL,
    sql_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queries_created ON queries(created_at);
"#;
