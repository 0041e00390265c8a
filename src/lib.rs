//! sqlbot - natural-language to SQL over a described schema
//!
//! This crate provides:
//! - A tolerant `CREATE TABLE` parser and a JSON table catalog
//! - Semantic table retrieval through Qdrant, with keyword fallback in SQLite
//! - Budgeted schema context and SQL generation through chat-completions APIs

pub mod app;
pub mod commands;
pub mod config;
pub mod context;
pub mod ddl;
pub mod embed;
pub mod error;
pub mod generate;
pub mod llm;
pub mod meta;
pub mod models;
pub mod retrieval;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use app::AppContext;
pub use config::Config;
pub use error::{Error, Result};
