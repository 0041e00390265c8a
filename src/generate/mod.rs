//! SQL generation
//!
//! Resolves the tables a request is about, renders them into a bounded
//! schema block, asks the generation backend for SQL and records the
//! result. The returned text is stored and shown exactly as produced.

use crate::config::{default_llm_max_tokens, default_llm_temperature, default_retrieval_top_k};
use crate::context::{ContextAssembler, ContextBlock};
use crate::error::{Error, Result};
use crate::llm::Generator;
use crate::meta::SchemaStore;
use crate::models::{Query, Table};
use crate::retrieval::{RetrievalEngine, RetrievalSource};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How the tables behind a generation were chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableSelection {
    Explicit,
    Semantic,
    Keyword,
}

impl fmt::Display for TableSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSelection::Explicit => write!(f, "explicit"),
            TableSelection::Semantic => write!(f, "semantic"),
            TableSelection::Keyword => write!(f, "keyword"),
        }
    }
}

impl From<RetrievalSource> for TableSelection {
    fn from(source: RetrievalSource) -> Self {
        match source {
            RetrievalSource::Semantic => TableSelection::Semantic,
            RetrievalSource::Keyword => TableSelection::Keyword,
        }
    }
}

/// Result of one generation request
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    /// The persisted query record
    pub query: Query,
    /// Tables that were offered to the model, in prompt order
    pub tables: Vec<String>,
    pub selection: TableSelection,
    /// Whether the schema block was cut to fit the budget
    pub context_truncated: bool,
}

/// Generation orchestrator
pub struct SqlGenerator {
    store: Arc<dyn SchemaStore>,
    retrieval: RetrievalEngine,
    generator: Arc<dyn Generator>,
    assembler: ContextAssembler,
    top_k: usize,
    max_tokens: u32,
    temperature: f32,
}

impl SqlGenerator {
    pub fn new(
        store: Arc<dyn SchemaStore>,
        retrieval: RetrievalEngine,
        generator: Arc<dyn Generator>,
        assembler: ContextAssembler,
    ) -> Self {
        Self {
            store,
            retrieval,
            generator,
            assembler,
            top_k: default_retrieval_top_k(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
        }
    }

    /// Number of tables retrieval may return
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Generate SQL for `description`. With explicit `table_names` every name
    /// must exist; otherwise tables are retrieved from the description.
    pub async fn generate(&self, description: &str, table_names: &[String]) -> Result<Generation> {
        let description = description.trim();
        if description.is_empty() {
            return Err(Error::InvalidInput("description must not be empty".to_string()));
        }

        let (tables, selection) = self.resolve_tables(description, table_names).await?;
        if tables.is_empty() {
            warn!("No tables matched '{}'; generating without schema context", description);
        }

        let context = self.assembler.assemble(&tables);
        if context.truncated {
            info!(
                "Schema context truncated to {} of {} tables",
                context.tables_included,
                tables.len()
            );
        }

        let prompt = build_prompt(description, &context);
        debug!(
            "Prompt for {} uses {} context chars",
            self.generator.model_name(),
            context.chars_used
        );

        let sql = self
            .generator
            .complete(&prompt, self.max_tokens, self.temperature)
            .await?;

        let query = Query::new(description, sql);
        self.store.create_query(&query).await?;
        info!("Stored generated query {}", query.id);

        Ok(Generation {
            query,
            tables: tables.into_iter().map(|t| t.name).collect(),
            selection,
            context_truncated: context.truncated,
        })
    }

    async fn resolve_tables(
        &self,
        description: &str,
        table_names: &[String],
    ) -> Result<(Vec<Table>, TableSelection)> {
        if table_names.is_empty() {
            let retrieval = self.retrieval.retrieve(description, self.top_k).await?;
            return Ok((retrieval.tables, retrieval.source.into()));
        }

        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            tables.push(self.store.get_table(name).await?);
        }
        Ok((tables, TableSelection::Explicit))
    }
}

/// Prompt sent to the generation backend
pub fn build_prompt(description: &str, context: &ContextBlock) -> String {
    format!(
        "You are an expert SQL developer. Write one SQL query that satisfies the requirement below, \
using only the tables and columns described.\n\n\
Requirement: {}\n\n\
Relevant table structures:\n{}\n\
Write the SQL query for the requirement using the table structures above.\n\
Rules:\n\
1. Return only a valid SQL statement.\n\
2. When several tables are involved, relate them with appropriate JOINs.\n\
3. Do not include explanations or any other text, only the SQL.\n\
4. Use standard SQL syntax.",
        description, context.text
    )
}
