//! Default values for configuration

use super::{EmbeddingProvider, LlmProvider};

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default environment variable name for Qdrant API key
pub fn default_qdrant_api_key_env() -> String {
    "".to_string()
}

/// Default collection name
pub fn default_collection_name() -> String {
    "sqlbot_tables".to_string()
}

/// Default embedding provider (DashScope compatible mode)
pub fn default_embedding_provider() -> EmbeddingProvider {
    EmbeddingProvider::Qwen
}

pub fn default_embedding_model() -> String {
    "text-embedding-v1".to_string()
}

pub fn default_embedding_api_key_env() -> String {
    "EMBEDDING_API_KEY".to_string()
}

pub fn default_embedding_dimension() -> usize {
    1536
}

/// Default attempts per embedding call, first try included
pub fn default_embedding_max_attempts() -> usize {
    3
}

pub fn default_embedding_base_delay_ms() -> u64 {
    1000
}

/// Default per-attempt deadline in seconds
pub fn default_embedding_timeout() -> u64 {
    60
}

pub fn default_llm_provider() -> LlmProvider {
    LlmProvider::OpenAi
}

pub fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

pub fn default_llm_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}

pub fn default_llm_max_tokens() -> u32 {
    2000
}

pub fn default_llm_temperature() -> f32 {
    0.3
}

pub fn default_llm_timeout() -> u64 {
    60
}

/// Default number of tables retrieved for a generation request
pub fn default_retrieval_top_k() -> usize {
    10
}

/// Default context budget in characters
pub fn default_context_max_chars() -> usize {
    crate::context::DEFAULT_MAX_CHARS
}
