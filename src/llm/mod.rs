//! Text generation backends
//!
//! Every supported provider speaks the chat-completions wire format, so a
//! single implementation covers them; the provider only picks the default
//! base URL.

mod chat;

pub use chat::ChatCompletionsGenerator;

use crate::config::LlmConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for text generation providers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt`, returning the model's raw text
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String>;

    fn model_name(&self) -> &str;
}

/// Create a generator based on configuration
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    Ok(Arc::new(ChatCompletionsGenerator::new(config)?))
}
