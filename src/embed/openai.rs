use super::{http_client, Embedder, EmbeddingResponse, RetryPolicy};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// OpenAI `/embeddings` API, also spoken by DashScope's compatible mode
pub struct OpenAiEmbedder {
    client: Client,
    url: Url,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    policy: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base = config.endpoint().trim_end_matches('/');
        let url = Url::parse(&format!("{}/embeddings", base))
            .map_err(|e| Error::Config(format!("Invalid embedding endpoint '{}': {}", base, e)))?;

        Ok(Self {
            client: http_client(config)?,
            url,
            api_key: config.api_key(),
            model: config.model.clone(),
            dimension: config.resolved_dimension(),
            policy: RetryPolicy::from_config(config),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.model,
            input: [text],
        };
        let mut request = self.client.post(self.url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: EmbeddingResponse = self.policy.send_json("embedding request", request).await?;
        response.into_first(&self.model, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
