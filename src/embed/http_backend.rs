use super::{http_client, Embedder, EmbeddingResponse, RetryPolicy};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// Self-hosted embedding sidecar speaking `POST /v1/embed/text`
pub struct HttpEmbedder {
    client: Client,
    base_url: Url,
    model_id: String,
    dimension: usize,
    policy: RetryPolicy,
}

#[derive(Debug, Clone, Serialize)]
struct EmbedTextRequest<'a> {
    model: &'a str,
    inputs: Vec<&'a str>,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base_url = Url::parse(config.endpoint())?;
        Ok(Self {
            client: http_client(config)?,
            base_url,
            model_id: config.model.clone(),
            dimension: config.resolved_dimension(),
            policy: RetryPolicy::from_config(config),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid embedding backend URL: {}", e)))
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint("/v1/embed/text")?;
        let request = EmbedTextRequest {
            model: &self.model_id,
            inputs: vec![text],
        };
        let parsed: EmbeddingResponse = self
            .policy
            .send_json("embedding backend request", self.client.post(url).json(&request))
            .await?;
        parsed.into_first(&self.model_id, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
