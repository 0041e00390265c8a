use super::{http_client, Embedder, EmbeddingResponse, RetryPolicy};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use url::Url;

/// Hugging Face inference API (`<endpoint>/<model>`)
pub struct HuggingFaceEmbedder {
    client: Client,
    url: Url,
    api_key: Option<String>,
    model: String,
    dimension: usize,
    policy: RetryPolicy,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    pooling: &'static str,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
    use_cache: bool,
}

impl HuggingFaceEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base = config.endpoint().trim_end_matches('/');
        let raw = format!("{}/{}", base, config.model.trim_start_matches('/'));
        let url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("Invalid embedding endpoint '{}': {}", raw, e)))?;

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
impl Embedder for HuggingFaceEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters { pooling: "mean" },
            options: InferenceOptions {
                wait_for_model: true,
                use_cache: true,
            },
        };
        let mut request = self.client.post(self.url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: EmbeddingResponse = self.policy.send_json("inference request", request).await?;
        response.into_first(&self.model, self.dimension)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
