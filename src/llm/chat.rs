use super::Generator;
use crate::config::LlmConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// OpenAI-style `/chat/completions` client (OpenAI, DeepSeek, DashScope)
pub struct ChatCompletionsGenerator {
    client: Client,
    url: Url,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base = config.endpoint().trim_end_matches('/');
        let url = Url::parse(&format!("{}/chat/completions", base))
            .map_err(|e| Error::Config(format!("Invalid LLM endpoint '{}': {}", base, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Generator for ChatCompletionsGenerator {
    async fn complete(&self, prompt: &str, max_tokens: u32, temperature: f32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let mut request = self.client.post(self.url.clone()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!("Requesting completion from {} ({} prompt chars)", self.model, prompt.chars().count());

        let response = request
            .send()
            .await
            .map_err(|e| Error::Generation(format!("request failed: {}", e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Generation(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Error::Generation(format!(
                "API request failed with status {}: {}",
                status.as_u16(),
                text.trim()
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| Error::Generation(format!("malformed response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::Generation("no choices returned".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
