//! Anthropic messages API backend.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use reason_provider_config::ProviderConfig;

use crate::error::{classify_http_error, LlmError, LlmResult};
use crate::openai::request_error;
use crate::ModelBackend;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    url: String,
    client: reqwest::Client,
}

impl AnthropicBackend {
    pub fn new() -> Self {
        Self {
            url: ANTHROPIC_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

impl Default for AnthropicBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ModelBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn invoke(&self, system: &str, user: &str, config: &ProviderConfig) -> LlmResult<String> {
        let body = serde_json::json!({
            "model": config.model,
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "system": system,
            "messages": [
                { "role": "user", "content": user },
            ],
        });

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(Duration::from_millis(config.timeout_ms))
            .json(&body)
            .send()
            .await
            .map_err(|err| request_error(self.name(), config.timeout_ms, err))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| LlmError::Network {
            provider: self.name().to_string(),
            message: err.to_string(),
        })?;

        if !status.is_success() {
            return Err(classify_http_error(
                status.as_u16(),
                &text,
                self.name(),
                &config.model,
            ));
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|err| LlmError::MalformedResponse {
                provider: self.name().to_string(),
                message: err.to_string(),
            })?;
        let joined: String = parsed
            .content
            .iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text.as_str())
            .collect();
        if joined.is_empty() {
            return Err(LlmError::MalformedResponse {
                provider: self.name().to_string(),
                message: "response contained no text blocks".to_string(),
            });
        }
        Ok(joined)
    }
}
