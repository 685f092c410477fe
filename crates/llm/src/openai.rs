//! OpenAI-compatible chat completions backend.
//!
//! Also serves DeepSeek, whose API speaks the same wire format at a
//! different base URL.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use reason_provider_config::ProviderConfig;

use crate::error::{classify_http_error, LlmError, LlmResult};
use crate::ModelBackend;

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

pub struct OpenAiCompatibleBackend {
    name: &'static str,
    url: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleBackend {
    pub fn openai() -> Self {
        Self {
            name: "openai",
            url: OPENAI_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn deepseek() -> Self {
        Self {
            name: "deepseek",
            url: DEEPSEEK_API_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    fn build_body(&self, system: &str, user: &str, config: &ProviderConfig) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": config.model,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
        });

        if let Some(reasoning) = &config.reasoning {
            if let Some(cap) = reasoning.max_completion_tokens {
                // The completion-token cap replaces max_tokens on models
                // that take it.
                body["max_completion_tokens"] = serde_json::json!(cap);
                if let Some(map) = body.as_object_mut() {
                    map.remove("max_tokens");
                }
            }
            if let Some(verbosity) = reasoning.verbosity {
                body["verbosity"] = serde_json::json!(verbosity.as_str());
            }
            if let Some(effort) = reasoning.reasoning_effort {
                body["reasoning_effort"] = serde_json::json!(effort.as_str());
            }
        }

        body
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl ModelBackend for OpenAiCompatibleBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn invoke(&self, system: &str, user: &str, config: &ProviderConfig) -> LlmResult<String> {
        let body = self.build_body(system, user, config);
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&config.api_key)
            .timeout(Duration::from_millis(config.timeout_ms))
            .json(&body)
            .send()
            .await
            .map_err(|err| request_error(self.name, config.timeout_ms, err))?;

        let status = response.status();
        let text = response.text().await.map_err(|err| LlmError::Network {
            provider: self.name.to_string(),
            message: err.to_string(),
        })?;

        if !status.is_success() {
            return Err(classify_http_error(
                status.as_u16(),
                &text,
                self.name,
                &config.model,
            ));
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|err| LlmError::MalformedResponse {
                provider: self.name.to_string(),
                message: err.to_string(),
            })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::MalformedResponse {
                provider: self.name.to_string(),
                message: "response contained no message content".to_string(),
            })
    }
}

pub(crate) fn request_error(provider: &str, timeout_ms: u64, err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout {
            provider: provider.to_string(),
            timeout_ms,
        }
    } else {
        LlmError::Network {
            provider: provider.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reason_provider_config::{Provider, ReasoningEffort, ReasoningParams, Verbosity};

    fn config(reasoning: Option<ReasoningParams>) -> ProviderConfig {
        ProviderConfig {
            provider: Provider::OpenAi,
            api_key: "sk-test".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 4096,
            timeout_ms: 30_000,
            reasoning,
        }
    }

    #[test]
    fn body_carries_model_and_sampling_params() {
        let backend = OpenAiCompatibleBackend::openai();
        let body = backend.build_body("sys", "user", &config(None));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "user");
    }

    #[test]
    fn reasoning_params_shape_the_body() {
        let backend = OpenAiCompatibleBackend::openai();
        let body = backend.build_body(
            "sys",
            "user",
            &config(Some(ReasoningParams {
                max_completion_tokens: Some(2048),
                verbosity: Some(Verbosity::Low),
                reasoning_effort: Some(ReasoningEffort::High),
            })),
        );
        assert_eq!(body["max_completion_tokens"], 2048);
        assert!(body.get("max_tokens").is_none());
        assert_eq!(body["verbosity"], "low");
        assert_eq!(body["reasoning_effort"], "high");
    }
}
