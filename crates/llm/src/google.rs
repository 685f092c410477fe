//! Google Gemini generateContent backend.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use reason_provider_config::ProviderConfig;

use crate::error::{classify_http_error, LlmError, LlmResult};
use crate::openai::request_error;
use crate::ModelBackend;

const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GoogleBackend {
    base: String,
    client: reqwest::Client,
}

impl GoogleBackend {
    pub fn new() -> Self {
        Self {
            base: GOOGLE_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }
}

impl Default for GoogleBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

#[async_trait]
impl ModelBackend for GoogleBackend {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn invoke(&self, system: &str, user: &str, config: &ProviderConfig) -> LlmResult<String> {
        let url = format!("{}/{}:generateContent", self.base, config.model);
        let body = serde_json::json!({
            "systemInstruction": {
                "parts": [{ "text": system }],
            },
            "contents": [
                { "role": "user", "parts": [{ "text": user }] },
            ],
            "generationConfig": {
                "temperature": config.temperature,
                "maxOutputTokens": config.max_tokens,
            },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", config.api_key.as_str())])
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

        let parsed: GenerateContentResponse =
            serde_json::from_str(&text).map_err(|err| LlmError::MalformedResponse {
                provider: self.name().to_string(),
                message: err.to_string(),
            })?;
        let joined: String = parsed
            .candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default();
        if joined.is_empty() {
            return Err(LlmError::MalformedResponse {
                provider: self.name().to_string(),
                message: "response contained no candidates".to_string(),
            });
        }
        Ok(joined)
    }
}
