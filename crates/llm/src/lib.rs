//! Model backend adapters.
//!
//! Each provider is an opaque text-completion service: given a system
//! prompt, a user prompt, and a resolved configuration, it returns text or a
//! categorized failure. Nothing above this crate knows about wire formats.

mod anthropic;
mod error;
mod google;
mod openai;

use async_trait::async_trait;
use std::sync::Arc;

use reason_provider_config::{Provider, ProviderConfig};

pub use anthropic::AnthropicBackend;
pub use error::{classify_http_error, LlmError, LlmResult};
pub use google::GoogleBackend;
pub use openai::OpenAiCompatibleBackend;

#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// One completion round-trip. The provider's configured timeout bounds
    /// the call; an elapsed timeout surfaces as a TIMEOUT-category error.
    async fn invoke(&self, system: &str, user: &str, config: &ProviderConfig) -> LlmResult<String>;
}

/// The backend serving a given provider.
pub fn backend_for(provider: Provider) -> Arc<dyn ModelBackend> {
    match provider {
        Provider::OpenAi => Arc::new(OpenAiCompatibleBackend::openai()),
        Provider::DeepSeek => Arc::new(OpenAiCompatibleBackend::deepseek()),
        Provider::Anthropic => Arc::new(AnthropicBackend::new()),
        Provider::Google => Arc::new(GoogleBackend::new()),
    }
}
