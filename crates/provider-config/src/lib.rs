//! Layered provider configuration for Reason MCP.
//!
//! Resolution follows a fixed three-tier environment chain (tool-caller
//! overrides, then a local `.env`-style file, then the process environment),
//! with per-field fallback chains on top (provider-specific override, global
//! `LLM_*` override, `*_DEFAULT` system default). Resolved configurations
//! are cached with a TTL and deduplicated under concurrency; validation
//! produces full reports instead of stopping at the first problem.

mod cache;
mod engine;
mod error;
mod placeholder;
mod provider;
mod resolve;
mod source;
mod validate;

pub use cache::TtlCache;
pub use engine::{
    ProviderConfigEngine, DEFAULT_LLM_PROVIDER_VAR, PROVIDER_SELECTION_PRIORITY_VAR,
    TEST_MODE_VAR,
};
pub use error::{ConfigError, Result};
pub use placeholder::PlaceholderPatterns;
pub use provider::{
    Provider, ProviderConfig, ReasoningEffort, ReasoningParams, UnknownProvider, Verbosity,
};
pub use source::{CallerEnv, EnvSource, FileEnv, ProcessEnv, SourceChain};
pub use validate::{
    validate_provider, SystemValidator, MAX_TOKENS_CEILING, TIMEOUT_CEILING_MS,
};
