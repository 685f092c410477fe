//! Provider configuration resolution engine.
//!
//! For each provider, every field resolves through a strict, short-circuiting
//! chain of environment tiers: provider-specific override, then the global
//! `LLM_*` override, then the `*_DEFAULT` system default. A required field
//! with no valid value in any tier fails fast with a categorized error naming
//! the exact variables that were consulted.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::error::{ConfigError, Result};
use crate::placeholder::PlaceholderPatterns;
use crate::provider::{
    Provider, ProviderConfig, ReasoningEffort, ReasoningParams, Verbosity,
};
use crate::resolve::{first_valid, parse_float_in_range, parse_positive_int, parse_string};
use crate::source::{CallerEnv, SourceChain};

pub const DEFAULT_LLM_PROVIDER_VAR: &str = "DEFAULT_LLM_PROVIDER";
pub const PROVIDER_SELECTION_PRIORITY_VAR: &str = "PROVIDER_SELECTION_PRIORITY";
pub const TEST_MODE_VAR: &str = "LLM_TEST_MODE";

/// Resolved configurations are cached briefly; environment changes are rare
/// but must not require a restart.
const CONFIG_CACHE_TTL: Duration = Duration::from_secs(300);

pub struct ProviderConfigEngine {
    chain: SourceChain,
    cache: Arc<TtlCache<ProviderConfig>>,
    placeholders: PlaceholderPatterns,
}

impl ProviderConfigEngine {
    pub fn new(chain: SourceChain) -> Self {
        Self {
            chain,
            cache: Arc::new(TtlCache::new(CONFIG_CACHE_TTL)),
            placeholders: PlaceholderPatterns::default(),
        }
    }

    pub fn with_placeholders(mut self, placeholders: PlaceholderPatterns) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn chain(&self) -> &SourceChain {
        &self.chain
    }

    /// Spawn the optional cache sweeper (memory bound for long-lived
    /// processes; lazy expiry remains the correctness mechanism).
    pub fn spawn_cache_sweeper(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        self.cache.spawn_sweeper(interval)
    }

    /// Resolve a provider's full configuration, cached with a TTL and
    /// deduplicated across concurrent callers.
    pub async fn resolve(&self, provider: Provider) -> Result<ProviderConfig> {
        let key = format!("provider:{provider}");
        self.cache
            .get_or_compute(&key, None, || async {
                self.resolve_in_chain(provider, &self.chain)
            })
            .await
    }

    /// Resolve with per-call caller overrides as the highest tier. Bypasses
    /// the cache: overrides are scoped to one request and must never leak
    /// into cached state.
    pub fn resolve_with_overrides(
        &self,
        provider: Provider,
        overrides: BTreeMap<String, String>,
    ) -> Result<ProviderConfig> {
        if overrides.is_empty() {
            return self.resolve_in_chain(provider, &self.chain);
        }
        let chain = self.chain.with_caller(CallerEnv::from_map(overrides));
        self.resolve_in_chain(provider, &chain)
    }

    /// Drop cached configurations. `pattern` follows the cache's
    /// prefix/suffix/substring grammar; `None` clears everything.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        self.cache.invalidate(pattern)
    }

    /// Whether the provider has a usable (present, non-placeholder) API key.
    /// Absence is a legitimate state, not an error.
    pub fn is_configured(&self, provider: Provider) -> bool {
        self.api_key(provider, &self.chain).is_ok()
    }

    /// Explicit default provider, when `DEFAULT_LLM_PROVIDER` is set.
    /// An unknown name is a hard configuration error.
    pub fn default_provider(&self) -> Result<Option<Provider>> {
        let Some(raw) = self.chain.get_non_empty(DEFAULT_LLM_PROVIDER_VAR) else {
            return Ok(None);
        };
        raw.parse::<Provider>()
            .map(Some)
            .map_err(|unknown| ConfigError::UnknownProvider {
                name: unknown.0,
                source_field: DEFAULT_LLM_PROVIDER_VAR.to_string(),
            })
    }

    /// Explicit selection priority, when `PROVIDER_SELECTION_PRIORITY` is
    /// set. Comma-separated; unknown names are a hard configuration error,
    /// not a skip.
    pub fn selection_priority(&self) -> Result<Option<Vec<Provider>>> {
        let Some(raw) = self.chain.get_non_empty(PROVIDER_SELECTION_PRIORITY_VAR) else {
            return Ok(None);
        };
        let mut providers = Vec::new();
        for name in raw.split(',') {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let provider =
                name.parse::<Provider>()
                    .map_err(|unknown| ConfigError::UnknownProvider {
                        name: unknown.0,
                        source_field: PROVIDER_SELECTION_PRIORITY_VAR.to_string(),
                    })?;
            providers.push(provider);
        }
        Ok(Some(providers))
    }

    /// Best available provider: the explicit default when it is configured,
    /// otherwise the first configured provider in priority order (explicit
    /// list or the built-in enumeration order), otherwise `None`.
    pub fn best_available(&self) -> Result<Option<Provider>> {
        if let Some(default) = self.default_provider()? {
            if self.is_configured(default) {
                return Ok(Some(default));
            }
            log::debug!("default provider {default} is not configured; falling back to priority");
        }

        let priority = self
            .selection_priority()?
            .unwrap_or_else(|| Provider::ALL.to_vec());
        Ok(priority.into_iter().find(|p| self.is_configured(*p)))
    }

    fn test_mode(&self, chain: &SourceChain) -> bool {
        chain
            .get_non_empty(TEST_MODE_VAR)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    fn api_key(&self, provider: Provider, chain: &SourceChain) -> Result<String> {
        let var = provider.env_key("API_KEY");
        let Some(key) = chain.get_non_empty(&var) else {
            return Err(ConfigError::NotConfigured {
                provider,
                reason: format!("{var} is not set"),
                hint: format!("Set {var} to a valid API key for {provider}."),
            });
        };
        if self.placeholders.is_placeholder(&key, self.test_mode(chain)) {
            return Err(ConfigError::NotConfigured {
                provider,
                reason: format!("{var} contains a placeholder value"),
                hint: format!(
                    "Replace the template value in {var} with a real API key for {provider}."
                ),
            });
        }
        Ok(key)
    }

    fn resolve_in_chain(
        &self,
        provider: Provider,
        chain: &SourceChain,
    ) -> Result<ProviderConfig> {
        let api_key = self.api_key(provider, chain)?;

        let model_keys = [provider.env_key("MODEL"), provider.env_key("MODEL_DEFAULT")];
        let model = first_valid(chain, &model_keys, parse_string)
            .ok_or_else(|| {
                ConfigError::missing_required(provider, "model", model_keys.to_vec())
            })?
            .value;

        let temperature_keys = tiered_keys(provider, "TEMPERATURE", "LLM_TEMPERATURE");
        let temperature = first_valid(chain, &temperature_keys, parse_float_in_range(0.0, 2.0))
            .ok_or_else(|| {
                ConfigError::missing_required(provider, "temperature", temperature_keys.clone())
            })?
            .value;

        let max_tokens_keys = tiered_keys(provider, "MAX_TOKENS", "LLM_MAX_TOKENS");
        let max_tokens = first_valid(chain, &max_tokens_keys, |raw| {
            parse_positive_int(raw).and_then(|v| u32::try_from(v).ok())
        })
        .ok_or_else(|| {
            ConfigError::missing_required(provider, "max_tokens", max_tokens_keys.clone())
        })?
        .value;

        let timeout_keys = tiered_keys(provider, "TIMEOUT", "LLM_TIMEOUT");
        let timeout_ms = first_valid(chain, &timeout_keys, parse_positive_int)
            .ok_or_else(|| {
                ConfigError::missing_required(provider, "timeout_ms", timeout_keys.clone())
            })?
            .value;

        let reasoning = provider
            .supports_reasoning_controls()
            .then(|| resolve_reasoning(chain))
            .flatten();

        Ok(ProviderConfig {
            provider,
            api_key,
            model,
            temperature,
            max_tokens,
            timeout_ms,
            reasoning,
        })
    }
}

/// `{PROVIDER}_{FIELD}` -> `{GLOBAL}` -> `{GLOBAL}_DEFAULT`.
fn tiered_keys(provider: Provider, field: &str, global: &str) -> Vec<String> {
    vec![
        provider.env_key(field),
        global.to_string(),
        format!("{global}_DEFAULT"),
    ]
}

/// Extended reasoning parameters. Never fails: an invalid or missing value
/// simply leaves that parameter unset, so the provider remains usable.
fn resolve_reasoning(chain: &SourceChain) -> Option<ReasoningParams> {
    let with_default = |var: &str| vec![var.to_string(), format!("{var}_DEFAULT")];

    let max_completion_tokens = first_valid(
        chain,
        &with_default("OPENAI_MAX_COMPLETION_TOKENS"),
        |raw| parse_positive_int(raw).and_then(|v| u32::try_from(v).ok()),
    )
    .map(|r| r.value);

    let verbosity = first_valid(chain, &with_default("OPENAI_VERBOSITY"), |raw| {
        raw.parse::<Verbosity>().ok()
    })
    .map(|r| r.value);

    let reasoning_effort = first_valid(chain, &with_default("OPENAI_REASONING_EFFORT"), |raw| {
        raw.parse::<ReasoningEffort>().ok()
    })
    .map(|r| r.value);

    let params = ReasoningParams {
        max_completion_tokens,
        verbosity,
        reasoning_effort,
    };
    (!params.is_empty()).then_some(params)
}
