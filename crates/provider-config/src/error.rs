//! Categorized configuration errors.
//!
//! `ConfigError` is `Clone` because single-flight cache waiters all receive
//! the same resolution outcome, success or failure.

use reason_protocol::ErrorCategory;
use thiserror::Error;

use crate::provider::Provider;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required setting could not be resolved from any tier of the chain.
    /// `tried` lists the exact environment variables consulted, in order.
    #[error("{provider}: no valid value for {field} (checked {})", tried.join(", "))]
    MissingRequired {
        provider: Provider,
        field: &'static str,
        tried: Vec<String>,
        hint: String,
    },

    /// The provider has no usable API key (absent, empty, or a placeholder).
    #[error("{provider}: not configured ({reason})")]
    NotConfigured {
        provider: Provider,
        reason: String,
        hint: String,
    },

    /// A provider name outside the fixed set appeared where one was required
    /// (e.g. in `PROVIDER_SELECTION_PRIORITY` or `DEFAULT_LLM_PROVIDER`).
    #[error("unknown provider '{name}' in {source_field}")]
    UnknownProvider { name: String, source_field: String },

    /// A single-flight computation died without publishing a result.
    #[error("configuration resolution for '{key}' aborted before completing")]
    ResolutionAborted { key: String },
}

impl ConfigError {
    /// All current variants are configuration failures; the accessor exists so
    /// callers branch on category rather than matching variants.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }

    /// Provider the error is scoped to, when it is provider-specific.
    pub fn provider(&self) -> Option<Provider> {
        match self {
            ConfigError::MissingRequired { provider, .. }
            | ConfigError::NotConfigured { provider, .. } => Some(*provider),
            ConfigError::UnknownProvider { .. } | ConfigError::ResolutionAborted { .. } => None,
        }
    }

    /// Human troubleshooting hint naming the exact settings to fix.
    pub fn hint(&self) -> Option<&str> {
        match self {
            ConfigError::MissingRequired { hint, .. }
            | ConfigError::NotConfigured { hint, .. } => Some(hint),
            ConfigError::UnknownProvider { .. } | ConfigError::ResolutionAborted { .. } => None,
        }
    }

    pub(crate) fn missing_required(
        provider: Provider,
        field: &'static str,
        tried: Vec<String>,
    ) -> Self {
        let hint = format!(
            "Set one of: {}. Provider-specific variables win over the global LLM_* tier.",
            tried.join(", ")
        );
        ConfigError::MissingRequired {
            provider,
            field,
            tried,
            hint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_names_every_env_var() {
        let err = ConfigError::missing_required(
            Provider::OpenAi,
            "model",
            vec!["OPENAI_MODEL".to_string(), "OPENAI_MODEL_DEFAULT".to_string()],
        );
        let text = err.to_string();
        assert!(text.contains("OPENAI_MODEL"));
        assert!(text.contains("OPENAI_MODEL_DEFAULT"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.hint().unwrap().contains("OPENAI_MODEL"));
        assert_eq!(err.provider(), Some(Provider::OpenAi));
    }
}
