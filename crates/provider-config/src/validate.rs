//! Declarative configuration validation.
//!
//! Validation never throws: every pass produces a full report so an operator
//! can fix all problems in one round instead of replaying startup once per
//! error. Report ordering is deterministic: global rules first, then
//! providers in enumeration order.

use reason_protocol::{ErrorCategory, ValidationReport};

use crate::engine::{
    ProviderConfigEngine, DEFAULT_LLM_PROVIDER_VAR, PROVIDER_SELECTION_PRIORITY_VAR,
};
use crate::provider::{Provider, ProviderConfig};

pub const MAX_TOKENS_CEILING: u32 = 200_000;
pub const TIMEOUT_CEILING_MS: u64 = 300_000;

struct FieldRule {
    field: &'static str,
    check: fn(&ProviderConfig) -> Option<String>,
}

/// Base rule set applied to every resolved provider configuration.
const BASE_RULES: &[FieldRule] = &[
    FieldRule {
        field: "api_key",
        check: |c| c.api_key.trim().is_empty().then(|| "must be a non-empty string".to_string()),
    },
    FieldRule {
        field: "model",
        check: |c| c.model.trim().is_empty().then(|| "must be a non-empty string".to_string()),
    },
    FieldRule {
        field: "temperature",
        check: |c| {
            (!(0.0..=2.0).contains(&c.temperature))
                .then(|| format!("must be between 0 and 2 (got {})", c.temperature))
        },
    },
    FieldRule {
        field: "max_tokens",
        check: |c| {
            (c.max_tokens == 0 || c.max_tokens > MAX_TOKENS_CEILING)
                .then(|| format!("must be in 1..={MAX_TOKENS_CEILING} (got {})", c.max_tokens))
        },
    },
    FieldRule {
        field: "timeout_ms",
        check: |c| {
            (c.timeout_ms == 0 || c.timeout_ms > TIMEOUT_CEILING_MS)
                .then(|| format!("must be in 1..={TIMEOUT_CEILING_MS} (got {})", c.timeout_ms))
        },
    },
];

/// Optional extended-parameter rules, checked only when the block is present.
const REASONING_RULES: &[FieldRule] = &[FieldRule {
    field: "max_completion_tokens",
    check: |c| match c.reasoning.as_ref().and_then(|r| r.max_completion_tokens) {
        Some(0) => Some("must be a positive integer".to_string()),
        Some(v) if v > MAX_TOKENS_CEILING => {
            Some(format!("must be at most {MAX_TOKENS_CEILING} (got {v})"))
        }
        _ => None,
    },
}];

/// Apply the base rule set plus the provider-specific optional rules to one
/// resolved configuration.
pub fn validate_provider(provider: Provider, config: &ProviderConfig) -> ValidationReport {
    let mut report = ValidationReport::passing();
    for rule in BASE_RULES {
        if let Some(message) = (rule.check)(config) {
            report.error(
                rule.field,
                message,
                ErrorCategory::Configuration,
                Some(provider.as_str()),
            );
        }
    }
    if config.reasoning.is_some() {
        for rule in REASONING_RULES {
            if let Some(message) = (rule.check)(config) {
                report.error(
                    rule.field,
                    message,
                    ErrorCategory::Configuration,
                    Some(provider.as_str()),
                );
            }
        }
    }
    report
}

pub struct SystemValidator<'e> {
    engine: &'e ProviderConfigEngine,
}

impl<'e> SystemValidator<'e> {
    pub fn new(engine: &'e ProviderConfigEngine) -> Self {
        Self { engine }
    }

    /// Cross-field checks over the global selection variables.
    pub fn validate_global(&self) -> ValidationReport {
        let mut report = ValidationReport::passing();
        let chain = self.engine.chain();

        let priority = match self.engine.selection_priority() {
            Ok(Some(providers)) => Some(providers),
            Ok(None) => {
                report.warning(
                    PROVIDER_SELECTION_PRIORITY_VAR,
                    "not set; provider selection uses the built-in order",
                    None,
                );
                None
            }
            Err(err) => {
                report.error(
                    PROVIDER_SELECTION_PRIORITY_VAR,
                    err.to_string(),
                    ErrorCategory::Configuration,
                    None,
                );
                None
            }
        };

        match self.engine.default_provider() {
            Ok(Some(default)) => {
                // Cross-dependency: when both variables are set, the default
                // must be a member of the priority list.
                if let Some(priority) = &priority {
                    if !priority.contains(&default) {
                        report.error(
                            DEFAULT_LLM_PROVIDER_VAR,
                            format!(
                                "'{default}' must appear in {PROVIDER_SELECTION_PRIORITY_VAR} \
                                 when both variables are set"
                            ),
                            ErrorCategory::Configuration,
                            None,
                        );
                    }
                }
            }
            Ok(None) => {
                if chain.has(DEFAULT_LLM_PROVIDER_VAR) {
                    // Present but blank: treated as unset by resolution.
                    report.warning(DEFAULT_LLM_PROVIDER_VAR, "set but empty; ignored", None);
                } else {
                    report.warning(
                        DEFAULT_LLM_PROVIDER_VAR,
                        "not set; the priority list decides the default",
                        None,
                    );
                }
            }
            Err(err) => {
                report.error(
                    DEFAULT_LLM_PROVIDER_VAR,
                    err.to_string(),
                    ErrorCategory::Configuration,
                    None,
                );
            }
        }

        report
    }

    /// Union of the global report and every configured provider's report.
    /// Unconfigured providers are skipped: absence is a legitimate state.
    pub async fn validate_system(&self) -> ValidationReport {
        let mut report = self.validate_global();

        for provider in Provider::ALL {
            if !self.engine.is_configured(provider) {
                continue;
            }
            match self.engine.resolve(provider).await {
                Ok(config) => report.merge(validate_provider(provider, &config)),
                Err(err) => {
                    let field = match &err {
                        crate::error::ConfigError::MissingRequired { field, .. } => *field,
                        _ => "configuration",
                    };
                    report.error(
                        field,
                        err.to_string(),
                        err.category(),
                        Some(provider.as_str()),
                    );
                }
            }
        }

        report
    }
}
