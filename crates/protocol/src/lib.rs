//! Shared protocol types for Reason MCP.
//!
//! Error taxonomy and validation-report types used across the configuration
//! engine, the file-context tools, and the model backends. Kept in a leaf
//! crate so every other crate agrees on categories without depending on the
//! server surface.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure category carried by every error that crosses a component
/// boundary. Callers branch on the category, not on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Configuration,
    Network,
    Authentication,
    Authorization,
    RateLimit,
    Timeout,
    Validation,
    Provider,
    NotFound,
    Conflict,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCategory::Configuration => "CONFIGURATION",
            ErrorCategory::Network => "NETWORK",
            ErrorCategory::Authentication => "AUTHENTICATION",
            ErrorCategory::Authorization => "AUTHORIZATION",
            ErrorCategory::RateLimit => "RATE_LIMIT",
            ErrorCategory::Timeout => "TIMEOUT",
            ErrorCategory::Validation => "VALIDATION",
            ErrorCategory::Provider => "PROVIDER",
            ErrorCategory::NotFound => "NOT_FOUND",
            ErrorCategory::Conflict => "CONFLICT",
            ErrorCategory::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// A single validation failure. `provider` is set for per-provider rules and
/// absent for global/cross-field rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub category: ErrorCategory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// A non-fatal validation finding. Warnings never flip `is_valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Aggregated result of one validation pass. Produced fresh on every call and
/// never mutated after being returned; `merge` is for building the aggregate,
/// not for patching a published report.
///
/// Error and warning order is significant: constituents are appended in
/// validation order (global first, then providers in enumeration order) so
/// operator-facing reports and test assertions are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn passing() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn error(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
        category: ErrorCategory,
        provider: Option<&str>,
    ) {
        self.is_valid = false;
        self.errors.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
            category,
            provider: provider.map(str::to_string),
        });
    }

    pub fn warning(
        &mut self,
        field: impl Into<String>,
        message: impl Into<String>,
        provider: Option<&str>,
    ) {
        self.warnings.push(ValidationWarning {
            field: field.into(),
            message: message.into(),
            provider: provider.map(str::to_string),
        });
    }

    /// Fold another report into this one. Overall validity is the logical AND;
    /// errors and warnings concatenate preserving each report's order.
    pub fn merge(&mut self, other: ValidationReport) {
        self.is_valid = self.is_valid && other.is_valid;
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_preserves_order_and_ands_validity() {
        let mut global = ValidationReport::passing();
        global.error(
            "PROVIDER_SELECTION_PRIORITY",
            "unknown provider 'grok'",
            ErrorCategory::Configuration,
            None,
        );

        let mut provider = ValidationReport::passing();
        provider.error(
            "temperature",
            "must be between 0 and 2",
            ErrorCategory::Configuration,
            Some("openai"),
        );
        provider.warning("model", "unrecognized model id", Some("openai"));

        let mut aggregate = ValidationReport::passing();
        aggregate.merge(global);
        aggregate.merge(provider);

        assert!(!aggregate.is_valid);
        assert_eq!(aggregate.errors.len(), 2);
        assert_eq!(aggregate.errors[0].field, "PROVIDER_SELECTION_PRIORITY");
        assert_eq!(aggregate.errors[1].provider.as_deref(), Some("openai"));
        assert_eq!(aggregate.warnings.len(), 1);
    }

    #[test]
    fn category_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::RateLimit).unwrap();
        assert_eq!(json, "\"RATE_LIMIT\"");
        assert_eq!(ErrorCategory::NotFound.to_string(), "NOT_FOUND");
    }

    #[test]
    fn warnings_do_not_flip_validity() {
        let mut report = ValidationReport::passing();
        report.warning("DEFAULT_LLM_PROVIDER", "not set; using priority order", None);
        assert!(report.is_valid);
    }
}
