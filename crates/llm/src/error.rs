use reason_protocol::ErrorCategory;
use thiserror::Error;

pub type LlmResult<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider}: authentication failed: {message}")]
    Authentication { provider: String, message: String },

    #[error("{provider}: access denied: {message}")]
    Authorization { provider: String, message: String },

    #[error("{provider}: rate limited: {message}")]
    RateLimited { provider: String, message: String },

    #[error("{provider}: request timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("{provider}: network error: {message}")]
    Network { provider: String, message: String },

    #[error("{provider}: model '{model}' not found")]
    ModelNotFound { provider: String, model: String },

    #[error("{provider}: invalid request: {message}")]
    InvalidRequest { provider: String, message: String },

    #[error("{provider}: backend error (status {status}): {message}")]
    Backend {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("{provider}: unexpected response shape: {message}")]
    MalformedResponse { provider: String, message: String },
}

impl LlmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LlmError::Authentication { .. } => ErrorCategory::Authentication,
            LlmError::Authorization { .. } => ErrorCategory::Authorization,
            LlmError::RateLimited { .. } => ErrorCategory::RateLimit,
            LlmError::Timeout { .. } => ErrorCategory::Timeout,
            LlmError::Network { .. } => ErrorCategory::Network,
            LlmError::ModelNotFound { .. } => ErrorCategory::NotFound,
            LlmError::InvalidRequest { .. } => ErrorCategory::Validation,
            LlmError::Backend { .. } | LlmError::MalformedResponse { .. } => {
                ErrorCategory::Provider
            }
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            LlmError::Authentication { provider, .. }
            | LlmError::Authorization { provider, .. }
            | LlmError::RateLimited { provider, .. }
            | LlmError::Timeout { provider, .. }
            | LlmError::Network { provider, .. }
            | LlmError::ModelNotFound { provider, .. }
            | LlmError::InvalidRequest { provider, .. }
            | LlmError::Backend { provider, .. }
            | LlmError::MalformedResponse { provider, .. } => provider,
        }
    }
}

/// Map an HTTP error status to the taxonomy. Unknown statuses become
/// provider-side backend failures.
pub fn classify_http_error(status: u16, body: &str, provider: &str, model: &str) -> LlmError {
    let provider = provider.to_string();
    match status {
        401 => LlmError::Authentication {
            provider,
            message: truncate(body),
        },
        403 => LlmError::Authorization {
            provider,
            message: truncate(body),
        },
        404 => LlmError::ModelNotFound {
            provider,
            model: model.to_string(),
        },
        429 => LlmError::RateLimited {
            provider,
            message: truncate(body),
        },
        400 | 422 => LlmError::InvalidRequest {
            provider,
            message: truncate(body),
        },
        _ => LlmError::Backend {
            provider,
            status,
            message: truncate(body),
        },
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 600;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_statuses_map_to_taxonomy() {
        let cases = [
            (401, ErrorCategory::Authentication),
            (403, ErrorCategory::Authorization),
            (404, ErrorCategory::NotFound),
            (429, ErrorCategory::RateLimit),
            (400, ErrorCategory::Validation),
            (500, ErrorCategory::Provider),
            (503, ErrorCategory::Provider),
        ];
        for (status, category) in cases {
            let err = classify_http_error(status, "body", "openai", "gpt-4o");
            assert_eq!(err.category(), category, "status {status}");
            assert_eq!(err.provider(), "openai");
        }
    }

    #[test]
    fn timeout_is_its_own_category() {
        let err = LlmError::Timeout {
            provider: "google".to_string(),
            timeout_ms: 30_000,
        };
        assert_eq!(err.category(), ErrorCategory::Timeout);
        assert!(err.to_string().contains("30000ms"));
    }
}
