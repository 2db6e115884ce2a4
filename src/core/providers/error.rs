//! Provider error normalization
//!
//! Internal to the provider adapters and the fallback executor. Never
//! surfaced as-is to callers of the orchestrator: `Orchestrator::chat_completion`
//! folds the last one into an `EngineError::Execution` on fallback exhaustion.

use std::fmt;

/// Why a `ProviderError` was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorReason {
    /// HTTP 429
    RateLimit,
    /// HTTP 408 or 504
    Timeout,
    /// Anything else
    ProviderError,
}

impl fmt::Display for ProviderErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "rate-limit"),
            Self::Timeout => write!(f, "timeout"),
            Self::ProviderError => write!(f, "provider-error"),
        }
    }
}

/// Normalized provider failure.
///
/// Constructed by provider adapters from a thrown/returned vendor error and
/// consumed by the fallback executor, which uses `retryable` to decide
/// whether to advance to the next target in the chain.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{reason} from {provider}: {message}")]
pub struct ProviderError {
    pub provider: String,
    pub reason: ProviderErrorReason,
    pub retryable: bool,
    pub code: Option<String>,
    pub http_status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    /// Classify an HTTP status code per the rules of the spec's §4.5:
    /// 429 -> rate-limit (retryable), 408/504 -> timeout (retryable),
    /// anything else -> provider-error (not retryable).
    pub fn from_http_status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let provider = provider.into();
        let message = message.into();
        match status {
            429 => Self {
                provider,
                reason: ProviderErrorReason::RateLimit,
                retryable: true,
                code: None,
                http_status: Some(status),
                message,
            },
            408 | 504 => Self {
                provider,
                reason: ProviderErrorReason::Timeout,
                retryable: true,
                code: None,
                http_status: Some(status),
                message,
            },
            _ => Self {
                provider,
                reason: ProviderErrorReason::ProviderError,
                retryable: false,
                code: None,
                http_status: Some(status),
                message,
            },
        }
    }

    /// A timeout not carrying an HTTP status (e.g. a caller-supplied
    /// cancellation signal firing mid-request). Per §5, this must be
    /// retryable so that fallback proceeds.
    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reason: ProviderErrorReason::Timeout,
            retryable: true,
            code: None,
            http_status: None,
            message: message.into(),
        }
    }

    /// A non-HTTP, non-retryable provider failure (bad request, malformed
    /// response, etc).
    pub fn other(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reason: ProviderErrorReason::ProviderError,
            retryable: false,
            code: None,
            http_status: None,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_rate_limit_as_retryable() {
        let err = ProviderError::from_http_status("openai", 429, "too many requests");
        assert_eq!(err.reason, ProviderErrorReason::RateLimit);
        assert!(err.retryable);
    }

    #[test]
    fn classifies_timeout_status_as_retryable() {
        for status in [408, 504] {
            let err = ProviderError::from_http_status("openai", status, "timed out");
            assert_eq!(err.reason, ProviderErrorReason::Timeout);
            assert!(err.retryable);
        }
    }

    #[test]
    fn classifies_other_status_as_terminal() {
        let err = ProviderError::from_http_status("openai", 500, "server error");
        assert_eq!(err.reason, ProviderErrorReason::ProviderError);
        assert!(!err.retryable);
    }
}
