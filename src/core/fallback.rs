//! Fallback Executor (§4.6)
//!
//! Contract: `execute(targets, attemptFn, getProvider, onAttempt?) ->
//! response`. Drives an ordered list of `(provider, model)` attempts,
//! honoring retryable/terminal error classification. No backoff, no delay,
//! no cap beyond the list length.

use super::providers::error::ProviderError;
use crate::config::models::ProviderType;

/// One entry in the fallback chain (Glossary: "Fallback chain"). Element
/// zero is the primary.
#[derive(Debug, Clone)]
pub struct Target {
    pub provider_id: String,
    pub provider_type: ProviderType,
    pub model: String,
    pub base_url: Option<String>,
}

/// Observed outcome of one attempt, passed to the `on_attempt` callback for
/// telemetry bookkeeping.
pub enum Attempt<'a> {
    Success { target: &'a Target },
    Failure { target: &'a Target, error: &'a ProviderError },
}

/// Run `attempt` over `targets` in order. On a retryable `ProviderError`,
/// advance to the next target; on a non-retryable one, stop immediately.
/// On exhaustion, return the last error.
pub async fn execute<T, F, Fut, A>(targets: &[Target], mut attempt: F, mut on_attempt: A) -> Result<T, ProviderError>
where
    F: FnMut(&Target) -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
    A: FnMut(Attempt<'_>),
{
    let mut last_error: Option<ProviderError> = None;
    for target in targets {
        match attempt(target).await {
            Ok(response) => {
                on_attempt(Attempt::Success { target });
                return Ok(response);
            }
            Err(error) => {
                on_attempt(Attempt::Failure { target, error: &error });
                if !error.retryable {
                    return Err(error);
                }
                last_error = Some(error);
            }
        }
    }
    Err(last_error.expect("targets is non-empty, so at least one attempt ran"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn target(id: &str) -> Target {
        Target { provider_id: id.to_string(), provider_type: ProviderType::Openai, model: "m".into(), base_url: None }
    }

    #[tokio::test]
    async fn exhausts_all_targets_on_retryable_errors() {
        let targets = vec![target("a"), target("b"), target("c")];
        let calls = AtomicUsize::new(0);
        let result: Result<(), ProviderError> = execute(
            &targets,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::from_http_status("openai", 429, "rate limited")) }
            },
            |_| {},
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn short_circuits_on_non_retryable_error() {
        let targets = vec![target("a"), target("b")];
        let calls = AtomicUsize::new(0);
        let result: Result<(), ProviderError> = execute(
            &targets,
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ProviderError::from_http_status("openai", 400, "bad request")) }
            },
            |_| {},
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn returns_on_first_success() {
        let targets = vec![target("a"), target("b")];
        let result = execute(&targets, |_| async { Ok::<_, ProviderError>(42) }, |_| {}).await;
        assert_eq!(result.unwrap(), 42);
    }
}
