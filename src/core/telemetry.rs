//! Telemetry Builder (§4.7)
//!
//! Accumulates a single `Observability` record per `chatCompletion` call
//! and emits it exactly once, fire-and-forget, via an optional sink
//! callback. Sink failures are isolated and never affect the primary
//! return value.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// One fallback attempt recorded for a non-terminal failure.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackAttempt {
    pub provider: String,
    pub model: String,
    pub reason: String,
}

/// Stage timings, all in milliseconds, relative to builder construction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Timings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,
}

/// Experiment context attached when routing resolved through a weighted
/// or tag-matched rule.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub weighted_selection: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_weight: Option<u8>,
}

/// Normalized error detail carried in a failed event.
#[derive(Debug, Clone, Serialize)]
pub struct EventError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

/// The per-request structured record emitted exactly once to the sink
/// callback (§6 "Observability event").
#[derive(Debug, Clone, Serialize)]
pub struct Observability {
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sdk_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    pub prompt_id: String,
    pub variant_id: String,
    pub routing_reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_tags: Option<Vec<String>>,
    pub timings: Timings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<crate::core::types::Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_request_id: Option<String>,
    pub fallback_used: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FallbackAttempt>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<EventError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_context: Option<ExperimentContext>,
}

/// A callback invoked exactly once per `chatCompletion` call with the
/// finished event.
pub type ObservabilitySink = std::sync::Arc<dyn Fn(Observability) + Send + Sync>;

pub struct TelemetryBuilder {
    start: Instant,
    event: Observability,
    sink: Option<ObservabilitySink>,
}

const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

impl TelemetryBuilder {
    pub fn new(prompt_id: impl Into<String>, user_id: Option<String>, environment: Option<String>, sink: Option<ObservabilitySink>) -> Self {
        Self {
            start: Instant::now(),
            event: Observability {
                request_id: Uuid::new_v4(),
                user_id,
                timestamp: Utc::now(),
                sdk_version: SDK_VERSION,
                environment,
                prompt_id: prompt_id.into(),
                variant_id: "unknown".to_string(),
                routing_reason: "unknown".to_string(),
                routing_tags: None,
                timings: Timings::default(),
                token_usage: None,
                provider: None,
                model: None,
                provider_request_id: None,
                fallback_used: false,
                fallbacks: Vec::new(),
                success: false,
                error: None,
                experiment_context: None,
            },
            sink,
        }
    }

    pub fn set_variant_id(&mut self, id: impl Into<String>) {
        self.event.variant_id = id.into();
    }

    pub fn set_routing(&mut self, reason: impl Into<String>, tags: Option<Vec<String>>) {
        self.event.routing_reason = reason.into();
        self.event.routing_tags = tags;
    }

    pub fn set_experiment_context(&mut self, tags: Option<Vec<String>>, weighted_selection: bool, selected_weight: Option<u8>) {
        self.event.experiment_context = Some(ExperimentContext { tags, weighted_selection, selected_weight });
    }

    pub fn mark_template(&mut self) {
        self.event.timings.template = Some(self.start.elapsed().as_millis());
    }

    pub fn mark_provider(&mut self) {
        self.event.timings.provider = Some(self.start.elapsed().as_millis());
    }

    pub fn set_provider(&mut self, provider: impl Into<String>, model: impl Into<String>) {
        self.event.provider = Some(provider.into());
        self.event.model = Some(model.into());
    }

    pub fn set_provider_request_id(&mut self, id: impl Into<String>) {
        self.event.provider_request_id = Some(id.into());
    }

    pub fn set_token_usage(&mut self, usage: crate::core::types::Usage) {
        self.event.token_usage = Some(usage);
    }

    pub fn add_fallback_attempt(&mut self, provider: impl Into<String>, model: impl Into<String>, reason: impl Into<String>) {
        self.event.fallback_used = true;
        self.event.fallbacks.push(FallbackAttempt {
            provider: provider.into(),
            model: model.into(),
            reason: reason.into(),
        });
    }

    fn finalize(&mut self) {
        self.event.timings.total = Some(self.start.elapsed().as_millis());
        self.event.timings.retries = Some(self.event.fallbacks.len() as u32);
    }

    fn emit(self) {
        if let Some(sink) = &self.sink {
            // Error isolation (§9): a misbehaving sink must not observe
            // itself in the next event, nor affect the caller.
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (sink)(self.event.clone())));
            if result.is_err() {
                tracing::warn!("observability sink panicked");
            }
        }
    }

    pub fn build_success(mut self) -> Observability {
        self.finalize();
        self.event.success = true;
        let event = self.event.clone();
        self.emit();
        event
    }

    pub fn build_error(mut self, error: EventError) -> Observability {
        self.finalize();
        self.event.success = false;
        self.event.error = Some(error);
        let event = self.event.clone();
        self.emit();
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_exactly_once_on_success() {
        let count = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counted = count.clone();
        let sink: ObservabilitySink = std::sync::Arc::new(move |_| {
            counted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });
        let mut builder = TelemetryBuilder::new("greeting", None, None, Some(sink));
        builder.set_variant_id("v1");
        let event = builder.build_success();
        assert!(event.success);
        assert_eq!(count.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn sink_panic_is_isolated() {
        let sink: ObservabilitySink = std::sync::Arc::new(|_| panic!("boom"));
        let builder = TelemetryBuilder::new("greeting", None, None, Some(sink));
        let event = builder.build_success();
        assert!(event.success);
    }
}
