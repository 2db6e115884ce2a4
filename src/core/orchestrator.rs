//! Orchestrator (§4.8)
//!
//! Exposes `get_template` and `chat_completion`. Owns the single-flight
//! cached `Config` and the per-provider-type adapter cache (§5).

use crate::config::models::{Config, ProviderType, ResponseFormat};
use crate::core::fallback::{self, Target};
use crate::core::params;
use crate::core::providers::{self, ChatOptions, ChatProvider, ResponseFormatHint};
use crate::core::router;
use crate::core::telemetry::{EventError, ObservabilitySink, TelemetryBuilder};
use crate::core::template;
use crate::core::types::{ChatCompletionResponse, ChatMessage};
use crate::utils::error::{EngineError, ErrorDetails, Result};
use dashmap::DashMap;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Deployment environment, carried through into telemetry events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Prod => write!(f, "prod"),
        }
    }
}

/// Construction parameters for an `Engine` (§6 `runtimeConfig`).
pub struct RuntimeConfig {
    pub config_path: PathBuf,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub environment: Environment,
    pub on_observability: Option<ObservabilitySink>,
}

/// `getTemplate` parameters (§4.8.1).
pub struct GetTemplateParams {
    pub prompt_id: String,
    pub variant_id: String,
    pub variables: Value,
}

/// `chatCompletion` parameters (§4.8.2).
#[derive(Default)]
pub struct ChatCompletionParams {
    pub prompt_id: String,
    pub variables: Option<Value>,
    pub message_history: Option<Vec<ChatMessage>>,
    pub user_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub unix_time: Option<i64>,
}

pub struct Engine {
    runtime_config: RuntimeConfig,
    config_cell: OnceCell<Arc<Config>>,
    providers: DashMap<ProviderType, Arc<dyn ChatProvider>>,
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Engine {
    pub fn new(runtime_config: RuntimeConfig) -> Self {
        Self {
            runtime_config,
            config_cell: OnceCell::new(),
            providers: DashMap::new(),
        }
    }

    /// Single-flight cached config load (§5): concurrent first callers
    /// share the same in-flight computation via `OnceCell::get_or_try_init`.
    async fn config(&self) -> Result<Arc<Config>> {
        self.config_cell
            .get_or_try_init(|| async {
                crate::config::load_and_validate_config(&self.runtime_config.config_path)
                    .await
                    .map(Arc::new)
            })
            .await
            .cloned()
    }

    /// Provider-instance cache, keyed by provider type. Construction is
    /// synchronous and side-effect-free, so a plain cached insert is
    /// already single-flight: there's no await between the check and the
    /// insert for a second caller to race into. The `base_url` override
    /// (from a config `providers` entry's `extras.baseUrl`) only takes
    /// effect on the first build for a given type, consistent with caching
    /// per-type rather than per-config-entry.
    fn provider(&self, provider_type: ProviderType, base_url: Option<&str>) -> Arc<dyn ChatProvider> {
        if let Some(existing) = self.providers.get(&provider_type) {
            return existing.clone();
        }
        let provider: Arc<dyn ChatProvider> = Arc::from(providers::build(provider_type, base_url));
        self.providers.insert(provider_type, provider.clone());
        provider
    }

    fn api_key_for(&self, provider_type: ProviderType) -> Result<String> {
        let key = match provider_type {
            ProviderType::Openai => &self.runtime_config.openai_api_key,
            ProviderType::Anthropic => &self.runtime_config.anthropic_api_key,
            ProviderType::Google => &self.runtime_config.google_api_key,
        };
        key.clone().ok_or_else(|| {
            EngineError::execution_with(
                format!("missing API key for provider type `{provider_type}`"),
                ErrorDetails::new().with_identifier(provider_type.to_string()),
            )
        })
    }

    /// Resolve a prompt and variant, render every message, return the list.
    /// Does not route, does not touch providers, does not emit telemetry.
    pub async fn get_template(&self, params: GetTemplateParams) -> Result<Vec<ChatMessage>> {
        let config = self.config().await?;
        let prompt = config.prompts.get(&params.prompt_id).ok_or_else(|| {
            EngineError::execution_with(
                format!("unknown prompt `{}`", params.prompt_id),
                ErrorDetails::new().with_identifier(params.prompt_id.clone()),
            )
        })?;
        let variant = prompt.variants.get(&params.variant_id).ok_or_else(|| {
            EngineError::execution_with(
                format!("unknown variant `{}`", params.variant_id),
                ErrorDetails::new().with_identifier(params.variant_id.clone()),
            )
        })?;
        render_messages(variant, &params.variables)
    }

    /// Route, render, execute with fallback, and emit telemetry exactly once.
    pub async fn chat_completion(&self, params: ChatCompletionParams) -> Result<ChatCompletionResponse> {
        let mut telemetry = TelemetryBuilder::new(
            params.prompt_id.clone(),
            params.user_id.clone(),
            Some(self.runtime_config.environment.to_string()),
            self.runtime_config.on_observability.clone(),
        );

        match self.chat_completion_inner(&params, &mut telemetry).await {
            Ok(response) => {
                telemetry.build_success();
                Ok(response)
            }
            Err(error) => {
                telemetry.build_error(EventError {
                    kind: error.kind().to_string(),
                    message: error.to_string(),
                    code: None,
                    retryable: false,
                    provider: None,
                    http_status: None,
                });
                Err(error)
            }
        }
    }

    async fn chat_completion_inner(
        &self,
        params: &ChatCompletionParams,
        telemetry: &mut TelemetryBuilder,
    ) -> Result<ChatCompletionResponse> {
        let config = self.config().await?;
        let prompt = config.prompts.get(&params.prompt_id).ok_or_else(|| {
            EngineError::execution_with(
                format!("unknown prompt `{}`", params.prompt_id),
                ErrorDetails::new().with_identifier(params.prompt_id.clone()),
            )
        })?;

        let tags = params.tags.clone().unwrap_or_default();
        let now = params.unix_time.unwrap_or_else(now_unix);
        let selection = router::select(prompt, &params.prompt_id, params.user_id.as_deref(), &tags, now)?;
        telemetry.set_variant_id(selection.variant_id.clone());
        telemetry.set_routing(selection.reason.to_string(), selection.tags.clone());
        telemetry.set_experiment_context(
            selection.tags.clone(),
            matches!(
                selection.reason,
                router::RoutingReason::TagMatch | router::RoutingReason::PhasedRollout | router::RoutingReason::WeightDistribution
            ),
            selection.selected_weight,
        );

        let variables = params.variables.clone().unwrap_or_else(|| Value::Object(Default::default()));
        let mut messages = render_messages(selection.variant, &variables)?;
        telemetry.mark_template();

        if let Some(history) = &params.message_history {
            let mut combined = history.clone();
            combined.append(&mut messages);
            messages = combined;
        }

        let mut targets = vec![target_for(&config, &selection.variant.provider, &selection.variant.model)];
        if let Some(fallback) = &selection.variant.fallback {
            for step in fallback {
                targets.push(target_for(&config, &step.provider, &step.model));
            }
        }

        let response_format = match &selection.variant.response_format {
            ResponseFormat::RawText => ResponseFormatHint::RawText,
            ResponseFormat::JsonSchema { schema_ref } => {
                let schema = config.response_schemas.get(schema_ref).cloned().unwrap_or(Value::Null);
                ResponseFormatHint::JsonSchema { schema }
            }
        };

        let user_id = params.user_id.clone();
        let result = fallback::execute(
            &targets,
            |target| {
                let provider = self.provider(target.provider_type, target.base_url.as_deref());
                let api_key = self.api_key_for(target.provider_type);
                let options = api_key.map(|api_key| ChatOptions {
                    model: target.model.clone(),
                    messages: messages.clone(),
                    user_id: user_id.clone(),
                    response_format: response_format.clone(),
                    parameters: params::map(target.provider_type, &selection.variant.parameters),
                    api_key,
                });
                async move {
                    match options {
                        Ok(options) => provider.chat_completion(&options).await,
                        Err(_) => Err(crate::core::providers::error::ProviderError::other(
                            target.provider_id.clone(),
                            "missing API key",
                        )),
                    }
                }
            },
            |attempt| match attempt {
                fallback::Attempt::Success { target } => {
                    telemetry.set_provider(target.provider_id.clone(), target.model.clone());
                }
                fallback::Attempt::Failure { target, error } => {
                    telemetry.add_fallback_attempt(target.provider_id.clone(), target.model.clone(), error.reason.to_string());
                }
            },
        )
        .await;
        telemetry.mark_provider();

        match result {
            Ok(response) => {
                if let Some(usage) = response.usage {
                    telemetry.set_token_usage(usage);
                }
                telemetry.set_provider_request_id(response.id.clone());
                Ok(response)
            }
            Err(provider_error) => Err(EngineError::execution_with(
                format!("fallback chain exhausted: {provider_error}"),
                ErrorDetails::new()
                    .with_identifier(provider_error.provider.clone())
                    .with_suggestion("every target in the fallback chain failed"),
            )),
        }
    }
}

/// Resolve a fallback-chain entry's provider type and optional base URL
/// override from the config's `providers` map. Falls back to `Openai` and
/// no override if `provider_id` names an entry that validation should
/// already have rejected.
fn target_for(config: &Config, provider_id: &str, model: &str) -> Target {
    let entry = config.providers.get(provider_id);
    let provider_type = entry.map(|p| p.provider_type).unwrap_or(ProviderType::Openai);
    let base_url = entry
        .and_then(|p| p.extras.get("baseUrl"))
        .and_then(|v| v.as_str())
        .map(str::to_string);
    Target { provider_id: provider_id.to_string(), provider_type, model: model.to_string(), base_url }
}

fn render_messages(variant: &crate::config::models::Variant, variables: &Value) -> Result<Vec<ChatMessage>> {
    variant
        .messages
        .iter()
        .map(|m| {
            let rendered = template::render(&m.content.template, variables)?;
            Ok(ChatMessage::new(role_from_message(m.role), rendered))
        })
        .collect()
}

fn role_from_message(role: crate::config::models::MessageRole) -> crate::core::types::Role {
    match role {
        crate::config::models::MessageRole::System => crate::core::types::Role::System,
        crate::config::models::MessageRole::User => crate::core::types::Role::User,
        crate::config::models::MessageRole::Assistant => crate::core::types::Role::Assistant,
    }
}
