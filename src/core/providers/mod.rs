//! Provider Adapters (§4.5)
//!
//! Three adapters share a common contract: `chatCompletion(options) ->
//! response`. Each normalizes a canonical chat request/response against a
//! concrete vendor API and classifies failures into `ProviderError`.

pub mod anthropic;
pub mod error;
pub mod google;
pub mod openai;

use crate::config::models::ProviderType;
use crate::core::types::ChatCompletionResponse;
use async_trait::async_trait;
use error::ProviderError;
use serde_json::{Map, Value};

/// What kind of structured output the caller asked for, if any.
#[derive(Debug, Clone)]
pub enum ResponseFormatHint {
    RawText,
    JsonSchema { schema: Value },
}

/// Request passed to a provider adapter, assembled by the orchestrator
/// after routing, template rendering, and parameter mapping.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub model: String,
    pub messages: Vec<crate::core::types::ChatMessage>,
    pub user_id: Option<String>,
    pub response_format: ResponseFormatHint,
    pub parameters: Map<String, Value>,
    pub api_key: String,
}

/// Shared provider contract (§9 "Polymorphism across providers": model
/// provider adapters as a capability set `{ chatCompletion }`).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat_completion(&self, options: &ChatOptions) -> Result<ChatCompletionResponse, ProviderError>;
}

/// Construct the adapter for a given provider type. The orchestrator
/// caches the result per type (§4.8, §5). `base_url` overrides the default
/// vendor endpoint when the config's `providers` entry carries an
/// `extras.baseUrl` (self-hosted gateways, or a test double).
pub fn build(provider_type: ProviderType, base_url: Option<&str>) -> Box<dyn ChatProvider> {
    match provider_type {
        ProviderType::Openai => match base_url {
            Some(url) => Box::new(openai::OpenAiProvider::with_base_url(url)),
            None => Box::new(openai::OpenAiProvider::new()),
        },
        ProviderType::Anthropic => match base_url {
            Some(url) => Box::new(anthropic::AnthropicProvider::with_base_url(url)),
            None => Box::new(anthropic::AnthropicProvider::new()),
        },
        ProviderType::Google => match base_url {
            Some(url) => Box::new(google::GoogleProvider::with_base_url(url)),
            None => Box::new(google::GoogleProvider::new()),
        },
    }
}
