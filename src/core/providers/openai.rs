//! OpenAI-shaped provider adapter (§4.5)

use super::error::ProviderError;
use super::{ChatOptions, ChatProvider, ResponseFormatHint};
use crate::core::types::{ChatCompletionResponse, ChatMessage, Choice, Role, Usage};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Override the API base URL, e.g. to point at a mock server in tests or
    /// an `extras.baseUrl` configured for a self-hosted gateway.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn build_body(options: &ChatOptions) -> Value {
    let messages: Vec<Value> = options
        .messages
        .iter()
        .map(|m| json!({ "role": m.role.to_string(), "content": m.content }))
        .collect();

    let mut body = json!({ "model": options.model, "messages": messages });
    let obj = body.as_object_mut().expect("body is a JSON object");
    for (key, value) in &options.parameters {
        obj.insert(key.clone(), value.clone());
    }
    if let Some(user_id) = &options.user_id {
        obj.insert("user".to_string(), json!(user_id));
    }
    if let ResponseFormatHint::JsonSchema { schema } = &options.response_format {
        obj.insert(
            "response_format".to_string(),
            json!({ "type": "json_schema", "json_schema": { "name": "response", "schema": schema } }),
        );
    }
    body
}

#[derive(Deserialize)]
struct WireResponse {
    id: String,
    model: String,
    choices: Vec<WireChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    index: u32,
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

fn parse_role(role: &str) -> Role {
    match role {
        "system" => Role::System,
        "assistant" => Role::Assistant,
        _ => Role::User,
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn chat_completion(&self, options: &ChatOptions) -> Result<ChatCompletionResponse, ProviderError> {
        let body = build_body(options);
        let response = self
            .client
            .post(self.chat_completions_url())
            .bearer_auth(&options.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::other("openai", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status("openai", status.as_u16(), message));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::other("openai", format!("malformed response: {e}")))?;

        Ok(ChatCompletionResponse {
            id: wire.id,
            model: wire.model,
            choices: wire
                .choices
                .into_iter()
                .map(|c| Choice {
                    index: c.index,
                    message: ChatMessage::new(parse_role(&c.message.role), c.message.content),
                    finish_reason: c.finish_reason,
                })
                .collect(),
            usage: wire.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}
