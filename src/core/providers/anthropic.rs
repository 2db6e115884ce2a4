//! Anthropic-shaped provider adapter (§4.5)

use super::error::ProviderError;
use super::{ChatOptions, ChatProvider, ResponseFormatHint};
use crate::core::types::{ChatCompletionResponse, ChatMessage, Choice, Role, Usage};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const STRUCTURED_OUTPUT_TOOL: &str = "structured_output";

pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold all `system` messages into one prefix (joined by a blank line); the
/// remainder becomes the conversation.
fn split_system_and_conversation(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let conversation = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| json!({ "role": m.role.to_string(), "content": m.content }))
        .collect();
    (if system.is_empty() { None } else { Some(system) }, conversation)
}

fn build_body(options: &ChatOptions) -> Value {
    let (system, conversation) = split_system_and_conversation(&options.messages);

    let mut body = json!({ "model": options.model, "messages": conversation });
    let obj = body.as_object_mut().expect("body is a JSON object");
    for (key, value) in &options.parameters {
        obj.insert(key.clone(), value.clone());
    }
    if let Some(system) = system {
        obj.insert("system".to_string(), json!(system));
    }
    if let ResponseFormatHint::JsonSchema { schema } = &options.response_format {
        obj.insert(
            "tools".to_string(),
            json!([{ "name": STRUCTURED_OUTPUT_TOOL, "input_schema": schema }]),
        );
        obj.insert(
            "tool_choice".to_string(),
            json!({ "type": "tool", "name": STRUCTURED_OUTPUT_TOOL }),
        );
    }
    body
}

#[derive(Deserialize)]
struct WireResponse {
    id: String,
    model: String,
    content: Vec<WireBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireBlock {
    Text { text: String },
    ToolUse { input: Value },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Extract the reply content: the tool's JSON input when structured output
/// was requested, otherwise the first text block.
fn extract_content(blocks: &[WireBlock]) -> String {
    for block in blocks {
        if let WireBlock::ToolUse { input } = block {
            return input.to_string();
        }
    }
    for block in blocks {
        if let WireBlock::Text { text } = block {
            return text.clone();
        }
    }
    String::new()
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn chat_completion(&self, options: &ChatOptions) -> Result<ChatCompletionResponse, ProviderError> {
        let body = build_body(options);
        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", &options.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::other("anthropic", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status("anthropic", status.as_u16(), message));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::other("anthropic", format!("malformed response: {e}")))?;

        let content = extract_content(&wire.content);
        Ok(ChatCompletionResponse {
            id: wire.id,
            model: wire.model,
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::new(Role::Assistant, content),
                finish_reason: wire.stop_reason,
            }],
            usage: wire.usage.map(|u| Usage {
                prompt_tokens: u.input_tokens,
                completion_tokens: u.output_tokens,
                total_tokens: u.input_tokens + u.output_tokens,
            }),
        })
    }
}
