//! Google-shaped provider adapter (§4.5)

use super::error::ProviderError;
use super::{ChatOptions, ChatProvider, ResponseFormatHint};
use crate::core::types::{ChatCompletionResponse, ChatMessage, Choice, Role, Usage};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleProvider {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into() }
    }

    fn generate_content_url(&self, model: &str, api_key: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent?key={api_key}", self.base_url.trim_end_matches('/'))
    }
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold `system` messages into a system-instruction field; serialize the
/// remainder into a single prompt with `"User: "`/`"Assistant: "` prefixes
/// joined by a blank line.
fn split_system_and_prompt(messages: &[ChatMessage]) -> (Option<String>, String) {
    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let prompt = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let prefix = if m.role == Role::Assistant { "Assistant: " } else { "User: " };
            format!("{prefix}{}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    (if system.is_empty() { None } else { Some(system) }, prompt)
}

fn build_body(options: &ChatOptions) -> Value {
    let (system, prompt) = split_system_and_prompt(&options.messages);

    let mut body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });
    let obj = body.as_object_mut().expect("body is a JSON object");
    if let Some(system) = system {
        obj.insert("systemInstruction".to_string(), json!({ "parts": [{ "text": system }] }));
    }

    let mut generation_config = serde_json::Map::new();
    for (key, value) in &options.parameters {
        generation_config.insert(key.clone(), value.clone());
    }
    if let ResponseFormatHint::JsonSchema { schema } = &options.response_format {
        generation_config.insert("responseMimeType".to_string(), json!("application/json"));
        generation_config.insert("responseSchema".to_string(), schema.clone());
    }
    if !generation_config.is_empty() {
        obj.insert("generationConfig".to_string(), Value::Object(generation_config));
    }
    body
}

#[derive(Deserialize)]
struct WireResponse {
    candidates: Vec<WireCandidate>,
    #[serde(default, rename = "usageMetadata")]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireCandidate {
    content: WireContent,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireContent {
    parts: Vec<WirePart>,
}

#[derive(Deserialize)]
struct WirePart {
    text: String,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: u32,
    #[serde(rename = "totalTokenCount")]
    total_token_count: u32,
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    async fn chat_completion(&self, options: &ChatOptions) -> Result<ChatCompletionResponse, ProviderError> {
        let body = build_body(options);
        let url = self.generate_content_url(&options.model, &options.api_key);
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::other("google", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_http_status("google", status.as_u16(), message));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::other("google", format!("malformed response: {e}")))?;

        let choices = wire
            .candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| {
                let text = candidate.content.parts.into_iter().map(|p| p.text).collect::<String>();
                Choice {
                    index: index as u32,
                    message: ChatMessage::new(Role::Assistant, text),
                    finish_reason: candidate.finish_reason,
                }
            })
            .collect();

        Ok(ChatCompletionResponse {
            id: uuid::Uuid::new_v4().to_string(),
            model: options.model.clone(),
            choices,
            usage: wire.usage.map(|u| Usage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> ChatOptions {
        ChatOptions {
            model: "gemini-1.5-pro".to_string(),
            messages: vec![
                ChatMessage::new(Role::System, "be terse".to_string()),
                ChatMessage::new(Role::User, "hi".to_string()),
            ],
            user_id: None,
            response_format: ResponseFormatHint::RawText,
            parameters: Default::default(),
            api_key: "key-test".to_string(),
        }
    }

    #[test]
    fn folds_conversation_into_a_prefixed_prompt() {
        let messages = vec![ChatMessage::new(Role::User, "hi".to_string())];
        let (system, prompt) = split_system_and_prompt(&messages);
        assert_eq!(system, None);
        assert_eq!(prompt, "User: hi");
    }

    #[tokio::test]
    async fn parses_a_successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/v1beta/models/.*:generateContent$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "hello" }] },
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 4,
                    "candidatesTokenCount": 1,
                    "totalTokenCount": 5
                }
            })))
            .mount(&server)
            .await;

        let provider = GoogleProvider::with_base_url(server.uri());
        let response = provider.chat_completion(&options()).await.unwrap();

        assert_eq!(response.choices[0].message.content, "hello");
        assert_eq!(response.usage.unwrap().total_tokens, 5);
    }
}
