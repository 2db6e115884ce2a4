//! End-to-end exercise of `Engine::chat_completion` against a mock provider
//! endpoint: config load, routing, template rendering, and response
//! normalization all wired together.

use promptuna::{ChatCompletionParams, Engine, Environment, RuntimeConfig};
use serde_json::json;
use std::io::Write;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(base_url: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let config = json!({
        "version": "1.0.0",
        "providers": {
            "oa": { "type": "openai", "baseUrl": base_url }
        },
        "responseSchemas": {},
        "prompts": {
            "greeting": {
                "description": "says hi",
                "variants": {
                    "v1": {
                        "provider": "oa",
                        "model": "gpt-4o",
                        "default": true,
                        "parameters": { "temperature": 0.5 },
                        "messages": [
                            { "role": "system", "content": { "template": "be friendly" } },
                            { "role": "user", "content": { "template": "hi {{ name }}" } }
                        ],
                        "responseFormat": { "type": "raw_text" }
                    }
                },
                "routing": { "rules": [{ "target": "v1", "weight": 100 }] }
            }
        }
    });
    write!(file, "{config}").unwrap();
    file
}

#[tokio::test]
async fn routes_renders_and_executes_against_a_mock_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-e2e",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "hello there" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12 }
        })))
        .mount(&server)
        .await;

    let config_file = write_config(&server.uri());
    let engine = Engine::new(RuntimeConfig {
        config_path: config_file.path().to_path_buf(),
        openai_api_key: Some("sk-test".to_string()),
        anthropic_api_key: None,
        google_api_key: None,
        environment: Environment::Dev,
        on_observability: None,
    });

    let response = engine
        .chat_completion(ChatCompletionParams {
            prompt_id: "greeting".to_string(),
            variables: Some(json!({ "name": "Ada" })),
            user_id: Some("alice".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(response.choices[0].message.content, "hello there");
    assert_eq!(response.usage.unwrap().total_tokens, 12);
}

#[tokio::test]
async fn get_template_renders_without_touching_the_network() {
    let config_file = write_config("http://127.0.0.1:1");
    let engine = Engine::new(RuntimeConfig {
        config_path: config_file.path().to_path_buf(),
        openai_api_key: Some("sk-test".to_string()),
        anthropic_api_key: None,
        google_api_key: None,
        environment: Environment::Dev,
        on_observability: None,
    });

    let messages = engine
        .get_template(promptuna::GetTemplateParams {
            prompt_id: "greeting".to_string(),
            variant_id: "v1".to_string(),
            variables: json!({ "name": "Ada" }),
        })
        .await
        .unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "hi Ada");
}

#[tokio::test]
async fn unknown_prompt_id_is_an_execution_error() {
    let config_file = write_config("http://127.0.0.1:1");
    let engine = Engine::new(RuntimeConfig {
        config_path: config_file.path().to_path_buf(),
        openai_api_key: Some("sk-test".to_string()),
        anthropic_api_key: None,
        google_api_key: None,
        environment: Environment::Dev,
        on_observability: None,
    });

    let error = engine
        .chat_completion(ChatCompletionParams { prompt_id: "missing".to_string(), ..Default::default() })
        .await
        .unwrap_err();

    assert_eq!(error.kind(), "execution-error");
}
