//! # Promptuna
//!
//! A configuration-driven prompt routing and execution engine for LLM
//! backends. Given a declarative configuration file that enumerates
//! providers, prompts, prompt variants, routing rules, and fallback
//! chains, the engine accepts a symbolic request (a prompt identifier plus
//! variables and optional user context) and produces either a rendered
//! message array or, after routing and provider invocation, a normalized
//! chat-completion response.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use promptuna::{ChatCompletionParams, Engine, Environment, RuntimeConfig};
//!
//! #[tokio::main]
//! async fn main() -> promptuna::Result<()> {
//!     let engine = Engine::new(RuntimeConfig {
//!         config_path: "promptuna.json".into(),
//!         openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
//!         anthropic_api_key: None,
//!         google_api_key: None,
//!         environment: Environment::Dev,
//!         on_observability: None,
//!     });
//!
//!     let response = engine
//!         .chat_completion(ChatCompletionParams {
//!             prompt_id: "greeting".to_string(),
//!             user_id: Some("alice".to_string()),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("{}", response.choices[0].message.content);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod utils;

pub use config::{load_and_validate_config, validate_config, Config};
pub use core::orchestrator::{ChatCompletionParams, Engine, Environment, GetTemplateParams, RuntimeConfig};
pub use core::types::{ChatCompletionResponse, ChatMessage, Choice, Role, Usage};
pub use utils::error::{EngineError, ErrorDetails, Result};

/// Current version of the crate, carried into every telemetry event as `sdkVersion`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_matches_cargo_manifest() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}
