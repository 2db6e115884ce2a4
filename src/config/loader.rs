//! Configuration loading (§4.1 `load(path) -> Config`)

use crate::config::models::Config;
use crate::config::validation;
use crate::utils::error::{EngineError, Result};
use std::path::Path;
use tracing::{debug, info};

/// Parse a raw JSON document into a `Config` and run both validation
/// passes. Exposed standalone so tooling can validate an in-memory value
/// without touching the filesystem (§6 `validateConfig`).
pub fn validate_config(raw: &serde_json::Value) -> Result<Config> {
    let config: Config = serde_json::from_value(raw.clone())
        .map_err(|e| EngineError::configuration(format!("malformed configuration: {e}")))?;
    validation::validate(&config)?;
    debug!(prompts = config.prompts.len(), providers = config.providers.len(), "configuration validated");
    Ok(config)
}

/// Read a configuration file from disk, parse, and validate it (§6
/// `loadAndValidateConfig`).
pub async fn load_and_validate_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| EngineError::configuration(format!("failed to read {}: {e}", path.display())))?;
    let raw: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| EngineError::configuration(format!("invalid JSON in {}: {e}", path.display())))?;
    let config = validate_config(&raw)?;
    info!(path = %path.display(), "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_config_json() -> serde_json::Value {
        serde_json::json!({
            "version": "1.0.0",
            "providers": { "oa": { "type": "openai" } },
            "responseSchemas": {},
            "prompts": {
                "greeting": {
                    "description": "says hi",
                    "variants": {
                        "v1": {
                            "provider": "oa",
                            "model": "gpt-4o",
                            "default": true,
                            "parameters": {},
                            "messages": [{ "role": "user", "content": { "template": "hi {{ name }}" } }],
                            "responseFormat": { "type": "raw_text" }
                        }
                    },
                    "routing": { "rules": [{ "target": "v1", "weight": 100 }] }
                }
            }
        })
    }

    #[tokio::test]
    async fn loads_well_formed_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", sample_config_json()).unwrap();
        let config = load_and_validate_config(file.path()).await.unwrap();
        assert_eq!(config.prompts.len(), 1);
    }

    #[test]
    fn rejects_malformed_json_value() {
        let raw = serde_json::json!({ "version": "1.0.0" });
        assert!(validate_config(&raw).is_err());
    }
}
