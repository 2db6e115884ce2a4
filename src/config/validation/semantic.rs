//! Semantic (cross-reference) validation — §4.1 steps 1-7, run in fixed
//! order, stopping at the first step producing at least one issue.

use crate::config::models::{Config, ResponseFormat};
use crate::core::template;
use crate::utils::error::{EngineError, ErrorDetails, Result};
use std::sync::OnceLock;

const SUPPORTED_MAJOR_VERSIONS: &[u64] = &[1];

fn version_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r"^\d+\.\d+\.\d+$").unwrap())
}

fn fail(step: &str, identifiers: Vec<String>, message: String) -> EngineError {
    let mut details = ErrorDetails::new().with_path(step.to_string());
    for id in identifiers {
        details = details.with_identifier(id);
    }
    EngineError::configuration_with(message, details)
}

/// Run the seven ordered semantic checks of §4.1, short-circuiting on the
/// first one that produces an error.
pub fn validate_semantic(config: &Config) -> Result<()> {
    check_version(config)?;
    check_default_variant(config)?;
    check_response_schemas(config)?;
    check_routing(config)?;
    check_fallback(config)?;
    check_required_parameters(config)?;
    check_template_syntax(config)?;
    Ok(())
}

fn check_version(config: &Config) -> Result<()> {
    if !version_pattern().is_match(&config.version) {
        return Err(fail(
            "version",
            vec![config.version.clone()],
            format!("version `{}` does not match ^\\d+\\.\\d+\\.\\d+$", config.version),
        ));
    }
    let major = config.major_version().unwrap_or(u64::MAX);
    if !SUPPORTED_MAJOR_VERSIONS.contains(&major) {
        return Err(fail(
            "version",
            vec![config.version.clone()],
            format!("unsupported major version {major}"),
        ));
    }
    Ok(())
}

fn check_default_variant(config: &Config) -> Result<()> {
    let mut bad = Vec::new();
    for (prompt_id, prompt) in &config.prompts {
        let defaults = prompt.variants.values().filter(|v| v.default).count();
        if defaults != 1 {
            bad.push(prompt_id.clone());
        }
    }
    if !bad.is_empty() {
        return Err(fail(
            "prompts.*.variants",
            bad,
            "each prompt must have exactly one default variant".to_string(),
        ));
    }
    Ok(())
}

fn check_response_schemas(config: &Config) -> Result<()> {
    let mut bad = Vec::new();

    for (schema_id, schema) in &config.response_schemas {
        if jsonschema::validator_for(schema).is_err() {
            bad.push(format!("responseSchemas.{schema_id}"));
        }
    }

    for (prompt_id, prompt) in &config.prompts {
        for (variant_id, variant) in &prompt.variants {
            if let ResponseFormat::JsonSchema { schema_ref } = &variant.response_format {
                if schema_ref.is_empty() || !config.response_schemas.contains_key(schema_ref) {
                    bad.push(format!("prompts.{prompt_id}.variants.{variant_id}.responseFormat.schemaRef"));
                }
            }
        }
    }

    if !bad.is_empty() {
        return Err(fail(
            "responseSchemas",
            bad,
            "every schemaRef must resolve and every schema fragment must be valid JSON-Schema".to_string(),
        ));
    }
    Ok(())
}

fn check_routing(config: &Config) -> Result<()> {
    let mut bad = Vec::new();
    for (prompt_id, prompt) in &config.prompts {
        let known_variants: std::collections::HashSet<&String> = prompt.variants.keys().collect();

        let mut any_positive = false;
        for rule in &prompt.routing.rules {
            if !known_variants.contains(&rule.target) {
                bad.push(format!("prompts.{prompt_id}.routing.rules.{}", rule.target));
            }
            if rule.weight > 0 {
                any_positive = true;
            }
        }
        if !prompt.routing.rules.is_empty() && !any_positive {
            bad.push(format!("prompts.{prompt_id}.routing.rules"));
        }

        if let Some(phased) = &prompt.routing.phased {
            for (i, entry) in phased.iter().enumerate() {
                let mut phase_positive = false;
                for (target, weight) in &entry.weights {
                    if !known_variants.contains(target) {
                        bad.push(format!("prompts.{prompt_id}.routing.phased[{i}].weights.{target}"));
                    }
                    if *weight > 0 {
                        phase_positive = true;
                    }
                }
                if !phase_positive {
                    bad.push(format!("prompts.{prompt_id}.routing.phased[{i}]"));
                }
            }
        }
    }
    if !bad.is_empty() {
        return Err(fail(
            "prompts.*.routing",
            bad,
            "routing rule targets and phased weight keys must resolve, and at least one weight per list must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn check_fallback(config: &Config) -> Result<()> {
    let mut bad = Vec::new();
    for (prompt_id, prompt) in &config.prompts {
        for (variant_id, variant) in &prompt.variants {
            if let Some(fallback) = &variant.fallback {
                for target in fallback {
                    if !config.providers.contains_key(&target.provider) {
                        bad.push(format!("prompts.{prompt_id}.variants.{variant_id}.fallback.{}", target.provider));
                    }
                }
            }
        }
    }
    if !bad.is_empty() {
        return Err(fail(
            "prompts.*.variants.*.fallback",
            bad,
            "every fallback target's provider must resolve".to_string(),
        ));
    }
    Ok(())
}

fn check_required_parameters(config: &Config) -> Result<()> {
    use crate::config::models::ProviderType;

    let mut bad = Vec::new();
    for (prompt_id, prompt) in &config.prompts {
        for (variant_id, variant) in &prompt.variants {
            let Some(entry) = config.providers.get(&variant.provider) else {
                continue;
            };
            if entry.provider_type == ProviderType::Anthropic && variant.parameters.max_tokens.is_none() {
                bad.push(format!("prompts.{prompt_id}.variants.{variant_id}.parameters.max_tokens"));
            }
        }
    }
    if !bad.is_empty() {
        return Err(fail(
            "prompts.*.variants.*.parameters",
            bad,
            "anthropic variants must declare max_tokens".to_string(),
        ));
    }
    Ok(())
}

fn check_template_syntax(config: &Config) -> Result<()> {
    let mut bad = Vec::new();
    for (prompt_id, prompt) in &config.prompts {
        for (variant_id, variant) in &prompt.variants {
            for (i, message) in variant.messages.iter().enumerate() {
                if let Err(e) = template::parse_strict(&message.content.template) {
                    bad.push(format!(
                        "prompts.{prompt_id}.variants.{variant_id}.messages[{i}]: {e}"
                    ));
                }
            }
        }
    }
    if !bad.is_empty() {
        return Err(fail(
            "prompts.*.variants.*.messages",
            bad,
            "every message template must parse under strict-filter mode".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::*;
    use std::collections::HashMap;

    fn base_variant(default: bool) -> Variant {
        Variant {
            provider: "oa".into(),
            model: "gpt-4o".into(),
            default,
            parameters: CanonicalParameters::default(),
            messages: vec![MessageTemplate {
                role: MessageRole::User,
                content: MessageContent { template: "hi {{ name }}".into() },
            }],
            response_format: ResponseFormat::RawText,
            fallback: None,
        }
    }

    fn base_config() -> Config {
        let mut providers = HashMap::new();
        providers.insert(
            "oa".to_string(),
            ProviderEntry {
                provider_type: ProviderType::Openai,
                extras: HashMap::new(),
            },
        );
        let mut variants = HashMap::new();
        variants.insert("v1".to_string(), base_variant(true));
        let mut prompts = HashMap::new();
        prompts.insert(
            "greeting".to_string(),
            Prompt {
                description: String::new(),
                variants,
                routing: Routing {
                    rules: vec![RoutingRule {
                        target: "v1".into(),
                        weight: 100,
                        tags: None,
                    }],
                    phased: None,
                },
                chains: None,
            },
        );
        Config {
            version: "1.0.0".into(),
            providers,
            response_schemas: HashMap::new(),
            prompts,
        }
    }

    #[test]
    fn accepts_well_formed_config() {
        assert!(validate_semantic(&base_config()).is_ok());
    }

    #[test]
    fn rejects_unsupported_major_version() {
        let mut config = base_config();
        config.version = "2.0.0".into();
        let err = validate_semantic(&config).unwrap_err();
        assert_eq!(err.kind(), "configuration-error");
    }

    #[test]
    fn rejects_missing_default_variant() {
        let mut config = base_config();
        for variant in config.prompts.get_mut("greeting").unwrap().variants.values_mut() {
            variant.default = false;
        }
        assert!(validate_semantic(&config).is_err());
    }

    #[test]
    fn rejects_dangling_routing_target() {
        let mut config = base_config();
        config.prompts.get_mut("greeting").unwrap().routing.rules.push(RoutingRule {
            target: "missing".into(),
            weight: 50,
            tags: None,
        });
        assert!(validate_semantic(&config).is_err());
    }

    #[test]
    fn rejects_anthropic_variant_missing_max_tokens() {
        let mut config = base_config();
        config.providers.get_mut("oa").unwrap().provider_type = ProviderType::Anthropic;
        assert!(validate_semantic(&config).is_err());
    }
}
