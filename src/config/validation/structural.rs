//! Structural validation: field presence/types are already enforced by
//! `serde` at deserialization time (§4.1 step 0, implicit). This pass
//! covers what a typed deserialization can't: identifier patterns, numeric
//! bounds, and non-emptiness constraints from §6.

use super::identifier::is_valid_identifier;
use crate::config::models::Config;

/// One structural defect, tagged with the JSON path it was found at.
#[derive(Debug, Clone)]
pub struct StructuralIssue {
    pub path: String,
    pub message: String,
}

/// Structural-validation trait, following the teacher's `Validate` contract
/// but path-aware so every issue can be attached to an `ErrorDetails.path`.
pub trait Validate {
    fn validate_structural(&self, path: &str, issues: &mut Vec<StructuralIssue>);
}

fn push(issues: &mut Vec<StructuralIssue>, path: impl Into<String>, message: impl Into<String>) {
    issues.push(StructuralIssue {
        path: path.into(),
        message: message.into(),
    });
}

impl Validate for Config {
    fn validate_structural(&self, _path: &str, issues: &mut Vec<StructuralIssue>) {
        for alias in self.providers.keys() {
            if !is_valid_identifier(alias) {
                push(issues, format!("providers.{alias}"), "invalid provider identifier");
            }
        }
        for schema_id in self.response_schemas.keys() {
            if !is_valid_identifier(schema_id) {
                push(
                    issues,
                    format!("responseSchemas.{schema_id}"),
                    "invalid schema identifier",
                );
            }
        }
        for (prompt_id, prompt) in &self.prompts {
            if !is_valid_identifier(prompt_id) {
                push(issues, format!("prompts.{prompt_id}"), "invalid prompt identifier");
                continue;
            }
            prompt.validate_structural(&format!("prompts.{prompt_id}"), issues);
        }
    }
}

impl Validate for crate::config::models::Prompt {
    fn validate_structural(&self, path: &str, issues: &mut Vec<StructuralIssue>) {
        if self.variants.is_empty() {
            push(issues, path, "prompt has no variants");
        }
        for (variant_id, variant) in &self.variants {
            if !is_valid_identifier(variant_id) {
                push(issues, format!("{path}.variants.{variant_id}"), "invalid variant identifier");
                continue;
            }
            variant.validate_structural(&format!("{path}.variants.{variant_id}"), issues);
        }
        if self.routing.rules.is_empty() {
            push(issues, format!("{path}.routing.rules"), "routing rules must be non-empty");
        }
        for (i, rule) in self.routing.rules.iter().enumerate() {
            if rule.weight > 100 {
                push(
                    issues,
                    format!("{path}.routing.rules[{i}].weight"),
                    "weight must be in [0, 100]",
                );
            }
        }
        if let Some(phased) = &self.routing.phased {
            for (i, entry) in phased.iter().enumerate() {
                for (target, weight) in &entry.weights {
                    if *weight > 100 {
                        push(
                            issues,
                            format!("{path}.routing.phased[{i}].weights.{target}"),
                            "weight must be in [0, 100]",
                        );
                    }
                }
            }
        }
    }
}

impl Validate for crate::config::models::Variant {
    fn validate_structural(&self, path: &str, issues: &mut Vec<StructuralIssue>) {
        if self.messages.is_empty() {
            push(issues, format!("{path}.messages"), "messages must be non-empty");
        }
        if let Some(temperature) = self.parameters.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                push(issues, format!("{path}.parameters.temperature"), "temperature must be in [0, 1]");
            }
        }
        if let Some(max_tokens) = self.parameters.max_tokens {
            if max_tokens < 1 {
                push(issues, format!("{path}.parameters.max_tokens"), "max_tokens must be >= 1");
            }
        }
        if let Some(top_p) = self.parameters.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                push(issues, format!("{path}.parameters.top_p"), "top_p must be in [0, 1]");
            }
        }
        if let Some(fp) = self.parameters.frequency_penalty {
            if !(-2.0..=2.0).contains(&fp) {
                push(issues, format!("{path}.parameters.frequency_penalty"), "frequency_penalty must be in [-2, 2]");
            }
        }
        if let Some(pp) = self.parameters.presence_penalty {
            if !(-2.0..=2.0).contains(&pp) {
                push(issues, format!("{path}.parameters.presence_penalty"), "presence_penalty must be in [-2, 2]");
            }
        }
        if let Some(stop) = &self.parameters.stop {
            if stop.len() > 4 {
                push(issues, format!("{path}.parameters.stop"), "at most 4 stop strings");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::*;
    use std::collections::HashMap;

    fn minimal_variant() -> Variant {
        Variant {
            provider: "oa".into(),
            model: "gpt-4o".into(),
            default: true,
            parameters: CanonicalParameters::default(),
            messages: vec![MessageTemplate {
                role: MessageRole::User,
                content: MessageContent { template: "hi".into() },
            }],
            response_format: ResponseFormat::RawText,
            fallback: None,
        }
    }

    #[test]
    fn flags_bad_provider_identifier() {
        let mut providers = HashMap::new();
        providers.insert(
            "bad id".to_string(),
            ProviderEntry {
                provider_type: ProviderType::Openai,
                extras: HashMap::new(),
            },
        );
        let config = Config {
            version: "1.0.0".into(),
            providers,
            response_schemas: HashMap::new(),
            prompts: HashMap::new(),
        };
        let mut issues = Vec::new();
        config.validate_structural("", &mut issues);
        assert!(issues.iter().any(|i| i.path.contains("bad id")));
    }

    #[test]
    fn flags_out_of_range_temperature() {
        let mut variant = minimal_variant();
        variant.parameters.temperature = Some(1.5);
        let mut issues = Vec::new();
        variant.validate_structural("variants.v1", &mut issues);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].path.ends_with("temperature"));
    }
}
