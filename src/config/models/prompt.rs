//! Prompt, variant, and routing configuration (§3 `Prompt`/`Variant`/`Routing`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A chat message role, as declared in a variant's `messages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// `messages[].content`, carrying the unparsed template source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageContent {
    pub template: String,
}

/// A single entry in a variant's `messages` list, prior to rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTemplate {
    pub role: MessageRole,
    pub content: MessageContent,
}

/// Canonical model parameters (Glossary: "Canonical parameters"). Unknown
/// properties are rejected per §6 — the capability table in the parameter
/// mapper is the only place that knows about these seven names, so the
/// config model mirrors it exactly rather than accepting an open bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CanonicalParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "max_tokens")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "top_p")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "frequency_penalty")]
    pub frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "presence_penalty")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "logit_bias")]
    pub logit_bias: Option<HashMap<String, f64>>,
}

/// `Variant.responseFormat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    RawText,
    JsonSchema {
        #[serde(rename = "schemaRef")]
        schema_ref: String,
    },
}

/// A fallback target: `{ provider, model }` prepended with the variant's own
/// binding to form the fallback chain (Glossary: "Fallback chain").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackTarget {
    pub provider: String,
    pub model: String,
}

/// A concrete `(provider, model, parameters, messages)` binding under a
/// prompt — the unit selected by routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub parameters: CanonicalParameters,
    pub messages: Vec<MessageTemplate>,
    #[serde(rename = "responseFormat")]
    pub response_format: ResponseFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Vec<FallbackTarget>>,
}

fn default_weight() -> u8 {
    100
}

/// A single default-rules entry: `{ target, weight, tags? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    pub target: String,
    #[serde(default = "default_weight")]
    pub weight: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// A time-bounded weighted distribution overriding default rules while active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhasedRule {
    /// Epoch seconds
    pub start: i64,
    /// Epoch seconds; unbounded (treated as +inf) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    ///
    /// A `BTreeMap`, not a `HashMap`: the router's weighted pick walks
    /// weights in a fixed order to stay deterministic (§8 "Routing
    /// determinism"), and JSON object key order isn't preserved through a
    /// `HashMap` anyway, so a sorted order is the stable choice.
    pub weights: std::collections::BTreeMap<String, u8>,
}

/// `Prompt.routing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Routing {
    pub rules: Vec<RoutingRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phased: Option<Vec<PhasedRule>>,
}

/// A step in an unexecuted prompt chain. Accepted and reference-checked
/// only — see the orchestrator module docs for why no execution path exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStep {
    #[serde(rename = "promptId")]
    pub prompt_id: String,
    #[serde(default, rename = "variantId", skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
}

/// A named prompt: a set of variants under shared routing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(default)]
    pub description: String,
    pub variants: HashMap<String, Variant>,
    pub routing: Routing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chains: Option<Vec<ChainStep>>,
}
