//! Provider configuration (§3 `providers`)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Provider backend type. Drives which provider adapter handles a variant
/// and which required-parameter rule applies (§4.1 step 6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Openai,
    Anthropic,
    Google,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Openai => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
            Self::Google => write!(f, "google"),
        }
    }
}

/// A single entry in the `providers` mapping. `extras` carries whatever
/// provider-specific configuration the deployment needs (base URL,
/// organization id, ...) — §6 exempts `provider` entries from the
/// unknown-property rejection rule, so this is intentionally open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderEntry {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}
