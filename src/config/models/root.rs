//! Root configuration entity (§3 `Configuration`)

use super::prompt::Prompt;
use super::provider::ProviderEntry;
use super::schema::ResponseSchemas;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The loaded, validated, immutable configuration. Created once by the
/// loader and cached for the lifetime of an `Engine` (§5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    pub providers: HashMap<String, ProviderEntry>,
    #[serde(default, rename = "responseSchemas")]
    pub response_schemas: ResponseSchemas,
    pub prompts: HashMap<String, Prompt>,
}

impl Config {
    /// Major version extracted from `version`, assuming it already matched
    /// `^\d+\.\d+\.\d+$` (checked by semantic validation step 1).
    pub fn major_version(&self) -> Option<u64> {
        self.version.split('.').next()?.parse().ok()
    }
}
