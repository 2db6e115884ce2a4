//! Configuration data model (§3)

mod prompt;
mod provider;
mod root;
mod schema;

pub use prompt::{
    CanonicalParameters, ChainStep, FallbackTarget, MessageContent, MessageRole, MessageTemplate,
    PhasedRule, Prompt, ResponseFormat, Routing, RoutingRule, Variant,
};
pub use provider::{ProviderEntry, ProviderType};
pub use root::Config;
pub use schema::ResponseSchemas;
