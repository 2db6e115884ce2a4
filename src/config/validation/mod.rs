//! Configuration validation: structural pass then semantic pass (§4.1)

mod identifier;
mod semantic;
mod structural;

pub use identifier::is_valid_identifier;
pub use semantic::validate_semantic;
pub use structural::{StructuralIssue, Validate};

use crate::config::models::Config;
use crate::utils::error::{EngineError, ErrorDetails, Result};

/// Run both validation passes over an already-deserialized `Config`,
/// structural first, then semantic (§4.1).
pub fn validate(config: &Config) -> Result<()> {
    let mut issues = Vec::new();
    config.validate_structural("", &mut issues);
    if !issues.is_empty() {
        let mut details = ErrorDetails::new();
        for issue in &issues {
            details = details.with_identifier(format!("{}: {}", issue.path, issue.message));
        }
        return Err(EngineError::configuration_with(
            format!("{} structural validation error(s)", issues.len()),
            details,
        ));
    }
    validate_semantic(config)
}
