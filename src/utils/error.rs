//! Error types for the engine
//!
//! Four error kinds, matching the four failure surfaces of the engine:
//! configuration loading, template parsing/rendering, provider execution,
//! and runtime orchestration failures.

use serde::Serialize;
use std::collections::HashMap;

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Structured details bag attached to every `EngineError`.
///
/// Carries the JSON path of the offending field, the identifiers involved,
/// and any suggestion hint produced by the template layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorDetails {
    /// JSON path of the offending field, e.g. `prompts.greeting.routing.rules[2]`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Offending identifiers (provider alias, variant id, schema id, ...)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub identifiers: Vec<String>,
    /// Suggestion hint, typically produced by the template adapter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Free-form extra context
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub extra: HashMap<String, String>,
}

impl ErrorDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_identifier(mut self, id: impl Into<String>) -> Self {
        self.identifiers.push(id.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Main error type for the engine
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    /// Raised by the validator and loader; fatal, surfaced verbatim
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        details: ErrorDetails,
    },

    /// Template parse or render failure
    #[error("template error: {message}")]
    Template {
        message: String,
        /// The offending template source
        source: String,
        details: ErrorDetails,
    },

    /// Wraps any runtime failure produced by the orchestrator
    #[error("execution error: {message}")]
    Execution {
        message: String,
        details: ErrorDetails,
    },
}

impl EngineError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            details: ErrorDetails::new(),
        }
    }

    pub fn configuration_with(message: impl Into<String>, details: ErrorDetails) -> Self {
        Self::Configuration {
            message: message.into(),
            details,
        }
    }

    pub fn template(message: impl Into<String>, source: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
            source: source.into(),
            details: ErrorDetails::new(),
        }
    }

    pub fn template_with(
        message: impl Into<String>,
        source: impl Into<String>,
        details: ErrorDetails,
    ) -> Self {
        Self::Template {
            message: message.into(),
            source: source.into(),
            details,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            details: ErrorDetails::new(),
        }
    }

    pub fn execution_with(message: impl Into<String>, details: ErrorDetails) -> Self {
        Self::Execution {
            message: message.into(),
            details,
        }
    }

    /// Stable kind code used by the CLI and telemetry event
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration-error",
            Self::Template { .. } => "template-error",
            Self::Execution { .. } => "execution-error",
        }
    }

    pub fn details(&self) -> &ErrorDetails {
        match self {
            Self::Configuration { details, .. } => details,
            Self::Template { details, .. } => details,
            Self::Execution { details, .. } => details,
        }
    }
}
