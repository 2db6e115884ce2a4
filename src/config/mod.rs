//! Configuration data model, loading, and validation (§3, §4.1)

pub mod loader;
pub mod models;
pub mod validation;

pub use loader::{load_and_validate_config, validate_config};
pub use models::Config;
