//! Core engine: template rendering, parameter mapping, routing, provider
//! execution, fallback, telemetry, and orchestration.

pub mod fallback;
pub mod orchestrator;
pub mod params;
pub mod providers;
pub mod router;
pub mod telemetry;
pub mod template;
pub mod types;
