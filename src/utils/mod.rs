//! Shared utilities
//!
//! Kept deliberately small: the engine's only cross-cutting utility is its
//! error type. Logging goes through `tracing` directly at call sites.

pub mod error;
