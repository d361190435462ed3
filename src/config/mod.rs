//! Configuration module for article acquisition
//!
//! This module provides the `FetchConfig` struct and its type-safe builder
//! with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{FetchConfigBuilder, WithApiBase, WithSecret};
pub use types::FetchConfig;
