//! Embedding providers.
//!
//! Passages and queries must be embedded by the same provider and model;
//! distances are only comparable within one embedding space.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};
