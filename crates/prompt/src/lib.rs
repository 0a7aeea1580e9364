//! Prompt system for the PolicyQA assistant.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - A built-in grounded-answer prompt, overridable per workspace
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_grounded_prompt, build_prompt};
pub use loader::{builtin_prompt, load_prompt, DEFAULT_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptOutputSpec};
