//! Command handlers for the PolicyQA CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod classify;
pub mod clean;
pub mod ingest;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use classify::ClassifyCommand;
pub use clean::CleanCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;
