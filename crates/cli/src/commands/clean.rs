//! Clean command handler.

use clap::Args;
use policyqa_core::{config::AppConfig, AppResult};
use policyqa_knowledge::{open_store, RagConfig};

/// Remove every entry from the index
#[derive(Args, Debug)]
pub struct CleanCommand {}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command");

        let rag = RagConfig::load(&config.workspace)?;
        let store = open_store(&config.workspace, &rag).await?;
        let removed = store.count().await?;
        store.clear().await?;

        println!("Removed {} entries from {}", removed, store.backend_name());
        Ok(())
    }
}
