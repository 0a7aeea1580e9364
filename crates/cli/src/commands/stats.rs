//! Stats command handler.
//!
//! Displays index statistics.

use clap::Args;
use policyqa_core::{config::AppConfig, AppResult};
use policyqa_knowledge::{open_store, RagConfig};

/// Show index statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let rag = RagConfig::load(&config.workspace)?;
        let store = open_store(&config.workspace, &rag).await?;
        let entries = store.count().await?;

        if self.json {
            let output = serde_json::json!({
                "backend": store.backend_name(),
                "indexPath": rag.index_path(&config.workspace),
                "table": rag.index.table,
                "mode": rag.index.mode,
                "embeddingProvider": store.embedder().provider_name(),
                "embeddingModel": store.embedder().model_name(),
                "entries": entries,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("Index: {} ({})", store.backend_name(), rag.index_path(&config.workspace).display());
            println!("  Table: {}", rag.index.table);
            println!("  Mode: {}", rag.index.mode);
            println!(
                "  Embeddings: {}/{}",
                store.embedder().provider_name(),
                store.embedder().model_name()
            );
            println!("  Entries: {}", entries);
        }

        Ok(())
    }
}
