//! Ingest command handler.
//!
//! Loads the configured documents into the index.

use clap::Args;
use policyqa_core::{config::AppConfig, AppError, AppResult};
use policyqa_knowledge::ingest::{ingest_documents, resolve_documents};
use policyqa_knowledge::{open_store, FileExtractor, PopulateMode, RagConfig};
use std::sync::Arc;

/// Load the policy documents into the index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Drop existing entries and load everything again
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command");

        let rag = RagConfig::load(&config.workspace)?;
        let mode = if self.rebuild {
            PopulateMode::Rebuild
        } else {
            rag.index.mode
        };

        let store = open_store(&config.workspace, &rag).await?;
        let specs = resolve_documents(&rag, &config.workspace)?;
        let report =
            ingest_documents(&store, Arc::new(FileExtractor), &specs, &rag.chunking, mode).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            match &report.populate {
                Some(stats) if stats.skipped => println!(
                    "Index already holds {} entries; nothing to do (use --rebuild to reload)",
                    stats.total
                ),
                Some(stats) => println!(
                    "Ingested {} documents ({} pages, {} passages) in {:.2}s; index holds {} entries",
                    report.documents, report.pages, report.passages, report.duration_secs, stats.total
                ),
                None => println!("No passages ingested"),
            }

            for failure in &report.failures {
                eprintln!("Failed: {} ({})", failure.path.display(), failure.reason);
            }
        }

        if report.all_failed() {
            return Err(AppError::Other(format!(
                "All {} documents failed to load",
                report.failures.len()
            )));
        }

        Ok(())
    }
}
