//! Ask command handler.
//!
//! Answers a question from the indexed policy documents.

use clap::Args;
use policyqa_core::{config::AppConfig, AppError, AppResult};
use policyqa_knowledge::{QueryRequest, RagConfig, RagPipeline};

/// Ask a question about company policies
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the request as JSON ({"pergunta": "..."}) from this file
    #[arg(short, long, conflicts_with = "question")]
    pub request: Option<std::path::PathBuf>,

    /// Skip index population before answering
    #[arg(long)]
    pub no_ingest: bool,

    /// Output as JSON ({"resposta": ..., "fontes": [...]})
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let question = self.resolve_question()?;
        tracing::debug!("Question: {}", question);

        config.validate()?;

        let mut rag = RagConfig::load(&config.workspace)?;
        if self.no_ingest {
            rag.ingest_on_startup = false;
        }

        let pipeline = RagPipeline::from_config(config, rag).await?;

        if let Some(report) = pipeline.bootstrap().await? {
            for failure in &report.failures {
                tracing::warn!("Document not loaded: {:?} ({})", failure.path, failure.reason);
            }
        }

        let result = pipeline.answer(&question).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result.into_response())?);
        } else {
            println!("{}", result.answer);
            println!();

            if result.citations.is_empty() {
                println!("Fontes: (nenhuma)");
            } else {
                println!("Fontes:");
                for citation in &result.citations {
                    println!("- {}", citation);
                }
            }
        }

        Ok(())
    }

    fn resolve_question(&self) -> AppResult<String> {
        if let Some(path) = &self.request {
            let content = std::fs::read_to_string(path)?;
            let request: QueryRequest = serde_json::from_str(&content)?;
            return Ok(request.pergunta);
        }

        self.question
            .clone()
            .ok_or_else(|| AppError::Config("No question provided".to_string()))
    }
}
