//! Classify command handler.

use clap::Args;
use policyqa_core::{config::AppConfig, AppResult};
use policyqa_knowledge::{DepartmentClassifier, RagConfig};

/// Show which department a question is routed to
#[derive(Args, Debug)]
pub struct ClassifyCommand {
    /// The question to classify
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ClassifyCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let rag = RagConfig::load(&config.workspace)?;
        let classifier = DepartmentClassifier::new(rag.departments);
        let department = classifier.classify(&self.question);

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "department": department,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            match department {
                Some(department) => println!("{}", department),
                None => println!("(none)"),
            }
        }

        Ok(())
    }
}
