//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use policyqa_core::config::STATE_DIR;
use policyqa_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Identifier of the built-in grounded-answer prompt.
pub const DEFAULT_PROMPT_ID: &str = "rag.grounded.default";

/// Variables a grounded prompt template must reference.
const REQUIRED_VARIABLES: [&str; 2] = ["context", "question"];

const DEFAULT_PROMPT_YAML: &str = include_str!("../prompts/rag.grounded.default.yml");

/// Path of a workspace prompt override: `.policyqa/prompts/<id>.yml`.
pub fn prompt_path(workspace_path: &Path, prompt_id: &str) -> PathBuf {
    workspace_path
        .join(STATE_DIR)
        .join("prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Load a prompt definition by ID.
///
/// A file at `.policyqa/prompts/<id>.yml` wins. Without one, the built-in
/// prompt is returned for [`DEFAULT_PROMPT_ID`]; any other id is an error.
///
/// # Example
/// ```no_run
/// use policyqa_prompt::{load_prompt, DEFAULT_PROMPT_ID};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), DEFAULT_PROMPT_ID)?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Looking for prompt override at: {:?}", prompt_file);

    if !prompt_file.exists() {
        if prompt_id == DEFAULT_PROMPT_ID {
            return builtin_prompt();
        }
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents)
        .map_err(|e| AppError::Prompt(format!("Invalid prompt {:?}: {}", prompt_file, e)))?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// The grounded-answer prompt shipped with the binary.
pub fn builtin_prompt() -> AppResult<PromptDefinition> {
    parse_prompt(DEFAULT_PROMPT_YAML)
}

fn parse_prompt(contents: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML: {}", e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // Validate API version format (simple check)
    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    for variable in REQUIRED_VARIABLES {
        if !def.template.contains(&format!("{{{{{}}}}}", variable)) {
            return Err(AppError::Prompt(format!(
                "Prompt '{}' must reference {{{{{}}}}}",
                def.id, variable
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, template: &str) {
        let path = prompt_path(dir, id);
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        let content = format!(
            r#"
id: {}
title: "Override"
apiVersion: "1.0"
createdBy: test
behavior:
  tone: neutral
  style: concise
template: "{}"
output:
  format: text
"#,
            id, template
        );
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_builtin_prompt_is_valid() {
        let prompt = builtin_prompt().unwrap();
        assert_eq!(prompt.id, DEFAULT_PROMPT_ID);
        assert!(prompt.template.contains("Você é um assistente corporativo interno."));
        assert!(prompt.template.contains("Resposta objetiva e profissional:"));
    }

    #[test]
    fn test_default_id_falls_back_to_builtin() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = load_prompt(temp_dir.path(), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, builtin_prompt().unwrap().title);
    }

    #[test]
    fn test_workspace_override_wins() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(
            temp_dir.path(),
            DEFAULT_PROMPT_ID,
            "C: {{context}} Q: {{question}}",
        );

        let prompt = load_prompt(temp_dir.path(), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(prompt.title, "Override");
        assert_eq!(prompt.template, "C: {{context}} Q: {{question}}");
    }

    #[test]
    fn test_unknown_prompt_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_prompt(temp_dir.path(), "nonexistent").is_err());
    }

    #[test]
    fn test_template_without_context_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_prompt(temp_dir.path(), "no.context", "Q: {{question}}");

        match load_prompt(temp_dir.path(), "no.context") {
            Err(AppError::Prompt(msg)) => assert!(msg.contains("{{context}}")),
            other => panic!("expected prompt error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let path = prompt_path(temp_dir.path(), "broken");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "invalid: yaml: content:").unwrap();

        assert!(load_prompt(temp_dir.path(), "broken").is_err());
    }
}
