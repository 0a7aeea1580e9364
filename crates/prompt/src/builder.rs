//! Prompt builder for rendering templates and injecting context.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use policyqa_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// The template is rendered with Handlebars; HTML escaping is disabled since
/// the output goes to a language model, not a browser. Missing variables
/// render as empty strings.
///
/// # Example
/// ```no_run
/// use policyqa_prompt::{build_prompt, PromptDefinition};
/// use std::collections::HashMap;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Quantos dias de férias tenho?".to_string());
///
/// let built = build_prompt(&def, vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;

    let system = match &definition.system {
        Some(system) => Some(render_template(system, &variables)?),
        None => None,
    };

    Ok(BuiltPrompt::new(
        system,
        user,
        definition.id.clone(),
        variables,
    ))
}

/// Build the grounded-answer prompt from the assembled context and the query.
///
/// `not_found` is the literal sentence the model must emit when the context
/// does not answer the question.
pub fn build_grounded_prompt(
    definition: &PromptDefinition,
    context: &str,
    question: &str,
    not_found: &str,
) -> AppResult<BuiltPrompt> {
    let mut variables = HashMap::new();
    variables.insert("context".to_string(), context.to_string());
    variables.insert("question".to_string(), question.to_string());
    variables.insert("notFound".to_string(), not_found.to_string());

    build_prompt(definition, variables)
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
