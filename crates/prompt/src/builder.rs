//! Prompt builder for rendering the augmented prompt.

use crate::loader::{load_template, DEFAULT_TEMPLATE};
use crate::types::{BuiltPrompt, BuiltPromptMetadata, TemplateSource};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use wayfinder_context::FusedContext;
use wayfinder_core::{AppError, AppResult};

const TEMPLATE_NAME: &str = "augmented";

#[derive(Debug, Serialize)]
struct TemplateVars<'a> {
    prompt: &'a str,
    internal: &'a str,
    web: &'a str,
}

/// Renders user questions together with fused context.
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
    source: TemplateSource,
}

impl PromptRenderer {
    /// Create a renderer for `template`.
    pub fn new(template: &str, source: TemplateSource) -> AppResult<Self> {
        let mut handlebars = Handlebars::new();

        // Plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        Ok(Self { handlebars, source })
    }

    /// Create a renderer using the workspace override if one exists.
    pub fn for_workspace(workspace_path: &Path) -> AppResult<Self> {
        let (template, source) = load_template(workspace_path)?;
        Self::new(&template, source)
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Render the prompt.
    ///
    /// With an empty fused context the user prompt is returned unchanged.
    pub fn render(&self, user_prompt: &str, context: &FusedContext) -> AppResult<BuiltPrompt> {
        let internal = segment(&context.internal_text);
        let web = segment(&context.web_text);

        let metadata = BuiltPromptMetadata {
            template: self.source.clone(),
            internal_included: !internal.is_empty(),
            web_included: !web.is_empty(),
        };

        if context.combined.trim().is_empty() {
            tracing::debug!("No context to add, passing prompt through");
            return Ok(BuiltPrompt::new(user_prompt.to_string(), metadata));
        }

        let text = self
            .handlebars
            .render(
                TEMPLATE_NAME,
                &TemplateVars {
                    prompt: user_prompt,
                    internal,
                    web,
                },
            )
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

        tracing::debug!(
            internal = metadata.internal_included,
            web = metadata.web_included,
            "Built augmented prompt"
        );
        Ok(BuiltPrompt::new(text, metadata))
    }
}

fn segment(text: &Option<String>) -> &str {
    text.as_deref().map(str::trim).unwrap_or("")
}

/// Build the augmented prompt with the built-in template.
///
/// # Example
/// ```no_run
/// use wayfinder_context::FusedContext;
/// use wayfinder_prompt::build_augmented_prompt;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let context = FusedContext::fuse(Some("Deploys happen on Tuesdays.".to_string()), None);
/// let prompt = build_augmented_prompt("When do we deploy?", &context)?;
/// println!("{}", prompt);
/// # Ok(())
/// # }
/// ```
pub fn build_augmented_prompt(user_prompt: &str, context: &FusedContext) -> AppResult<String> {
    PromptRenderer::new(DEFAULT_TEMPLATE, TemplateSource::Default)?
        .render(user_prompt, context)
        .map(|built| built.text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(internal: Option<&str>, web: Option<&str>) -> FusedContext {
        FusedContext::fuse(internal.map(str::to_string), web.map(str::to_string))
    }

    #[test]
    fn test_empty_context_passes_prompt_through() {
        let prompt = build_augmented_prompt("What is Rust?", &FusedContext::default()).unwrap();
        assert_eq!(prompt, "What is Rust?");
    }

    #[test]
    fn test_both_sections_rendered() {
        let prompt =
            build_augmented_prompt("When do we deploy?", &context(Some("A"), Some("B"))).unwrap();

        assert_eq!(
            prompt,
            "You are an assistant. Use the context below when helpful. If the context is \
             insufficient, answer based on your general knowledge.\n\n\
             ## Internal Knowledge Base Results\nA\n\n\
             ## Internet Search Results\nB\n\n\
             ## User Question\nWhen do we deploy?"
        );
    }

    #[test]
    fn test_missing_section_omitted() {
        let prompt = build_augmented_prompt("q", &context(None, Some("B"))).unwrap();

        assert!(!prompt.contains("## Internal Knowledge Base Results"));
        assert!(prompt.contains("## Internet Search Results\nB\n\n## User Question\nq"));
    }

    #[test]
    fn test_no_html_escaping() {
        let prompt = build_augmented_prompt("a < b & c", &context(Some("x > y"), None)).unwrap();
        assert!(prompt.contains("a < b & c"));
        assert!(prompt.contains("x > y"));
    }

    #[test]
    fn test_custom_template_metadata() {
        let renderer = PromptRenderer::new(
            "{{internal}}|{{web}}|{{prompt}}",
            TemplateSource::File("custom.hbs".into()),
        )
        .unwrap();
        let built = renderer.render("q", &context(Some("A"), None)).unwrap();

        assert_eq!(built.text, "A||q");
        assert!(built.metadata.internal_included);
        assert!(!built.metadata.web_included);
        assert_eq!(renderer.source(), &TemplateSource::File("custom.hbs".into()));
    }

    #[test]
    fn test_invalid_template_rejected() {
        assert!(PromptRenderer::new("{{#if}}", TemplateSource::Default).is_err());
    }
}
