//! Prompt template loading.

use crate::types::TemplateSource;
use std::path::Path;
use wayfinder_core::{AppError, AppResult};

/// Workspace-relative location of the template override.
pub const TEMPLATE_FILE: &str = ".wayfinder/prompts/augmented.hbs";

/// Built-in augmented prompt template.
///
/// Variables: `prompt`, `internal`, `web`. The sections for `internal` and
/// `web` are only rendered when the variable is non-empty.
pub const DEFAULT_TEMPLATE: &str = "You are an assistant. Use the context below when helpful. \
If the context is insufficient, answer based on your general knowledge.

{{#if internal}}## Internal Knowledge Base Results
{{internal}}

{{/if}}{{#if web}}## Internet Search Results
{{web}}

{{/if}}## User Question
{{prompt}}";

/// Load the augmented prompt template for a workspace.
///
/// Returns the override in [`TEMPLATE_FILE`] when present, otherwise the
/// built-in template.
///
/// # Example
/// ```no_run
/// use wayfinder_prompt::load_template;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (template, source) = load_template(Path::new("."))?;
/// println!("Using {:?} ({} bytes)", source, template.len());
/// # Ok(())
/// # }
/// ```
pub fn load_template(workspace_path: &Path) -> AppResult<(String, TemplateSource)> {
    let template_file = workspace_path.join(TEMPLATE_FILE);

    if !template_file.exists() {
        tracing::debug!("No template override at {:?}, using default", template_file);
        return Ok((DEFAULT_TEMPLATE.to_string(), TemplateSource::Default));
    }

    let contents = std::fs::read_to_string(&template_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read template file {:?}: {}",
            template_file, e
        ))
    })?;

    if contents.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Template file {:?} is empty",
            template_file
        )));
    }

    tracing::info!("Loaded prompt template from {:?}", template_file);
    Ok((contents, TemplateSource::File(template_file)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_override(dir: &Path, contents: &str) {
        let path = dir.join(TEMPLATE_FILE);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_default_without_override() {
        let temp_dir = TempDir::new().unwrap();
        let (template, source) = load_template(temp_dir.path()).unwrap();

        assert_eq!(template, DEFAULT_TEMPLATE);
        assert_eq!(source, TemplateSource::Default);
    }

    #[test]
    fn test_override_is_loaded() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "Q: {{prompt}}");

        let (template, source) = load_template(temp_dir.path()).unwrap();
        assert_eq!(template, "Q: {{prompt}}");
        assert!(matches!(source, TemplateSource::File(_)));
    }

    #[test]
    fn test_empty_override_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        write_override(temp_dir.path(), "  \n");

        assert!(load_template(temp_dir.path()).is_err());
    }
}
