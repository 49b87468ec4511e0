//! Rendered prompt types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the prompt template came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "path")]
pub enum TemplateSource {
    /// Built-in template
    Default,
    /// Workspace override file
    File(PathBuf),
}

/// Metadata about a rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltPromptMetadata {
    pub template: TemplateSource,

    /// Whether an internal knowledge base section was rendered
    pub internal_included: bool,

    /// Whether an internet search section was rendered
    pub web_included: bool,
}

/// A prompt ready for the generation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    pub text: String,
    pub metadata: BuiltPromptMetadata,
}

impl BuiltPrompt {
    pub fn new(text: String, metadata: BuiltPromptMetadata) -> Self {
        Self { text, metadata }
    }

    /// Whether any retrieved context made it into the prompt.
    pub fn is_augmented(&self) -> bool {
        self.metadata.internal_included || self.metadata.web_included
    }
}
