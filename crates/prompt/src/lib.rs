//! Augmented prompt rendering for Wayfinder.
//!
//! Turns a user question and a [`FusedContext`](wayfinder_context::FusedContext)
//! into the prompt handed to the generation step:
//! - Handlebars template rendering
//! - Per-source context sections, omitted when a source contributed nothing
//! - Workspace template override in `.wayfinder/prompts/augmented.hbs`

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_augmented_prompt, PromptRenderer};
pub use loader::{load_template, DEFAULT_TEMPLATE, TEMPLATE_FILE};
pub use types::{BuiltPrompt, BuiltPromptMetadata, TemplateSource};
