//! Prompt system for Magnet knowledge sync.
//!
//! This crate provides prompt template management with:
//! - YAML-based prompt definitions
//! - Handlebars template rendering
//! - An explicit, invalidatable template cache
//! - LLM-backed prompt template execution

pub mod builder;
pub mod executor;
pub mod library;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use executor::{LlmPromptExecutor, PromptExecutor};
pub use library::PromptLibrary;
pub use loader::{list_prompts, load_prompt};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptModelSettings, PromptOutput,
};
