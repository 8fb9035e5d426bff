//! The Odin tutor: system prompt and model-callable tools

pub mod prompt;
pub mod tools;

pub use prompt::system_prompt;
pub use tools::{build_registry, ToolContext};
