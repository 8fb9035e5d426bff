//! LLM layer
//!
//! A provider-neutral message model, the Gemini streaming client, the tool
//! registry the `#[tool]` macro plugs into, and the agent loop that ties them
//! together.

pub mod agent;
pub mod auth;
pub mod core;
pub mod gemini;
pub mod tools;

pub use self::core::{
    config::GenerationConfig,
    error::LlmError,
    provider::{create_provider, EventStream, LlmProvider},
    types::{
        ContentBlock, ContentDelta, FinishReason, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration, UsageMetadata,
    },
};

pub use agent::{Agent, AgentError, AgentEvent};
pub use gemini::{GeminiCredentials, GeminiModel};
pub use tools::{FunctionRegistry, ToolExecutor};
