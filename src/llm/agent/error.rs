use crate::llm::core::error::LlmError;

/// Errors that end an agent run
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// The model produced tool arguments that are not JSON
    #[error("Failed to parse tool input: {0}")]
    ToolInputParse(#[from] serde_json::Error),

    /// The provider reported an error inside the stream
    #[error("Model stream error: {0}")]
    Stream(String),

    #[error("Maximum iterations reached ({0})")]
    MaxIterationsReached(usize),
}
