//! Tool executor trait

use async_trait::async_trait;

/// Runs tool calls requested by the model
///
/// `Ok` carries the JSON-encoded result handed back to the model; `Err`
/// carries a message that is reported to the model as a failed call.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(
        &self,
        tool_use_id: String,
        name: String,
        arguments: serde_json::Value,
    ) -> Result<String, String>;

    /// Declarations of every tool this executor can run
    fn declarations(&self) -> Vec<crate::llm::core::types::ToolDeclaration>;
}
