//! Provider trait for LLM implementations

use async_trait::async_trait;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

use super::{
    error::LlmError,
    types::{GenerateRequest, StreamEvent},
};
use crate::llm::gemini::{GeminiClient, GeminiCredentials, GeminiModel};

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send>>;

/// Main interface that all LLM provider implementations must satisfy
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Stream generate content from the LLM
    ///
    /// Sends the request and returns a stream of events representing the
    /// incremental response.
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError>;
}

/// Create the shared provider used by every chat request
///
/// The returned handle is cheap to clone; the underlying HTTP client and
/// token cache are shared.
pub async fn create_provider(
    model: GeminiModel,
    credentials: GeminiCredentials,
) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let client = GeminiClient::new(model, credentials).await?;
    Ok(Arc::new(client))
}
