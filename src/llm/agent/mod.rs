//! Tool-calling agent loop
//!
//! One `Agent` serves one chat request. It is seeded with the conversation
//! so far, then repeatedly calls the model, forwards every streamed event,
//! runs any tool calls the model makes and feeds the results back, until the
//! model answers with text only or the iteration cap is hit.

mod error;

pub use error::AgentError;

use std::pin::Pin;
use std::sync::Arc;

use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use pin_utils::pin_mut;
use tracing::{debug, warn};

use crate::llm::core::{
    config::GenerationConfig,
    provider::LlmProvider,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration,
    },
};
use crate::llm::tools::executor::ToolExecutor;

pub const DEFAULT_MAX_ITERATIONS: usize = 8;

pub type AgentStream<'a> = Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + 'a>>;

/// Events emitted by the agent during execution
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Raw LLM streaming event (text deltas, tool calls, etc.)
    LlmEvent(StreamEvent),

    ToolExecutionStarted {
        tool_use_id: String,
        name: String,
        input: serde_json::Value,
    },

    ToolExecutionCompleted {
        tool_use_id: String,
        name: String,
        result: String,
    },

    ToolExecutionFailed {
        tool_use_id: String,
        name: String,
        error: String,
    },

    /// A model call is about to be made
    IterationStarted { iteration: usize },

    /// The model answered without calling tools
    Completed,
}

struct PartialToolUseAccumulator {
    id: String,
    name: String,
    input: String,
}

pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tool_executor: Box<dyn ToolExecutor>,
    tool_declarations: Vec<ToolDeclaration>,
    messages: Vec<Message>,
    config: GenerationConfig,
    system: Option<String>,
    max_iterations: usize,
}

impl Agent {
    /// Create an agent whose tools are whatever `tool_executor` declares
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tool_executor: Box<dyn ToolExecutor>,
        config: GenerationConfig,
        system: Option<String>,
    ) -> Self {
        let tool_declarations = tool_executor.declarations();
        Self {
            provider,
            tool_executor,
            tool_declarations,
            messages: Vec::new(),
            config,
            system,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Seed the conversation the loop continues from
    pub fn with_history(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Run the loop over the current history
    ///
    /// The stream yields `IterationStarted` before each model call, every
    /// provider event as `LlmEvent`, `ToolExecution*` around each tool call and
    /// finally `Completed`. Any error is yielded once and ends the stream.
    /// Messages produced along the way are appended to the history, so after
    /// the stream is drained `messages()` holds the full conversation.
    pub fn run(&mut self) -> AgentStream<'_> {
        Box::pin(self.create_agent_stream())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn create_agent_stream(
        &mut self,
    ) -> impl Stream<Item = Result<AgentEvent, AgentError>> + Send + '_ {
        stream! {
            let mut iteration = 0;

            loop {
                iteration += 1;

                if iteration > self.max_iterations {
                    warn!(max = self.max_iterations, "agent iteration cap reached");
                    yield Err(AgentError::MaxIterationsReached(self.max_iterations));
                    return;
                }

                yield Ok(AgentEvent::IterationStarted { iteration });

                let tools = if self.tool_declarations.is_empty() {
                    None
                } else {
                    Some(self.tool_declarations.clone())
                };
                let request = GenerateRequest {
                    messages: self.messages.clone(),
                    tools,
                    config: self.config.clone(),
                    system: self.system.clone(),
                };

                let llm_stream = match self.provider.stream_generate(request).await {
                    Ok(s) => s,
                    Err(e) => {
                        yield Err(AgentError::Llm(e));
                        return;
                    }
                };

                let mut text_content = String::new();
                let mut tool_uses = Vec::new();
                let mut current_tool_use: Option<PartialToolUseAccumulator> = None;

                pin_mut!(llm_stream);

                while let Some(event_result) = llm_stream.next().await {
                    let event = match event_result {
                        Ok(e) => e,
                        Err(e) => {
                            yield Err(AgentError::Llm(e));
                            return;
                        }
                    };

                    match &event {
                        StreamEvent::ContentBlockStart { block, .. } => match block {
                            ContentBlockStart::Text { text } => text_content.push_str(text),
                            ContentBlockStart::ToolUse { id, name } => {
                                current_tool_use = Some(PartialToolUseAccumulator {
                                    id: id.clone(),
                                    name: name.clone(),
                                    input: String::new(),
                                });
                            }
                        },
                        StreamEvent::ContentDelta { delta, .. } => match delta {
                            ContentDelta::TextDelta { text } => text_content.push_str(text),
                            ContentDelta::ToolUseDelta { partial } => {
                                if let Some(tool_use) = &mut current_tool_use {
                                    tool_use.input.push_str(&partial.partial_json);
                                }
                            }
                        },
                        StreamEvent::ContentBlockEnd { .. } => {
                            if let Some(tool_use) = current_tool_use.take() {
                                let input = if tool_use.input.trim().is_empty() {
                                    Ok(serde_json::json!({}))
                                } else {
                                    serde_json::from_str(&tool_use.input)
                                };
                                match input {
                                    Ok(input) => tool_uses.push(ContentBlock::ToolUse {
                                        id: tool_use.id,
                                        name: tool_use.name,
                                        input,
                                    }),
                                    Err(e) => {
                                        yield Err(AgentError::ToolInputParse(e));
                                        return;
                                    }
                                }
                            }
                        }
                        StreamEvent::Error { error } => {
                            yield Err(AgentError::Stream(error.clone()));
                            return;
                        }
                        _ => {}
                    }

                    let finished = matches!(event, StreamEvent::MessageEnd { .. });
                    yield Ok(AgentEvent::LlmEvent(event));
                    if finished {
                        break;
                    }
                }

                let mut assistant_content = Vec::new();
                if !text_content.is_empty() {
                    assistant_content.push(ContentBlock::Text { text: text_content });
                }

                if tool_uses.is_empty() {
                    if !assistant_content.is_empty() {
                        self.messages.push(Message {
                            role: MessageRole::Assistant,
                            content: assistant_content,
                        });
                    }
                    debug!(iteration, "agent completed");
                    yield Ok(AgentEvent::Completed);
                    return;
                }

                assistant_content.extend(tool_uses.iter().cloned());
                self.messages.push(Message {
                    role: MessageRole::Assistant,
                    content: assistant_content,
                });

                for block in tool_uses {
                    let ContentBlock::ToolUse { id, name, input } = block else {
                        continue;
                    };

                    yield Ok(AgentEvent::ToolExecutionStarted {
                        tool_use_id: id.clone(),
                        name: name.clone(),
                        input: input.clone(),
                    });

                    match self.tool_executor.execute(id.clone(), name.clone(), input).await {
                        Ok(result) => {
                            self.messages.push(Message::tool_result(&id, &name, result.clone()));
                            yield Ok(AgentEvent::ToolExecutionCompleted {
                                tool_use_id: id,
                                name,
                                result,
                            });
                        }
                        Err(error) => {
                            warn!(tool = %name, %error, "tool call failed");
                            self.messages.push(Message::tool_error(&id, &name, error.clone()));
                            yield Ok(AgentEvent::ToolExecutionFailed {
                                tool_use_id: id,
                                name,
                                error,
                            });
                        }
                    }
                }
            }
        }
    }
}
