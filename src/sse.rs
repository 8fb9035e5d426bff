// Server-sent events for the chat stream

use std::convert::Infallible;

use serde_json::{json, Value};
use uuid::Uuid;
use warp::sse::Event;

use crate::llm::core::types::ContentBlockStart;
use crate::llm::{AgentEvent, ContentDelta, StreamEvent};

/// An event as the client sees it
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    AgentText {
        id: String,
        chunk: String,
    },
    ToolCall {
        id: String,
        tool_name: String,
        arguments: Value,
    },
    ToolResponse {
        id: String,
        tool_call_id: String,
        tool_name: String,
        result: Value,
        is_error: bool,
    },
    Error {
        message: String,
    },
    Done,
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::AgentText { .. } => "agent_text",
            ChatEvent::ToolCall { .. } => "tool_call",
            ChatEvent::ToolResponse { .. } => "tool_response",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Done => "done",
        }
    }

    pub fn payload(&self) -> Value {
        match self {
            ChatEvent::AgentText { id, chunk } => json!({ "id": id, "chunk": chunk }),
            ChatEvent::ToolCall {
                id,
                tool_name,
                arguments,
            } => json!({ "id": id, "tool_name": tool_name, "arguments": arguments }),
            ChatEvent::ToolResponse {
                id,
                tool_call_id,
                tool_name,
                result,
                is_error,
            } => json!({
                "id": id,
                "tool_call_id": tool_call_id,
                "tool_name": tool_name,
                "result": result,
                "is_error": is_error,
            }),
            ChatEvent::Error { message } => json!({ "message": message }),
            ChatEvent::Done => json!({}),
        }
    }

    pub fn into_sse(self) -> Result<Event, Infallible> {
        Ok(Event::default()
            .event(self.name())
            .data(self.payload().to_string()))
    }
}

/// Turns agent events into client events
///
/// Text chunks of one model response share the id announced by its
/// `MessageStart`.
#[derive(Debug, Default)]
pub struct ChatEventMapper {
    message_id: String,
}

impl ChatEventMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&mut self, event: AgentEvent) -> Option<ChatEvent> {
        match event {
            AgentEvent::LlmEvent(StreamEvent::MessageStart { message }) => {
                self.message_id = message.id;
                None
            }
            AgentEvent::LlmEvent(StreamEvent::ContentBlockStart {
                block: ContentBlockStart::Text { text },
                ..
            })
            | AgentEvent::LlmEvent(StreamEvent::ContentDelta {
                delta: ContentDelta::TextDelta { text },
                ..
            }) if !text.is_empty() => Some(ChatEvent::AgentText {
                id: self.message_id.clone(),
                chunk: text,
            }),
            AgentEvent::ToolExecutionStarted {
                tool_use_id,
                name,
                input,
            } => Some(ChatEvent::ToolCall {
                id: tool_use_id,
                tool_name: name,
                arguments: input,
            }),
            AgentEvent::ToolExecutionCompleted {
                tool_use_id,
                name,
                result,
            } => Some(ChatEvent::ToolResponse {
                id: Uuid::new_v4().to_string(),
                tool_call_id: tool_use_id,
                tool_name: name,
                result: serde_json::from_str(&result).unwrap_or(Value::String(result)),
                is_error: false,
            }),
            AgentEvent::ToolExecutionFailed {
                tool_use_id,
                name,
                error,
            } => Some(ChatEvent::ToolResponse {
                id: Uuid::new_v4().to_string(),
                tool_call_id: tool_use_id,
                tool_name: name,
                result: json!({ "error": error }),
                is_error: true,
            }),
            AgentEvent::Completed => Some(ChatEvent::Done),
            _ => None,
        }
    }
}
