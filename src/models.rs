// Request and response bodies for the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::llm::{ContentBlock, Message as LlmMessage, MessageRole};

// Chat request

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientMessage {
    pub role: ClientRole,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub id: Uuid,
    #[serde(default)]
    pub messages: Vec<ClientMessage>,
}

/// Convert client messages to model history
///
/// Unknown roles and blank messages are dropped, then only the newest
/// `window` messages are kept.
pub fn to_llm_history(messages: &[ClientMessage], window: usize) -> Vec<LlmMessage> {
    let history: Vec<LlmMessage> = messages
        .iter()
        .filter_map(|m| match m.role {
            ClientRole::User => Some(LlmMessage::user(m.content.clone())),
            ClientRole::Assistant => Some(LlmMessage::assistant(m.content.clone())),
            ClientRole::Other => None,
        })
        .filter(|m| !m.is_empty())
        .collect();
    let skip = history.len().saturating_sub(window);
    history.into_iter().skip(skip).collect()
}

// Transcript view of a stored chat

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Agent,
    ToolCall,
    ToolResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    User {
        text: String,
    },
    Agent {
        text: String,
    },
    ToolCall {
        tool_name: String,
        arguments: Value,
    },
    ToolResponse {
        tool_call_id: String,
        result: Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptMessage {
    pub id: String,
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub chat_id: Uuid,
    pub messages: Vec<TranscriptMessage>,
}

/// Flatten stored model messages into one transcript entry per block
///
/// Entries are numbered `msg_1`, `msg_2`, ... and stamped with the chat's
/// creation time, since individual messages are not timestamped.
pub fn transcript_from_messages(
    messages: &[LlmMessage],
    timestamp: DateTime<Utc>,
) -> Vec<TranscriptMessage> {
    let entries = messages.iter().flat_map(|message| {
        message.content.iter().filter_map(move |block| match block {
            ContentBlock::Text { text } if text.trim().is_empty() => None,
            ContentBlock::Text { text } => Some(match message.role {
                MessageRole::User => (MessageType::User, MessageContent::User { text: text.clone() }),
                _ => (MessageType::Agent, MessageContent::Agent { text: text.clone() }),
            }),
            ContentBlock::ToolUse { name, input, .. } => Some((
                MessageType::ToolCall,
                MessageContent::ToolCall {
                    tool_name: name.clone(),
                    arguments: input.clone(),
                },
            )),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                ..
            } => Some((
                MessageType::ToolResponse,
                MessageContent::ToolResponse {
                    tool_call_id: tool_use_id.clone(),
                    result: serde_json::from_str(content)
                        .unwrap_or_else(|_| Value::String(content.clone())),
                },
            )),
        })
    });

    entries
        .enumerate()
        .map(|(i, (message_type, content))| TranscriptMessage {
            id: format!("msg_{}", i + 1),
            message_type,
            timestamp,
            content,
        })
        .collect()
}

// Code submissions

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Client-side timestamp; the server records its own
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub problem_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub submission_id: Uuid,
}

// Misc

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteChatQuery {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
