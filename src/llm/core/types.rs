//! Provider-neutral conversation model
//!
//! These types are what the agent loop works with and what a chat is
//! persisted as, so their serde shape is part of the stored format: block
//! and event tags are snake_case under a `type` key.

use serde::{Deserialize, Serialize};

use super::config::GenerationConfig;

/// One model call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolDeclaration>>,
    pub config: GenerationConfig,
    pub system: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text_message(MessageRole::Assistant, text)
    }

    fn text_message(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// Successful output of the tool call `tool_use_id`
    pub fn tool_result(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::tool_message(tool_use_id, name, content, false)
    }

    /// Failure of the tool call `tool_use_id`, reported back to the model
    pub fn tool_error(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::tool_message(tool_use_id, name, error, true)
    }

    fn tool_message(
        tool_use_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        is_error: bool,
    ) -> Self {
        Self {
            role: MessageRole::Tool,
            content: vec![ContentBlock::ToolResult {
                tool_use_id: tool_use_id.into(),
                name: name.into(),
                content: content.into(),
                is_error,
            }],
        }
    }

    /// Concatenated text of every text block, ignoring tool traffic
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// True when the message carries no text and no tool traffic
    pub fn is_empty(&self) -> bool {
        self.content.iter().all(|block| match block {
            ContentBlock::Text { text } => text.trim().is_empty(),
            _ => false,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        /// Gemini matches responses to calls by function name
        name: String,
        /// Tool output, usually a JSON document
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

/// A tool as advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object
    pub input_schema: serde_json::Value,
}

/// Incremental output of one model call
///
/// A call yields `MessageStart`, then for each block a start, any number of
/// deltas and an end, then `MessageEnd`. `Error` may appear at any point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    MessageStart {
        message: MessageMetadata,
    },
    ContentBlockStart {
        index: usize,
        #[serde(rename = "content_block")]
        block: ContentBlockStart,
    },
    ContentDelta {
        index: usize,
        delta: ContentDelta,
    },
    ContentBlockEnd {
        index: usize,
    },
    MessageEnd {
        finish_reason: FinishReason,
        usage: UsageMetadata,
    },
    Error {
        error: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Shared by every text chunk of this response
    pub id: String,
    pub role: MessageRole,
    pub usage: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockStart {
    Text { text: String },
    ToolUse { id: String, name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta { text: String },
    ToolUseDelta { partial: PartialToolUse },
}

/// A fragment of tool arguments; fragments of one block concatenate to JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialToolUse {
    pub id: Option<String>,
    pub name: Option<String>,
    pub partial_json: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    /// The model wants tool results before continuing
    ToolUse,
    Safety,
    Other(String),
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl UsageMetadata {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}
