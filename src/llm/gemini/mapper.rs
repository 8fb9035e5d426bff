//! Mapping between abstraction types and Gemini types

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::llm::core::{
    config::GenerationConfig,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
        MessageMetadata, MessageRole, PartialToolUse, StreamEvent, ToolDeclaration, UsageMetadata,
    },
};

use super::types::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GeminiGenerationConfig,
    GenerateContentRequest, GenerateContentResponse, Part, SystemInstruction, Tool,
};

/// Schema keywords Gemini's function declarations understand
const SCHEMA_KEYWORDS: &[&str] = &[
    "type",
    "description",
    "nullable",
    "enum",
    "properties",
    "required",
    "items",
    "minItems",
    "maxItems",
    "minimum",
    "maximum",
];

/// Convert our abstraction request to Gemini's request format
pub fn to_gemini_request(request: GenerateRequest) -> GenerateContentRequest {
    let tools = request
        .tools
        .filter(|tools| !tools.is_empty())
        .map(|tools| {
            vec![Tool {
                function_declarations: tools
                    .into_iter()
                    .map(to_gemini_function_declaration)
                    .collect(),
            }]
        });

    GenerateContentRequest {
        contents: merge_adjacent_roles(request.messages.into_iter().map(to_gemini_content)),
        system_instruction: request.system.map(|s| SystemInstruction {
            parts: vec![Part::Text { text: s }],
        }),
        tools,
        generation_config: Some(to_gemini_generation_config(request.config)),
    }
}

/// Gemini wants all responses to one model turn's calls in a single content,
/// so consecutive contents with the same role are folded together.
fn merge_adjacent_roles(contents: impl Iterator<Item = Content>) -> Vec<Content> {
    let mut merged: Vec<Content> = Vec::new();
    for content in contents {
        if content.parts.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.role == content.role => last.parts.extend(content.parts),
            _ => merged.push(content),
        }
    }
    merged
}

/// Convert a message to Gemini's content format
fn to_gemini_content(message: Message) -> Content {
    let role = match message.role {
        MessageRole::User => "user",
        MessageRole::Assistant => "model",
        // function responses travel in a user turn
        MessageRole::Tool => "user",
    };

    let parts = message
        .content
        .into_iter()
        .filter(|block| !matches!(block, ContentBlock::Text { text } if text.is_empty()))
        .map(to_gemini_part)
        .collect();

    Content {
        role: role.to_string(),
        parts,
    }
}

/// Convert a content block to a Gemini part
fn to_gemini_part(block: ContentBlock) -> Part {
    match block {
        ContentBlock::Text { text } => Part::Text { text },
        // Gemini has no call ids; calls and responses pair up by name and order
        ContentBlock::ToolUse { name, input, .. } => Part::FunctionCall {
            function_call: FunctionCall { name, args: input },
        },
        ContentBlock::ToolResult {
            name,
            content,
            is_error,
            ..
        } => Part::FunctionResponse {
            function_response: FunctionResponse {
                name,
                response: tool_result_payload(content, is_error),
            },
        },
    }
}

/// `functionResponse.response` must be a JSON object
fn tool_result_payload(content: String, is_error: bool) -> Value {
    if is_error {
        return serde_json::json!({ "error": content });
    }
    match serde_json::from_str::<Value>(&content) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => serde_json::json!({ "result": other }),
        Err(_) => serde_json::json!({ "result": content }),
    }
}

/// Convert a tool declaration to Gemini's function declaration
fn to_gemini_function_declaration(tool: ToolDeclaration) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name,
        description: tool.description,
        parameters: Some(sanitize_schema(&tool.input_schema)).filter(has_properties),
    }
}

/// Gemini rejects object schemas with no properties
fn has_properties(schema: &Value) -> bool {
    match schema.get("properties") {
        Some(Value::Object(props)) => !props.is_empty(),
        _ => schema.get("type").and_then(Value::as_str) != Some("object"),
    }
}

/// Reduce a JSON Schema to the OpenAPI subset Gemini accepts
///
/// Unknown keywords (`$schema`, `title`, `format`, `default`,
/// `additionalProperties`, ...) are dropped recursively. A `type` array such
/// as `["string", "null"]` becomes a single type plus `nullable`.
pub fn sanitize_schema(schema: &Value) -> Value {
    let Value::Object(object) = schema else {
        return schema.clone();
    };

    let mut out = Map::new();

    // `Option<T>` of a named type comes out as a one-armed allOf/anyOf
    for combinator in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(arms)) = object.get(combinator) {
            let arm = arms
                .iter()
                .find(|arm| arm.get("type").and_then(Value::as_str) != Some("null"));
            if let Some(Value::Object(inner)) = arm.map(sanitize_schema) {
                out.extend(inner);
            }
            if arms.iter().any(|arm| arm.get("type").and_then(Value::as_str) == Some("null")) {
                out.insert("nullable".to_string(), Value::Bool(true));
            }
        }
    }

    for (key, value) in object {
        if !SCHEMA_KEYWORDS.contains(&key.as_str()) {
            continue;
        }
        match key.as_str() {
            "properties" => {
                if let Value::Object(props) = value {
                    let props = props
                        .iter()
                        .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                        .collect();
                    out.insert(key.clone(), Value::Object(props));
                }
            }
            "items" => {
                out.insert(key.clone(), sanitize_schema(value));
            }
            "type" => match value {
                Value::Array(types) => {
                    let mut concrete = types.iter().filter(|t| t.as_str() != Some("null"));
                    if let Some(first) = concrete.next() {
                        out.insert(key.clone(), first.clone());
                    }
                    if types.iter().any(|t| t.as_str() == Some("null")) {
                        out.insert("nullable".to_string(), Value::Bool(true));
                    }
                }
                other => {
                    out.insert(key.clone(), other.clone());
                }
            },
            "enum" => {
                if let Value::Array(values) = value {
                    let values = values.iter().filter(|v| !v.is_null()).cloned().collect();
                    out.insert(key.clone(), Value::Array(values));
                }
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(out)
}

/// Convert generation config to Gemini's format
fn to_gemini_generation_config(config: GenerationConfig) -> GeminiGenerationConfig {
    GeminiGenerationConfig {
        max_output_tokens: Some(config.max_tokens),
        temperature: config.temperature,
    }
}

/// Convert one streamed Gemini chunk into stream events
///
/// Text parts become deltas on the current block. Each function call is a
/// complete block (start, one delta carrying the whole args, end) since
/// Gemini never splits call arguments across chunks.
pub fn from_gemini_response(
    response: GenerateContentResponse,
    current_index: &mut usize,
) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    let Some(candidate) = response.candidates.into_iter().next() else {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            events.push(StreamEvent::Error {
                error: format!("prompt blocked by Gemini: {}", reason),
            });
        }
        return events;
    };

    for part in candidate.content.parts {
        match part {
            Part::Text { text } => {
                if text.is_empty() {
                    continue;
                }
                events.push(StreamEvent::ContentDelta {
                    index: *current_index,
                    delta: ContentDelta::TextDelta { text },
                });
            }
            Part::FunctionCall { function_call } => {
                // Gemini does not id its calls, so mint one for pairing results
                events.push(StreamEvent::ContentBlockStart {
                    index: *current_index,
                    block: ContentBlockStart::ToolUse {
                        id: Uuid::new_v4().to_string(),
                        name: function_call.name.clone(),
                    },
                });
                events.push(StreamEvent::ContentDelta {
                    index: *current_index,
                    delta: ContentDelta::ToolUseDelta {
                        partial: PartialToolUse {
                            id: None,
                            name: Some(function_call.name),
                            partial_json: function_call.args.to_string(),
                        },
                    },
                });
                events.push(StreamEvent::ContentBlockEnd {
                    index: *current_index,
                });
                *current_index += 1;
            }
            Part::FunctionResponse { .. } => {}
        }
    }

    if let Some(reason) = candidate.finish_reason.as_deref() {
        let usage = response
            .usage_metadata
            .map(|u| UsageMetadata {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_else(|| UsageMetadata::new(0, 0));
        events.push(StreamEvent::MessageEnd {
            finish_reason: map_finish_reason(reason),
            usage,
        });
    }

    events
}

/// Map Gemini's finish reason to our abstraction
fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::MaxTokens,
        "SAFETY" => FinishReason::Safety,
        "RECITATION" => FinishReason::Other("Recitation".to_string()),
        other => FinishReason::Other(other.to_string()),
    }
}

/// Helper to create initial message start event
pub fn create_message_start(message_id: String) -> StreamEvent {
    StreamEvent::MessageStart {
        message: MessageMetadata {
            id: message_id,
            role: MessageRole::Assistant,
            usage: None,
        },
    }
}
