//! Server-Sent Events parser for `streamGenerateContent?alt=sse`

use bytes::Bytes;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;

use crate::llm::core::error::LlmError;

use super::types::GenerateContentResponse;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<GenerateContentResponse, LlmError>> + Send>>;

/// Parse a byte stream into Gemini response chunks
///
/// Only `data:` lines carry payloads; comments, `event:` and blank lines are
/// skipped. Bytes are buffered until a full line arrives so multi-byte
/// characters split across network chunks decode correctly.
pub fn parse_sse_stream(byte_stream: ByteStream) -> ResponseStream {
    let mut buffer: Vec<u8> = Vec::new();

    let event_stream = byte_stream.flat_map(move |chunk_result| {
        let chunk = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => {
                return futures::stream::iter(vec![Err(LlmError::StreamError(e.to_string()))]);
            }
        };

        buffer.extend_from_slice(&chunk);

        let mut events = Vec::new();
        while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = buffer.drain(..=newline_pos).collect();
            let line = match std::str::from_utf8(&line_bytes) {
                Ok(line) => line.trim(),
                Err(e) => {
                    events.push(Err(LlmError::StreamError(format!(
                        "Invalid UTF-8 in stream: {}",
                        e
                    ))));
                    continue;
                }
            };

            if let Some(data) = line.strip_prefix("data:") {
                events.push(parse_data(data.trim_start()));
            }
        }

        futures::stream::iter(events)
    });

    Box::pin(event_stream)
}

fn parse_data(data: &str) -> Result<GenerateContentResponse, LlmError> {
    serde_json::from_str::<GenerateContentResponse>(data).map_err(|e| {
        LlmError::SerializationError(format!("Failed to parse SSE data: {}. Data: {}", e, data))
    })
}
