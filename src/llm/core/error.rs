//! Error types for the LLM layer

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the model provider
#[derive(Debug, Error)]
pub enum LlmError {
    /// Authentication/token issues
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// HTTP request failures
    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    /// SSE stream parsing failures
    #[error("Stream error: {0}")]
    StreamError(String),

    /// JSON encoding/decoding issues
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid request parameters or configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded (retry after {retry_after:?})")]
    RateLimitExceeded { retry_after: Option<Duration> },
}

impl LlmError {
    /// Build the error for a non-success HTTP response
    ///
    /// 429 becomes `RateLimitExceeded`, honouring a numeric `Retry-After`.
    pub fn from_status(status: u16, retry_after: Option<&str>, body: String) -> Self {
        if status == 429 {
            let retry_after = retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return LlmError::RateLimitExceeded { retry_after };
        }
        LlmError::HttpError { status, body }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display() {
        let err = LlmError::HttpError {
            status: 404,
            body: "model not found".to_string(),
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("model not found"));
    }

    #[test]
    fn test_from_status_rate_limited() {
        let err = LlmError::from_status(429, Some("30"), String::new());
        match err {
            LlmError::RateLimitExceeded { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_secs(30)));
            }
            other => panic!("Expected rate limit, got {:?}", other),
        }
    }

    #[test]
    fn test_from_status_other() {
        let err = LlmError::from_status(400, None, "bad schema".to_string());
        assert!(matches!(err, LlmError::HttpError { status: 400, .. }));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::SerializationError(_)));
    }
}
