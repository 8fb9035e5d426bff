//! Gemini client implementation

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::llm::auth::adc::AuthenticationManager;
use crate::llm::core::{
    error::LlmError,
    provider::{EventStream, LlmProvider},
    types::GenerateRequest,
};

use super::mapper::{create_message_start, from_gemini_response, to_gemini_request};
use super::sse::parse_sse_stream;

/// Gemini model identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiModel {
    /// Gemini 2.0 Flash
    Gemini20Flash,
    /// Gemini 2.5 Flash
    Gemini25Flash,
    /// Gemini 2.5 Pro
    Gemini25Pro,
}

impl GeminiModel {
    pub fn as_str(&self) -> &str {
        match self {
            GeminiModel::Gemini20Flash => "gemini-2.0-flash",
            GeminiModel::Gemini25Flash => "gemini-2.5-flash",
            GeminiModel::Gemini25Pro => "gemini-2.5-pro",
        }
    }
}

impl FromStr for GeminiModel {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gemini-2.0-flash" => Ok(GeminiModel::Gemini20Flash),
            "gemini-2.5-flash" => Ok(GeminiModel::Gemini25Flash),
            "gemini-2.5-pro" => Ok(GeminiModel::Gemini25Pro),
            other => Err(LlmError::InvalidRequest(format!(
                "unsupported Gemini model '{}'",
                other
            ))),
        }
    }
}

/// How the client authenticates against Google
#[derive(Clone)]
pub enum GeminiCredentials {
    /// Generative Language API key (`x-goog-api-key`)
    ApiKey(String),
    /// Vertex AI with Application Default Credentials
    VertexAi { project_id: String, location: String },
}

impl fmt::Debug for GeminiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeminiCredentials::ApiKey(_) => f.write_str("ApiKey(***)"),
            GeminiCredentials::VertexAi {
                project_id,
                location,
            } => f
                .debug_struct("VertexAi")
                .field("project_id", project_id)
                .field("location", location)
                .finish(),
        }
    }
}

enum Auth {
    ApiKey(String),
    Vertex {
        manager: AuthenticationManager,
        project_id: String,
        location: String,
    },
}

/// Client for streaming generations from Gemini
pub struct GeminiClient {
    http_client: Client,
    auth: Auth,
    model: GeminiModel,
}

impl GeminiClient {
    /// Create a new Gemini client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or, for Vertex AI,
    /// if Application Default Credentials cannot be discovered.
    pub async fn new(model: GeminiModel, credentials: GeminiCredentials) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        let auth = match credentials {
            GeminiCredentials::ApiKey(key) => Auth::ApiKey(key),
            GeminiCredentials::VertexAi {
                project_id,
                location,
            } => Auth::Vertex {
                manager: AuthenticationManager::new().await?,
                project_id,
                location,
            },
        };

        Ok(Self {
            http_client,
            auth,
            model,
        })
    }

    fn build_endpoint_url(&self) -> String {
        match &self.auth {
            Auth::ApiKey(_) => api_key_endpoint(&self.model),
            Auth::Vertex {
                project_id,
                location,
                ..
            } => vertex_endpoint(project_id, location, &self.model),
        }
    }

    async fn make_streaming_request(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        let gemini_request = to_gemini_request(request);
        let url = self.build_endpoint_url();

        let mut builder = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

        builder = match &self.auth {
            Auth::ApiKey(key) => builder.header("x-goog-api-key", key),
            Auth::Vertex { manager, .. } => {
                let token = manager.get_token().await?;
                builder.header("Authorization", format!("Bearer {}", token))
            }
        };

        debug!(model = self.model.as_str(), contents = gemini_request.contents.len(), "calling Gemini");

        let response = builder.json(&gemini_request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(
                status.as_u16(),
                retry_after.as_deref(),
                body,
            ));
        }

        let sse_stream = parse_sse_stream(Box::pin(response.bytes_stream()));

        let message_id = Uuid::new_v4().to_string();
        let mut emitted_start = false;
        let mut current_index = 0;

        let event_stream = sse_stream.flat_map(move |result| {
            let events = match result {
                Ok(gemini_response) => {
                    let mut events = Vec::new();
                    if !emitted_start {
                        events.push(Ok(create_message_start(message_id.clone())));
                        emitted_start = true;
                    }
                    events.extend(
                        from_gemini_response(gemini_response, &mut current_index)
                            .into_iter()
                            .map(Ok),
                    );
                    events
                }
                Err(e) => vec![Err(e)],
            };
            futures::stream::iter(events)
        });

        Ok(Box::pin(event_stream))
    }
}

fn api_key_endpoint(model: &GeminiModel) -> String {
    format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:streamGenerateContent?alt=sse",
        model.as_str()
    )
}

fn vertex_endpoint(project_id: &str, location: &str, model: &GeminiModel) -> String {
    format!(
        "https://{}-aiplatform.googleapis.com/v1/projects/{}/locations/{}/publishers/google/models/{}:streamGenerateContent?alt=sse",
        location, project_id, location, model.as_str()
    )
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn stream_generate(&self, request: GenerateRequest) -> Result<EventStream, LlmError> {
        self.make_streaming_request(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_model_round_trip_names() {
        for model in [
            GeminiModel::Gemini20Flash,
            GeminiModel::Gemini25Flash,
            GeminiModel::Gemini25Pro,
        ] {
            assert_eq!(model.as_str().parse::<GeminiModel>().unwrap(), model);
        }
    }

    #[test]
    fn test_unknown_model_rejected() {
        assert!("gpt-4o".parse::<GeminiModel>().is_err());
    }

    #[test]
    fn test_api_key_endpoint() {
        let url = api_key_endpoint(&GeminiModel::Gemini20Flash);
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_vertex_endpoint() {
        let url = vertex_endpoint("my-project", "us-central1", &GeminiModel::Gemini25Flash);
        assert!(url.starts_with("https://us-central1-aiplatform.googleapis.com/"));
        assert!(url.contains("/projects/my-project/locations/us-central1/"));
        assert!(url.ends_with("gemini-2.5-flash:streamGenerateContent?alt=sse"));
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds = GeminiCredentials::ApiKey("secret-key".to_string());
        assert!(!format!("{:?}", creds).contains("secret-key"));
    }

    #[tokio::test]
    async fn test_api_key_client_needs_no_network() {
        let client = GeminiClient::new(
            GeminiModel::Gemini20Flash,
            GeminiCredentials::ApiKey("k".to_string()),
        )
        .await
        .unwrap();
        assert!(client.build_endpoint_url().contains("generativelanguage"));
    }
}
