//! Application Default Credentials for Vertex AI

use gcp_auth::AuthenticationManager as GcpAuthManager;
use tracing::debug;

use crate::llm::core::error::LlmError;

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Token source for Vertex AI requests
///
/// Credentials are discovered from `GOOGLE_APPLICATION_CREDENTIALS`, the
/// gcloud user credentials, or the metadata server. Tokens are cached and
/// refreshed by `gcp_auth`.
pub struct AuthenticationManager {
    inner: GcpAuthManager,
}

impl AuthenticationManager {
    /// Discover credentials
    ///
    /// # Errors
    /// Returns `AuthenticationError` if no credential source is usable.
    pub async fn new() -> Result<Self, LlmError> {
        let inner = GcpAuthManager::new()
            .await
            .map_err(|e| LlmError::AuthenticationError(format!("Failed to initialize ADC: {}", e)))?;
        debug!("application default credentials discovered");
        Ok(Self { inner })
    }

    /// Bearer token for the cloud-platform scope
    pub async fn get_token(&self) -> Result<String, LlmError> {
        let token = self
            .inner
            .get_token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| LlmError::AuthenticationError(format!("Failed to get token: {}", e)))?;

        Ok(token.as_str().to_string())
    }
}
