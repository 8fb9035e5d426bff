//! Service configuration from environment variables
//!
//! Variables (defaults in parentheses):
//!   HOST (0.0.0.0), PORT (3000)
//!   POSTGRES_URL                 : chat database, required
//!   ALGO_DATABASE_URL            : practice platform database (POSTGRES_URL)
//!   DB_POOL_SIZE (16), RUN_MIGRATIONS (false)
//!   JWT_SECRET                   : protected routes answer 500 without it
//!   GOOGLE_GENERATIVE_AI_API_KEY : Gemini API key, or
//!   GCP_PROJECT_ID / GCP_LOCATION (us-central1) for Vertex AI
//!   GEMINI_MODEL (gemini-2.0-flash), LLM_MAX_TOKENS (2048)
//!   AGENT_MAX_ITERATIONS (8), CHAT_HISTORY_WINDOW (10)
//!   CHAT_INCLUDE_USER_CONTEXT (false), BRAVE_API_KEY

use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::llm::{GeminiCredentials, GeminiModel};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("no Gemini credentials: set GOOGLE_GENERATIVE_AI_API_KEY or GCP_PROJECT_ID")]
    NoCredentials,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub chat_database_url: String,
    pub algo_database_url: String,
    pub db_pool_size: usize,
    pub run_migrations: bool,
    pub jwt_secret: Option<String>,
    pub gemini_credentials: GeminiCredentials,
    pub gemini_model: GeminiModel,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub agent_max_iterations: usize,
    pub chat_history_window: usize,
    pub chat_include_user_context: bool,
    pub brave_api_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let chat_database_url = get("POSTGRES_URL").ok_or(ConfigError::Missing("POSTGRES_URL"))?;
        let algo_database_url =
            get("ALGO_DATABASE_URL").unwrap_or_else(|| chat_database_url.clone());

        let gemini_credentials = match (get("GOOGLE_GENERATIVE_AI_API_KEY"), get("GCP_PROJECT_ID")) {
            (Some(key), _) => GeminiCredentials::ApiKey(key),
            (None, Some(project_id)) => GeminiCredentials::VertexAi {
                project_id,
                location: get("GCP_LOCATION").unwrap_or_else(|| "us-central1".to_string()),
            },
            (None, None) => return Err(ConfigError::NoCredentials),
        };

        let gemini_model = match get("GEMINI_MODEL") {
            Some(value) => value.parse().map_err(|e: crate::llm::LlmError| ConfigError::Invalid {
                key: "GEMINI_MODEL",
                value,
                reason: e.to_string(),
            })?,
            None => GeminiModel::Gemini20Flash,
        };

        Ok(Self {
            host: parse_or(&get, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&get, "PORT", 3000)?,
            chat_database_url,
            algo_database_url,
            db_pool_size: parse_or(&get, "DB_POOL_SIZE", 16)?,
            run_migrations: parse_bool(&get, "RUN_MIGRATIONS", false)?,
            jwt_secret: get("JWT_SECRET"),
            gemini_credentials,
            gemini_model,
            max_tokens: parse_or(&get, "LLM_MAX_TOKENS", 2048)?,
            temperature: get("LLM_TEMPERATURE")
                .map(|value| {
                    value.parse().map_err(|e: std::num::ParseFloatError| ConfigError::Invalid {
                        key: "LLM_TEMPERATURE",
                        reason: e.to_string(),
                        value,
                    })
                })
                .transpose()?,
            agent_max_iterations: parse_or(&get, "AGENT_MAX_ITERATIONS", 8)?,
            chat_history_window: parse_or(&get, "CHAT_HISTORY_WINDOW", 10)?,
            chat_include_user_context: parse_bool(&get, "CHAT_INCLUDE_USER_CONTEXT", false)?,
            brave_api_key: get("BRAVE_API_KEY"),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(value) => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a boolean".to_string(),
        }),
    }
}
