//! Generation configuration parameters

use serde::{Deserialize, Serialize};

/// Parameters for controlling text generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Maximum number of tokens to generate per model call
    pub max_tokens: u32,
    /// Sampling temperature, 0.0 to 2.0 for Gemini; `None` keeps the model default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl GenerationConfig {
    pub fn new(max_tokens: u32) -> Self {
        Self {
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Default for GenerationConfig {
    /// Tutor answers are explanations with code snippets, so the default
    /// budget is larger than a one-line reply needs.
    fn default() -> Self {
        Self::new(2048)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = GenerationConfig::default();
        assert_eq!(config.max_tokens, 2048);
        assert!(config.temperature.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = GenerationConfig::new(512).with_temperature(0.4);

        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.temperature, Some(0.4));
    }

    #[test]
    fn test_config_serialization_skips_unset() {
        let json = serde_json::to_string(&GenerationConfig::new(1024)).unwrap();
        assert_eq!(json, "{\"max_tokens\":1024}");
    }
}
