//! Configuration for the Gemini client.

use assistant_core::GatewayError;
use std::env;

/// Configuration for [`crate::GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Temperature for generation.
    pub temperature: f32,

    /// Nucleus sampling parameter.
    pub top_p: f32,

    /// Maximum tokens for conversation replies.
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.0,
            top_p: 0.95,
            max_output_tokens: 4096,
        }
    }
}

impl GeminiConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GEMINI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GEMINI_API_URL` - API URL (default: https://generativelanguage.googleapis.com)
    /// - `GEMINI_MODEL` - Model name (default: gemini-2.5-flash)
    /// - `GEMINI_TEMPERATURE` - Temperature (default: 0)
    /// - `GEMINI_MAX_OUTPUT_TOKENS` - Max reply tokens (default: 4096)
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = env::var("GEMINI_API_KEY")
            .map_err(|_| GatewayError::Configuration("GEMINI_API_KEY not set".to_string()))?;

        let api_url = env::var("GEMINI_API_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        let temperature = env::var("GEMINI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);

        let max_output_tokens = env::var("GEMINI_MAX_OUTPUT_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4096);

        Ok(Self {
            api_url,
            api_key,
            model,
            temperature,
            top_p: 0.95,
            max_output_tokens,
        })
    }
}
