//! Configuration for the Mem0 client.

use assistant_core::GatewayError;
use std::env;

/// Configuration for [`crate::Mem0Client`].
#[derive(Debug, Clone)]
pub struct Mem0Config {
    /// Mem0 API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,
}

impl Default for Mem0Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.mem0.ai".to_string(),
            api_key: String::new(),
        }
    }
}

impl Mem0Config {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `MEM0_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `MEM0_API_URL` - API URL (default: https://api.mem0.ai)
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = env::var("MEM0_API_KEY")
            .map_err(|_| GatewayError::Configuration("MEM0_API_KEY not set".to_string()))?;

        let api_url =
            env::var("MEM0_API_URL").unwrap_or_else(|_| "https://api.mem0.ai".to_string());

        Ok(Self { api_url, api_key })
    }
}
