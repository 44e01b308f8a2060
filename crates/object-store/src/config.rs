//! Configuration for the storage client.

use assistant_core::GatewayError;
use std::env;

/// Configuration for [`crate::ObjectStoreClient`].
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// Storage service base URL.
    pub base_url: String,

    /// Bucket name.
    pub bucket: String,

    /// Bearer token for authentication.
    pub api_token: String,
}

impl ObjectStoreConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `BUCKET_URL` - storage service base URL
    /// - `BUCKET_NAME` - bucket name
    /// - `BUCKET_API_TOKEN` - bearer token
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_url = env::var("BUCKET_URL")
            .map_err(|_| GatewayError::Configuration("BUCKET_URL not set".to_string()))?;

        let bucket = env::var("BUCKET_NAME")
            .map_err(|_| GatewayError::Configuration("BUCKET_NAME not set".to_string()))?;

        let api_token = env::var("BUCKET_API_TOKEN")
            .map_err(|_| GatewayError::Configuration("BUCKET_API_TOKEN not set".to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            api_token,
        })
    }
}
