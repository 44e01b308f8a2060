//! Storage HTTP client.

use std::path::Path;

use assistant_core::{async_trait, GatewayError, MediaStore};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ObjectStoreConfig;

/// Client for a bucket-style storage HTTP API.
pub struct ObjectStoreClient {
    client: Client,
    config: ObjectStoreConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRequest {
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    #[serde(alias = "signedURL")]
    signed_url: String,
}

impl ObjectStoreClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ObjectStoreConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`ObjectStoreConfig::from_env`] for the required variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(ObjectStoreConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &ObjectStoreConfig {
        &self.config
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.config.base_url, self.config.bucket, key
        )
    }
}

#[async_trait]
impl MediaStore for ObjectStoreClient {
    async fn upload(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let bytes = tokio::fs::read(local_path).await?;
        let url = self.object_url(key);

        debug!("Uploading {} bytes to {}", bytes.len(), url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to upload object: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Service {
                status: status.as_u16(),
                message: error_text,
            });
        }

        info!("Uploaded {} to {}", local_path.display(), url);
        Ok(url)
    }

    async fn signed_url(&self, key: &str, expires_secs: u64) -> Result<String, GatewayError> {
        let url = format!(
            "{}/object/sign/{}/{}",
            self.config.base_url, self.config.bucket, key
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&SignRequest {
                expires_in: expires_secs,
            })
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to sign url: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Service {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        // The service returns a path relative to its base
        if body.signed_url.starts_with("http") {
            Ok(body.signed_url)
        } else {
            Ok(format!(
                "{}/{}",
                self.config.base_url,
                body.signed_url.trim_start_matches('/')
            ))
        }
    }
}
