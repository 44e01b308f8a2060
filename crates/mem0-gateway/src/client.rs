//! Mem0 HTTP client.

use assistant_core::{
    async_trait, CreatedRange, GatewayError, MemoryEvent, MemoryGateway, MemoryHit,
};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api_types::{
    AddMemoryRequest, AddMemoryResponse, ApiError, SearchRequest, SearchResponse,
    UpdateMemoryRequest,
};
use crate::config::Mem0Config;

/// Client for the Mem0 memory-store API.
pub struct Mem0Client {
    client: Client,
    config: Mem0Config,
}

impl Mem0Client {
    /// Create a new client with the given configuration.
    pub fn new(config: Mem0Config) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`Mem0Config::from_env`] for the required variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(Mem0Config::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &Mem0Config {
        &self.config
    }

    fn auth_header(&self) -> String {
        format!("Token {}", self.config.api_key)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&error_text)
            .map(|e| e.message().to_string())
            .unwrap_or(error_text);

        Err(GatewayError::Service {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl MemoryGateway for Mem0Client {
    async fn add(
        &self,
        user_id: &str,
        content: &str,
        memory_type: &str,
        mut metadata: Value,
    ) -> Result<Vec<MemoryEvent>, GatewayError> {
        let url = format!("{}/v1/memories/", self.config.api_url);

        if metadata.is_null() {
            metadata = serde_json::json!({ "type": memory_type });
        } else if let Value::Object(ref mut map) = metadata {
            map.entry("type")
                .or_insert_with(|| Value::String(memory_type.to_string()));
        }

        let request = AddMemoryRequest::new(user_id, content, metadata);

        debug!("Adding memory for user {}: {}", user_id, content);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to send request: {}", e)))?;

        let response = Self::check_status(response).await?;

        let body: AddMemoryResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        debug!(
            "Memory store reported {} event(s) for user {}",
            body.results.len(),
            user_id
        );

        Ok(body.results)
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
        created_between: Option<CreatedRange>,
    ) -> Result<Vec<MemoryHit>, GatewayError> {
        let url = format!("{}/v2/memories/search/", self.config.api_url);
        let request = SearchRequest::new(user_id, query, created_between);

        debug!("Searching memories for user {}: {}", user_id, query);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to send request: {}", e)))?;

        let response = Self::check_status(response).await?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if body.results.is_empty() {
            warn!("Memory search returned no results for user {}", user_id);
        }

        Ok(body.results)
    }

    async fn update(&self, memory_id: &str, content: &str) -> Result<(), GatewayError> {
        let url = format!("{}/v1/memories/{}/", self.config.api_url, memory_id);
        let request = UpdateMemoryRequest {
            text: content.to_string(),
        };

        let response = self
            .client
            .put(&url)
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to send request: {}", e)))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, memory_id: &str) -> Result<(), GatewayError> {
        let url = format!("{}/v1/memories/{}/", self.config.api_url, memory_id);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to send request: {}", e)))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_header_format() {
        let client = Mem0Client::new(Mem0Config {
            api_key: "secret".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.auth_header(), "Token secret");
    }
}
