//! Gemini HTTP client.

use assistant_core::{
    async_trait, ChatTurn, GatewayError, ReasoningGateway, ReasoningReply, Role, ToolInvocation,
    ToolMode,
};
use reqwest::Client;
use tracing::{debug, warn};

use crate::api_types::{
    ApiError, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};
use crate::config::GeminiConfig;
use crate::tools::memory_tool_manifest;

/// Token budget for media descriptions; transcriptions can run long.
const DESCRIBE_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Client for the Gemini `generateContent` API.
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`GeminiConfig::from_env`] for the required variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn generation_config(&self, max_output_tokens: u32) -> GenerationConfig {
        GenerationConfig {
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            max_output_tokens,
        }
    }

    /// Make a `generateContent` request.
    async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GatewayError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.api_url, self.config.model
        );

        debug!("Sending request to Gemini API: {:?}", request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(GatewayError::Service {
                    status: status.as_u16(),
                    message: api_error.error.message,
                });
            }

            return Err(GatewayError::Service {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let completion: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(ref usage) = completion.usage_metadata {
            debug!(
                "Token usage - prompt: {}, candidates: {}, total: {}",
                usage.prompt_token_count, usage.candidates_token_count, usage.total_token_count
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl ReasoningGateway for GeminiClient {
    async fn generate(
        &self,
        turns: &[ChatTurn],
        tools: ToolMode,
    ) -> Result<ReasoningReply, GatewayError> {
        let contents = turns
            .iter()
            .map(|turn| match turn.role {
                Role::User => Content::user_text(&turn.text),
                Role::Model => Content::model_text(&turn.text),
            })
            .collect();

        let request = GenerateContentRequest {
            contents,
            tools: match tools {
                ToolMode::Enabled => Some(memory_tool_manifest()),
                ToolMode::Disabled => None,
            },
            generation_config: self.generation_config(self.config.max_output_tokens),
        };

        let response = self.generate_content(&request).await?;

        let tool_calls: Vec<ToolInvocation> = response
            .function_calls()
            .into_iter()
            .map(|call| ToolInvocation::new(call.name.clone(), call.args.clone()))
            .collect();

        let text = response.text();
        if text.is_none() && tool_calls.is_empty() {
            warn!("Gemini returned neither text nor function calls");
        }

        Ok(ReasoningReply { text, tool_calls })
    }

    async fn describe_media(&self, url: &str, mime_type: &str) -> Result<String, GatewayError> {
        if url.trim().is_empty() {
            return Err(GatewayError::Configuration(
                "media url cannot be empty".to_string(),
            ));
        }

        let prompt = if mime_type.starts_with("image/") {
            "For the given image, describe the image concisely and to the point. \
             Do not include any other text."
        } else {
            "For the given media, transcribe the audio to text in simple paragraphs \
             without timestamps and without speaker diarization."
        };

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part::file(url, mime_type), Part::text(prompt)],
            }],
            tools: None,
            generation_config: self.generation_config(DESCRIBE_MAX_OUTPUT_TOKENS),
        };

        let response = self.generate_content(&request).await?;

        response.text().ok_or_else(|| {
            GatewayError::InvalidResponse("no description in media response".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_generation_config_uses_configured_limits() {
        let client = test_client();
        let config = client.generation_config(client.config().max_output_tokens);
        assert_eq!(config.max_output_tokens, 4096);
        assert_eq!(config.top_p, 0.95);
    }

    #[tokio::test]
    async fn test_describe_media_rejects_empty_url() {
        let client = test_client();
        let result = client.describe_media("", "image/jpeg").await;
        assert!(matches!(result, Err(GatewayError::Configuration(_))));
    }
}
