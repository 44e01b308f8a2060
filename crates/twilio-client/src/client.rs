//! Authenticated Twilio REST client.

use std::path::Path;

use assistant_core::{async_trait, GatewayError, MediaFetcher};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::TwilioConfig;

/// Client for media downloads and outbound sends.
pub struct TwilioClient {
    client: Client,
    config: TwilioConfig,
}

/// Subset of the send-message response we care about.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResource {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl TwilioClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TwilioConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(|e| {
            GatewayError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`TwilioConfig::from_env`] for the required variables.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::new(TwilioConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &TwilioConfig {
        &self.config
    }

    /// Send an outbound WhatsApp message.
    pub async fn send_message(
        &self,
        to: &str,
        body: &str,
    ) -> Result<MessageResource, GatewayError> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.config.account_sid
        );

        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to send message: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Service {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let resource: MessageResource = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        info!("Sent message {} to {}", resource.sid, to);
        Ok(resource)
    }
}

#[async_trait]
impl MediaFetcher for TwilioClient {
    /// Download provider-hosted media to `dest`, authenticating with the
    /// account credentials.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), GatewayError> {
        debug!("Downloading media from {} to {}", url, dest.display());

        let response = self
            .client
            .get(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to download media: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Service {
                status: status.as_u16(),
                message: format!("media download failed for {}", url),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to read media body: {}", e)))?;

        tokio::fs::write(dest, &bytes).await?;

        debug!("Downloaded {} bytes", bytes.len());
        Ok(())
    }
}

/// Extract the media SID from a provider media URL.
///
/// Media URLs end with the SID, e.g. `https://api.twilio.com/.../Media/ME123`.
/// Falls back to the last path segment (or the whole URL) for unexpected
/// shapes.
pub fn media_sid_from_url(media_url: &str) -> String {
    media_url
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(media_url)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_sid_from_url() {
        assert_eq!(
            media_sid_from_url("https://api.twilio.com/2010-04-01/Accounts/AC1/Messages/SM1/Media/ME123456789"),
            "ME123456789"
        );
    }

    #[test]
    fn test_media_sid_from_url_odd_shapes() {
        assert_eq!(media_sid_from_url("ME42"), "ME42");
        assert_eq!(media_sid_from_url("https://x.example/a/"), "https://x.example/a/");
    }
}
