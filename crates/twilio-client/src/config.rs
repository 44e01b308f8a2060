//! Configuration for the Twilio client.

use assistant_core::GatewayError;
use std::env;

/// Configuration for [`crate::TwilioClient`].
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    /// Account SID, also the basic-auth username for media downloads.
    pub account_sid: String,

    /// Auth token.
    pub auth_token: String,

    /// Sender address for outbound messages (with `whatsapp:` prefix).
    pub from_number: String,
}

impl TwilioConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `TWILIO_ACCOUNT_SID`
    /// - `TWILIO_AUTH_TOKEN`
    ///
    /// Optional environment variables:
    /// - `TWILIO_FROM_NUMBER` - sender address (default: whatsapp:+14155238886,
    ///   the sandbox number)
    pub fn from_env() -> Result<Self, GatewayError> {
        let account_sid = env::var("TWILIO_ACCOUNT_SID")
            .map_err(|_| GatewayError::Configuration("TWILIO_ACCOUNT_SID not set".to_string()))?;

        let auth_token = env::var("TWILIO_AUTH_TOKEN")
            .map_err(|_| GatewayError::Configuration("TWILIO_AUTH_TOKEN not set".to_string()))?;

        let from_number = env::var("TWILIO_FROM_NUMBER")
            .unwrap_or_else(|_| "whatsapp:+14155238886".to_string());

        Ok(Self {
            account_sid,
            auth_token,
            from_number,
        })
    }
}
