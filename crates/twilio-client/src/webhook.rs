//! Typed view of the inbound webhook payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// One attached media reference: provider URL plus MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub content_type: String,
}

/// An inbound WhatsApp webhook, parsed from the provider's form fields.
///
/// Media arrives as indexed pairs (`MediaUrl0`/`MediaContentType0`, ...);
/// entries with an empty URL are skipped, matching the provider's behavior
/// of sending `NumMedia` greater than the populated pairs on occasion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Provider message id, the idempotency key.
    pub message_sid: String,
    pub sms_message_sid: Option<String>,
    pub account_sid: Option<String>,
    pub api_version: Option<String>,
    /// Sender address, `whatsapp:`-prefixed.
    pub from: String,
    /// Recipient address (the bot's number).
    pub to: String,
    /// Provider account id of the sender.
    pub wa_id: Option<String>,
    /// Sender's profile display name.
    pub profile_name: Option<String>,
    pub body: Option<String>,
    pub message_type: String,
    pub media: Vec<MediaRef>,
}

impl WebhookPayload {
    /// Parse and validate a form-field map.
    ///
    /// Rejects payloads missing the message sid or sender address; nothing
    /// is enqueued for a payload this returns an error for.
    pub fn from_form(form: &HashMap<String, String>) -> Result<Self, PayloadError> {
        let message_sid = require(form, "MessageSid")?;
        let from = require(form, "From")?;
        let to = require(form, "To")?;

        let num_media: usize = match form.get("NumMedia").map(|s| s.as_str()) {
            None | Some("") => 0,
            Some(raw) => raw.parse().map_err(|_| PayloadError::InvalidField {
                field: "NumMedia",
                value: raw.to_string(),
            })?,
        };

        let mut media = Vec::with_capacity(num_media);
        for i in 0..num_media {
            let url = form
                .get(&format!("MediaUrl{}", i))
                .cloned()
                .unwrap_or_default();
            if url.is_empty() {
                continue;
            }
            let content_type = form
                .get(&format!("MediaContentType{}", i))
                .cloned()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            media.push(MediaRef { url, content_type });
        }

        Ok(Self {
            message_sid,
            sms_message_sid: optional(form, "SmsMessageSid"),
            account_sid: optional(form, "AccountSid"),
            api_version: optional(form, "ApiVersion"),
            from,
            to,
            wa_id: optional(form, "WaId"),
            profile_name: optional(form, "ProfileName"),
            body: optional(form, "Body"),
            message_type: form
                .get("MessageType")
                .cloned()
                .unwrap_or_else(|| "text".to_string()),
            media,
        })
    }

    /// Number of attached media items.
    pub fn num_media(&self) -> usize {
        self.media.len()
    }

    /// Provider account id of the sender, falling back to the bare number.
    pub fn sender_account_id(&self) -> String {
        self.wa_id
            .clone()
            .unwrap_or_else(|| self.from.trim_start_matches("whatsapp:").to_string())
    }
}

fn require(form: &HashMap<String, String>, field: &'static str) -> Result<String, PayloadError> {
    match form.get(field) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(PayloadError::MissingField(field)),
    }
}

fn optional(form: &HashMap<String, String>, field: &str) -> Option<String> {
    form.get(field).filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> HashMap<String, String> {
        let mut form = HashMap::new();
        form.insert("MessageSid".to_string(), "SM123".to_string());
        form.insert("From".to_string(), "whatsapp:+14155552345".to_string());
        form.insert("To".to_string(), "whatsapp:+14155238886".to_string());
        form.insert("Body".to_string(), "hello".to_string());
        form
    }

    #[test]
    fn test_parse_minimal_payload() {
        let payload = WebhookPayload::from_form(&base_form()).unwrap();
        assert_eq!(payload.message_sid, "SM123");
        assert_eq!(payload.body.as_deref(), Some("hello"));
        assert_eq!(payload.num_media(), 0);
        assert_eq!(payload.sender_account_id(), "+14155552345");
    }

    #[test]
    fn test_parse_indexed_media_fields() {
        let mut form = base_form();
        form.insert("NumMedia".to_string(), "2".to_string());
        form.insert(
            "MediaUrl0".to_string(),
            "https://api.twilio.com/Media/ME1".to_string(),
        );
        form.insert("MediaContentType0".to_string(), "image/jpeg".to_string());
        form.insert(
            "MediaUrl1".to_string(),
            "https://api.twilio.com/Media/ME2".to_string(),
        );
        form.insert("MediaContentType1".to_string(), "video/mp4".to_string());

        let payload = WebhookPayload::from_form(&form).unwrap();
        assert_eq!(payload.num_media(), 2);
        assert_eq!(payload.media[0].content_type, "image/jpeg");
        assert_eq!(payload.media[1].url, "https://api.twilio.com/Media/ME2");
    }

    #[test]
    fn test_empty_media_url_skipped() {
        let mut form = base_form();
        form.insert("NumMedia".to_string(), "2".to_string());
        form.insert("MediaUrl0".to_string(), String::new());
        form.insert(
            "MediaUrl1".to_string(),
            "https://api.twilio.com/Media/ME2".to_string(),
        );

        let payload = WebhookPayload::from_form(&form).unwrap();
        assert_eq!(payload.num_media(), 1);
    }

    #[test]
    fn test_missing_message_sid_rejected() {
        let mut form = base_form();
        form.remove("MessageSid");
        assert_eq!(
            WebhookPayload::from_form(&form),
            Err(PayloadError::MissingField("MessageSid"))
        );
    }

    #[test]
    fn test_bad_num_media_rejected() {
        let mut form = base_form();
        form.insert("NumMedia".to_string(), "two".to_string());
        assert!(matches!(
            WebhookPayload::from_form(&form),
            Err(PayloadError::InvalidField { field: "NumMedia", .. })
        ));
    }

    #[test]
    fn test_wa_id_preferred_for_account_id() {
        let mut form = base_form();
        form.insert("WaId".to_string(), "14155552345".to_string());
        let payload = WebhookPayload::from_form(&form).unwrap();
        assert_eq!(payload.sender_account_id(), "14155552345");
    }
}
