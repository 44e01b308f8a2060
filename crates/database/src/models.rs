//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user, identified by their WhatsApp account id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    /// Provider account id (usually the phone number without `+`).
    pub whatsapp_id: String,
    /// Normalized E.164 phone number.
    pub phone_number: String,
    /// Display name from the provider profile.
    pub profile_name: Option<String>,
    /// IANA timezone inferred from the phone prefix.
    pub timezone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// An inbound message exactly as delivered by the provider.
///
/// `message_sid` is the idempotency key: duplicate webhook deliveries map to
/// the same row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RawMessage {
    pub id: i64,
    pub user_id: i64,
    /// Provider message id, unique.
    pub message_sid: String,
    pub sms_message_sid: Option<String>,
    pub body: Option<String>,
    pub message_type: String,
    pub from_number: String,
    pub to_number: String,
    pub status: String,
    pub num_media: i64,
    pub account_sid: Option<String>,
    pub api_version: Option<String>,
    /// Full webhook payload as JSON.
    pub raw_data: Option<String>,
    pub created_at: String,
}

/// Fields for inserting a new raw message.
#[derive(Debug, Clone, Default)]
pub struct NewRawMessage {
    pub user_id: i64,
    pub message_sid: String,
    pub sms_message_sid: Option<String>,
    pub body: Option<String>,
    pub message_type: String,
    pub from_number: String,
    pub to_number: String,
    pub status: String,
    pub num_media: i64,
    pub account_sid: Option<String>,
    pub api_version: Option<String>,
    pub raw_data: Option<String>,
}

/// A deduplicated media asset, keyed by content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MediaFile {
    pub id: i64,
    pub media_sid: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    /// SHA-256 of the file content, unique.
    pub file_hash: String,
    pub storage_key: String,
    pub storage_url: String,
    /// Model-generated description or transcription.
    pub description: Option<String>,
    /// How many times this exact content has been received, starting at 1.
    pub forwarded_count: i64,
    pub created_at: String,
}

/// Fields for inserting a new media file.
#[derive(Debug, Clone, Default)]
pub struct NewMediaFile {
    pub media_sid: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    pub file_hash: String,
    pub storage_key: String,
    pub storage_url: String,
    pub description: Option<String>,
}

/// A locally mirrored memory record, keyed by the external store's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Memory {
    pub id: i64,
    pub user_id: i64,
    /// Message the memory was extracted from; NULL for directly-authored
    /// memories.
    pub raw_message_id: Option<i64>,
    /// External memory-store id, unique.
    pub mem0_id: String,
    pub memory_text: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A memory joined with the message body it came from, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct MemoryWithSource {
    pub id: i64,
    pub mem0_id: String,
    pub memory_text: String,
    pub raw_message_id: Option<i64>,
    pub original_message_body: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// One processed conversational turn. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Interaction {
    pub id: i64,
    pub user_id: i64,
    pub raw_message_id: i64,
    pub user_message: String,
    pub bot_response: String,
    pub interaction_type: String,
    /// JSON array of external memory ids consulted for the reply.
    pub sources: String,
    pub created_at: String,
}

impl Interaction {
    /// Decode the consulted memory ids.
    pub fn source_ids(&self) -> Vec<String> {
        serde_json::from_str(&self.sources).unwrap_or_default()
    }
}
