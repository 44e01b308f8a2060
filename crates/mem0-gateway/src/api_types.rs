//! Mem0 API request and response types.

use assistant_core::{CreatedRange, MemoryEvent, MemoryHit};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A role-tagged message submitted to the memory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mem0Message {
    pub role: String,
    pub content: String,
}

impl Mem0Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /v1/memories/`.
#[derive(Debug, Clone, Serialize)]
pub struct AddMemoryRequest {
    pub messages: Vec<Mem0Message>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
    pub output_format: String,
}

impl AddMemoryRequest {
    pub fn new(user_id: impl Into<String>, content: impl Into<String>, metadata: Value) -> Self {
        Self {
            messages: vec![Mem0Message::user(content)],
            user_id: user_id.into(),
            metadata,
            output_format: "v1.1".to_string(),
        }
    }
}

/// Response body for `POST /v1/memories/`: the consolidation events the
/// store performed.
#[derive(Debug, Clone, Deserialize)]
pub struct AddMemoryResponse {
    #[serde(default)]
    pub results: Vec<MemoryEvent>,
}

/// Request body for `POST /v2/memories/search/`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub filters: Value,
}

impl SearchRequest {
    /// Build a search scoped to `user_id`, optionally AND-combined with a
    /// creation-time range.
    ///
    /// The range arrives as a UTC half-open interval; exclusivity of the
    /// upper bound is already baked into the value, so both bounds go on the
    /// wire as full RFC 3339 timestamps.
    pub fn new(user_id: &str, query: &str, created_between: Option<CreatedRange>) -> Self {
        let filters = match created_between {
            Some(range) => json!({
                "user_id": user_id,
                "AND": [
                    {
                        "created_at": {
                            "gte": range.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                            "lte": range.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                        }
                    }
                ],
            }),
            None => json!({ "user_id": user_id }),
        };

        Self {
            query: query.to_string(),
            filters,
        }
    }
}

/// Response body for `POST /v2/memories/search/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<MemoryHit>,
}

/// Request body for `PUT /v1/memories/{id}/`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateMemoryRequest {
    pub text: String,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiError {
    pub fn message(&self) -> &str {
        self.detail
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("unknown error")
    }
}
