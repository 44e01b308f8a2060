//! API-facing views assembled by the pipeline.

use assistant_core::MemoryHit;
use serde::Serialize;

/// User identity block included in listings.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub user_id: i64,
    pub whatsapp_id: String,
    pub phone_number: String,
    pub profile_name: Option<String>,
    pub timezone: Option<String>,
}

/// One memory with its source message and signed media URLs.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryEntry {
    pub id: i64,
    pub mem0_id: String,
    pub memory_text: String,
    pub raw_message_id: Option<i64>,
    pub original_message_body: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub media_files: Vec<String>,
}

/// Everything the memories listing endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct MemoriesOverview {
    pub user_info: UserInfo,
    pub memories_count: usize,
    pub memories: Vec<MemoryEntry>,
}

/// Reply plus retrieved memories for the search endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub reply: String,
    pub results: Vec<MemoryHit>,
}

/// One recent interaction with signed media URLs.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionView {
    pub id: i64,
    pub raw_message_id: i64,
    pub user_message: String,
    pub bot_response: String,
    pub sources: Vec<String>,
    pub original_message_body: Option<String>,
    pub message_type: Option<String>,
    pub media_files: Vec<String>,
}
