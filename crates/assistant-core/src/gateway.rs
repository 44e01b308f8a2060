//! Capability traits for the external collaborators.
//!
//! The pipeline talks to four external services: the memory store, the LLM
//! inference endpoint, the messaging provider's media API, and durable object
//! storage. Each is modeled as a trait so implementations can be substituted
//! (notably with in-process stubs in tests).

use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GatewayError;
use crate::memory::{CreatedRange, MemoryEvent, MemoryHit};
use crate::message::ChatTurn;
use crate::tools::ToolInvocation;

/// Whether the reasoning gateway should expose the memory tools.
///
/// The function-calling protocol is a bounded two-round exchange: the first
/// round runs with tools enabled, the follow-up runs with tools disabled to
/// force a plain-text answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    Enabled,
    Disabled,
}

/// What the reasoning gateway produced for one round.
#[derive(Debug, Clone, Default)]
pub struct ReasoningReply {
    /// Free text, absent when the model only issued tool calls.
    pub text: Option<String>,
    /// Tool calls the model wants executed.
    pub tool_calls: Vec<ToolInvocation>,
}

/// Contract to the external memory store, scoped per user.
#[async_trait]
pub trait MemoryGateway: Send + Sync {
    /// Submit a fact. The store consolidates and reports the resulting
    /// ADD/UPDATE/DELETE events.
    async fn add(
        &self,
        user_id: &str,
        content: &str,
        memory_type: &str,
        metadata: Value,
    ) -> Result<Vec<MemoryEvent>, GatewayError>;

    /// Search memories by free text, optionally bounded to a UTC
    /// creation-time range.
    async fn search(
        &self,
        user_id: &str,
        query: &str,
        created_between: Option<CreatedRange>,
    ) -> Result<Vec<MemoryHit>, GatewayError>;

    /// Overwrite a memory's text by external id.
    async fn update(&self, memory_id: &str, content: &str) -> Result<(), GatewayError>;

    /// Remove a memory by external id.
    async fn delete(&self, memory_id: &str) -> Result<(), GatewayError>;
}

/// Contract to the LLM inference endpoint.
#[async_trait]
pub trait ReasoningGateway: Send + Sync {
    /// Run one conversation round. With [`ToolMode::Enabled`] the reply may
    /// carry `get_memory` / `store_memory` invocations; with
    /// [`ToolMode::Disabled`] it is plain text.
    async fn generate(
        &self,
        turns: &[ChatTurn],
        tools: ToolMode,
    ) -> Result<ReasoningReply, GatewayError>;

    /// Produce a short textual description (or transcription) of a media
    /// object reachable at `url`.
    async fn describe_media(&self, url: &str, mime_type: &str) -> Result<String, GatewayError>;
}

/// Downloads provider-hosted media into local scratch storage.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), GatewayError>;
}

/// Durable object storage for deduplicated media.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Upload a local file under `key`, returning its storage URL.
    async fn upload(
        &self,
        local_path: &Path,
        key: &str,
        content_type: &str,
    ) -> Result<String, GatewayError>;

    /// Generate a time-bounded signed URL for `key`.
    async fn signed_url(&self, key: &str, expires_secs: u64) -> Result<String, GatewayError>;
}
