//! The two-round function-calling loop.

use std::sync::Arc;

use assistant_core::{
    ChatTurn, MemoryEvent, MemoryGateway, MemoryHit, ReasoningGateway, ToolInvocation, ToolMode,
};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::dates::utc_range_for_dates;
use crate::prompt::{build_followup_prompt, build_prompt, format_memories_as_context};

const GET_MEMORY: &str = "get_memory";
const STORE_MEMORY: &str = "store_memory";

/// Input for one conversation turn.
#[derive(Debug, Clone, Default)]
pub struct ConverseRequest {
    /// The user's message text (or the media-only placeholder).
    pub query: String,
    /// Memory-store scoping key.
    pub user_id: String,
    /// IANA timezone used to interpret model-supplied calendar dates.
    pub timezone: Option<String>,
    /// Pre-formatted prior conversation, chronological.
    pub history: String,
    /// One description line per attached media file.
    pub media_descriptions: Vec<String>,
}

/// Result of one conversation turn.
#[derive(Debug, Clone, Default)]
pub struct ConverseOutcome {
    /// Final reply text. On gateway failure this is an apologetic message,
    /// never an error.
    pub reply: String,
    /// Tool calls the model issued, in order.
    pub tool_calls: Vec<ToolInvocation>,
    /// Memories retrieved across all `get_memory` calls.
    pub memories_retrieved: Vec<MemoryHit>,
    /// Consolidation-event batches from `store_memory` calls, in call order.
    pub memories_stored: Vec<Vec<MemoryEvent>>,
}

/// Mediates one turn between the reasoning model and the memory store.
///
/// The protocol is a request/response exchange bounded to exactly one
/// retrieval/storage round-trip: at most two reasoning calls per turn.
pub struct ConversationOrchestrator<M, R> {
    memory: Arc<M>,
    reasoning: Arc<R>,
}

impl<M, R> ConversationOrchestrator<M, R>
where
    M: MemoryGateway,
    R: ReasoningGateway,
{
    /// Create an orchestrator over shared gateway handles.
    pub fn new(memory: Arc<M>, reasoning: Arc<R>) -> Self {
        Self { memory, reasoning }
    }

    /// Run one conversation turn.
    ///
    /// Gateway failures are absorbed here: the outcome always carries a
    /// user-presentable reply.
    pub async fn converse(&self, request: ConverseRequest) -> ConverseOutcome {
        match self.converse_inner(&request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Conversation turn degraded to error reply: {}", e);
                ConverseOutcome {
                    reply: format!("⚠️ Error while processing your request: {}", e),
                    ..Default::default()
                }
            }
        }
    }

    async fn converse_inner(
        &self,
        request: &ConverseRequest,
    ) -> Result<ConverseOutcome, assistant_core::GatewayError> {
        let current_date = Utc::now().format("%Y-%m-%d").to_string();
        let prompt = build_prompt(
            &current_date,
            &request.query,
            &request.history,
            &request.media_descriptions,
        );

        let mut turns = vec![ChatTurn::user(prompt)];

        let first = self.reasoning.generate(&turns, ToolMode::Enabled).await?;

        let mut outcome = ConverseOutcome {
            tool_calls: first.tool_calls.clone(),
            ..Default::default()
        };

        if first.tool_calls.is_empty() {
            // No function calls: the first response is the answer.
            outcome.reply = first.text.unwrap_or_default();
            if outcome.reply.is_empty() {
                warn!("Model returned neither tools nor text");
            }
            return Ok(outcome);
        }

        info!("Model issued {} tool call(s)", first.tool_calls.len());

        for call in &first.tool_calls {
            match call.name.as_str() {
                GET_MEMORY => {
                    let hits = self.resolve_get_memory(request, call).await?;
                    outcome.memories_retrieved.extend(hits);
                }
                STORE_MEMORY => {
                    if let Some(events) = self.resolve_store_memory(request, call).await {
                        outcome.memories_stored.push(events);
                    }
                }
                other => {
                    warn!("Ignoring unknown tool call: {}", other);
                }
            }
        }

        // Second round without tools forces a plain-text answer.
        if let Some(text) = first.text {
            turns.push(ChatTurn::model(text));
        }
        let memory_context = format_memories_as_context(&outcome.memories_retrieved);
        turns.push(ChatTurn::user(build_followup_prompt(
            &memory_context,
            &request.query,
        )));

        let second = self.reasoning.generate(&turns, ToolMode::Disabled).await?;
        outcome.reply = second.text.unwrap_or_default();

        Ok(outcome)
    }

    async fn resolve_get_memory(
        &self,
        request: &ConverseRequest,
        call: &ToolInvocation,
    ) -> Result<Vec<MemoryHit>, assistant_core::GatewayError> {
        let query = call.get_str("search_query").unwrap_or_default();

        let created_between = match (call.get_str("start_date"), call.get_str("end_date")) {
            (Some(start), Some(end)) => {
                let tz = request.timezone.as_deref().unwrap_or("UTC");
                utc_range_for_dates(start, end, tz)
            }
            _ => None,
        };

        debug!(
            "Resolving get_memory: query={:?}, range={:?}",
            query, created_between
        );

        self.memory
            .search(&request.user_id, query, created_between)
            .await
    }

    /// Resolve a `store_memory` call. Store failures do not abort the turn;
    /// the model still gets to answer from what it has.
    async fn resolve_store_memory(
        &self,
        request: &ConverseRequest,
        call: &ToolInvocation,
    ) -> Option<Vec<MemoryEvent>> {
        let content = match call.require_str("memory_content") {
            Ok(content) => content,
            Err(e) => {
                warn!("store_memory call without content: {}", e);
                return None;
            }
        };
        let memory_type = call.get_str("memory_type").unwrap_or("general_info");

        let metadata = json!({ "type": memory_type, "source": "llm_conversation" });

        match self
            .memory
            .add(&request.user_id, content, memory_type, metadata)
            .await
        {
            Ok(events) => {
                info!("Stored memory ({} event(s)): {}", events.len(), content);
                Some(events)
            }
            Err(e) => {
                warn!("Failed to store memory: {}", e);
                None
            }
        }
    }
}
