//! Route handlers and application state.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use database::{analytics, Database};
use ingest::{IngestError, MessagePipeline};
use task_queue::WebhookQueue;
use twilio_client::{MessagingResponse, WebhookPayload};

/// Acknowledgment sent when a message is queued for async processing.
const PROCESSING_ACK: &str = "processing ⚙️...";

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn WebhookQueue>,
    pub pipeline: Arc<dyn MessagePipeline>,
    pub db: Database,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/memories", post(create_memory).get(get_memories))
        .route("/memories/list", post(list_memories))
        .route("/interactions/recent", get(recent_interactions))
        .route("/analytics/summary", get(analytics_summary))
        .route("/health", get(health))
        .with_state(state)
}

fn twiml_response(body: &str) -> Response {
    let xml = MessagingResponse::new().message(body).to_xml();
    ([(header::CONTENT_TYPE, "application/xml")], xml).into_response()
}

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn ingest_error_response(e: IngestError) -> Response {
    match e {
        IngestError::UserNotFound(number) => error_response(
            StatusCode::NOT_FOUND,
            format!("User not found with WhatsApp number: {}", number),
        ),
        IngestError::InvalidSender(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        other => {
            error!("Request failed: {}", other);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

/// Inbound webhook intake.
pub async fn webhook(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    // Validation errors reject early; nothing reaches the queue.
    let payload = match WebhookPayload::from_form(&form) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Rejected malformed webhook: {}", e);
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    // The /list command is answered inline
    if payload
        .body
        .as_deref()
        .is_some_and(|body| body.trim().starts_with("/list"))
    {
        return match state.pipeline.format_memory_listing(&payload.from).await {
            Ok(listing) => twiml_response(&listing),
            Err(IngestError::UserNotFound(_)) => twiml_response("No user found"),
            Err(e) => ingest_error_response(e),
        };
    }

    if state.queue.is_available().await {
        match state
            .queue
            .enqueue(&json!(form), &payload.message_sid)
            .await
        {
            Ok(task_id) => {
                info!("Message enqueued with task ID: {}", task_id);
                return twiml_response(PROCESSING_ACK);
            }
            Err(e) => {
                // Availability raced the enqueue; degrade like an
                // unavailable queue rather than dropping the message.
                warn!("Enqueue failed, falling back to synchronous: {}", e);
            }
        }
    } else {
        warn!("Queue unavailable, falling back to synchronous processing");
    }

    match state.pipeline.handle(&payload).await {
        Ok(reply) => twiml_response(&reply),
        Err(e) => ingest_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateMemoryRequest {
    pub whatsapp_number: String,
    pub memory_text: String,
    #[serde(default = "default_memory_type")]
    pub memory_type: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

fn default_memory_type() -> String {
    "user_info".to_string()
}

/// Create a directly-authored memory.
pub async fn create_memory(
    State(state): State<AppState>,
    Json(request): Json<CreateMemoryRequest>,
) -> Response {
    if request.whatsapp_number.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "whatsapp_number is required".into());
    }
    if request.memory_text.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "memory_text is required and cannot be empty".into(),
        );
    }

    match state
        .pipeline
        .store_memory_direct(
            &request.whatsapp_number,
            request.memory_text.trim(),
            &request.memory_type,
            request.metadata,
        )
        .await
    {
        Ok(memory_ids) => Json(json!({
            "message": "Memory created successfully",
            "memory_ids": memory_ids,
        }))
        .into_response(),
        Err(e) => ingest_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct GetMemoriesParams {
    pub whatsapp_number: Option<String>,
    pub query: Option<String>,
}

/// Search a user's memories with a free-text question.
pub async fn get_memories(
    State(state): State<AppState>,
    Query(params): Query<GetMemoriesParams>,
) -> Response {
    let Some(number) = params.whatsapp_number.filter(|n| !n.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "whatsapp_number is required".into());
    };
    let query = params.query.unwrap_or_default();

    match state.pipeline.search_memories(&number, &query).await {
        Ok(result) => Json(json!({
            "success": true,
            "query": query,
            "results_count": result.results.len(),
            "search_results": result.results,
            "reply": result.reply,
        }))
        .into_response(),
        Err(e) => ingest_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct ListMemoriesRequest {
    pub whatsapp_number: String,
}

/// List all stored memories for a user.
pub async fn list_memories(
    State(state): State<AppState>,
    Json(request): Json<ListMemoriesRequest>,
) -> Response {
    if request.whatsapp_number.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "whatsapp_number is required".into());
    }

    match state
        .pipeline
        .memories_overview(&request.whatsapp_number)
        .await
    {
        Ok(overview) => Json(overview).into_response(),
        Err(e) => ingest_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentInteractionsParams {
    pub whatsapp_number: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// Recent interactions, newest first.
pub async fn recent_interactions(
    State(state): State<AppState>,
    Query(params): Query<RecentInteractionsParams>,
) -> Response {
    if params.whatsapp_number.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "whatsapp_number is required".into());
    }

    match state
        .pipeline
        .recent_interactions(&params.whatsapp_number, params.limit)
        .await
    {
        Ok(views) => Json(views).into_response(),
        Err(e) => ingest_error_response(e),
    }
}

/// Aggregate counts.
pub async fn analytics_summary(State(state): State<AppState>) -> Response {
    match analytics::summary(state.db.pool()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => {
            error!("Analytics summary failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Liveness probe.
pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}
