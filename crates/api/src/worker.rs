//! Queue-side task handler: bridges dequeued payloads into the pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use assistant_core::async_trait;
use ingest::MessagePipeline;
use serde_json::Value;
use task_queue::{TaskError, TaskHandler};
use twilio_client::WebhookPayload;

/// Feeds dequeued webhook payloads through the ingest pipeline.
pub struct WebhookTaskHandler {
    pipeline: Arc<dyn MessagePipeline>,
}

impl WebhookTaskHandler {
    pub fn new(pipeline: Arc<dyn MessagePipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for WebhookTaskHandler {
    async fn handle(&self, payload: &Value) -> Result<String, TaskError> {
        let form: HashMap<String, String> = serde_json::from_value(payload.clone())
            .map_err(|e| TaskError::new(format!("undecodable payload: {}", e)))?;

        let webhook = WebhookPayload::from_form(&form)
            .map_err(|e| TaskError::new(format!("invalid payload: {}", e)))?;

        self.pipeline
            .handle(&webhook)
            .await
            .map_err(|e| TaskError::new(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingest::{IngestError, InteractionView, MemoriesOverview, SearchResult, UserInfo};
    use serde_json::json;

    struct EchoPipeline;

    #[async_trait]
    impl MessagePipeline for EchoPipeline {
        async fn handle(&self, payload: &WebhookPayload) -> Result<String, IngestError> {
            Ok(format!("handled {}", payload.message_sid))
        }

        async fn format_memory_listing(&self, _number: &str) -> Result<String, IngestError> {
            Ok(String::new())
        }

        async fn memories_overview(&self, number: &str) -> Result<MemoriesOverview, IngestError> {
            Ok(MemoriesOverview {
                user_info: UserInfo {
                    user_id: 1,
                    whatsapp_id: number.to_string(),
                    phone_number: number.to_string(),
                    profile_name: None,
                    timezone: None,
                },
                memories_count: 0,
                memories: Vec::new(),
            })
        }

        async fn search_memories(
            &self,
            _number: &str,
            _query: &str,
        ) -> Result<SearchResult, IngestError> {
            Ok(SearchResult {
                reply: String::new(),
                results: Vec::new(),
            })
        }

        async fn store_memory_direct(
            &self,
            _number: &str,
            _text: &str,
            _memory_type: &str,
            _metadata: Value,
        ) -> Result<Vec<String>, IngestError> {
            Ok(Vec::new())
        }

        async fn recent_interactions(
            &self,
            _number: &str,
            _limit: i64,
        ) -> Result<Vec<InteractionView>, IngestError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_round_trips_form_payload() {
        let handler = WebhookTaskHandler::new(Arc::new(EchoPipeline));

        let payload = json!({
            "MessageSid": "SM1",
            "From": "whatsapp:+14155552345",
            "To": "whatsapp:+14155238886",
            "Body": "hello",
        });

        let reply = handler.handle(&payload).await.unwrap();
        assert_eq!(reply, "handled SM1");
    }

    #[tokio::test]
    async fn test_invalid_payload_is_task_error() {
        let handler = WebhookTaskHandler::new(Arc::new(EchoPipeline));

        let result = handler.handle(&json!({"From": "whatsapp:+1"})).await;
        assert!(result.is_err());
    }
}
