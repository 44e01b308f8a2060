//! The unit of work carried on the queue.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One queued webhook task.
///
/// `task_id` is the provider message sid, so a task is also its own dedup
/// key. `attempt` starts at 1 and increments on each retry redelivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task_id: String,
    pub attempt: u32,
    pub payload: Value,
}

impl TaskEnvelope {
    /// Create a first-attempt envelope.
    pub fn new(task_id: impl Into<String>, payload: Value) -> Self {
        Self {
            task_id: task_id.into(),
            attempt: 1,
            payload,
        }
    }

    /// The envelope for the next retry.
    pub fn next_attempt(&self) -> Self {
        Self {
            task_id: self.task_id.clone(),
            attempt: self.attempt + 1,
            payload: self.payload.clone(),
        }
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from the wire.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_round_trip() {
        let envelope = TaskEnvelope::new("SM123", json!({"Body": "hello"}));
        let decoded = TaskEnvelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
        assert_eq!(decoded.attempt, 1);
    }

    #[test]
    fn test_next_attempt_increments() {
        let envelope = TaskEnvelope::new("SM123", json!({}));
        let retry = envelope.next_attempt().next_attempt();
        assert_eq!(retry.attempt, 3);
        assert_eq!(retry.task_id, "SM123");
    }
}
