//! Enqueue side of the queue.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::envelope::TaskEnvelope;
use crate::error::QueueError;

/// Configuration for the Redis queue.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis connection URL.
    pub redis_url: String,

    /// List the intake pushes tasks onto.
    pub queue_key: String,

    /// List holding tasks currently being processed.
    pub processing_key: String,

    /// Key prefix for enqueue dedup markers.
    pub dedup_prefix: String,

    /// Lifetime of a dedup marker; matches the task expiry window.
    pub dedup_ttl_secs: u64,

    /// Timeout for the liveness probe.
    pub probe_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            queue_key: "whatsy:webhook_messages".to_string(),
            processing_key: "whatsy:webhook_messages:processing".to_string(),
            dedup_prefix: "whatsy:task:".to_string(),
            dedup_ttl_secs: 300,
            probe_timeout: Duration::from_secs(2),
        }
    }
}

impl QueueConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads `REDIS_URL` directly, or composes one from:
    /// - `REDIS_HOST` (required if `REDIS_URL` unset)
    /// - `REDIS_PORT` (default: 6379)
    /// - `REDIS_DB` (default: 0)
    /// - `REDIS_PASSWORD` (optional)
    pub fn from_env() -> Result<Self, QueueError> {
        let redis_url = match env::var("REDIS_URL") {
            Ok(url) => url,
            Err(_) => {
                let host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
                let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
                let db = env::var("REDIS_DB").unwrap_or_else(|_| "0".to_string());
                match env::var("REDIS_PASSWORD") {
                    Ok(password) if !password.is_empty() => {
                        format!("redis://:{}@{}:{}/{}", password, host, port, db)
                    }
                    _ => format!("redis://{}:{}/{}", host, port, db),
                }
            }
        };

        Ok(Self {
            redis_url,
            ..Default::default()
        })
    }
}

/// Enqueue surface the HTTP intake depends on. Object-safe so the intake can
/// be tested against a stub queue.
#[async_trait]
pub trait WebhookQueue: Send + Sync {
    /// Enqueue a payload under `dedup_key` (the provider message sid).
    /// Redelivery of an already-queued key collapses to the existing task.
    async fn enqueue(&self, payload: &Value, dedup_key: &str) -> Result<String, QueueError>;

    /// Liveness probe with a short timeout.
    async fn is_available(&self) -> bool;
}

/// Redis-backed queue.
pub struct RedisQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl RedisQueue {
    /// Create a queue over the given configuration.
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create a queue from environment variables.
    pub fn from_env() -> Result<Self, QueueError> {
        Self::new(QueueConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub(crate) async fn connection(
        &self,
    ) -> Result<redis::aio::MultiplexedConnection, QueueError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    fn dedup_key(&self, task_id: &str) -> String {
        format!("{}{}", self.config.dedup_prefix, task_id)
    }
}

#[async_trait]
impl WebhookQueue for RedisQueue {
    async fn enqueue(&self, payload: &Value, dedup_key: &str) -> Result<String, QueueError> {
        let mut conn = self.connection().await?;

        // SET NX marks the task id; losing the race means the task is
        // already queued or in flight and we collapse onto it.
        let marker: Option<String> = redis::cmd("SET")
            .arg(self.dedup_key(dedup_key))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(self.config.dedup_ttl_secs)
            .query_async(&mut conn)
            .await?;

        if marker.is_none() {
            debug!("Task {} already queued, collapsing", dedup_key);
            return Ok(dedup_key.to_string());
        }

        let envelope = TaskEnvelope::new(dedup_key, payload.clone());
        let encoded = envelope.encode()?;

        let () = redis::cmd("LPUSH")
            .arg(&self.config.queue_key)
            .arg(&encoded)
            .query_async(&mut conn)
            .await?;

        info!("Enqueued task {}", dedup_key);
        Ok(dedup_key.to_string())
    }

    async fn is_available(&self) -> bool {
        let probe = async {
            let mut conn = self.connection().await.ok()?;
            redis::cmd("PING")
                .query_async::<String>(&mut conn)
                .await
                .ok()
        };

        match tokio::time::timeout(self.config.probe_timeout, probe).await {
            Ok(Some(_)) => true,
            Ok(None) => {
                warn!("Redis probe failed");
                false
            }
            Err(_) => {
                warn!("Redis probe timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_layout() {
        let queue = RedisQueue::new(QueueConfig::default()).unwrap();
        assert_eq!(queue.dedup_key("SM123"), "whatsy:task:SM123");
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_unavailable() {
        let queue = RedisQueue::new(QueueConfig {
            // Nothing listens on port 1
            redis_url: "redis://127.0.0.1:1/0".to_string(),
            probe_timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        assert!(!queue.is_available().await);
    }
}
