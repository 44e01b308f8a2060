//! Consume side of the queue.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::envelope::TaskEnvelope;
use crate::error::{QueueError, TaskError};
use crate::queue::RedisQueue;

/// Handles one dequeued task.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Process the payload and return the computed reply text.
    async fn handle(&self, payload: &Value) -> Result<String, TaskError>;
}

/// Configuration for the worker loop.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Retries after the first attempt; the linear backoff is
    /// `retry_delay × attempt`.
    pub max_retries: u32,

    /// Base retry delay.
    pub retry_delay: Duration,

    /// Wall-clock budget per task; exceeding it kills the attempt.
    pub hard_timeout: Duration,

    /// Warning threshold before the hard timeout.
    pub soft_timeout: Duration,

    /// Blocking-pop timeout, which is also the shutdown-check cadence.
    pub pop_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(60),
            hard_timeout: Duration::from_secs(300),
            soft_timeout: Duration::from_secs(270),
            pop_timeout: Duration::from_secs(5),
        }
    }
}

impl WorkerConfig {
    /// Linear backoff for a failed attempt: `retry_delay × attempt`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt
    }
}

/// Single-task-at-a-time queue consumer.
///
/// Concurrency is intentionally capped at 1 per process to bound downstream
/// API cost; scale out by running more worker processes against the shared
/// queue. Tasks are moved to a processing list while in flight and removed
/// only after the attempt resolves, so a crashed worker leaves its task
/// recoverable.
pub struct Worker<H> {
    queue: RedisQueue,
    handler: Arc<H>,
    config: WorkerConfig,
}

impl<H: TaskHandler> Worker<H> {
    /// Create a worker over a queue and a handler.
    pub fn new(queue: RedisQueue, handler: Arc<H>, config: WorkerConfig) -> Self {
        Self {
            queue,
            handler,
            config,
        }
    }

    /// Move any tasks a previous worker left in the processing list back to
    /// the queue. Called once at startup.
    pub async fn recover_abandoned(&self) -> Result<u64, QueueError> {
        let mut conn = self.queue.connection().await?;
        let mut recovered = 0;

        loop {
            let moved: Option<String> = redis::cmd("LMOVE")
                .arg(&self.queue.config().processing_key)
                .arg(&self.queue.config().queue_key)
                .arg("RIGHT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await?;
            match moved {
                Some(raw) => {
                    warn!("Recovered abandoned task: {}", raw);
                    recovered += 1;
                }
                None => break,
            }
        }

        Ok(recovered)
    }

    /// Run until the shutdown future completes.
    pub async fn run_with_shutdown<S>(self, shutdown_signal: S) -> Result<(), QueueError>
    where
        S: Future<Output = ()> + Send,
    {
        info!("Worker starting (concurrency 1)");

        let recovered = self.recover_abandoned().await?;
        if recovered > 0 {
            info!("Recovered {} abandoned task(s)", recovered);
        }

        tokio::pin!(shutdown_signal);

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown_signal => {
                    info!("Shutdown signal received, stopping worker");
                    return Ok(());
                }

                popped = self.pop_next() => {
                    match popped {
                        Ok(Some(raw)) => self.run_task(&raw).await?,
                        Ok(None) => {} // pop timeout, loop to re-check shutdown
                        Err(e) => {
                            error!("Queue pop failed: {}", e);
                            // Transient connection loss; back off briefly
                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }
    }

    /// Blocking-pop one task into the processing list.
    async fn pop_next(&self) -> Result<Option<String>, QueueError> {
        let mut conn = self.queue.connection().await?;
        let raw: Option<String> = redis::cmd("BLMOVE")
            .arg(&self.queue.config().queue_key)
            .arg(&self.queue.config().processing_key)
            .arg("RIGHT")
            .arg("LEFT")
            .arg(self.config.pop_timeout.as_secs_f64())
            .query_async(&mut conn)
            .await?;
        Ok(raw)
    }

    /// Acknowledge a task by removing it from the processing list.
    async fn acknowledge(&self, raw: &str) -> Result<(), QueueError> {
        let mut conn = self.queue.connection().await?;
        let () = redis::cmd("LREM")
            .arg(&self.queue.config().processing_key)
            .arg(1)
            .arg(raw)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Re-enqueue a failed task for its next attempt.
    async fn requeue(&self, envelope: &TaskEnvelope) -> Result<(), QueueError> {
        let mut conn = self.queue.connection().await?;
        let () = redis::cmd("LPUSH")
            .arg(&self.queue.config().queue_key)
            .arg(envelope.encode()?)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    /// Run one dequeued task through the handler with soft/hard timeouts,
    /// then acknowledge and retry/fail as needed.
    async fn run_task(&self, raw: &str) -> Result<(), QueueError> {
        let envelope = match TaskEnvelope::decode(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("Dropping undecodable task: {}", e);
                self.acknowledge(raw).await?;
                return Ok(());
            }
        };

        info!(
            "Processing task {} (attempt {})",
            envelope.task_id, envelope.attempt
        );

        let mut work = Box::pin(self.handler.handle(&envelope.payload));

        // Soft timeout warns; the hard timeout kills the attempt.
        let outcome = match tokio::time::timeout(self.config.soft_timeout, &mut work).await {
            Ok(result) => Some(result),
            Err(_) => {
                warn!(
                    "Task {} exceeded soft timeout ({:?})",
                    envelope.task_id, self.config.soft_timeout
                );
                let remaining = self
                    .config
                    .hard_timeout
                    .saturating_sub(self.config.soft_timeout);
                match tokio::time::timeout(remaining, &mut work).await {
                    Ok(result) => Some(result),
                    Err(_) => None,
                }
            }
        };

        // The future borrows `envelope.payload`; it's fully resolved into
        // `outcome` now, so release the borrow before `envelope` is moved.
        drop(work);

        // The attempt is resolved either way; take it off the processing list.
        self.acknowledge(raw).await?;

        match outcome {
            Some(Ok(reply)) => {
                // Async replies are fire-and-forget; the reply is recorded
                // on the interaction row.
                info!("Task {} completed: {} chars", envelope.task_id, reply.len());
                Ok(())
            }
            Some(Err(e)) => {
                warn!("Task {} failed: {}", envelope.task_id, e);
                self.retry_or_fail(envelope).await
            }
            None => {
                error!(
                    "Task {} killed after hard timeout ({:?})",
                    envelope.task_id, self.config.hard_timeout
                );
                self.retry_or_fail(envelope).await
            }
        }
    }

    async fn retry_or_fail(&self, envelope: TaskEnvelope) -> Result<(), QueueError> {
        if envelope.attempt > self.config.max_retries {
            error!(
                "Task {} permanently failed after {} attempts",
                envelope.task_id, envelope.attempt
            );
            return Ok(());
        }

        let delay = self.config.backoff_for_attempt(envelope.attempt);
        debug!(
            "Retrying task {} in {:?} (attempt {} of {})",
            envelope.task_id,
            delay,
            envelope.attempt + 1,
            self.config.max_retries + 1
        );
        tokio::time::sleep(delay).await;
        self.requeue(&envelope.next_attempt()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_backoff_schedule() {
        let config = WorkerConfig::default();
        assert_eq!(config.backoff_for_attempt(1), Duration::from_secs(60));
        assert_eq!(config.backoff_for_attempt(2), Duration::from_secs(120));
        assert_eq!(config.backoff_for_attempt(3), Duration::from_secs(180));
    }

    #[test]
    fn test_soft_timeout_precedes_hard() {
        let config = WorkerConfig::default();
        assert!(config.soft_timeout < config.hard_timeout);
        assert_eq!(
            config.hard_timeout - config.soft_timeout,
            Duration::from_secs(30)
        );
    }
}
