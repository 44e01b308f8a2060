//! Redis-backed task queue and worker for webhook processing.
//!
//! The queue decouples the HTTP intake from pipeline execution:
//!
//! - [`RedisQueue`] - dedup enqueue (redelivered webhooks collapse onto one
//!   task, keyed by the provider message sid) and a short-timeout liveness
//!   probe the intake uses to decide between async and synchronous handling
//! - [`Worker`] - reliable single-task-at-a-time consumer: tasks move to a
//!   processing list while in flight and are acknowledged only after
//!   completion, with linear-backoff retries and soft/hard timeouts
//!
//! Delivery is at-least-once; the pipeline's idempotency gate makes
//! redundant deliveries harmless.

mod envelope;
mod error;
mod queue;
mod worker;

pub use envelope::TaskEnvelope;
pub use error::{QueueError, TaskError};
pub use queue::{QueueConfig, RedisQueue, WebhookQueue};
pub use worker::{TaskHandler, Worker, WorkerConfig};

// Re-export async_trait for implementors
pub use async_trait::async_trait;
