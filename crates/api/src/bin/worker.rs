//! Whatsy queue worker entry point.

use std::sync::Arc;

use api::bootstrap;
use api::worker::WebhookTaskHandler;
use task_queue::{RedisQueue, Worker, WorkerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db = bootstrap::database().await?;
    let pipeline = bootstrap::pipeline(db)?;
    let queue = RedisQueue::from_env()?;

    let handler = Arc::new(WebhookTaskHandler::new(pipeline));
    let worker = Worker::new(queue, handler, WorkerConfig::default());

    info!("Whatsy worker starting");
    worker
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for Ctrl+C");
        })
        .await?;

    Ok(())
}
