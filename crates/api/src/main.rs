//! Whatsy HTTP gateway entry point.

use std::env;
use std::sync::Arc;

use api::{bootstrap, router, AppState};
use task_queue::{RedisQueue, WebhookQueue};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db = bootstrap::database().await?;
    let pipeline = bootstrap::pipeline(db.clone())?;
    let queue: Arc<dyn WebhookQueue> = Arc::new(RedisQueue::from_env()?);

    let state = AppState {
        queue,
        pipeline,
        db,
    };

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Whatsy API listening on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
