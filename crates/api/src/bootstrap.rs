//! Component construction for the process entry points.
//!
//! All service clients are built here and injected into the pipeline; no
//! component reaches for globals.

use std::env;
use std::sync::Arc;

use database::Database;
use gemini_gateway::GeminiClient;
use ingest::{IngestConfig, IngestCoordinator, MessagePipeline};
use mem0_gateway::Mem0Client;
use object_store::ObjectStoreClient;
use twilio_client::TwilioClient;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Connect to the database and run migrations.
pub async fn database() -> Result<Database, BoxError> {
    let url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:whatsy.db?mode=rwc".to_string());
    let db = Database::connect(&url).await?;
    db.migrate().await?;
    Ok(db)
}

/// Build the full ingest pipeline from environment configuration.
pub fn pipeline(db: Database) -> Result<Arc<dyn MessagePipeline>, BoxError> {
    let memory = Arc::new(Mem0Client::from_env()?);
    let reasoning = Arc::new(GeminiClient::from_env()?);
    let store = Arc::new(ObjectStoreClient::from_env()?);
    let fetcher = Arc::new(TwilioClient::from_env()?);

    Ok(Arc::new(IngestCoordinator::new(
        db,
        memory,
        reasoning,
        store,
        fetcher,
        IngestConfig::default(),
    )))
}
