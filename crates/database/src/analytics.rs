//! Aggregate counts for the analytics summary endpoint.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;
use crate::{interaction, media, memory, message, user};

/// Aggregate counts across the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub users: i64,
    pub messages: i64,
    pub media_files: i64,
    pub memories: i64,
    pub interactions: i64,
}

/// Compute the summary.
pub async fn summary(pool: &SqlitePool) -> Result<AnalyticsSummary> {
    Ok(AnalyticsSummary {
        users: user::count_users(pool).await?,
        messages: message::count_messages(pool).await?,
        media_files: media::count_media(pool).await?,
        memories: memory::count_memories(pool).await?,
        interactions: interaction::count_interactions(pool).await?,
    })
}
