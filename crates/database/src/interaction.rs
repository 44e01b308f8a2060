//! Interaction log: one append-only row per processed conversational turn.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;
use crate::models::Interaction;

/// Append an interaction. `sources` are the external memory ids consulted
/// while producing the reply.
pub async fn store_interaction(
    pool: &SqlitePool,
    user_id: i64,
    raw_message_id: i64,
    user_message: &str,
    bot_response: &str,
    interaction_type: &str,
    sources: &[String],
) -> Result<i64> {
    let sources_json = serde_json::to_string(sources).unwrap_or_else(|_| "[]".to_string());

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO interactions
            (user_id, raw_message_id, user_message, bot_response,
             interaction_type, sources)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(raw_message_id)
    .bind(user_message)
    .bind(bot_response)
    .bind(interaction_type)
    .bind(sources_json)
    .fetch_one(pool)
    .await?;

    debug!("Stored interaction {} for message {}", id, raw_message_id);
    Ok(id)
}

/// The interaction recorded for a message, if processing already completed.
/// This is the replay short-circuit for redelivered webhooks.
pub async fn get_interaction_by_message_id(
    pool: &SqlitePool,
    raw_message_id: i64,
) -> Result<Option<Interaction>> {
    let interaction = sqlx::query_as::<_, Interaction>(
        r#"
        SELECT id, user_id, raw_message_id, user_message, bot_response,
               interaction_type, sources, created_at
        FROM interactions
        WHERE raw_message_id = ?
        "#,
    )
    .bind(raw_message_id)
    .fetch_optional(pool)
    .await?;

    Ok(interaction)
}

/// A user's most recent interactions, newest first.
pub async fn recent_interactions(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Interaction>> {
    let interactions = sqlx::query_as::<_, Interaction>(
        r#"
        SELECT id, user_id, raw_message_id, user_message, bot_response,
               interaction_type, sources, created_at
        FROM interactions
        WHERE user_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(interactions)
}

/// Count total interactions.
pub async fn count_interactions(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM interactions")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
