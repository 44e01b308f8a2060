//! Raw message persistence, idempotent by provider message sid.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{NewRawMessage, RawMessage};

/// Look up a message by provider sid.
pub async fn get_message_by_sid(
    pool: &SqlitePool,
    message_sid: &str,
) -> Result<Option<RawMessage>> {
    let message = sqlx::query_as::<_, RawMessage>(
        r#"
        SELECT id, user_id, message_sid, sms_message_sid, body, message_type,
               from_number, to_number, status, num_media, account_sid,
               api_version, raw_data, created_at
        FROM raw_messages
        WHERE message_sid = ?
        "#,
    )
    .bind(message_sid)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

/// Get a message by row id.
pub async fn get_message_by_id(pool: &SqlitePool, id: i64) -> Result<Option<RawMessage>> {
    let message = sqlx::query_as::<_, RawMessage>(
        r#"
        SELECT id, user_id, message_sid, sms_message_sid, body, message_type,
               from_number, to_number, status, num_media, account_sid,
               api_version, raw_data, created_at
        FROM raw_messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

/// Store a message, returning the existing row on redelivery.
///
/// `ON CONFLICT DO NOTHING` plus a fetch keeps the operation safe when the
/// same webhook is delivered twice concurrently.
pub async fn store_message(pool: &SqlitePool, new: &NewRawMessage) -> Result<RawMessage> {
    sqlx::query(
        r#"
        INSERT INTO raw_messages
            (user_id, message_sid, sms_message_sid, body, message_type,
             from_number, to_number, status, num_media, account_sid,
             api_version, raw_data)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(message_sid) DO NOTHING
        "#,
    )
    .bind(new.user_id)
    .bind(&new.message_sid)
    .bind(&new.sms_message_sid)
    .bind(&new.body)
    .bind(&new.message_type)
    .bind(&new.from_number)
    .bind(&new.to_number)
    .bind(&new.status)
    .bind(new.num_media)
    .bind(&new.account_sid)
    .bind(&new.api_version)
    .bind(&new.raw_data)
    .execute(pool)
    .await?;

    debug!("Stored raw message {}", new.message_sid);

    get_message_by_sid(pool, &new.message_sid)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "RawMessage",
            id: new.message_sid.clone(),
        })
}

/// Count total messages.
pub async fn count_messages(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM raw_messages")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
