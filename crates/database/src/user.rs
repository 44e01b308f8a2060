//! User persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Look up a user by whatsapp id, creating them on first contact.
///
/// The upsert is a single statement so concurrent first messages from the
/// same sender converge on one row instead of racing a check-then-insert.
pub async fn get_or_create_user(
    pool: &SqlitePool,
    whatsapp_id: &str,
    phone_number: &str,
    profile_name: Option<&str>,
    timezone: Option<&str>,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (whatsapp_id, phone_number, profile_name, timezone)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(whatsapp_id) DO UPDATE SET updated_at = datetime('now')
        RETURNING id, whatsapp_id, phone_number, profile_name, timezone, created_at, updated_at
        "#,
    )
    .bind(whatsapp_id)
    .bind(phone_number)
    .bind(profile_name)
    .bind(timezone)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, whatsapp_id, phone_number, profile_name, timezone, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        id: id.to_string(),
    })
}

/// Get a user by normalized E.164 phone number.
pub async fn get_user_by_phone(pool: &SqlitePool, phone_number: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, whatsapp_id, phone_number, profile_name, timezone, created_at, updated_at
        FROM users
        WHERE phone_number = ?
        "#,
    )
    .bind(phone_number)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
