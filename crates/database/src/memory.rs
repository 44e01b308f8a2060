//! Local mirror of the external memory store, keyed by external id.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{Memory, MemoryWithSource};

/// Create a memory record. If the external id already exists the text is
/// overwritten in place, so there is never more than one row per external id.
pub async fn store_memory(
    pool: &SqlitePool,
    user_id: i64,
    raw_message_id: Option<i64>,
    mem0_id: &str,
    memory_text: &str,
) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO memories (user_id, raw_message_id, mem0_id, memory_text)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(mem0_id) DO UPDATE
            SET memory_text = excluded.memory_text,
                updated_at = datetime('now')
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(raw_message_id)
    .bind(mem0_id)
    .bind(memory_text)
    .fetch_one(pool)
    .await?;

    debug!("Stored memory {} (mem0 id {})", id, mem0_id);
    Ok(id)
}

/// Overwrite a memory's text by external id.
pub async fn update_memory(pool: &SqlitePool, mem0_id: &str, memory_text: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE memories
        SET memory_text = ?, updated_at = datetime('now')
        WHERE mem0_id = ?
        "#,
    )
    .bind(memory_text)
    .bind(mem0_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Memory",
            id: mem0_id.to_string(),
        });
    }

    Ok(())
}

/// Remove a memory by external id. Removing an unknown id is a no-op: the
/// external store may consolidate away records we never mirrored.
pub async fn delete_memory(pool: &SqlitePool, mem0_id: &str) -> Result<()> {
    sqlx::query("DELETE FROM memories WHERE mem0_id = ?")
        .bind(mem0_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Get a memory by external id.
pub async fn get_memory_by_mem0_id(pool: &SqlitePool, mem0_id: &str) -> Result<Option<Memory>> {
    let memory = sqlx::query_as::<_, Memory>(
        r#"
        SELECT id, user_id, raw_message_id, mem0_id, memory_text, created_at, updated_at
        FROM memories
        WHERE mem0_id = ?
        "#,
    )
    .bind(mem0_id)
    .fetch_optional(pool)
    .await?;

    Ok(memory)
}

/// All of a user's memories joined with their source message bodies,
/// newest first.
pub async fn memories_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<MemoryWithSource>> {
    let memories = sqlx::query_as::<_, MemoryWithSource>(
        r#"
        SELECT m.id, m.mem0_id, m.memory_text, m.raw_message_id,
               rm.body AS original_message_body, m.created_at, m.updated_at
        FROM memories m
        LEFT JOIN raw_messages rm ON m.raw_message_id = rm.id
        WHERE m.user_id = ?
        ORDER BY m.created_at DESC, m.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(memories)
}

/// Count total memories.
pub async fn count_memories(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM memories")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
