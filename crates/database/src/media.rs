//! Media asset persistence with content-hash dedup.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DatabaseError, Result};
use crate::models::{MediaFile, NewMediaFile};

/// Look up a media asset by content hash.
pub async fn get_media_by_hash(pool: &SqlitePool, file_hash: &str) -> Result<Option<MediaFile>> {
    let media = sqlx::query_as::<_, MediaFile>(
        r#"
        SELECT id, media_sid, content_type, file_size, file_hash, storage_key,
               storage_url, description, forwarded_count, created_at
        FROM media_files
        WHERE file_hash = ?
        "#,
    )
    .bind(file_hash)
    .fetch_optional(pool)
    .await?;

    Ok(media)
}

/// Store a new media asset. A concurrent insert of the same hash resolves to
/// the winner's row.
pub async fn store_media(pool: &SqlitePool, new: &NewMediaFile) -> Result<MediaFile> {
    sqlx::query(
        r#"
        INSERT INTO media_files
            (media_sid, content_type, file_size, file_hash, storage_key,
             storage_url, description)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(file_hash) DO NOTHING
        "#,
    )
    .bind(&new.media_sid)
    .bind(&new.content_type)
    .bind(new.file_size)
    .bind(&new.file_hash)
    .bind(&new.storage_key)
    .bind(&new.storage_url)
    .bind(&new.description)
    .execute(pool)
    .await?;

    debug!("Stored media file with hash {}", new.file_hash);

    get_media_by_hash(pool, &new.file_hash)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "MediaFile",
            id: new.file_hash.clone(),
        })
}

/// Associate a media asset with a message. Repeat associations are ignored.
pub async fn associate_media_with_message(
    pool: &SqlitePool,
    raw_message_id: i64,
    media_file_id: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO message_media (raw_message_id, media_file_id)
        VALUES (?, ?)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(raw_message_id)
    .bind(media_file_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record that known content arrived again.
pub async fn increment_forwarded_count(pool: &SqlitePool, media_file_id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE media_files
        SET forwarded_count = forwarded_count + 1
        WHERE id = ?
        "#,
    )
    .bind(media_file_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "MediaFile",
            id: media_file_id.to_string(),
        });
    }

    Ok(())
}

/// All media assets attached to a message, oldest first.
pub async fn media_for_message(pool: &SqlitePool, raw_message_id: i64) -> Result<Vec<MediaFile>> {
    let media = sqlx::query_as::<_, MediaFile>(
        r#"
        SELECT mf.id, mf.media_sid, mf.content_type, mf.file_size, mf.file_hash,
               mf.storage_key, mf.storage_url, mf.description,
               mf.forwarded_count, mf.created_at
        FROM media_files mf
        JOIN message_media mm ON mm.media_file_id = mf.id
        WHERE mm.raw_message_id = ?
        ORDER BY mf.created_at
        "#,
    )
    .bind(raw_message_id)
    .fetch_all(pool)
    .await?;

    Ok(media)
}

/// Count total media assets.
pub async fn count_media(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM media_files")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
