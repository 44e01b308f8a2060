//! SQLite persistence layer for Whatsy.
//!
//! This crate provides async database operations for users, raw messages,
//! deduplicated media, mirrored memories, and the interaction log using SQLx
//! with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:whatsy.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let user = user::get_or_create_user(
//!         db.pool(),
//!         "14155552345",
//!         "+14155552345",
//!         Some("Alice"),
//!         Some("America/New_York"),
//!     )
//!     .await?;
//!     println!("user id {}", user.id);
//!
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod error;
pub mod interaction;
pub mod media;
pub mod memory;
pub mod message;
pub mod models;
pub mod user;

pub use error::{DatabaseError, Result};
pub use models::{
    Interaction, MediaFile, Memory, MemoryWithSource, NewMediaFile, NewRawMessage, RawMessage,
    User,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sized for concurrent webhook handling plus the worker.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMediaFile, NewRawMessage};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn seed_user(db: &Database) -> models::User {
        user::get_or_create_user(
            db.pool(),
            "14155552345",
            "+14155552345",
            Some("Alice"),
            Some("America/New_York"),
        )
        .await
        .unwrap()
    }

    fn test_message(user_id: i64, sid: &str) -> NewRawMessage {
        NewRawMessage {
            user_id,
            message_sid: sid.to_string(),
            body: Some("hello".to_string()),
            message_type: "text".to_string(),
            from_number: "whatsapp:+14155552345".to_string(),
            to_number: "whatsapp:+14155238886".to_string(),
            status: "received".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_or_create_user_is_idempotent() {
        let db = test_db().await;

        let first = seed_user(&db).await;
        let second = seed_user(&db).await;

        assert_eq!(first.id, second.id);
        assert_eq!(user::count_users(db.pool()).await.unwrap(), 1);
        assert_eq!(second.phone_number, "+14155552345");
    }

    #[tokio::test]
    async fn test_get_user_by_phone() {
        let db = test_db().await;
        let created = seed_user(&db).await;

        let found = user::get_user_by_phone(db.pool(), "+14155552345")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        let missing = user::get_user_by_phone(db.pool(), "+441234567890")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_store_message_is_idempotent() {
        let db = test_db().await;
        let u = seed_user(&db).await;

        let first = message::store_message(db.pool(), &test_message(u.id, "SM1"))
            .await
            .unwrap();
        let second = message::store_message(db.pool(), &test_message(u.id, "SM1"))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(message::count_messages(db.pool()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_media_dedup_by_hash() {
        let db = test_db().await;
        let u = seed_user(&db).await;
        let m1 = message::store_message(db.pool(), &test_message(u.id, "SM1"))
            .await
            .unwrap();
        let m2 = message::store_message(db.pool(), &test_message(u.id, "SM2"))
            .await
            .unwrap();

        let new_media = NewMediaFile {
            media_sid: Some("ME1".to_string()),
            content_type: Some("image/jpeg".to_string()),
            file_size: Some(1024),
            file_hash: "abc123".to_string(),
            storage_key: "media/2025/01/01/x.jpg".to_string(),
            storage_url: "https://store.example/media/2025/01/01/x.jpg".to_string(),
            description: Some("a cat".to_string()),
        };

        let media = media::store_media(db.pool(), &new_media).await.unwrap();
        media::associate_media_with_message(db.pool(), m1.id, media.id)
            .await
            .unwrap();

        // Same hash arrives again on a different message
        let existing = media::get_media_by_hash(db.pool(), "abc123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(existing.id, media.id);
        media::associate_media_with_message(db.pool(), m2.id, existing.id)
            .await
            .unwrap();
        media::increment_forwarded_count(db.pool(), existing.id)
            .await
            .unwrap();

        assert_eq!(media::count_media(db.pool()).await.unwrap(), 1);
        let refreshed = media::get_media_by_hash(db.pool(), "abc123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(refreshed.forwarded_count, 2);

        let for_m1 = media::media_for_message(db.pool(), m1.id).await.unwrap();
        let for_m2 = media::media_for_message(db.pool(), m2.id).await.unwrap();
        assert_eq!(for_m1.len(), 1);
        assert_eq!(for_m2.len(), 1);
        assert_eq!(for_m1[0].id, for_m2[0].id);
    }

    #[tokio::test]
    async fn test_memory_lifecycle_by_external_id() {
        let db = test_db().await;
        let u = seed_user(&db).await;
        let m = message::store_message(db.pool(), &test_message(u.id, "SM1"))
            .await
            .unwrap();

        memory::store_memory(db.pool(), u.id, Some(m.id), "mem-1", "likes tea")
            .await
            .unwrap();
        memory::update_memory(db.pool(), "mem-1", "likes green tea")
            .await
            .unwrap();

        let stored = memory::get_memory_by_mem0_id(db.pool(), "mem-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.memory_text, "likes green tea");

        // Re-adding the same external id must not create a second row
        memory::store_memory(db.pool(), u.id, None, "mem-1", "likes oolong")
            .await
            .unwrap();
        assert_eq!(memory::count_memories(db.pool()).await.unwrap(), 1);

        memory::delete_memory(db.pool(), "mem-1").await.unwrap();
        assert_eq!(memory::count_memories(db.pool()).await.unwrap(), 0);

        // Deleting an id we never mirrored is a no-op
        memory::delete_memory(db.pool(), "mem-unknown").await.unwrap();
    }

    #[tokio::test]
    async fn test_interaction_replay_lookup() {
        let db = test_db().await;
        let u = seed_user(&db).await;
        let m = message::store_message(db.pool(), &test_message(u.id, "SM1"))
            .await
            .unwrap();

        let sources = vec!["mem-1".to_string(), "mem-2".to_string()];
        interaction::store_interaction(
            db.pool(),
            u.id,
            m.id,
            "hello",
            "hi Alice",
            "conversation",
            &sources,
        )
        .await
        .unwrap();

        let found = interaction::get_interaction_by_message_id(db.pool(), m.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.bot_response, "hi Alice");
        assert_eq!(found.source_ids(), sources);
    }

    #[tokio::test]
    async fn test_recent_interactions_newest_first() {
        let db = test_db().await;
        let u = seed_user(&db).await;

        for i in 0..5 {
            let m = message::store_message(db.pool(), &test_message(u.id, &format!("SM{}", i)))
                .await
                .unwrap();
            interaction::store_interaction(
                db.pool(),
                u.id,
                m.id,
                &format!("q{}", i),
                &format!("a{}", i),
                "conversation",
                &[],
            )
            .await
            .unwrap();
        }

        let recent = interaction::recent_interactions(db.pool(), u.id, 3)
            .await
            .unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].user_message, "q4");
        assert_eq!(recent[2].user_message, "q2");
    }

    #[tokio::test]
    async fn test_analytics_summary() {
        let db = test_db().await;
        let u = seed_user(&db).await;
        message::store_message(db.pool(), &test_message(u.id, "SM1"))
            .await
            .unwrap();

        let summary = analytics::summary(db.pool()).await.unwrap();
        assert_eq!(summary.users, 1);
        assert_eq!(summary.messages, 1);
        assert_eq!(summary.interactions, 0);
    }
}
