//! The ingest coordinator: webhook payload in, reply text out.

use std::path::Path;
use std::sync::Arc;

use assistant_core::{
    async_trait, phone, GatewayError, MediaFetcher, MediaStore, MemoryEvent, MemoryEventKind,
    MemoryGateway, ReasoningGateway,
};
use database::models::{NewMediaFile, NewRawMessage};
use database::{interaction, media, memory, message, user, Database, DatabaseError, MediaFile, User};
use object_store::hash;
use orchestrator::{ConversationOrchestrator, ConverseRequest};
use tracing::{debug, info, warn};
use twilio_client::{media_sid_from_url, MediaRef, WebhookPayload};
use uuid::Uuid;

use crate::error::IngestError;
use crate::history::format_past_interactions;
use crate::media::{description_line, extension_for_content_type, storage_key};
use crate::views::{
    InteractionView, MemoriesOverview, MemoryEntry, SearchResult, UserInfo,
};

/// Body text recorded and sent to the model for media-only messages.
pub const MEDIA_ONLY_PLACEHOLDER: &str = "User only sent a media attachment";

/// Configuration for the ingest pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Prior interactions included in the prompt.
    pub history_limit: i64,

    /// Lifetime of signed media URLs.
    pub signed_url_ttl_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            history_limit: 10,
            signed_url_ttl_secs: 3600,
        }
    }
}

/// Object-safe surface of the pipeline, so the HTTP layer and the queue
/// worker can hold it behind `Arc<dyn MessagePipeline>` and tests can stub
/// it.
#[async_trait]
pub trait MessagePipeline: Send + Sync {
    /// Process one inbound webhook payload end-to-end and return the reply.
    async fn handle(&self, payload: &WebhookPayload) -> Result<String, IngestError>;

    /// Human-readable memory listing for the `/list` chat command.
    async fn format_memory_listing(&self, whatsapp_number: &str) -> Result<String, IngestError>;

    /// Structured memory listing with signed media URLs.
    async fn memories_overview(&self, whatsapp_number: &str)
        -> Result<MemoriesOverview, IngestError>;

    /// Answer a free-text question over a user's memories.
    async fn search_memories(
        &self,
        whatsapp_number: &str,
        query: &str,
    ) -> Result<SearchResult, IngestError>;

    /// Store a directly-authored memory (no source message). Returns the
    /// external ids the store reported.
    async fn store_memory_direct(
        &self,
        whatsapp_number: &str,
        memory_text: &str,
        memory_type: &str,
        metadata: serde_json::Value,
    ) -> Result<Vec<String>, IngestError>;

    /// Recent interactions with signed media URLs, newest first.
    async fn recent_interactions(
        &self,
        whatsapp_number: &str,
        limit: i64,
    ) -> Result<Vec<InteractionView>, IngestError>;
}

/// Coordinates one message through user resolution, the idempotency gate,
/// the media pipeline, orchestration, and persistence.
pub struct IngestCoordinator<M, R, S, F> {
    db: Database,
    orchestrator: ConversationOrchestrator<M, R>,
    memory: Arc<M>,
    reasoning: Arc<R>,
    store: Arc<S>,
    fetcher: Arc<F>,
    config: IngestConfig,
}

impl<M, R, S, F> IngestCoordinator<M, R, S, F>
where
    M: MemoryGateway,
    R: ReasoningGateway,
    S: MediaStore,
    F: MediaFetcher,
{
    /// Create a coordinator over shared gateway handles.
    pub fn new(
        db: Database,
        memory: Arc<M>,
        reasoning: Arc<R>,
        store: Arc<S>,
        fetcher: Arc<F>,
        config: IngestConfig,
    ) -> Self {
        let orchestrator = ConversationOrchestrator::new(memory.clone(), reasoning.clone());
        Self {
            db,
            orchestrator,
            memory,
            reasoning,
            store,
            fetcher,
            config,
        }
    }

    /// Get the database handle.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Resolve a user by raw WhatsApp number, erroring if unknown.
    async fn resolve_user(&self, whatsapp_number: &str) -> Result<User, IngestError> {
        let phone_number = phone::normalize_e164(whatsapp_number)?;
        user::get_user_by_phone(self.db.pool(), &phone_number)
            .await?
            .ok_or(IngestError::UserNotFound(phone_number))
    }

    /// Download, dedup, and store every attachment of a message.
    ///
    /// A per-invocation scratch directory holds the downloads; it is removed
    /// when this function returns, on success and on error alike.
    async fn process_media_files(
        &self,
        raw_message_id: i64,
        media: &[MediaRef],
    ) -> Result<Vec<MediaFile>, IngestError> {
        let scratch = tempfile::tempdir().map_err(GatewayError::Io)?;

        let mut files = Vec::with_capacity(media.len());
        for item in media {
            let file = self
                .process_single_media(scratch.path(), raw_message_id, item)
                .await?;
            files.push(file);
        }

        // scratch dropped here, removing all downloads
        Ok(files)
    }

    async fn process_single_media(
        &self,
        scratch: &Path,
        raw_message_id: i64,
        item: &MediaRef,
    ) -> Result<MediaFile, IngestError> {
        let extension = extension_for_content_type(&item.content_type);
        let unique_id = Uuid::new_v4().to_string();
        let tmp_path = scratch.join(format!("{}{}", unique_id, extension));

        self.fetcher.download(&item.url, &tmp_path).await?;

        let file_hash = hash::sha256_file(&tmp_path)
            .await
            .map_err(GatewayError::Io)?;
        let file_size = hash::file_size(&tmp_path).await.map_err(GatewayError::Io)? as i64;

        // Known content: reference it, count the forward, skip the upload.
        if let Some(existing) = media::get_media_by_hash(self.db.pool(), &file_hash).await? {
            info!(
                "Media hash {} already known (id {}), associating",
                file_hash, existing.id
            );
            media::associate_media_with_message(self.db.pool(), raw_message_id, existing.id)
                .await?;
            media::increment_forwarded_count(self.db.pool(), existing.id).await?;
            return Ok(existing);
        }

        let key = storage_key(&unique_id, extension);
        let storage_url = self
            .store
            .upload(&tmp_path, &key, &item.content_type)
            .await?;

        let signed_url = self
            .store
            .signed_url(&key, self.config.signed_url_ttl_secs)
            .await?;
        let description = self
            .reasoning
            .describe_media(&signed_url, &item.content_type)
            .await?;

        let stored = media::store_media(
            self.db.pool(),
            &NewMediaFile {
                media_sid: Some(media_sid_from_url(&item.url)),
                content_type: Some(item.content_type.clone()),
                file_size: Some(file_size),
                file_hash,
                storage_key: key,
                storage_url,
                description: Some(description),
            },
        )
        .await?;

        media::associate_media_with_message(self.db.pool(), raw_message_id, stored.id).await?;

        Ok(stored)
    }

    /// Apply memory deltas in the order the store reported them. UPDATE and
    /// DELETE may reference ids created earlier in the same batch.
    async fn apply_memory_deltas(
        &self,
        user_id: i64,
        raw_message_id: Option<i64>,
        batches: &[Vec<MemoryEvent>],
    ) -> Result<(), IngestError> {
        for batch in batches {
            for event in batch {
                match event.event {
                    MemoryEventKind::Add => {
                        memory::store_memory(
                            self.db.pool(),
                            user_id,
                            raw_message_id,
                            &event.id,
                            &event.memory,
                        )
                        .await?;
                    }
                    MemoryEventKind::Update => {
                        match memory::update_memory(self.db.pool(), &event.id, &event.memory).await
                        {
                            Ok(()) => {}
                            // The store can update records we never mirrored
                            Err(DatabaseError::NotFound { .. }) => {
                                warn!("UPDATE for unmirrored memory {}", event.id);
                            }
                            Err(e) => return Err(e.into()),
                        }
                    }
                    MemoryEventKind::Delete => {
                        memory::delete_memory(self.db.pool(), &event.id).await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn signed_urls_for_message(
        &self,
        raw_message_id: i64,
    ) -> Result<Vec<String>, IngestError> {
        let mut urls = Vec::new();
        for file in media::media_for_message(self.db.pool(), raw_message_id).await? {
            match self
                .store
                .signed_url(&file.storage_key, self.config.signed_url_ttl_secs)
                .await
            {
                Ok(url) => urls.push(url),
                Err(e) => warn!("Failed to sign url for {}: {}", file.storage_key, e),
            }
        }
        Ok(urls)
    }

    fn user_info(user: &User) -> UserInfo {
        UserInfo {
            user_id: user.id,
            whatsapp_id: user.whatsapp_id.clone(),
            phone_number: user.phone_number.clone(),
            profile_name: user.profile_name.clone(),
            timezone: user.timezone.clone(),
        }
    }
}

#[async_trait]
impl<M, R, S, F> MessagePipeline for IngestCoordinator<M, R, S, F>
where
    M: MemoryGateway,
    R: ReasoningGateway,
    S: MediaStore,
    F: MediaFetcher,
{
    async fn handle(&self, payload: &WebhookPayload) -> Result<String, IngestError> {
        let message_sid = &payload.message_sid;
        info!("Processing message {}", message_sid);

        // 1. Resolve the user, creating lazily on first contact.
        let phone_number = phone::normalize_e164(&payload.from)?;
        let timezone = phone::infer_timezone(&phone_number);
        let user = user::get_or_create_user(
            self.db.pool(),
            &payload.sender_account_id(),
            &phone_number,
            payload.profile_name.as_deref(),
            timezone,
        )
        .await?;

        // 2. Idempotency gate: a completed message returns its stored reply.
        if let Some(existing) = message::get_message_by_sid(self.db.pool(), message_sid).await? {
            if let Some(done) =
                interaction::get_interaction_by_message_id(self.db.pool(), existing.id).await?
            {
                info!("Duplicate delivery of {}, returning stored reply", message_sid);
                return Ok(done.bot_response);
            }
            debug!(
                "Message {} exists without interaction, reprocessing",
                message_sid
            );
        }

        // 3. Persist the message and stage its media.
        let body = match &payload.body {
            Some(text) if !text.trim().is_empty() => Some(text.clone()),
            _ if payload.num_media() > 0 => Some(MEDIA_ONLY_PLACEHOLDER.to_string()),
            _ => None,
        };

        let raw_message = message::store_message(
            self.db.pool(),
            &NewRawMessage {
                user_id: user.id,
                message_sid: message_sid.clone(),
                sms_message_sid: payload.sms_message_sid.clone(),
                body: body.clone(),
                message_type: payload.message_type.clone(),
                from_number: payload.from.clone(),
                to_number: payload.to.clone(),
                status: "received".to_string(),
                num_media: payload.num_media() as i64,
                account_sid: payload.account_sid.clone(),
                api_version: payload.api_version.clone(),
                raw_data: serde_json::to_string(payload).ok(),
            },
        )
        .await?;

        let media_files = if payload.num_media() > 0 {
            self.process_media_files(raw_message.id, &payload.media)
                .await?
        } else {
            Vec::new()
        };

        // 4. Build the conversational input.
        let text = body.unwrap_or_else(|| MEDIA_ONLY_PLACEHOLDER.to_string());
        let newest_first =
            interaction::recent_interactions(self.db.pool(), user.id, self.config.history_limit)
                .await?;
        let history = format_past_interactions(&newest_first);
        let media_descriptions: Vec<String> =
            media_files.iter().map(description_line).collect();

        // 5. One orchestrated reasoning turn.
        let outcome = self
            .orchestrator
            .converse(ConverseRequest {
                query: text.clone(),
                user_id: user.id.to_string(),
                timezone: user.timezone.clone(),
                history,
                media_descriptions,
            })
            .await;

        // 6. Mirror the memory deltas, in order.
        self.apply_memory_deltas(user.id, Some(raw_message.id), &outcome.memories_stored)
            .await?;

        // 7. Record the interaction with the consulted memory ids.
        let sources: Vec<String> = outcome
            .memories_retrieved
            .iter()
            .map(|hit| hit.id.clone())
            .collect();
        interaction::store_interaction(
            self.db.pool(),
            user.id,
            raw_message.id,
            &text,
            &outcome.reply,
            "conversation",
            &sources,
        )
        .await?;

        info!("Processed message {} ({} chars)", message_sid, outcome.reply.len());
        Ok(outcome.reply)
    }

    async fn format_memory_listing(&self, whatsapp_number: &str) -> Result<String, IngestError> {
        let user = self.resolve_user(whatsapp_number).await?;
        let memories = memory::memories_for_user(self.db.pool(), user.id).await?;

        if memories.is_empty() {
            return Ok("No memories stored yet.".to_string());
        }

        let mut listing = String::new();
        for entry in &memories {
            listing.push_str(&format!("ID: {}\n", entry.id));
            listing.push_str(&format!("Mem0 ID: {}\n", entry.mem0_id));
            listing.push_str(&format!("Memory: {}\n", entry.memory_text));
            listing.push_str(&format!(
                "Raw Message ID: {}\n",
                entry
                    .raw_message_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "direct".to_string())
            ));
            listing.push_str(&format!("Created At: {}\n", entry.created_at));
            listing.push_str(&format!("Updated At: {}\n", entry.updated_at));
            if let Some(ref original) = entry.original_message_body {
                listing.push_str(&format!("Original Message Body: {}\n", original));
            }
            listing.push('\n');
        }

        Ok(listing)
    }

    async fn memories_overview(
        &self,
        whatsapp_number: &str,
    ) -> Result<MemoriesOverview, IngestError> {
        let user = self.resolve_user(whatsapp_number).await?;
        let memories = memory::memories_for_user(self.db.pool(), user.id).await?;

        let mut entries = Vec::with_capacity(memories.len());
        for entry in memories {
            let media_files = match entry.raw_message_id {
                Some(message_id) => self.signed_urls_for_message(message_id).await?,
                None => Vec::new(),
            };
            entries.push(MemoryEntry {
                id: entry.id,
                mem0_id: entry.mem0_id,
                memory_text: entry.memory_text,
                raw_message_id: entry.raw_message_id,
                original_message_body: entry.original_message_body,
                created_at: entry.created_at,
                updated_at: entry.updated_at,
                media_files,
            });
        }

        Ok(MemoriesOverview {
            user_info: Self::user_info(&user),
            memories_count: entries.len(),
            memories: entries,
        })
    }

    async fn search_memories(
        &self,
        whatsapp_number: &str,
        query: &str,
    ) -> Result<SearchResult, IngestError> {
        let user = self.resolve_user(whatsapp_number).await?;

        let outcome = self
            .orchestrator
            .converse(ConverseRequest {
                query: query.to_string(),
                user_id: user.id.to_string(),
                timezone: user.timezone.clone(),
                ..Default::default()
            })
            .await;

        Ok(SearchResult {
            reply: outcome.reply,
            results: outcome.memories_retrieved,
        })
    }

    async fn store_memory_direct(
        &self,
        whatsapp_number: &str,
        memory_text: &str,
        memory_type: &str,
        metadata: serde_json::Value,
    ) -> Result<Vec<String>, IngestError> {
        let user = self.resolve_user(whatsapp_number).await?;

        let events = self
            .memory
            .add(&user.id.to_string(), memory_text, memory_type, metadata)
            .await?;

        self.apply_memory_deltas(user.id, None, std::slice::from_ref(&events))
            .await?;

        Ok(events.into_iter().map(|e| e.id).collect())
    }

    async fn recent_interactions(
        &self,
        whatsapp_number: &str,
        limit: i64,
    ) -> Result<Vec<InteractionView>, IngestError> {
        let user = self.resolve_user(whatsapp_number).await?;
        let interactions =
            interaction::recent_interactions(self.db.pool(), user.id, limit).await?;

        let mut views = Vec::with_capacity(interactions.len());
        for entry in interactions {
            let source_message =
                message::get_message_by_id(self.db.pool(), entry.raw_message_id).await?;
            let media_files = self.signed_urls_for_message(entry.raw_message_id).await?;

            views.push(InteractionView {
                id: entry.id,
                raw_message_id: entry.raw_message_id,
                sources: entry.source_ids(),
                user_message: entry.user_message,
                bot_response: entry.bot_response,
                original_message_body: source_message.as_ref().and_then(|m| m.body.clone()),
                message_type: source_message.map(|m| m.message_type),
                media_files,
            });
        }

        Ok(views)
    }
}
