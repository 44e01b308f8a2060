//! End-to-end pipeline tests over an in-memory database and stub gateways.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assistant_core::{
    async_trait, ChatTurn, CreatedRange, GatewayError, MediaFetcher, MediaStore, MemoryEvent,
    MemoryEventKind, MemoryGateway, MemoryHit, ReasoningGateway, ReasoningReply, ToolInvocation,
    ToolMode,
};
use database::{interaction, media, memory, message, Database};
use ingest::{IngestConfig, IngestCoordinator, IngestError, MessagePipeline, MEDIA_ONLY_PLACEHOLDER};
use twilio_client::WebhookPayload;

/// Reasoning stub: pops scripted replies, then falls back to a plain text
/// reply. Counts conversation rounds.
struct StubReasoning {
    script: Mutex<Vec<ReasoningReply>>,
    generate_calls: AtomicUsize,
    describe_calls: AtomicUsize,
}

impl StubReasoning {
    fn plain() -> Self {
        Self {
            script: Mutex::new(Vec::new()),
            generate_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
        }
    }

    fn scripted(replies: Vec<ReasoningReply>) -> Self {
        Self {
            script: Mutex::new(replies),
            generate_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ReasoningGateway for StubReasoning {
    async fn generate(
        &self,
        _turns: &[ChatTurn],
        _tools: ToolMode,
    ) -> Result<ReasoningReply, GatewayError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Ok(ReasoningReply {
                text: Some("stub reply".to_string()),
                tool_calls: Vec::new(),
            })
        } else {
            Ok(script.remove(0))
        }
    }

    async fn describe_media(&self, _url: &str, _mime: &str) -> Result<String, GatewayError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok("described media".to_string())
    }
}

/// Memory stub with fixed results.
struct StubMemory {
    add_events: Vec<MemoryEvent>,
    search_hits: Vec<MemoryHit>,
}

impl StubMemory {
    fn empty() -> Self {
        Self {
            add_events: Vec::new(),
            search_hits: Vec::new(),
        }
    }
}

#[async_trait]
impl MemoryGateway for StubMemory {
    async fn add(
        &self,
        _user_id: &str,
        _content: &str,
        _memory_type: &str,
        _metadata: serde_json::Value,
    ) -> Result<Vec<MemoryEvent>, GatewayError> {
        Ok(self.add_events.clone())
    }

    async fn search(
        &self,
        _user_id: &str,
        _query: &str,
        _created_between: Option<CreatedRange>,
    ) -> Result<Vec<MemoryHit>, GatewayError> {
        Ok(self.search_hits.clone())
    }

    async fn update(&self, _memory_id: &str, _content: &str) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn delete(&self, _memory_id: &str) -> Result<(), GatewayError> {
        Ok(())
    }
}

/// Storage stub recording uploads.
#[derive(Default)]
struct StubStore {
    uploads: Mutex<Vec<String>>,
}

#[async_trait]
impl MediaStore for StubStore {
    async fn upload(
        &self,
        _local_path: &Path,
        key: &str,
        _content_type: &str,
    ) -> Result<String, GatewayError> {
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(format!("https://store.example/{}", key))
    }

    async fn signed_url(&self, key: &str, _expires_secs: u64) -> Result<String, GatewayError> {
        Ok(format!("https://store.example/signed/{}", key))
    }
}

/// Fetcher stub that writes fixed bytes, or fails when configured to.
struct StubFetcher {
    content: Vec<u8>,
    fail: bool,
}

impl StubFetcher {
    fn with_content(content: &[u8]) -> Self {
        Self {
            content: content.to_vec(),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            content: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl MediaFetcher for StubFetcher {
    async fn download(&self, url: &str, dest: &Path) -> Result<(), GatewayError> {
        if self.fail {
            return Err(GatewayError::Network(format!("download failed: {}", url)));
        }
        tokio::fs::write(dest, &self.content).await?;
        Ok(())
    }
}

type TestCoordinator = IngestCoordinator<StubMemory, StubReasoning, StubStore, StubFetcher>;

async fn coordinator(
    memory: StubMemory,
    reasoning: StubReasoning,
    fetcher: StubFetcher,
) -> (TestCoordinator, Database, Arc<StubReasoning>, Arc<StubStore>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();

    let reasoning = Arc::new(reasoning);
    let store = Arc::new(StubStore::default());
    let coordinator = IngestCoordinator::new(
        db.clone(),
        Arc::new(memory),
        reasoning.clone(),
        store.clone(),
        Arc::new(fetcher),
        IngestConfig::default(),
    );
    (coordinator, db, reasoning, store)
}

fn payload(sid: &str, body: Option<&str>, media_urls: &[&str]) -> WebhookPayload {
    let mut form = HashMap::new();
    form.insert("MessageSid".to_string(), sid.to_string());
    form.insert("From".to_string(), "whatsapp:+14155552345".to_string());
    form.insert("To".to_string(), "whatsapp:+14155238886".to_string());
    form.insert("ProfileName".to_string(), "Alice".to_string());
    if let Some(body) = body {
        form.insert("Body".to_string(), body.to_string());
    }
    form.insert("NumMedia".to_string(), media_urls.len().to_string());
    for (i, url) in media_urls.iter().enumerate() {
        form.insert(format!("MediaUrl{}", i), url.to_string());
        form.insert(format!("MediaContentType{}", i), "image/jpeg".to_string());
    }
    WebhookPayload::from_form(&form).unwrap()
}

fn tool_call(name: &str, args: serde_json::Value) -> ToolInvocation {
    let serde_json::Value::Object(map) = args else {
        unreachable!()
    };
    ToolInvocation::new(name, map)
}

#[tokio::test]
async fn test_duplicate_delivery_returns_stored_reply() {
    let (coordinator, db, reasoning, _) = coordinator(
        StubMemory::empty(),
        StubReasoning::plain(),
        StubFetcher::with_content(b""),
    )
    .await;

    let first = coordinator.handle(&payload("SM1", Some("hello"), &[])).await.unwrap();
    assert_eq!(first, "stub reply");
    assert_eq!(reasoning.generate_calls.load(Ordering::SeqCst), 1);

    // Redelivery: same reply, no second reasoning call, no new rows
    let second = coordinator.handle(&payload("SM1", Some("hello"), &[])).await.unwrap();
    assert_eq!(second, "stub reply");
    assert_eq!(reasoning.generate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(message::count_messages(db.pool()).await.unwrap(), 1);
    assert_eq!(interaction::count_interactions(db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_identical_media_content_uploaded_once() {
    let (coordinator, db, reasoning, store) = coordinator(
        StubMemory::empty(),
        StubReasoning::plain(),
        StubFetcher::with_content(b"same image bytes"),
    )
    .await;

    // Two distinct messages, distinct provider URLs, identical bytes
    coordinator
        .handle(&payload("SM1", Some("look"), &["https://api.twilio.com/Media/ME1"]))
        .await
        .unwrap();
    coordinator
        .handle(&payload("SM2", Some("again"), &["https://api.twilio.com/Media/ME2"]))
        .await
        .unwrap();

    assert_eq!(media::count_media(db.pool()).await.unwrap(), 1);
    assert_eq!(store.uploads.lock().unwrap().len(), 1);
    assert_eq!(reasoning.describe_calls.load(Ordering::SeqCst), 1);

    let hash = object_store::hash::sha256_bytes(b"same image bytes");
    let asset = media::get_media_by_hash(db.pool(), &hash)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(asset.forwarded_count, 2);
}

#[tokio::test]
async fn test_memory_deltas_apply_in_order() {
    let reasoning = StubReasoning::scripted(vec![
        ReasoningReply {
            text: None,
            tool_calls: vec![tool_call(
                "store_memory",
                serde_json::json!({"memory_content": "facts", "memory_type": "general_info"}),
            )],
        },
        ReasoningReply {
            text: Some("saved".to_string()),
            tool_calls: Vec::new(),
        },
    ]);
    let memory = StubMemory {
        add_events: vec![
            MemoryEvent {
                id: "m1".to_string(),
                memory: "first version".to_string(),
                event: MemoryEventKind::Add,
            },
            MemoryEvent {
                id: "m2".to_string(),
                memory: "second fact".to_string(),
                event: MemoryEventKind::Add,
            },
            MemoryEvent {
                id: "m1".to_string(),
                memory: "updated version".to_string(),
                event: MemoryEventKind::Update,
            },
        ],
        search_hits: Vec::new(),
    };

    let (coordinator, db, _, _) =
        coordinator(memory, reasoning, StubFetcher::with_content(b"")).await;

    let reply = coordinator
        .handle(&payload("SM1", Some("remember this"), &[]))
        .await
        .unwrap();
    assert_eq!(reply, "saved");

    // The UPDATE referenced an id created earlier in the same batch: one
    // record, rewritten text, never a second row.
    assert_eq!(memory::count_memories(db.pool()).await.unwrap(), 2);
    let m1 = memory::get_memory_by_mem0_id(db.pool(), "m1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(m1.memory_text, "updated version");
}

#[tokio::test]
async fn test_retrieved_ids_recorded_as_sources() {
    let reasoning = StubReasoning::scripted(vec![
        ReasoningReply {
            text: None,
            tool_calls: vec![tool_call(
                "get_memory",
                serde_json::json!({"search_query": "tea"}),
            )],
        },
        ReasoningReply {
            text: Some("you like tea".to_string()),
            tool_calls: Vec::new(),
        },
    ]);
    let memory = StubMemory {
        add_events: Vec::new(),
        search_hits: vec![MemoryHit {
            id: "m9".to_string(),
            memory: "likes tea".to_string(),
            created_at: None,
            score: None,
        }],
    };

    let (coordinator, db, _, _) =
        coordinator(memory, reasoning, StubFetcher::with_content(b"")).await;

    coordinator
        .handle(&payload("SM1", Some("do I like tea?"), &[]))
        .await
        .unwrap();

    let interactions = interaction::recent_interactions(db.pool(), 1, 10)
        .await
        .unwrap();
    assert_eq!(interactions.len(), 1);
    assert_eq!(interactions[0].source_ids(), vec!["m9".to_string()]);
    assert_eq!(interactions[0].bot_response, "you like tea");
}

#[tokio::test]
async fn test_media_only_message_uses_placeholder() {
    let (coordinator, db, _, _) = coordinator(
        StubMemory::empty(),
        StubReasoning::plain(),
        StubFetcher::with_content(b"image"),
    )
    .await;

    coordinator
        .handle(&payload("SM1", None, &["https://api.twilio.com/Media/ME1"]))
        .await
        .unwrap();

    let stored = message::get_message_by_sid(db.pool(), "SM1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.body.as_deref(), Some(MEDIA_ONLY_PLACEHOLDER));

    let interactions = interaction::recent_interactions(db.pool(), 1, 10)
        .await
        .unwrap();
    assert_eq!(interactions[0].user_message, MEDIA_ONLY_PLACEHOLDER);
}

#[tokio::test]
async fn test_download_failure_fails_turn_and_retry_succeeds() {
    let (coordinator, db, _, _) = coordinator(
        StubMemory::empty(),
        StubReasoning::plain(),
        StubFetcher::failing(),
    )
    .await;

    let result = coordinator
        .handle(&payload("SM1", Some("look"), &["https://api.twilio.com/Media/ME1"]))
        .await;
    assert!(matches!(result, Err(IngestError::Gateway(_))));

    // Message row exists but no interaction: the turn did not complete
    assert_eq!(message::count_messages(db.pool()).await.unwrap(), 1);
    assert_eq!(interaction::count_interactions(db.pool()).await.unwrap(), 0);

    // A redelivery with a healthy fetcher completes the turn
    let retry = IngestCoordinator::new(
        db.clone(),
        Arc::new(StubMemory::empty()),
        Arc::new(StubReasoning::plain()),
        Arc::new(StubStore::default()),
        Arc::new(StubFetcher::with_content(b"image")),
        IngestConfig::default(),
    );
    let reply = retry
        .handle(&payload("SM1", Some("look"), &["https://api.twilio.com/Media/ME1"]))
        .await
        .unwrap();
    assert_eq!(reply, "stub reply");
    assert_eq!(message::count_messages(db.pool()).await.unwrap(), 1);
    assert_eq!(interaction::count_interactions(db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_store_memory_direct_without_source_message() {
    let memory = StubMemory {
        add_events: vec![MemoryEvent {
            id: "m1".to_string(),
            memory: "prefers window seats".to_string(),
            event: MemoryEventKind::Add,
        }],
        search_hits: Vec::new(),
    };
    let (coordinator, db, _, _) =
        coordinator(memory, StubReasoning::plain(), StubFetcher::with_content(b"")).await;

    // Unknown numbers are rejected
    let missing = coordinator
        .store_memory_direct("whatsapp:+14155552345", "x", "user_info", serde_json::Value::Null)
        .await;
    assert!(matches!(missing, Err(IngestError::UserNotFound(_))));

    // First contact creates the user, then direct storage works
    coordinator
        .handle(&payload("SM1", Some("hi"), &[]))
        .await
        .unwrap();
    let ids = coordinator
        .store_memory_direct(
            "whatsapp:+14155552345",
            "prefers window seats",
            "user_info",
            serde_json::Value::Null,
        )
        .await
        .unwrap();
    assert_eq!(ids, vec!["m1".to_string()]);

    let stored = memory::get_memory_by_mem0_id(db.pool(), "m1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.raw_message_id, None);
}

#[tokio::test]
async fn test_memory_listing_and_overview() {
    let memory = StubMemory {
        add_events: vec![MemoryEvent {
            id: "m1".to_string(),
            memory: "likes tea".to_string(),
            event: MemoryEventKind::Add,
        }],
        search_hits: Vec::new(),
    };
    let reasoning = StubReasoning::scripted(vec![
        ReasoningReply {
            text: None,
            tool_calls: vec![tool_call(
                "store_memory",
                serde_json::json!({"memory_content": "likes tea", "memory_type": "preference"}),
            )],
        },
        ReasoningReply {
            text: Some("noted".to_string()),
            tool_calls: Vec::new(),
        },
    ]);
    let (coordinator, _, _, _) =
        coordinator(memory, reasoning, StubFetcher::with_content(b"")).await;

    coordinator
        .handle(&payload("SM1", Some("I like tea"), &[]))
        .await
        .unwrap();

    let listing = coordinator
        .format_memory_listing("whatsapp:+14155552345")
        .await
        .unwrap();
    assert!(listing.contains("Mem0 ID: m1"));
    assert!(listing.contains("Memory: likes tea"));
    assert!(listing.contains("Original Message Body: I like tea"));

    let overview = coordinator
        .memories_overview("whatsapp:+14155552345")
        .await
        .unwrap();
    assert_eq!(overview.memories_count, 1);
    assert_eq!(overview.user_info.phone_number, "+14155552345");
    assert_eq!(overview.memories[0].mem0_id, "m1");
}

#[tokio::test]
async fn test_recent_interactions_view() {
    let (coordinator, _, _, _) = coordinator(
        StubMemory::empty(),
        StubReasoning::plain(),
        StubFetcher::with_content(b"img"),
    )
    .await;

    coordinator
        .handle(&payload("SM1", Some("first"), &[]))
        .await
        .unwrap();
    coordinator
        .handle(&payload("SM2", None, &["https://api.twilio.com/Media/ME1"]))
        .await
        .unwrap();

    let views = coordinator
        .recent_interactions("whatsapp:+14155552345", 10)
        .await
        .unwrap();
    assert_eq!(views.len(), 2);
    // Newest first: the media-only message
    assert_eq!(views[0].user_message, MEDIA_ONLY_PLACEHOLDER);
    assert_eq!(views[0].media_files.len(), 1);
    assert!(views[0].media_files[0].starts_with("https://store.example/signed/"));
    assert_eq!(views[1].user_message, "first");
    assert!(views[1].media_files.is_empty());
}
