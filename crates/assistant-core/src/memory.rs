//! Result types returned by the external memory store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the memory store did with a submitted fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemoryEventKind {
    /// A new memory was created.
    Add,
    /// An existing memory was rewritten.
    Update,
    /// An existing memory was removed.
    Delete,
}

/// One mutation the memory store performed in response to an add call.
///
/// The store consolidates: a single `store_memory` request can produce any
/// mix of ADD/UPDATE/DELETE events against existing records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    /// External memory id the event applies to.
    pub id: String,
    /// Memory text after the event (empty for deletions).
    #[serde(default)]
    pub memory: String,
    /// Event kind.
    pub event: MemoryEventKind,
}

/// A memory returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryHit {
    /// External memory id.
    pub id: String,
    /// Memory text.
    pub memory: String,
    /// Creation timestamp, when the store reports one.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Relevance score, when the store reports one.
    #[serde(default)]
    pub score: Option<f64>,
}

/// A half-open UTC interval on a memory's creation timestamp.
///
/// `start` is inclusive, `end` exclusive. Built by the orchestrator from
/// calendar dates interpreted in the user's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}
