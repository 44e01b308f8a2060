//! Inbound message processing pipeline for Whatsy.
//!
//! [`IngestCoordinator::handle`] takes one webhook payload end-to-end:
//! resolve the user (atomic first-contact creation), pass the idempotency
//! gate (redelivered messages return their stored reply), stage and dedup
//! media by content hash, run one orchestrated reasoning turn, mirror the
//! memory deltas in order, and append the interaction record.
//!
//! The HTTP layer and the queue worker drive the pipeline through the
//! object-safe [`MessagePipeline`] trait.

mod coordinator;
mod error;
pub mod history;
pub mod media;
mod views;

pub use coordinator::{
    IngestConfig, IngestCoordinator, MessagePipeline, MEDIA_ONLY_PLACEHOLDER,
};
pub use error::IngestError;
pub use views::{InteractionView, MemoriesOverview, MemoryEntry, SearchResult, UserInfo};
