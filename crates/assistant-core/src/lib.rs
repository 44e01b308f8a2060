//! Core traits and types for the Whatsy assistant pipeline.
//!
//! This crate provides the shared interface between the ingest pipeline and
//! the external services it talks to. It defines:
//!
//! - [`MemoryGateway`] - Contract to the external memory store
//! - [`ReasoningGateway`] - Contract to the LLM inference endpoint
//! - [`MediaFetcher`] / [`MediaStore`] - Media download and durable storage
//! - [`ChatTurn`] / [`ReasoningReply`] / [`ToolInvocation`] - Conversation types
//! - [`MemoryEvent`] / [`MemoryHit`] - Memory store results
//! - [`GatewayError`] - Error type shared by all gateway implementations
//!
//! Concrete clients (Mem0, Gemini, Twilio, object storage) live in their own
//! crates and implement these traits, so the pipeline never depends on a
//! specific provider SDK.

mod error;
mod gateway;
mod memory;
mod message;
pub mod phone;
mod tools;

pub use error::GatewayError;
pub use gateway::{
    MediaFetcher, MediaStore, MemoryGateway, ReasoningGateway, ReasoningReply, ToolMode,
};
pub use memory::{CreatedRange, MemoryEvent, MemoryEventKind, MemoryHit};
pub use message::{ChatTurn, Role};
pub use tools::ToolInvocation;

// Re-export async_trait for implementors
pub use async_trait::async_trait;
