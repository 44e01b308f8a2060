//! Mem0 memory-store client.
//!
//! Implements [`assistant_core::MemoryGateway`] against the Mem0 HTTP API:
//! add with consolidation events, search with user scoping and an optional
//! creation-time range filter, update and delete by external id.

mod api_types;
mod client;
mod config;

pub use api_types::{AddMemoryRequest, AddMemoryResponse, Mem0Message, SearchRequest};
pub use client::Mem0Client;
pub use config::Mem0Config;
