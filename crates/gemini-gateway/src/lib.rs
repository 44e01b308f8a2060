//! Gemini reasoning client.
//!
//! Implements [`assistant_core::ReasoningGateway`] against the Gemini
//! `generateContent` REST API: role-tagged conversation turns with the
//! memory function declarations attached, function-call extraction from
//! response parts, and media description via `fileData` parts.

mod api_types;
mod client;
mod config;
mod tools;

pub use api_types::{
    Candidate, Content, FunctionCall, GenerateContentRequest, GenerateContentResponse, Part,
};
pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use tools::memory_tool_manifest;
