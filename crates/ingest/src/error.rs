//! Ingest pipeline errors.

use assistant_core::phone::PhoneError;
use assistant_core::GatewayError;
use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while processing an inbound message.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Persistence failure.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// External service failure (media download, storage, description).
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// The sender address could not be normalized.
    #[error("invalid sender: {0}")]
    InvalidSender(#[from] PhoneError),

    /// No user exists for the given number.
    #[error("user not found: {0}")]
    UserNotFound(String),
}
