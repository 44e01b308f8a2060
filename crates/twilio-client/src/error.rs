//! Webhook payload validation errors.

use thiserror::Error;

/// Errors raised while validating an inbound webhook payload.
///
/// These reject the request before anything is enqueued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    /// A required identifier is missing.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but unparseable.
    #[error("invalid field {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}
