//! Error type shared by gateway implementations.

use thiserror::Error;

/// Errors that can occur when talking to an external service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration problem (missing key, bad URL, etc.)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network-level failure (connect, send, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The remote service answered with an error status.
    #[error("service error ({status}): {message}")]
    Service { status: u16, message: String },

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Local I/O failure while staging media.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = GatewayError::Service {
            status: 429,
            message: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "service error (429): rate limited");
    }
}
