//! Error types used throughout the SDK

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the Airalo SDK
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AiraloError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// The HTTP capability could not be initialised.
    #[error("HTTP transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Batch of {size} items exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("Duplicate request tag: {0}")]
    DuplicateTag(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Multiplex-level fault that ends a run early.
    #[error("Transport fault: {0}")]
    Transport(String),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AiraloError {
    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::TransportUnavailable(_) => "transport_unavailable",
            Self::UnsupportedMethod(_) => "unsupported_method",
            Self::InvalidRequest(_) => "invalid_request",
            Self::BatchTooLarge { .. } => "batch_too_large",
            Self::DuplicateTag(_) => "duplicate_tag",
            Self::Validation(_) => "validation",
            Self::Auth(_) => "auth",
            Self::Network(_) => "network",
            Self::Transport(_) => "transport",
            Self::Api { .. } => "api",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }

    /// Errors raised before any network I/O was attempted.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::UnsupportedMethod(_)
                | Self::InvalidRequest(_)
                | Self::BatchTooLarge { .. }
                | Self::DuplicateTag(_)
                | Self::Validation(_)
        )
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, AiraloError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_too_large_reports_size_and_limit() {
        let err = AiraloError::BatchTooLarge { size: 51, max: 50 };
        assert_eq!(err.to_string(), "Batch of 51 items exceeds the maximum of 50");
        assert_eq!(err.label(), "batch_too_large");
        assert!(err.is_preflight());
    }

    #[test]
    fn network_errors_are_not_preflight() {
        assert!(!AiraloError::Network("reset".into()).is_preflight());
        assert!(!AiraloError::Transport("aborted".into()).is_preflight());
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(AiraloError::Auth("denied".into())).unwrap();
        assert_eq!(json["type"], "Auth");
        assert_eq!(json["message"], "denied");
    }
}
