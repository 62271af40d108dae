/*
[INPUT]:  Error sources (config, API, transport, streams, listen keys)
[OUTPUT]: Structured error types with status/code context
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the Pi42 SDK
#[derive(Error, Debug)]
pub enum Pi42Error {
    /// Missing or unusable configuration (credentials, URLs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server rejected the request
    #[error("API error (status {status}, code {}): {message}", .code.as_deref().unwrap_or("none"))]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Network or transport-level failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Stream operation attempted outside the Connected state
    #[error("Stream not connected: {0}")]
    NotConnected(String),

    /// Listen key could not be created, refreshed or revoked
    #[error("Listen key error: {0}")]
    ListenKey(String),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Malformed Socket.IO / Engine.IO frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Bounded wait elapsed
    #[error("Timed out after {millis}ms")]
    Timeout { millis: u64 },
}

impl Pi42Error {
    /// HTTP status of an API rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            Pi42Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if error is caused by missing credentials or settings
    pub fn is_config_error(&self) -> bool {
        matches!(self, Pi42Error::Config(_))
    }

    pub(crate) fn timeout(duration: std::time::Duration) -> Self {
        Pi42Error::Timeout {
            millis: duration.as_millis() as u64,
        }
    }
}

/// Result type alias for Pi42 operations
pub type Result<T> = std::result::Result<T, Pi42Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Pi42Error::Api {
            status: 400,
            message: "bad".to_string(),
            code: Some("E1".to_string()),
        };
        assert_eq!(err.to_string(), "API error (status 400, code E1): bad");
        assert_eq!(err.status(), Some(400));

        let err = Pi42Error::Api {
            status: 500,
            message: "oops".to_string(),
            code: None,
        };
        assert_eq!(err.to_string(), "API error (status 500, code none): oops");
    }

    #[test]
    fn test_error_is_config_error() {
        assert!(Pi42Error::Config("missing secret".into()).is_config_error());
        assert!(!Pi42Error::Transport("refused".into()).is_config_error());
        assert_eq!(Pi42Error::NotConnected("public".into()).status(), None);
    }
}
