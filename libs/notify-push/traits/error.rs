use thiserror::Error;

/// Main error type for notify-push
#[derive(Error, Debug)]
pub enum PushError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Connection closed unexpectedly
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// The pre-auth token exchange failed
    #[error("Pre-auth exchange failed: {0}")]
    PreAuth(String),

    /// Capability discovery failed
    #[error("Capability discovery failed: {0}")]
    Discovery(String),

    /// Inbound frame could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Handler reported a failure
    #[error("Handler error: {0}")]
    Handler(String),
}

impl From<serde_json::Error> for PushError {
    fn from(e: serde_json::Error) -> Self {
        PushError::Parse(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for PushError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        PushError::WebSocket(e.to_string())
    }
}

/// Result type for notify-push operations
pub type Result<T> = std::result::Result<T, PushError>;
