//! Error types for the Forge dashboard
//!
//! Provides a unified error type for API calls, configuration and the
//! client-side checks done by the view models.

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, ForgeError>;

/// Main error type for dashboard operations
#[derive(Debug, Error)]
pub enum ForgeError {
    /// No response from the backend (connect, timeout, decode)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The local cache has no record for the key
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected on the client before any request was made
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// YAML parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl ForgeError {
    /// Backend reported 404 for the requested resource
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }

    /// Failure happened before a response was received
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<String> for ForgeError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}

impl From<&str> for ForgeError {
    fn from(msg: &str) -> Self {
        Self::Other(msg.to_string())
    }
}
