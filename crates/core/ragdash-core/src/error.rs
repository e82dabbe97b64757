//! Error types for ragdash core

use thiserror::Error;

/// Main error type for dashboard operations
#[derive(Debug, Error)]
pub enum DashError {
    /// Unauthenticated access (no session, expired session, bad credentials)
    #[error("Auth error: {0}")]
    Auth(String),

    /// Missing or malformed client input, detected before any network call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The RAG backend answered with an error status and a JSON body
    #[error("Rejected by upstream ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the backend
        status: u16,
        /// Most specific message found in the body
        message: String,
        /// Body as returned by the backend
        body: serde_json::Value,
    },

    /// Backend unreachable or returned something unusable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// An upload/replace flow was driven from a state that does not allow it
    #[error("Flow error: {0}")]
    Flow(String),
}

/// Convenient Result type using DashError
pub type Result<T> = std::result::Result<T, DashError>;

impl DashError {
    /// Create an auth error
    pub fn auth(msg: impl Into<String>) -> Self {
        DashError::Auth(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        DashError::InvalidInput(msg.into())
    }

    /// Create an upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        DashError::Upstream(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        DashError::Config(msg.into())
    }

    /// Create a template error
    pub fn template(msg: impl Into<String>) -> Self {
        DashError::Template(msg.into())
    }

    /// Create a flow error
    pub fn flow(msg: impl Into<String>) -> Self {
        DashError::Flow(msg.into())
    }

    /// Build a rejection from an upstream status and body.
    ///
    /// The message is taken from the body's `error` field, then `detail`,
    /// then `message`, and finally `fallback`.
    pub fn rejected(status: u16, body: serde_json::Value, fallback: &str) -> Self {
        let message = ["error", "detail", "message"]
            .iter()
            .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
            .unwrap_or(fallback)
            .to_string();
        DashError::Rejected {
            status,
            message,
            body,
        }
    }

    /// Message suitable for showing to the dashboard user
    pub fn user_message(&self) -> String {
        match self {
            DashError::Rejected { message, .. } => message.clone(),
            DashError::Auth(msg)
            | DashError::InvalidInput(msg)
            | DashError::Upstream(msg)
            | DashError::Flow(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
