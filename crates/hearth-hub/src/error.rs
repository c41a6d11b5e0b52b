//! Error types for hub communication.

use thiserror::Error;

/// Errors that can occur when talking to the automation hub.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Service call failed: {0}")]
    ServiceCallFailed(String),

    #[error("Invalid response from hub: {0}")]
    InvalidResponse(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timed out waiting for the hub")]
    Timeout,

    #[error("Hub is not configured: {0}")]
    NotConfigured(String),
}

/// Result type for hub operations.
pub type HubResult<T> = Result<T, HubError>;
