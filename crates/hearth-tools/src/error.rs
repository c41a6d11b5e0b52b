//! Error types for tool execution.

/// Tool error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ToolError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// Invalid arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Execution error
    #[error("{0}")]
    Execution(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A required configuration value is absent
    #[error("{0}")]
    NotConfigured(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Serialization(err.to_string())
    }
}

impl From<hearth_hub::HubError> for ToolError {
    fn from(err: hearth_hub::HubError) -> Self {
        match err {
            hearth_hub::HubError::Timeout => ToolError::Timeout,
            hearth_hub::HubError::NotConfigured(s) => ToolError::NotConfigured(s),
            other => ToolError::Execution(other.to_string()),
        }
    }
}
