//! Error types for generation backends.

/// Engine error types.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered, but not with a usable generation
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Timeout
    #[error("Generation timed out")]
    Timeout,
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Generation("model not loaded".to_string());
        assert!(err.to_string().contains("model not loaded"));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{broken").unwrap_err();
        let engine_err: EngineError = json_err.into();
        assert!(matches!(engine_err, EngineError::Serialization(_)));
    }
}
