//! Error types for the CareLens service.
//!
//! Errors are organized by layer: configuration, pipeline stages (decode,
//! inference, LLM calls), analytics storage, and the service boundary that the
//! HTTP layer maps onto status codes.

use thiserror::Error;

/// Top-level error type for CareLens operations.
#[derive(Error, Debug)]
pub enum CareLensError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Service-boundary errors
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Analytics storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors raised inside processing stages (decode, inference, LLM calls).
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("{message}")]
    Decode { message: String },

    /// The bytes are not in a recognizable image format
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// Model loading or inference failed
    #[error("Inference failed in {model}: {message}")]
    Inference { model: String, message: String },

    /// LLM call failed
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        status_code: Option<u16>,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },
}

/// Errors surfaced at the service boundary.
///
/// Each variant maps to one class of HTTP status: `Unavailable` to 503,
/// `InvalidInput` to 400 and `Internal` to 500.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The backing model or chain failed to initialize
    #[error("{0}")]
    Unavailable(String),

    /// The request carried data the service cannot use
    #[error("{0}")]
    InvalidInput(String),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

/// Analytics storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The database directory could not be created
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored timestamp could not be parsed
    #[error("Invalid timestamp '{value}': {message}")]
    Time { value: String, message: String },

    /// The connection mutex was poisoned by a panicking writer
    #[error("Database connection lock poisoned")]
    Poisoned,
}

/// Convenience type alias for CareLens results.
pub type Result<T> = std::result::Result<T, CareLensError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Convenience type alias for service-boundary results.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_displays_bare_message() {
        let err = ServiceError::InvalidInput("Image too small".to_string());
        assert_eq!(err.to_string(), "Image too small");
    }

    #[test]
    fn test_llm_error_message() {
        let err = PipelineError::Llm {
            message: "HTTP 429".to_string(),
            status_code: Some(429),
        };
        assert_eq!(err.to_string(), "LLM error: HTTP 429");
    }

    #[test]
    fn test_config_error_wraps_into_top_level() {
        let err: CareLensError = ConfigError::ValidationError("bad".into()).into();
        assert!(err.to_string().contains("Invalid configuration: bad"));
    }
}
