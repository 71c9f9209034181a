//! Error types for queue operations.

use thiserror::Error;

/// Comprehensive error type for all template operations
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Message conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    #[error("Remote queue operation failed: {0}")]
    Remote(#[from] RemoteQueueError),
}

impl QueueError {
    /// Check if error is transient and could succeed on a later attempt.
    ///
    /// This crate performs no retries itself; the classification is advisory
    /// for callers that implement their own retry policy.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidArgument(_) => false,
            Self::Configuration(_) => false,
            Self::Conversion(_) => false,
            Self::Remote(remote) => remote.is_transient(),
        }
    }
}

/// Validation errors for caller-supplied arguments
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },
}

/// Configuration errors, rejected synchronously at the setter or during binding
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Visibility timeout must be strictly positive, got {seconds}")]
    NonPositiveVisibilityTimeout { seconds: i64 },

    #[error("Unsupported checkpoint mode '{mode}', expected RECORD or MANUAL")]
    UnsupportedCheckpointMode { mode: String },

    #[error("Unsupported payload format '{format}', expected RAW, TEXT or JSON")]
    UnsupportedPayloadFormat { format: String },

    #[error("Property binding failed: {message}")]
    Binding { message: String },
}

/// Errors during payload translation, raised before any remote call
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Message body is not valid UTF-8")]
    InvalidUtf8,

    #[error("JSON conversion failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Transport or service failure reported by the remote queue store
///
/// Native transport errors are remapped into this type at the provider
/// boundary; callers never see a provider's own error type.
#[derive(Debug, Error)]
pub enum RemoteQueueError {
    #[error("Queue not found: {queue_name}")]
    QueueNotFound { queue_name: String },

    #[error("Message '{message_id}' in queue '{queue_name}' not found or pop receipt no longer valid")]
    ReceiptInvalid {
        queue_name: String,
        message_id: String,
    },

    #[error("Connection to queue service failed: {message}")]
    Connection { message: String },

    #[error("Queue service error ({code}): {message}")]
    Service { code: String, message: String },
}

impl RemoteQueueError {
    /// Check if error is transient and could succeed on a later attempt
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueueNotFound { .. } => false,
            Self::ReceiptInvalid { .. } => false,
            Self::Connection { .. } => true,
            Self::Service { .. } => true,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
