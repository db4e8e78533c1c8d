//! Error types for queue channel operations.

use thiserror::Error;

/// Error type for all queue channel operations.
///
/// Provider adapters translate their broker client's failures into
/// [`QueueError::Provider`]; everything else is raised by this crate.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue not found: {queue}")]
    QueueNotFound { queue: String },

    #[error("Unsupported message kind: {kind}")]
    UnsupportedMessageKind { kind: String },

    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Payload streaming failed: {0}")]
    Payload(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl QueueError {
    /// Check if error is transient and worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::QueueNotFound { .. } => false,
            Self::UnsupportedMessageKind { .. } => false,
            Self::Provider { .. } => true, // Provider-specific errors are usually transient
            Self::Payload(_) => false,
            Self::Validation(_) => false,
        }
    }
}

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
