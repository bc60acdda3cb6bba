//! Error types for the sample store.

use thiserror::Error;

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Subscription already closed")]
    SubscriptionClosed,

    #[error("Subscription disconnected from store")]
    Disconnected,

    #[error("Timed out waiting for event")]
    Timeout,
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
