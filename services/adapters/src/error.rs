//! Error types for the store adapters

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failure talking to a location store
///
/// All variants are recoverable from the scheduler's point of view: the
/// affected cycle or identifier is skipped and retried on the next tick.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached right now
    #[error("Store unavailable at {location}: {reason}")]
    Unavailable {
        /// Where the store was expected
        location: String,
        /// Reason for the failure
        reason: String,
    },

    /// I/O failure while reading the store
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A query was rejected by the store
    #[error("Store query failed: {0}")]
    Query(String),

    /// MongoDB driver failure: bad URI, unreachable server or rejected query
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Store URI could not be parsed
    #[error("Invalid store URI {uri}: {reason}")]
    InvalidUri {
        /// The URI as configured
        uri: String,
        /// Parser message
        reason: String,
    },

    /// Store URI names a backend this build does not provide
    #[error("Unsupported store scheme: {scheme}")]
    UnsupportedScheme {
        /// The scheme portion of the URI
        scheme: String,
    },
}
