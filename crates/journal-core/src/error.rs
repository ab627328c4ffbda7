//! Error types for journal operations.
//!
//! This module defines [`JournalError`] which covers every failure that can occur
//! when fetching a record from the source or reading and writing the store.
//!
//! A record that already exists is not an error: the write path reports it as
//! [`InsertOutcome::Duplicate`](crate::store::InsertOutcome::Duplicate), and a
//! missing record on the read path is `Ok(None)`.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during journal operations.
#[derive(Error, Debug)]
pub enum JournalError {
    /// Network-related errors (connection failures, timeouts, non-success status).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by the record source.
    #[error("Rate limited by {source_name}: retry after {retry_after:?}")]
    RateLimited {
        /// The source that rate limited the request.
        source_name: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Error decoding a payload from the record source.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The record source rejected the configured credentials.
    #[error("Authentication failed for source {0}")]
    AuthenticationFailed(String),

    /// Error interacting with the store (connection, schema, serialization).
    #[error("Storage error: {0}")]
    Storage(String),
}

impl JournalError {
    /// Short, stable category name for structured log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::RateLimited { .. } => "rate_limited",
            Self::Parse(_) => "parse",
            Self::AuthenticationFailed(_) => "authentication",
            Self::Storage(_) => "storage",
        }
    }
}

/// Result type alias using [`JournalError`].
pub type Result<T> = std::result::Result<T, JournalError>;
