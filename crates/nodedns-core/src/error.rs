//! Error types for the nodedns system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for nodedns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the nodedns system
///
/// Registry mutations never surface these to their callers; reconciler and
/// provider errors always do.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Listing the provider's existing records failed
    #[error("fetching page {page} of records for {record_name}: {message}")]
    ProviderFetch {
        /// Record name being reconciled
        record_name: String,
        /// Zero-based page that failed
        page: u32,
        /// Underlying provider error
        message: String,
    },

    /// The provider kept returning pages past the iteration ceiling
    #[error("more than {limit} pages of records for {record_name}")]
    TooManyPages {
        /// Record name being reconciled
        record_name: String,
        /// The page ceiling that was exceeded
        limit: u32,
    },

    /// Creating an address record failed
    #[error("creating {kind} record {address}: {message}")]
    RecordCreate {
        /// Record type ("A" or "AAAA")
        kind: &'static str,
        /// Address the record would have held
        address: String,
        /// Underlying provider error
        message: String,
    },

    /// Deleting an address record failed
    #[error("deleting record id {id}: {message}")]
    RecordDelete {
        /// Provider-assigned record id
        id: u64,
        /// Underlying provider error
        message: String,
    },

    /// The operation's deadline expired before completion. Distinguished
    /// from provider errors so callers can tell shutdown from failure.
    #[error("operation cancelled: deadline exceeded")]
    Cancelled,

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this error is a deadline/cancellation error rather than a
    /// genuine provider failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
