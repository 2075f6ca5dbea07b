use thiserror::Error;

/// Errors produced by the sync layer.
///
/// Everything here is recoverable: pending check-ins are never mutated on
/// failure, so the user can simply retry once connectivity is back.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Transport-level failure (no connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Server returned status {0}")]
    Status(u16),

    /// The server answered 2xx but the body is not the expected shape.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// Another operation of the same class is already in flight.
    #[error("Operation already in progress")]
    AlreadyRunning,

    /// Local store failure while reading or applying sync data.
    #[error("Store error: {0}")]
    Store(#[from] rancho_store::StoreError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;
