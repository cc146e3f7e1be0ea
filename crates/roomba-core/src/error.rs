//! Common error types for vacuum accessory backends

use thiserror::Error;

/// Result type for accessory operations
pub type AccessoryResult<T> = Result<T, AccessoryError>;

/// Errors surfaced by accessory backends
#[derive(Debug, Error, Clone)]
pub enum AccessoryError {
    /// Connection refused, dropped, or closed mid-request
    #[error("Transport error: {0}")]
    Transport(String),

    /// The robot did not respond within the configured bound
    #[error("Robot did not respond in time")]
    Timeout,

    /// Malformed or unexpected robot response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A concurrent operation holds the resource
    #[error("Resource busy: {0}")]
    Busy(String),
}
