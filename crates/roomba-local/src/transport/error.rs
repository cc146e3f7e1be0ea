//! Transport layer errors

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Request failed: {0}")]
    RequestFailed(String),
}

impl From<TransportError> for roomba_core::AccessoryError {
    fn from(err: TransportError) -> Self {
        roomba_core::AccessoryError::Transport(err.to_string())
    }
}
