//! Error types specific to card transport

use thiserror::Error;

/// Transport error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to device")]
    Connection,

    /// No card present in the named reader
    #[error("No card present in reader: {0}")]
    NoCard(String),

    /// Reader not found
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// Transport has been disconnected
    #[error("Transport is not connected")]
    NotConnected,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// Card was reset or removed during the exchange
    #[error("Card was reset or removed")]
    CardLost,

    /// Buffer too small
    #[error("Buffer too small")]
    BufferTooSmall,

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}
