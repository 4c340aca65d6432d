//! Error types for PC/SC transport

use esdc_apdu_core::TransportError;

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    #[error("No readers available")]
    NoReadersAvailable,

    /// Reader not found
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// No card present in reader
    #[error("No card present in reader: {0}")]
    NoCard(String),

    /// Card was reset
    #[error("Card was reset")]
    CardReset,

    /// Card was removed
    #[error("Card was removed")]
    CardRemoved,

    /// Transport already disconnected
    #[error("Not connected to a card")]
    NotConnected,
}

impl From<PcscError> for TransportError {
    fn from(error: PcscError) -> Self {
        match error {
            PcscError::Pcsc(pcsc::Error::Timeout) => Self::Timeout,
            PcscError::Pcsc(pcsc::Error::InsufficientBuffer) => Self::BufferTooSmall,
            PcscError::Pcsc(pcsc::Error::ResetCard | pcsc::Error::RemovedCard)
            | PcscError::CardReset
            | PcscError::CardRemoved => Self::CardLost,
            PcscError::Pcsc(pcsc::Error::NoSmartcard) => Self::NoCard(String::new()),
            PcscError::Pcsc(e) => Self::other(format!("PC/SC error: {e}")),
            PcscError::NoReadersAvailable => Self::other("No readers available"),
            PcscError::ReaderNotFound(reader) => Self::ReaderNotFound(reader),
            PcscError::NoCard(reader) => Self::NoCard(reader),
            PcscError::NotConnected => Self::NotConnected,
        }
    }
}
