use esdc_apdu_core::{StatusWord, TransportError};
use rust_decimal::Decimal;

use crate::commands::CommandKind;
use crate::session::SessionState;

/// Result type for ESDC operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ESDC operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// APDU layer errors
    #[error(transparent)]
    Apdu(#[from] esdc_apdu_core::Error),

    /// Reader transport errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A numeric value does not fit its fixed byte width
    #[error("Amount {value} does not fit in {width} bytes")]
    EncodingOverflow {
        /// The amount that was being encoded
        value: Decimal,
        /// Width of the target field in bytes
        width: usize,
    },

    /// Amount fields are unsigned
    #[error("Amount must not be negative: {0}")]
    NegativeAmount(Decimal),

    /// A fixed-width field's source value exceeds its slot
    #[error("{field} is {actual} long, at most {max} allowed")]
    InvalidFieldLength {
        /// Name of the field
        field: &'static str,
        /// Length of the source value
        actual: usize,
        /// Width of the slot
        max: usize,
    },

    /// A character that is not a decimal digit
    #[error("Invalid digit: {0:?}")]
    InvalidDigit(char),

    /// A digit value outside 0-9
    #[error("Digit value out of range: {0}")]
    InvalidDigitValue(u8),

    /// PIN without any digits
    #[error("PIN must contain at least one digit")]
    EmptyPin,

    /// Unknown enumerated code
    #[error("Unknown {field} code: {value}")]
    InvalidCode {
        /// Name of the field
        field: &'static str,
        /// The code that was read
        value: u8,
    },

    /// No reader accepted the application select
    #[error("No reader with a compatible secure element found")]
    NoCompatibleReaderFound,

    /// The device answered a command with a non-normal status word
    #[error("{command} rejected by device: {status} ({})", .status.description())]
    DeviceRejected {
        /// The rejected command
        command: CommandKind,
        /// Status word returned by the device
        status: StatusWord,
    },

    /// A command was issued in the wrong session state
    #[error("Invalid session state: expected {expected}, but session is {actual}")]
    InvalidState {
        /// State required by the operation
        expected: &'static str,
        /// State the session was in
        actual: SessionState,
    },

    /// A command was issued after the session failed
    #[error("Session already failed: {command} was rejected with {status}")]
    SessionFailed {
        /// The command that failed the session
        command: CommandKind,
        /// Status word that failed the session
        status: StatusWord,
    },

    /// An encoded invoice record has the wrong length
    #[error("Invoice record is {actual} bytes, expected {expected}")]
    InvalidRecordLength {
        /// Length of the input
        actual: usize,
        /// Length implied by the record header
        expected: usize,
    },
}

impl Error {
    /// The status word that caused this error, if the device rejected a command
    pub const fn status(&self) -> Option<StatusWord> {
        match self {
            Self::DeviceRejected { status, .. } | Self::SessionFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Whether this error was raised while encoding, before anything was sent
    pub const fn is_encoding_error(&self) -> bool {
        matches!(
            self,
            Self::EncodingOverflow { .. }
                | Self::NegativeAmount(_)
                | Self::InvalidFieldLength { .. }
                | Self::InvalidDigit(_)
                | Self::InvalidDigitValue(_)
                | Self::EmptyPin
        )
    }
}
