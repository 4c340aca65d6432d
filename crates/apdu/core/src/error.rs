//! Core error type for all APDU operations
//!
//! The transport, command and response layers each have their own error
//! type; this module gathers them into a single [`Error`] so that callers can
//! bubble any of them up with `?`.

use crate::command::CommandError;
use crate::response::error::{ResponseError, StatusError};
use crate::transport::TransportError;

/// Result type for APDU operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-related errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Command-related errors
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Response-related errors
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Status errors (for status words)
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Context error with message and source error
    #[error("{context}: {source}")]
    Context {
        /// Contextual message
        context: String,
        /// Source error
        source: Box<Self>,
    },

    /// Generic dynamic error with string message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Create a new error with context information
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create a new error with a dynamic message
    pub fn message<S: Into<String>>(message: S) -> Self {
        Self::Message(message.into())
    }

    /// The transport error at the root of this error, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Context { source, .. } => source.transport_error(),
            _ => None,
        }
    }
}

/// Extension trait for Result with APDU Errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, context: S) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context<S: Into<String>>(self, context: S) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_root_cause() {
        let result: std::result::Result<(), TransportError> = Err(TransportError::Transmission);
        let err = result.context("Sending SELECT").unwrap_err();

        assert_eq!(err.to_string(), "Sending SELECT: Failed to transmit data");
        assert!(matches!(
            err.transport_error(),
            Some(TransportError::Transmission)
        ));
    }
}
