//! Core traits and types for APDU (Application Protocol Data Unit) operations
//!
//! This crate provides the foundational types and traits for working with smart card
//! APDU commands and responses according to ISO/IEC 7816-4.
//!
//! ## Overview
//!
//! APDU (Application Protocol Data Unit) is the communication format used by smart cards.
//! This crate provides abstractions for:
//!
//! - Creating commands in short and extended length form and parsing responses
//! - Enumerating readers and connecting to cards through a [`CardConnector`]
//! - Exchanging raw frames through a [`CardTransport`]
//! - Executing typed commands one at a time through an [`Executor`]
//! - Error handling and status word interpretation
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

// Main modules
pub mod card;
pub mod command;
pub mod executor;
pub mod response;
pub mod transport;

// Core error types
mod error;
pub use error::{Error, Result, ResultExt};

// Re-exports for common types
pub use card::CardExecutor;
pub use command::{ApduCommand, Command, CommandError, ExpectedLength, IsoCase};
pub use executor::Executor;
pub use response::error::{ResponseError, StatusError};
pub use response::status::StatusWord;
pub use response::{ApduResponse, Response};
pub use transport::{CardConnector, CardTransport, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, Command, Error, Response, ResultExt,
        card::CardExecutor,
        command::{ApduCommand, ExpectedLength, IsoCase},
        executor::Executor,
        response::ApduResponse,
        response::status::{StatusWord, common as status},
        transport::{CardConnector, CardTransport, TransportError},
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    // Test the basic types are re-exported correctly
    #[test]
    fn test_reexports() {
        let cmd = Command::new(0x00, 0xA4, 0x04, 0x00);
        assert_eq!(cmd.class(), 0x00);
        assert_eq!(cmd.instruction(), 0xA4);
        assert_eq!(cmd.p1(), 0x04);
        assert_eq!(cmd.p2(), 0x00);
        assert_eq!(cmd.case(), IsoCase::Case1);

        let data = Bytes::from_static(&[0x01, 0x02, 0x03]);
        let resp = Response::success(Some(data.clone()));
        assert!(resp.is_success());
        assert_eq!(resp.payload(), &Some(data));
        assert_eq!(resp.status(), StatusWord::new(0x90, 0x00));
    }
}
