//! SIGN INVOICE command
//!
//! Carries an encoded invoice record and returns the device's signed
//! response. Always framed with extended lengths.

use bytes::Bytes;
use esdc_apdu_core::{ApduCommand, ApduResponse, ExpectedLength, Response, StatusWord};

use crate::commands::CommandKind;
use crate::constants::{ESDC_P1, ESDC_P2, cla, ins};
use crate::error::Error;

/// SIGN INVOICE command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInvoiceCommand {
    payload: Bytes,
}

impl SignInvoiceCommand {
    /// Create a SIGN INVOICE command for an encoded invoice record
    pub fn with_payload(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The encoded invoice record
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

impl ApduCommand for SignInvoiceCommand {
    type Success = SignInvoiceResponse;
    type Error = Error;

    fn convert_error(error: esdc_apdu_core::Error) -> Self::Error {
        Error::from(error)
    }

    fn class(&self) -> u8 {
        cla::ESDC
    }

    fn instruction(&self) -> u8 {
        ins::SIGN_INVOICE
    }

    fn p1(&self) -> u8 {
        ESDC_P1
    }

    fn p2(&self) -> u8 {
        ESDC_P2
    }

    fn data(&self) -> Option<&[u8]> {
        Some(&self.payload)
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        Some(0x0000)
    }

    fn extended_length(&self) -> bool {
        true
    }

    fn parse_response(response: Response) -> Result<Self::Success, Self::Error> {
        Ok(if response.is_normal() {
            SignInvoiceResponse::Success {
                signed: SignedInvoice(response.payload().clone().unwrap_or_default()),
            }
        } else {
            SignInvoiceResponse::Rejected {
                status: response.status(),
            }
        })
    }
}

/// Signed response returned by the secure element
///
/// The content is opaque to this crate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignedInvoice(Bytes);

impl SignedInvoice {
    /// Raw response bytes, without the status word
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the raw response bytes
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Upper-case hex encoding of the response
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }

    /// Length of the response
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the device returned no data
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SignedInvoice {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Response to [`SignInvoiceCommand`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInvoiceResponse {
    /// Invoice signed (90 XX)
    Success {
        /// The device's response payload
        signed: SignedInvoice,
    },
    /// Any other status word
    Rejected {
        /// Status word returned by the card
        status: StatusWord,
    },
}

impl SignInvoiceResponse {
    /// Whether the invoice was signed
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Turn a rejection into [`Error::DeviceRejected`]
    pub fn into_result(self) -> Result<SignedInvoice, Error> {
        match self {
            Self::Success { signed } => Ok(signed),
            Self::Rejected { status } => Err(Error::DeviceRejected {
                command: CommandKind::SignInvoice,
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esdc_apdu_core::IsoCase;
    use hex_literal::hex;

    #[test]
    fn test_sign_invoice_command() {
        let cmd = SignInvoiceCommand::with_payload(hex!("AABBCC").to_vec());

        assert_eq!(cmd.class(), 0x88);
        assert_eq!(cmd.instruction(), 0x13);
        assert_eq!(cmd.case(), IsoCase::Case4Extended);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("8813040000 0003 AABBCC 0000"));
    }

    #[test]
    fn test_sign_invoice_record_length() {
        let cmd = SignInvoiceCommand::with_payload(vec![0u8; 66]);
        let raw = cmd.to_bytes();
        assert_eq!(raw.len(), 4 + 3 + 66 + 2);
        assert_eq!(&raw[4..7], &[0x00, 0x00, 0x42]);
        assert_eq!(cmd.command_length(), raw.len());
    }

    #[test]
    fn test_sign_invoice_large_payload() {
        let cmd = SignInvoiceCommand::with_payload(vec![0u8; 300]);
        let raw = cmd.to_bytes();
        assert_eq!(&raw[4..7], &[0x00, 0x01, 0x2C]);
        assert_eq!(&raw[raw.len() - 2..], &[0x00, 0x00]);
    }

    #[test]
    fn test_sign_invoice_response() {
        let response =
            SignInvoiceCommand::parse_response_raw(Bytes::copy_from_slice(&hex!("01020304 9000")))
                .unwrap();
        let signed = response.into_result().unwrap();
        assert_eq!(signed.as_bytes(), &[1, 2, 3, 4]);
        assert_eq!(signed.to_hex(), "01020304");

        let response =
            SignInvoiceCommand::parse_response_raw(Bytes::copy_from_slice(&hex!("9000")))
                .unwrap();
        assert!(response.into_result().unwrap().is_empty());

        let response =
            SignInvoiceCommand::parse_response_raw(Bytes::copy_from_slice(&hex!("6985")))
                .unwrap();
        assert!(!response.is_success());
        assert!(matches!(
            response.into_result(),
            Err(Error::DeviceRejected {
                command: CommandKind::SignInvoice,
                status
            }) if status == StatusWord::new(0x69, 0x85)
        ));
    }
}
