//! VERIFY PIN command

use esdc_apdu_core::{ApduCommand, ApduResponse, ExpectedLength, Response, StatusWord};

use crate::commands::CommandKind;
use crate::constants::{ESDC_P1, ESDC_P2, cla, ins};
use crate::error::Error;
use crate::fields::Pin;

/// VERIFY PIN command
///
/// The PIN digits are sent one per byte, most significant first. No
/// response body is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPinCommand {
    pin: Pin,
}

impl VerifyPinCommand {
    /// Create a VERIFY PIN command
    pub fn with_pin(pin: &Pin) -> Self {
        Self { pin: pin.clone() }
    }
}

impl ApduCommand for VerifyPinCommand {
    type Success = VerifyPinResponse;
    type Error = Error;

    fn convert_error(error: esdc_apdu_core::Error) -> Self::Error {
        Error::from(error)
    }

    fn class(&self) -> u8 {
        cla::ESDC
    }

    fn instruction(&self) -> u8 {
        ins::VERIFY_PIN
    }

    fn p1(&self) -> u8 {
        ESDC_P1
    }

    fn p2(&self) -> u8 {
        ESDC_P2
    }

    fn data(&self) -> Option<&[u8]> {
        Some(self.pin.digits())
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        None
    }

    fn parse_response(response: Response) -> Result<Self::Success, Self::Error> {
        Ok(if response.is_normal() {
            VerifyPinResponse::Success
        } else {
            VerifyPinResponse::Rejected {
                status: response.status(),
            }
        })
    }
}

/// Response to [`VerifyPinCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPinResponse {
    /// PIN accepted (90 XX)
    Success,
    /// Any other status word
    Rejected {
        /// Status word returned by the card
        status: StatusWord,
    },
}

impl VerifyPinResponse {
    /// Whether the PIN was accepted
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Remaining attempts, when the card reports them as 63 CX
    pub const fn remaining_attempts(&self) -> Option<u8> {
        match self {
            Self::Rejected { status } if status.sw1 == 0x63 && status.sw2 & 0xF0 == 0xC0 => {
                Some(status.sw2 & 0x0F)
            }
            _ => None,
        }
    }

    /// Turn a rejection into [`Error::DeviceRejected`]
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Success => Ok(()),
            Self::Rejected { status } => Err(Error::DeviceRejected {
                command: CommandKind::VerifyPin,
                status,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use esdc_apdu_core::IsoCase;
    use hex_literal::hex;

    #[test]
    fn test_verify_pin_command() {
        let pin: Pin = "1234".parse().unwrap();
        let cmd = VerifyPinCommand::with_pin(&pin);

        assert_eq!(cmd.class(), 0x88);
        assert_eq!(cmd.instruction(), 0x11);
        assert_eq!(cmd.p1(), 0x04);
        assert_eq!(cmd.p2(), 0x00);
        assert_eq!(cmd.case(), IsoCase::Case3Short);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("881104000401020304"));
    }

    #[test]
    fn test_verify_pin_keeps_leading_zero() {
        let pin: Pin = "0123".parse().unwrap();
        let cmd = VerifyPinCommand::with_pin(&pin);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("881104000400010203"));
    }

    #[test]
    fn test_verify_pin_debug_is_redacted() {
        let pin: Pin = "1234".parse().unwrap();
        let cmd = VerifyPinCommand::with_pin(&pin);
        assert_eq!(format!("{cmd:?}"), "VerifyPinCommand { pin: Pin(<4 digits>) }");
    }

    #[test]
    fn test_verify_pin_response() {
        let response =
            VerifyPinCommand::parse_response_raw(Bytes::copy_from_slice(&hex!("9000"))).unwrap();
        assert!(response.is_success());
        assert!(response.into_result().is_ok());

        let response =
            VerifyPinCommand::parse_response_raw(Bytes::copy_from_slice(&hex!("63C2"))).unwrap();
        assert!(!response.is_success());
        assert_eq!(response.remaining_attempts(), Some(2));
        assert!(matches!(
            response.into_result(),
            Err(Error::DeviceRejected {
                command: CommandKind::VerifyPin,
                ..
            })
        ));

        let response =
            VerifyPinCommand::parse_response_raw(Bytes::copy_from_slice(&hex!("6983"))).unwrap();
        assert_eq!(response.remaining_attempts(), None);
    }
}
