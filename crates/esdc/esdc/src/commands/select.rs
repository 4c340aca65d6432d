//! SELECT command
//!
//! Selects the fiscal application by AID. A normal status word means the
//! reader hosts the secure element.

use bytes::Bytes;
use esdc_apdu_core::{ApduCommand, ApduResponse, ExpectedLength, Response, StatusWord};

use crate::commands::CommandKind;
use crate::constants::{ESDC_AID, cla, ins, select_p1};
use crate::error::Error;

/// SELECT command for the fiscal application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectCommand {
    aid: Bytes,
}

impl SelectCommand {
    /// Create a SELECT command for an arbitrary AID
    pub fn with_aid(aid: impl Into<Bytes>) -> Self {
        Self { aid: aid.into() }
    }

    /// Create a SELECT command for the fiscal application
    pub const fn for_esdc() -> Self {
        Self {
            aid: Bytes::from_static(ESDC_AID),
        }
    }

    /// The AID being selected
    pub fn aid(&self) -> &[u8] {
        &self.aid
    }
}

impl ApduCommand for SelectCommand {
    type Success = SelectResponse;
    type Error = Error;

    fn convert_error(error: esdc_apdu_core::Error) -> Self::Error {
        Error::from(error)
    }

    fn class(&self) -> u8 {
        cla::ISO7816
    }

    fn instruction(&self) -> u8 {
        ins::SELECT
    }

    fn p1(&self) -> u8 {
        select_p1::BY_NAME
    }

    fn p2(&self) -> u8 {
        0x00
    }

    fn data(&self) -> Option<&[u8]> {
        Some(&self.aid)
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        Some(0x00)
    }

    fn parse_response(response: Response) -> Result<Self::Success, Self::Error> {
        Ok(if response.is_normal() {
            SelectResponse::Success {
                fci: response.payload().clone(),
            }
        } else {
            SelectResponse::Rejected {
                status: response.status(),
            }
        })
    }
}

/// Response to [`SelectCommand`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectResponse {
    /// Application selected (90 XX)
    Success {
        /// File control information, if the card returned any
        fci: Option<Bytes>,
    },
    /// Any other status word
    Rejected {
        /// Status word returned by the card
        status: StatusWord,
    },
}

impl SelectResponse {
    /// Whether the application was selected
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// File control information returned on success
    pub fn fci(&self) -> Option<&[u8]> {
        match self {
            Self::Success { fci } => fci.as_deref(),
            Self::Rejected { .. } => None,
        }
    }

    /// Turn a rejection into [`Error::DeviceRejected`]
    pub fn into_result(self) -> Result<Option<Bytes>, Error> {
        match self {
            Self::Success { fci } => Ok(fci),
            Self::Rejected { status } => Err(Error::DeviceRejected {
                command: CommandKind::Select,
                status,
            }),
        }
    }
}
