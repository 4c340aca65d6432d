//! APDU command definitions and traits
//!
//! This module provides types and traits for working with APDU commands
//! according to ISO/IEC 7816-4. Commands are framed in short form unless they
//! ask for extended length or their data/Le does not fit a short frame.

pub mod error;

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

pub use error::CommandError;

use crate::{Error, Response};

/// Expected length type for APDU commands
///
/// This is the Ne value carried by the Le field. `0` asks for as much as the
/// card can return: 256 bytes in short form, 65 536 in extended form.
pub type ExpectedLength = u16;

/// Largest data field that fits a short frame
pub const MAX_SHORT_DATA_LENGTH: usize = 255;

/// Largest data field that fits an extended frame
pub const MAX_EXTENDED_DATA_LENGTH: usize = 65_535;

/// Largest Le that can be expressed in a short frame (encoded as `00`)
pub const MAX_SHORT_EXPECTED_LENGTH: ExpectedLength = 256;

/// ISO/IEC 7816-3 command case
///
/// The case says whether the command carries data (Lc + data), whether a
/// response body is expected (Le), and whether lengths are short or extended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsoCase {
    /// Header only: no data, no response body
    Case1,
    /// No data, response body expected (short Le)
    Case2Short,
    /// Data, no response body (short Lc)
    Case3Short,
    /// Data and response body (short Lc and Le)
    Case4Short,
    /// No data, response body expected (extended Le)
    Case2Extended,
    /// Data, no response body (extended Lc)
    Case3Extended,
    /// Data and response body (extended Lc and Le)
    Case4Extended,
}

impl IsoCase {
    /// Whether this case uses extended length fields
    pub const fn is_extended(&self) -> bool {
        matches!(
            self,
            Self::Case2Extended | Self::Case3Extended | Self::Case4Extended
        )
    }

    /// Whether this case carries a command data field
    pub const fn has_data(&self) -> bool {
        matches!(
            self,
            Self::Case3Short | Self::Case4Short | Self::Case3Extended | Self::Case4Extended
        )
    }

    /// Whether this case expects a response body
    pub const fn expects_response_data(&self) -> bool {
        matches!(
            self,
            Self::Case2Short | Self::Case4Short | Self::Case2Extended | Self::Case4Extended
        )
    }
}

/// Core trait for APDU commands
pub trait ApduCommand {
    /// Success response type
    type Success;

    /// Error response type
    type Error: fmt::Debug;

    /// Convert core Error to command-specific error type
    fn convert_error(error: Error) -> Self::Error;

    /// Command class (CLA)
    fn class(&self) -> u8;

    /// Instruction code (INS)
    fn instruction(&self) -> u8;

    /// First parameter (P1)
    fn p1(&self) -> u8;

    /// Second parameter (P2)
    fn p2(&self) -> u8;

    /// Command payload data (optional)
    fn data(&self) -> Option<&[u8]>;

    /// Expected response length (optional)
    fn expected_length(&self) -> Option<ExpectedLength>;

    /// Whether the command explicitly asks for extended length framing
    fn extended_length(&self) -> bool {
        false
    }

    /// Whether the command is framed with extended length fields
    ///
    /// This is true when extended framing was requested, or when the data or
    /// Le cannot be expressed in a short frame.
    fn is_extended(&self) -> bool {
        self.extended_length()
            || self
                .data()
                .is_some_and(|data| data.len() > MAX_SHORT_DATA_LENGTH)
            || self
                .expected_length()
                .is_some_and(|le| le > MAX_SHORT_EXPECTED_LENGTH)
    }

    /// The ISO case of this command
    fn case(&self) -> IsoCase {
        let has_data = self.data().is_some_and(|data| !data.is_empty());
        let has_le = self.expected_length().is_some();

        match (has_data, has_le, self.is_extended()) {
            (false, false, _) => IsoCase::Case1,
            (false, true, false) => IsoCase::Case2Short,
            (true, false, false) => IsoCase::Case3Short,
            (true, true, false) => IsoCase::Case4Short,
            (false, true, true) => IsoCase::Case2Extended,
            (true, false, true) => IsoCase::Case3Extended,
            (true, true, true) => IsoCase::Case4Extended,
        }
    }

    /// Check that the command can be framed at all
    fn validate(&self) -> Result<(), CommandError> {
        match self.data() {
            Some(data) if data.len() > MAX_EXTENDED_DATA_LENGTH => Err(
                CommandError::data_too_long(data.len(), MAX_EXTENDED_DATA_LENGTH),
            ),
            _ => Ok(()),
        }
    }

    /// Convert to raw APDU bytes
    ///
    /// The data length is assumed to have been checked with
    /// [`validate`](Self::validate).
    fn to_bytes(&self) -> Bytes {
        let extended = self.is_extended();
        let data = self.data().filter(|data| !data.is_empty());
        let mut buffer = BytesMut::with_capacity(self.command_length());

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.class());
        buffer.put_u8(self.instruction());
        buffer.put_u8(self.p1());
        buffer.put_u8(self.p2());

        // Lc and data
        if let Some(data) = data {
            if extended {
                buffer.put_u8(0x00);
                buffer.put_u16(data.len() as u16);
            } else {
                buffer.put_u8(data.len() as u8);
            }
            buffer.put_slice(data);
        }

        // Le, where 256 (short) and 65536 (extended) wrap to zero
        if let Some(le) = self.expected_length() {
            if extended {
                if data.is_none() {
                    buffer.put_u8(0x00);
                }
                buffer.put_u16(le);
            } else {
                buffer.put_u8(le as u8);
            }
        }

        buffer.freeze()
    }

    /// Calculate length of serialized command
    fn command_length(&self) -> usize {
        // Header (CLA, INS, P1, P2) is always 4 bytes
        let mut length = 4;
        let extended = self.is_extended();
        let data_len = self.data().map_or(0, <[u8]>::len);

        if data_len > 0 {
            length += if extended { 3 } else { 1 } + data_len;
        }

        if self.expected_length().is_some() {
            length += match (extended, data_len > 0) {
                (false, _) => 1,
                (true, true) => 2,
                (true, false) => 3,
            };
        }

        length
    }

    /// Convert to a generic Command
    fn to_command(&self) -> Command {
        Command {
            cla: self.class(),
            ins: self.instruction(),
            p1: self.p1(),
            p2: self.p2(),
            data: self.data().map(Bytes::copy_from_slice),
            le: self.expected_length(),
            extended: self.extended_length(),
        }
    }

    /// Parse response into the command's response type
    fn parse_response(response: Response) -> Result<Self::Success, Self::Error>;

    /// Parse raw bytes into the command's response type
    fn parse_response_raw(bytes: Bytes) -> Result<Self::Success, Self::Error> {
        let response = Response::from_bytes(&bytes)
            .map_err(|e| Self::convert_error(Error::from(e)))?;
        Self::parse_response(response)
    }
}

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<ExpectedLength>,
    /// Force extended length framing
    pub extended: bool,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
            extended: false,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: ExpectedLength) -> Self {
        Self::new(cla, ins, p1, p2).with_le(le)
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self::new(cla, ins, p1, p2).with_data(data)
    }

    /// Create a new command with both data and expected length
    pub fn new_with_data_and_le<T: Into<Bytes>>(
        cla: u8,
        ins: u8,
        p1: u8,
        p2: u8,
        data: T,
        le: ExpectedLength,
    ) -> Self {
        Self::new(cla, ins, p1, p2).with_data(data).with_le(le)
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Force extended length framing
    pub const fn with_extended_length(mut self) -> Self {
        self.extended = true;
        self
    }

    /// Parse a command from raw bytes
    ///
    /// Both short and extended frames are recognised. An extended frame is
    /// one whose first length byte is `00` followed by at least two more bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CommandError> {
        if data.len() < 4 {
            return Err(CommandError::InvalidLength(data.len()));
        }

        let mut command = Self::new(data[0], data[1], data[2], data[3]);
        let body = &data[4..];

        match body {
            // Case 1
            [] => {}
            // Case 2 short
            [le] => command.le = Some(decode_short_le(*le)),
            // Extended frames
            [0x00, rest @ ..] if rest.len() >= 2 => {
                command.extended = true;
                let first = u16::from_be_bytes([rest[0], rest[1]]);
                let rest = &rest[2..];

                if rest.is_empty() {
                    // Case 2 extended
                    command.le = Some(first);
                } else {
                    let lc = first as usize;
                    if lc == 0 || rest.len() < lc {
                        return Err(CommandError::InvalidLength(data.len()));
                    }
                    command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
                    match &rest[lc..] {
                        [] => {}
                        [hi, lo] => command.le = Some(u16::from_be_bytes([*hi, *lo])),
                        _ => return Err(CommandError::InvalidLength(data.len())),
                    }
                }
            }
            // Short frames with data
            [lc, rest @ ..] => {
                let lc = *lc as usize;
                if lc == 0 || rest.len() < lc {
                    return Err(CommandError::InvalidLength(data.len()));
                }
                command.data = Some(Bytes::copy_from_slice(&rest[..lc]));
                match &rest[lc..] {
                    [] => {}
                    [le] => command.le = Some(decode_short_le(*le)),
                    _ => return Err(CommandError::InvalidLength(data.len())),
                }
            }
        }

        Ok(command)
    }
}

/// A short Le of `00` means 256
pub(crate) const fn decode_short_le(le: u8) -> ExpectedLength {
    if le == 0 {
        MAX_SHORT_EXPECTED_LENGTH
    } else {
        le as ExpectedLength
    }
}

impl ApduCommand for Command {
    type Success = Response;
    type Error = Error;

    fn convert_error(error: Error) -> Self::Error {
        error
    }

    fn class(&self) -> u8 {
        self.cla
    }

    fn instruction(&self) -> u8 {
        self.ins
    }

    fn p1(&self) -> u8 {
        self.p1
    }

    fn p2(&self) -> u8 {
        self.p2
    }

    fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    fn expected_length(&self) -> Option<ExpectedLength> {
        self.le
    }

    fn extended_length(&self) -> bool {
        self.extended
    }

    fn parse_response(response: Response) -> Result<Self::Success, Self::Error> {
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_command_serialization() {
        let data = Bytes::from_static(&[0xA0, 0x00, 0x00, 0x01, 0x51, 0x00]);
        let cmd = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, data, 0);
        assert_eq!(cmd.case(), IsoCase::Case4Short);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00A4040006A0000001510000"));
    }

    #[test]
    fn test_short_le_256_wraps_to_zero() {
        let cmd = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 256);
        assert_eq!(cmd.case(), IsoCase::Case2Short);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00B0000000"));
    }

    #[test]
    fn test_case3_short() {
        let cmd = Command::new_with_data(0x88, 0x11, 0x04, 0x00, vec![1, 2, 3, 4]);
        assert_eq!(cmd.case(), IsoCase::Case3Short);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("881104000401020304"));
        assert_eq!(cmd.command_length(), 9);
    }

    #[test]
    fn test_case4_extended() {
        let cmd = Command::new_with_data_and_le(0x88, 0x13, 0x04, 0x00, vec![0xAA; 3], 0)
            .with_extended_length();
        assert_eq!(cmd.case(), IsoCase::Case4Extended);

        let bytes = cmd.to_bytes();
        assert_eq!(bytes.as_ref(), hex!("8813040000 0003 AAAAAA 0000"));
        assert_eq!(bytes.len(), cmd.command_length());
    }

    #[test]
    fn test_case2_extended() {
        let cmd = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0x0400);
        assert_eq!(cmd.case(), IsoCase::Case2Extended);
        assert_eq!(cmd.to_bytes().as_ref(), hex!("00B0000000 0400"));
        assert_eq!(cmd.command_length(), 7);
    }

    #[test]
    fn test_long_data_promotes_to_extended() {
        let cmd = Command::new_with_data(0x88, 0x13, 0x04, 0x00, vec![0x55; 300]);
        assert!(cmd.is_extended());
        assert_eq!(cmd.case(), IsoCase::Case3Extended);

        let bytes = cmd.to_bytes();
        assert_eq!(&bytes[4..7], &[0x00, 0x01, 0x2C]);
        assert_eq!(bytes.len(), 4 + 3 + 300);
        assert_eq!(bytes.len(), cmd.command_length());
    }

    #[test]
    fn test_validate_rejects_oversized_data() {
        let cmd = Command::new_with_data(0x00, 0xD6, 0x00, 0x00, vec![0u8; 65_536]);
        assert!(matches!(
            cmd.validate(),
            Err(CommandError::DataTooLong(65_536, 65_535))
        ));
    }

    #[test]
    fn test_command_length() {
        let cmd1 = Command::new(0x00, 0xB0, 0x00, 0x00);
        assert_eq!(cmd1.command_length(), 4);

        let cmd2 = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0xFF);
        assert_eq!(cmd2.command_length(), 5);

        let data = Bytes::from_static(&[0x01, 0x02, 0x03]);
        let cmd3 = Command::new_with_data(0x00, 0xD6, 0x00, 0x00, data.clone());
        assert_eq!(cmd3.command_length(), 8);

        let cmd4 = Command::new_with_data_and_le(0x00, 0xD6, 0x00, 0x00, data, 0xFF);
        assert_eq!(cmd4.command_length(), 9);
    }

    #[test]
    fn test_command_from_bytes() {
        // Header only
        let cmd = Command::from_bytes(&hex!("00A40400")).unwrap();
        assert_eq!((cmd.cla, cmd.ins, cmd.p1, cmd.p2), (0x00, 0xA4, 0x04, 0x00));
        assert!(cmd.data.is_none());
        assert!(cmd.le.is_none());

        // Data, no Le
        let cmd = Command::from_bytes(&hex!("00A4040003010203")).unwrap();
        assert_eq!(cmd.data.as_deref(), Some(&[0x01, 0x02, 0x03][..]));
        assert!(cmd.le.is_none());

        // Data and Le
        let cmd = Command::from_bytes(&hex!("00A4040003010203FF")).unwrap();
        assert_eq!(cmd.data.as_deref(), Some(&[0x01, 0x02, 0x03][..]));
        assert_eq!(cmd.le, Some(0xFF));

        // Le only, 00 means 256
        let cmd = Command::from_bytes(&hex!("00B0000000")).unwrap();
        assert!(cmd.data.is_none());
        assert_eq!(cmd.le, Some(256));

        // Extended with data and Le
        let cmd = Command::from_bytes(&hex!("881304000000030102030000")).unwrap();
        assert!(cmd.extended);
        assert_eq!(cmd.data.as_deref(), Some(&[0x01, 0x02, 0x03][..]));
        assert_eq!(cmd.le, Some(0));

        // Lc larger than the remaining data
        assert!(Command::from_bytes(&hex!("00A4040005010203")).is_err());
    }

    #[test]
    fn test_from_bytes_inverts_to_bytes() {
        let original = Command::new_with_data_and_le(0x88, 0x13, 0x04, 0x00, vec![7u8; 66], 0)
            .with_extended_length();
        let parsed = Command::from_bytes(&original.to_bytes()).unwrap();
        assert_eq!(parsed, original);
    }
}
