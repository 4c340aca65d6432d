//! Digit-encoded record fields
//!
//! Tax identifiers and PINs are sent one decimal digit per byte, holding the
//! digit's numeric value (0-9) rather than its ASCII code.

use std::fmt;
use std::str::FromStr;

use esdc_apdu_core::command::MAX_SHORT_DATA_LENGTH;
use serde::{Deserialize, Deserializer, de};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::layout::TAX_ID_LENGTH;
use crate::error::{Error, Result};

fn parse_digits(s: &str) -> Result<Vec<u8>> {
    s.chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as u8)
                .ok_or(Error::InvalidDigit(c))
        })
        .collect()
}

fn check_digits(digits: &[u8]) -> Result<()> {
    match digits.iter().find(|&&d| d > 9) {
        Some(&d) => Err(Error::InvalidDigitValue(d)),
        None => Ok(()),
    }
}

/// A 20-byte tax identifier field
///
/// Digits are right-aligned and left-padded with zero bytes. An all-zero
/// field means "no tax identifier".
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub struct TaxId([u8; TAX_ID_LENGTH]);

impl TaxId {
    /// The absent tax identifier
    pub const EMPTY: Self = Self([0; TAX_ID_LENGTH]);

    /// Create from digit values, most significant first
    pub fn from_digits(digits: &[u8]) -> Result<Self> {
        if digits.len() > TAX_ID_LENGTH {
            return Err(Error::InvalidFieldLength {
                field: "tax id",
                actual: digits.len(),
                max: TAX_ID_LENGTH,
            });
        }
        check_digits(digits)?;

        let mut field = [0u8; TAX_ID_LENGTH];
        field[TAX_ID_LENGTH - digits.len()..].copy_from_slice(digits);
        Ok(Self(field))
    }

    /// Create from an encoded field
    pub fn from_bytes(field: [u8; TAX_ID_LENGTH]) -> Result<Self> {
        check_digits(&field)?;
        Ok(Self(field))
    }

    /// The encoded field
    pub const fn as_bytes(&self) -> &[u8; TAX_ID_LENGTH] {
        &self.0
    }

    /// Whether this is the absent tax identifier
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&d| d == 0)
    }
}

impl FromStr for TaxId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_digits(&parse_digits(s.trim())?)
    }
}

impl TryFrom<String> for TaxId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|d| write!(f, "{d}"))
    }
}

impl fmt::Debug for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaxId({self})")
    }
}

/// PIN as an explicit sequence of digit values
///
/// Leading zeros are kept. Digits are wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Pin(Vec<u8>);

impl Pin {
    /// Create from digit values, most significant first
    pub fn from_digits(digits: &[u8]) -> Result<Self> {
        if digits.is_empty() {
            return Err(Error::EmptyPin);
        }
        if digits.len() > MAX_SHORT_DATA_LENGTH {
            return Err(Error::InvalidFieldLength {
                field: "PIN",
                actual: digits.len(),
                max: MAX_SHORT_DATA_LENGTH,
            });
        }
        check_digits(digits)?;
        Ok(Self(digits.to_vec()))
    }

    /// Derive the digits of an integer PIN
    ///
    /// Leading zeros cannot be expressed this way, and `0` has no digits at
    /// all, so it is rejected as [`Error::EmptyPin`].
    pub fn from_number(pin: u64) -> Result<Self> {
        let mut digits = Vec::new();
        let mut rest = pin;
        while rest > 0 {
            digits.push((rest % 10) as u8);
            rest /= 10;
        }
        digits.reverse();

        let result = Self::from_digits(&digits);
        digits.zeroize();
        result
    }

    /// Digit values, most significant first
    pub fn digits(&self) -> &[u8] {
        &self.0
    }

    /// Number of digits
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the PIN has no digits
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut digits = parse_digits(s.trim())?;
        let result = Self::from_digits(&digits);
        digits.zeroize();
        result
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pin(<{} digits>)", self.0.len())
    }
}

/// Only string values are accepted.
impl<'de> Deserialize<'de> for Pin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut digits = String::deserialize(deserializer)?;
        let result = digits.parse::<Self>().map_err(de::Error::custom);
        digits.zeroize();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_id_right_aligned() {
        let tax_id: TaxId = "021131682".parse().unwrap();
        let bytes = tax_id.as_bytes();
        assert_eq!(&bytes[..11], &[0u8; 11]);
        assert_eq!(&bytes[11..], &[0, 2, 1, 1, 3, 1, 6, 8, 2]);
        assert_eq!(tax_id.to_string(), "00000000000021131682");
        assert!(!tax_id.is_empty());
    }

    #[test]
    fn test_tax_id_full_width() {
        let tax_id: TaxId = "12345678901234567890".parse().unwrap();
        assert_eq!(tax_id.as_bytes()[0], 1);
        assert_eq!(tax_id.as_bytes()[19], 0);
    }

    #[test]
    fn test_tax_id_too_long() {
        let err = "123456789012345678901".parse::<TaxId>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidFieldLength {
                actual: 21,
                max: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_tax_id_rejects_non_digits() {
        assert!(matches!(
            "12A4".parse::<TaxId>(),
            Err(Error::InvalidDigit('A'))
        ));
        assert!(matches!(
            TaxId::from_digits(&[1, 10]),
            Err(Error::InvalidDigitValue(10))
        ));
        let mut field = [0u8; TAX_ID_LENGTH];
        field[0] = b'1';
        assert!(TaxId::from_bytes(field).is_err());
    }

    #[test]
    fn test_tax_id_empty() {
        assert!(TaxId::EMPTY.is_empty());
        assert!(TaxId::default().is_empty());
        assert_eq!("".parse::<TaxId>().unwrap(), TaxId::EMPTY);
    }

    #[test]
    fn test_pin_keeps_leading_zeros() {
        let pin: Pin = "0042".parse().unwrap();
        assert_eq!(pin.digits(), &[0, 0, 4, 2]);
        assert_eq!(pin.len(), 4);
    }

    #[test]
    fn test_pin_from_number() {
        let pin = Pin::from_number(4321).unwrap();
        assert_eq!(pin.digits(), &[4, 3, 2, 1]);

        // Leading zeros are lost when a PIN is stored as a number
        assert_eq!(Pin::from_number(42).unwrap().digits(), &[4, 2]);
        assert!(matches!(Pin::from_number(0), Err(Error::EmptyPin)));
    }

    #[test]
    fn test_pin_rejects_invalid() {
        assert!(matches!("".parse::<Pin>(), Err(Error::EmptyPin)));
        assert!(matches!("12x4".parse::<Pin>(), Err(Error::InvalidDigit('x'))));
    }

    #[test]
    fn test_pin_debug_is_redacted() {
        let pin: Pin = "1234".parse().unwrap();
        assert_eq!(format!("{pin:?}"), "Pin(<4 digits>)");
    }

    #[test]
    fn test_deserialize() {
        #[derive(Deserialize)]
        struct Doc {
            pin: Pin,
            seller: TaxId,
        }

        let doc: Doc = toml::from_str("pin = \"0012\"\nseller = \"021131682\"").unwrap();
        assert_eq!(doc.pin.digits(), &[0, 0, 1, 2]);
        assert_eq!(doc.seller, "021131682".parse().unwrap());

        // Integers are refused instead of silently dropping leading zeros
        assert!(toml::from_str::<Doc>("pin = 123\nseller = \"1\"").is_err());

        assert!(toml::from_str::<Doc>("pin = \"\"\nseller = \"1\"").is_err());
    }
}
