//! Fixed-point amount codec
//!
//! Monetary amounts travel as unsigned big-endian integers holding the value
//! scaled by 10 000. Amounts are rounded to four decimal places, half away
//! from zero, before scaling.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::layout::AMOUNT_LENGTH;
use crate::error::{Error, Result};

/// Number of fractional decimal digits kept
pub const AMOUNT_SCALE: u32 = 4;

/// Factor between a decimal amount and its scaled units
pub const AMOUNT_FACTOR: u64 = 10_000;

/// An amount in scaled units that fits the 7-byte record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPointAmount(u64);

impl FixedPointAmount {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Largest amount the 7-byte field can hold (2^56 - 1 units)
    pub const MAX: Self = Self((1 << (AMOUNT_LENGTH * 8)) - 1);

    /// Create from scaled units
    pub fn from_units(units: u64) -> Result<Self> {
        if units > Self::MAX.0 {
            return Err(Error::EncodingOverflow {
                value: units_to_decimal(units),
                width: AMOUNT_LENGTH,
            });
        }
        Ok(Self(units))
    }

    /// Round and scale a decimal amount
    pub fn from_decimal(amount: Decimal) -> Result<Self> {
        scale_amount(amount, AMOUNT_LENGTH).map(Self)
    }

    /// Scaled units
    pub const fn units(&self) -> u64 {
        self.0
    }

    /// The decimal value, with a scale of four
    pub fn to_decimal(&self) -> Decimal {
        units_to_decimal(self.0)
    }

    /// Big-endian encoding, dropping the always-zero most significant byte
    pub fn to_be_bytes(&self) -> [u8; AMOUNT_LENGTH] {
        let mut bytes = [0u8; AMOUNT_LENGTH];
        bytes.copy_from_slice(&self.0.to_be_bytes()[8 - AMOUNT_LENGTH..]);
        bytes
    }

    /// Decode a 7-byte big-endian field
    pub fn from_be_bytes(bytes: [u8; AMOUNT_LENGTH]) -> Self {
        let mut wide = [0u8; 8];
        wide[8 - AMOUNT_LENGTH..].copy_from_slice(&bytes);
        Self(u64::from_be_bytes(wide))
    }
}

impl TryFrom<Decimal> for FixedPointAmount {
    type Error = Error;

    fn try_from(amount: Decimal) -> Result<Self> {
        Self::from_decimal(amount)
    }
}

impl From<FixedPointAmount> for Decimal {
    fn from(amount: FixedPointAmount) -> Self {
        amount.to_decimal()
    }
}

/// Encode `amount` into the low-order `width` bytes of its 8-byte big-endian
/// scaled value
///
/// Fails with [`Error::EncodingOverflow`] when a non-zero byte would be
/// dropped.
pub fn encode_amount(amount: Decimal, width: usize) -> Result<Vec<u8>> {
    let units = scale_amount(amount, width)?;
    Ok(units.to_be_bytes()[8 - width..].to_vec())
}

/// Decode a big-endian scaled amount of at most 8 bytes
pub fn decode_amount(bytes: &[u8]) -> Result<Decimal> {
    if bytes.len() > 8 {
        return Err(Error::InvalidFieldLength {
            field: "amount",
            actual: bytes.len(),
            max: 8,
        });
    }

    let mut wide = [0u8; 8];
    wide[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(units_to_decimal(u64::from_be_bytes(wide)))
}

fn scale_amount(amount: Decimal, width: usize) -> Result<u64> {
    if width == 0 || width > 8 {
        return Err(Error::InvalidFieldLength {
            field: "amount width",
            actual: width,
            max: 8,
        });
    }
    if amount < Decimal::ZERO {
        return Err(Error::NegativeAmount(amount));
    }

    let overflow = || Error::EncodingOverflow {
        value: amount,
        width,
    };

    let units = amount
        .round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::from(AMOUNT_FACTOR))
        .and_then(|scaled| scaled.to_u64())
        .ok_or_else(overflow)?;

    if width < 8 && units >> (width * 8) != 0 {
        return Err(overflow());
    }

    Ok(units)
}

fn units_to_decimal(units: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(units), AMOUNT_SCALE)
}
