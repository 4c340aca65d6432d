//! Invoice record encoder
//!
//! The record signed by the secure element has a fixed 58-byte header
//! followed by one 8-byte entry per tax category:
//!
//! | Offset | Size | Field                          |
//! |--------|------|--------------------------------|
//! | 0      | 8    | timestamp (ms since epoch)     |
//! | 8      | 20   | seller tax id                  |
//! | 28     | 20   | buyer tax id (zero if absent)  |
//! | 48     | 1    | invoice type                   |
//! | 49     | 1    | transaction type               |
//! | 50     | 7    | total amount                   |
//! | 57     | 1    | tax category count `k`         |
//! | 58     | 8k   | category code + amount, each   |

use bytes::{Buf, BufMut, Bytes, BytesMut};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::amount::FixedPointAmount;
use crate::constants::layout::{
    AMOUNT_LENGTH, CATEGORY_COUNT, CATEGORY_ENTRY_LENGTH, HEADER_LENGTH, TAX_ID_LENGTH,
};
use crate::error::{Error, Result};
use crate::fields::TaxId;

/// Length of an encoded record with `categories` tax category entries
pub const fn record_length(categories: usize) -> usize {
    HEADER_LENGTH + CATEGORY_ENTRY_LENGTH * categories
}

/// Invoice type code
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum InvoiceType {
    /// Normal invoice
    #[default]
    Normal = 0,
    /// Pro forma invoice
    ProForma = 1,
    /// Copy of an earlier invoice
    Copy = 2,
    /// Training invoice
    Training = 3,
    /// Advance payment invoice
    Advance = 4,
}

impl TryFrom<u8> for InvoiceType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::ProForma),
            2 => Ok(Self::Copy),
            3 => Ok(Self::Training),
            4 => Ok(Self::Advance),
            _ => Err(Error::InvalidCode {
                field: "invoice type",
                value,
            }),
        }
    }
}

impl From<InvoiceType> for u8 {
    fn from(value: InvoiceType) -> Self {
        value as Self
    }
}

/// Transaction type code
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionType {
    /// Sale
    #[default]
    Sale = 0,
    /// Refund
    Refund = 1,
}

impl TryFrom<u8> for TransactionType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Sale),
            1 => Ok(Self::Refund),
            _ => Err(Error::InvalidCode {
                field: "transaction type",
                value,
            }),
        }
    }
}

impl From<TransactionType> for u8 {
    fn from(value: TransactionType) -> Self {
        value as Self
    }
}

/// Amount attributed to one tax category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxCategoryAmount {
    /// Category code
    pub category: u8,
    /// Amount for the category
    pub amount: Decimal,
}

impl TaxCategoryAmount {
    /// Create a new category entry
    pub const fn new(category: u8, amount: Decimal) -> Self {
        Self { category, amount }
    }
}

/// The invoice record signed by the secure element
///
/// Whether the total equals the sum of the category amounts is not checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRecord {
    timestamp_ms: u64,
    seller_id: TaxId,
    buyer_id: TaxId,
    invoice_type: InvoiceType,
    transaction_type: TransactionType,
    total_amount: Decimal,
    tax_categories: Vec<TaxCategoryAmount>,
}

impl InvoiceRecord {
    /// Create a normal sale without buyer or tax categories
    pub const fn new(timestamp_ms: u64, seller_id: TaxId, total_amount: Decimal) -> Self {
        Self {
            timestamp_ms,
            seller_id,
            buyer_id: TaxId::EMPTY,
            invoice_type: InvoiceType::Normal,
            transaction_type: TransactionType::Sale,
            total_amount,
            tax_categories: Vec::new(),
        }
    }

    /// Set the buyer tax identifier
    pub fn with_buyer(mut self, buyer_id: TaxId) -> Self {
        self.buyer_id = buyer_id;
        self
    }

    /// Set the invoice type
    pub fn with_invoice_type(mut self, invoice_type: InvoiceType) -> Self {
        self.invoice_type = invoice_type;
        self
    }

    /// Set the transaction type
    pub fn with_transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    /// Append a tax category entry
    pub fn with_tax_category(mut self, category: u8, amount: Decimal) -> Self {
        self.tax_categories
            .push(TaxCategoryAmount::new(category, amount));
        self
    }

    /// Append several tax category entries, keeping their order
    pub fn with_tax_categories(
        mut self,
        categories: impl IntoIterator<Item = TaxCategoryAmount>,
    ) -> Self {
        self.tax_categories.extend(categories);
        self
    }

    /// Timestamp in milliseconds since the Unix epoch
    pub const fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Seller tax identifier
    pub const fn seller_id(&self) -> &TaxId {
        &self.seller_id
    }

    /// Buyer tax identifier, if present
    pub fn buyer_id(&self) -> Option<&TaxId> {
        (!self.buyer_id.is_empty()).then_some(&self.buyer_id)
    }

    /// Invoice type
    pub const fn invoice_type(&self) -> InvoiceType {
        self.invoice_type
    }

    /// Transaction type
    pub const fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// Total amount
    pub const fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// Tax category entries in encoding order
    pub fn tax_categories(&self) -> &[TaxCategoryAmount] {
        &self.tax_categories
    }

    /// Length of the encoded record
    pub fn encoded_len(&self) -> usize {
        record_length(self.tax_categories.len())
    }

    /// Encode the record
    ///
    /// Every field is checked before the buffer is assembled.
    pub fn encode(&self) -> Result<Bytes> {
        let count =
            u8::try_from(self.tax_categories.len()).map_err(|_| Error::InvalidFieldLength {
                field: "tax category count",
                actual: self.tax_categories.len(),
                max: u8::MAX as usize,
            })?;
        let total = FixedPointAmount::from_decimal(self.total_amount)?;
        let categories = self
            .tax_categories
            .iter()
            .map(|entry| Ok((entry.category, FixedPointAmount::from_decimal(entry.amount)?)))
            .collect::<Result<Vec<_>>>()?;

        let mut buffer = BytesMut::with_capacity(self.encoded_len());
        buffer.put_u64(self.timestamp_ms);
        buffer.put_slice(self.seller_id.as_bytes());
        buffer.put_slice(self.buyer_id.as_bytes());
        buffer.put_u8(self.invoice_type.into());
        buffer.put_u8(self.transaction_type.into());
        buffer.put_slice(&total.to_be_bytes());
        buffer.put_u8(count);
        for (category, amount) in categories {
            buffer.put_u8(category);
            buffer.put_slice(&amount.to_be_bytes());
        }

        trace!(len = buffer.len(), categories = count, "Encoded invoice record");
        Ok(buffer.freeze())
    }

    /// Decode an encoded record
    ///
    /// The input length must match the category count in the header exactly.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LENGTH {
            return Err(Error::InvalidRecordLength {
                actual: data.len(),
                expected: HEADER_LENGTH,
            });
        }
        let expected = record_length(data[CATEGORY_COUNT] as usize);
        if data.len() != expected {
            return Err(Error::InvalidRecordLength {
                actual: data.len(),
                expected,
            });
        }

        let mut buf = data;
        let timestamp_ms = buf.get_u64();
        let seller_id = TaxId::from_bytes(take_array::<TAX_ID_LENGTH>(&mut buf))?;
        let buyer_id = TaxId::from_bytes(take_array::<TAX_ID_LENGTH>(&mut buf))?;
        let invoice_type = InvoiceType::try_from(buf.get_u8())?;
        let transaction_type = TransactionType::try_from(buf.get_u8())?;
        let total_amount = FixedPointAmount::from_be_bytes(take_array(&mut buf)).to_decimal();
        let count = buf.get_u8();

        let tax_categories = (0..count)
            .map(|_| {
                let category = buf.get_u8();
                let amount = FixedPointAmount::from_be_bytes(take_array::<AMOUNT_LENGTH>(&mut buf));
                TaxCategoryAmount::new(category, amount.to_decimal())
            })
            .collect();

        Ok(Self {
            timestamp_ms,
            seller_id,
            buyer_id,
            invoice_type,
            transaction_type,
            total_amount,
            tax_categories,
        })
    }
}

fn take_array<const N: usize>(buf: &mut &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    buf.copy_to_slice(&mut out);
    out
}
