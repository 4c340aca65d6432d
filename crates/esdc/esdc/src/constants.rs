//! Constants for the ESDC secure element

/// Application identifier of the TaxCore applet on the secure element
pub const ESDC_AID: &[u8] =
    b"\xA0\x00\x00\x07\x48\x46\x4A\x49\x2D\x54\x61\x78\x43\x6F\x72\x65";

/// Class bytes
pub mod cla {
    /// Interindustry class, used for SELECT
    pub const ISO7816: u8 = 0x00;
    /// Proprietary class of the fiscal applet
    pub const ESDC: u8 = 0x88;
}

/// Instruction bytes
pub mod ins {
    /// SELECT
    pub const SELECT: u8 = 0xA4;
    /// VERIFY PIN
    pub const VERIFY_PIN: u8 = 0x11;
    /// SIGN INVOICE
    pub const SIGN_INVOICE: u8 = 0x13;
}

/// P1 values for SELECT
pub mod select_p1 {
    /// Select by DF name (AID)
    pub const BY_NAME: u8 = 0x04;
}

/// P1 used by every fiscal applet command
pub const ESDC_P1: u8 = 0x04;

/// P2 used by every command
pub const ESDC_P2: u8 = 0x00;

/// Byte layout of the invoice record
///
/// All multi-byte integers are big-endian.
pub mod layout {
    /// Timestamp, milliseconds since the Unix epoch (8 bytes)
    pub const TIMESTAMP: usize = 0;
    /// Seller tax identifier (20 bytes)
    pub const SELLER_ID: usize = 8;
    /// Buyer tax identifier, all zero when absent (20 bytes)
    pub const BUYER_ID: usize = 28;
    /// Invoice type code (1 byte)
    pub const INVOICE_TYPE: usize = 48;
    /// Transaction type code (1 byte)
    pub const TRANSACTION_TYPE: usize = 49;
    /// Total amount (7 bytes)
    pub const TOTAL_AMOUNT: usize = 50;
    /// Number of tax category entries (1 byte)
    pub const CATEGORY_COUNT: usize = 57;
    /// First tax category entry
    pub const CATEGORIES: usize = 58;

    /// Length of a tax identifier field
    pub const TAX_ID_LENGTH: usize = 20;
    /// Length of an amount field
    pub const AMOUNT_LENGTH: usize = 7;
    /// Length of the fixed part of the record
    pub const HEADER_LENGTH: usize = CATEGORIES;
    /// Length of one tax category entry: code plus amount
    pub const CATEGORY_ENTRY_LENGTH: usize = 1 + AMOUNT_LENGTH;
}
