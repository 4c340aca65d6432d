//! Invoice description files
//!
//! ```toml
//! timestamp_ms = 1500977838953   # optional, defaults to now
//! seller_id = "021131682"
//! buyer_id = "123456789"          # optional
//! invoice_type = "normal"         # normal, pro_forma, copy, training, advance
//! transaction_type = "sale"       # sale, refund
//! total_amount = "240"
//!
//! [[tax_category]]
//! category = 3
//! amount = "13.5849"
//! ```

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use esdc::{InvoiceRecord, InvoiceType, TaxCategoryAmount, TaxId, TransactionType};
use eyre::WrapErr;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Contents of an invoice file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct InvoiceFile {
    timestamp_ms: Option<u64>,
    seller_id: TaxId,
    #[serde(default)]
    buyer_id: Option<TaxId>,
    #[serde(default)]
    invoice_type: InvoiceType,
    #[serde(default)]
    transaction_type: TransactionType,
    total_amount: Decimal,
    #[serde(default, rename = "tax_category")]
    tax_categories: Vec<TaxCategoryAmount>,
}

impl InvoiceFile {
    /// Read and parse an invoice file
    pub(crate) fn load(path: &Path) -> eyre::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::parse(&contents).wrap_err_with(|| format!("invalid invoice file {}", path.display()))
    }

    fn parse(contents: &str) -> eyre::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Build the record, stamping it with the current time if no timestamp was given
    pub(crate) fn into_record(self) -> eyre::Result<InvoiceRecord> {
        let timestamp_ms = match self.timestamp_ms {
            Some(timestamp_ms) => timestamp_ms,
            None => u64::try_from(SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis())?,
        };

        Ok(
            InvoiceRecord::new(timestamp_ms, self.seller_id, self.total_amount)
                .with_buyer(self.buyer_id.unwrap_or(TaxId::EMPTY))
                .with_invoice_type(self.invoice_type)
                .with_transaction_type(self.transaction_type)
                .with_tax_categories(self.tax_categories),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_full() {
        let file = InvoiceFile::parse(
            r#"
            timestamp_ms = 1500977838953
            seller_id = "021131682"
            buyer_id = "1234"
            invoice_type = "pro_forma"
            transaction_type = "refund"
            total_amount = "240"

            [[tax_category]]
            category = 3
            amount = "13.5849"
            "#,
        )
        .unwrap();

        let record = file.into_record().unwrap();
        assert_eq!(record.timestamp_ms(), 1_500_977_838_953);
        assert_eq!(record.seller_id(), &"021131682".parse().unwrap());
        assert_eq!(record.buyer_id(), Some(&"1234".parse().unwrap()));
        assert_eq!(record.invoice_type(), InvoiceType::ProForma);
        assert_eq!(record.transaction_type(), TransactionType::Refund);
        assert_eq!(record.total_amount(), dec!(240));
        assert_eq!(
            record.tax_categories(),
            &[TaxCategoryAmount::new(3, dec!(13.5849))]
        );
        assert_eq!(record.encode().unwrap().len(), 66);
    }

    #[test]
    fn test_parse_defaults() {
        let file = InvoiceFile::parse("seller_id = \"1\"\ntotal_amount = \"0\"").unwrap();
        let record = file.into_record().unwrap();
        assert!(record.timestamp_ms() > 0);
        assert_eq!(record.buyer_id(), None);
        assert_eq!(record.invoice_type(), InvoiceType::Normal);
        assert!(record.tax_categories().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        assert!(InvoiceFile::parse("seller_id = \"12a\"\ntotal_amount = \"1\"").is_err());
        assert!(InvoiceFile::parse("seller_id = \"1\"\ntotal_amount = \"1\"\ncolour = 1").is_err());
        assert!(
            InvoiceFile::parse("seller_id = \"1\"\ntotal_amount = \"1\"\ninvoice_type = \"x\"")
                .is_err()
        );
    }
}
