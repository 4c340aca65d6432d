//! Invoice signing with ESDC fiscal secure elements
//!
//! The secure element signs a fixed-layout binary invoice record. This crate
//! encodes that record, frames the three commands the fiscal applet
//! understands (SELECT, VERIFY PIN, SIGN INVOICE) and runs them in order
//! over any [`CardConnector`](esdc_apdu_core::CardConnector).
//!
//! ```no_run
//! # fn sign<C: esdc_apdu_core::CardConnector>(connector: &C) -> esdc::Result<()> {
//! use esdc::{InvoiceRecord, SessionConfig};
//! use rust_decimal::Decimal;
//!
//! let record = InvoiceRecord::new(1_500_977_838_953, "021131682".parse()?, Decimal::from(240))
//!     .with_tax_category(3, Decimal::new(135_849, 4));
//! let config = SessionConfig::new("1234".parse()?);
//!
//! let signed = esdc::sign_invoice(connector, config, &record)?;
//! println!("{}", signed.to_hex());
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

pub mod amount;
mod commands;
mod config;
mod constants;
mod error;
mod fields;
mod invoice;
mod session;

pub use amount::{FixedPointAmount, decode_amount, encode_amount};
pub use commands::*;
pub use config::SessionConfig;
pub use constants::*;
pub use error::{Error, Result};
pub use fields::{Pin, TaxId};
pub use invoice::{InvoiceRecord, InvoiceType, TaxCategoryAmount, TransactionType, record_length};
pub use session::{DeviceSession, SessionState, find_reader, sign_invoice};
