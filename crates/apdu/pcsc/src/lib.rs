//! PC/SC transport implementation for APDU operations
//!
//! This crate implements the `CardConnector` and `CardTransport` traits from
//! `esdc-apdu-core` on top of the PC/SC API.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use esdc_apdu_core::prelude::*;
//! use esdc_apdu_transport_pcsc::PcscDeviceManager;
//!
//! // Create a PC/SC device manager
//! let manager = PcscDeviceManager::new()?;
//!
//! // Connect to the first reader
//! let readers = manager.list_readers()?;
//! let Some(reader) = readers.first() else {
//!     println!("No readers found");
//!     return Ok(());
//! };
//!
//! let transport = manager.open_reader(reader.name())?;
//! let mut executor = CardExecutor::new(transport);
//!
//! // Send a SELECT command
//! let select = Command::new_with_data_and_le(0x00, 0xA4, 0x04, 0x00, vec![0xA0, 0x00, 0x00, 0x07], 0);
//! let response = executor.execute(&select)?;
//! println!("Status: {}", response.status());
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

// Core modules
mod config;
mod error;
mod manager;
mod reader;
mod transport;

// Public exports
pub use config::{PcscConfig, ShareMode};
pub use error::PcscError;
pub use manager::PcscDeviceManager;
pub use reader::PcscReader;
pub use transport::PcscTransport;

// Re-export some pcsc types for convenience
pub use pcsc::{Protocol, Protocols};
