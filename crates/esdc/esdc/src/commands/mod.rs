//! APDU commands understood by the fiscal applet

pub mod select;
pub use select::*;
pub mod sign_invoice;
pub use sign_invoice::*;
pub mod verify_pin;
pub use verify_pin::*;

/// The commands a session issues, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CommandKind {
    /// SELECT of the fiscal application
    #[display("SELECT")]
    Select,
    /// VERIFY PIN
    #[display("VERIFY PIN")]
    VerifyPin,
    /// SIGN INVOICE
    #[display("SIGN INVOICE")]
    SignInvoice,
}
