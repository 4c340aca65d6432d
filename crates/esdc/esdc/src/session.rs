//! Device session
//!
//! A [`DeviceSession`] owns the connection to the reader hosting the secure
//! element for one signing attempt. Commands go out one at a time and a
//! rejected command fails the session for good; the caller decides whether
//! to start over with a new session.

use bytes::Bytes;
use esdc_apdu_core::{CardConnector, CardExecutor, CardTransport, Executor, StatusWord};
use tracing::{debug, instrument, warn};

use crate::commands::{
    CommandKind, SelectCommand, SelectResponse, SignInvoiceCommand, SignInvoiceResponse,
    SignedInvoice, VerifyPinCommand, VerifyPinResponse,
};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::invoice::InvoiceRecord;

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum SessionState {
    /// No reader connection
    #[display("disconnected")]
    Disconnected,
    /// Probing readers
    #[display("connecting")]
    Connecting,
    /// Connected to a reader
    #[display("connected (secure element detected: {secure_element_detected})")]
    Connected {
        /// Whether the reader accepted the application select
        secure_element_detected: bool,
    },
    /// Fiscal application selected
    #[display("application selected")]
    ApplicationSelected,
    /// PIN accepted
    #[display("PIN verified")]
    PinVerified,
    /// At least one invoice signed
    #[display("invoice signed")]
    InvoiceSigned,
    /// A command was rejected; terminal
    #[display("failed ({command} returned {status})")]
    Failed {
        /// The rejected command
        command: CommandKind,
        /// Status word returned for it
        status: StatusWord,
    },
}

/// Connection to the reader hosting the secure element
///
/// The reader is disconnected when the session is closed or dropped.
#[derive(Debug)]
pub struct DeviceSession<T: CardTransport> {
    executor: CardExecutor<T>,
    reader_name: String,
    state: SessionState,
    config: SessionConfig,
}

impl<T: CardTransport> DeviceSession<T> {
    /// Find the reader hosting the secure element and select the application
    ///
    /// Readers are tried in the order the connector lists them, or only the
    /// reader named in the configuration. Readers that cannot be connected
    /// or that reject SELECT are disconnected and skipped.
    #[instrument(level = "debug", skip_all, fields(reader = ?config.reader))]
    pub fn open<C>(connector: &C, config: SessionConfig) -> Result<Self>
    where
        C: CardConnector<Transport = T>,
    {
        let (reader_name, executor) = probe(connector, &config.aid, config.reader.as_deref())?;

        let mut session = Self {
            executor,
            reader_name,
            state: SessionState::Connected {
                secure_element_detected: true,
            },
            config,
        };
        session.transition(SessionState::ApplicationSelected);
        Ok(session)
    }

    /// Name of the connected reader
    pub fn reader_name(&self) -> &str {
        &self.reader_name
    }

    /// Current state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        self.executor.transport()
    }

    /// Present the configured PIN
    #[instrument(level = "debug", skip(self), fields(reader = %self.reader_name))]
    pub fn verify_pin(&mut self) -> Result<()> {
        self.ensure_state("application selected", |state| {
            matches!(state, SessionState::ApplicationSelected)
        })?;

        let command = VerifyPinCommand::with_pin(&self.config.pin);
        match self.executor.execute(&command)? {
            VerifyPinResponse::Success => {
                self.transition(SessionState::PinVerified);
                Ok(())
            }
            VerifyPinResponse::Rejected { status } => {
                Err(self.fail(CommandKind::VerifyPin, status))
            }
        }
    }

    /// Encode and sign an invoice record
    ///
    /// Requires a verified PIN. Nothing is sent if the record cannot be
    /// encoded.
    pub fn sign_invoice(&mut self, record: &InvoiceRecord) -> Result<SignedInvoice> {
        self.ensure_signing_state()?;
        let payload = record.encode()?;
        self.sign_encoded(payload)
    }

    /// Sign an already encoded invoice record
    #[instrument(level = "debug", skip_all, fields(reader = %self.reader_name, len = payload.len()))]
    pub fn sign_encoded(&mut self, payload: Bytes) -> Result<SignedInvoice> {
        self.ensure_signing_state()?;

        let command = SignInvoiceCommand::with_payload(payload);
        match self.executor.execute(&command)? {
            SignInvoiceResponse::Success { signed } => {
                self.transition(SessionState::InvoiceSigned);
                Ok(signed)
            }
            SignInvoiceResponse::Rejected { status } => {
                Err(self.fail(CommandKind::SignInvoice, status))
            }
        }
    }

    /// Disconnect from the reader
    pub fn close(mut self) -> Result<()> {
        self.disconnect()
    }

    fn disconnect(&mut self) -> Result<()> {
        if self.state == SessionState::Disconnected {
            return Ok(());
        }
        let result = self.executor.disconnect();
        self.transition(SessionState::Disconnected);
        result.map_err(Into::into)
    }

    fn ensure_signing_state(&self) -> Result<()> {
        self.ensure_state("PIN verified", |state| {
            matches!(
                state,
                SessionState::PinVerified | SessionState::InvoiceSigned
            )
        })
    }

    fn ensure_state(
        &self,
        expected: &'static str,
        allowed: impl Fn(&SessionState) -> bool,
    ) -> Result<()> {
        match self.state {
            SessionState::Failed { command, status } => {
                Err(Error::SessionFailed { command, status })
            }
            state if allowed(&state) => Ok(()),
            actual => Err(Error::InvalidState { expected, actual }),
        }
    }

    fn transition(&mut self, state: SessionState) {
        debug!(from = %self.state, to = %state, "Session state change");
        self.state = state;
    }

    fn fail(&mut self, command: CommandKind, status: StatusWord) -> Error {
        warn!(
            reader = %self.reader_name,
            %command,
            %status,
            description = status.description(),
            "Command rejected by device"
        );
        self.transition(SessionState::Failed { command, status });
        Error::DeviceRejected { command, status }
    }
}

/// Connect to the first reader that accepts SELECT of `aid`
///
/// When no reader hosts the application and some reader could not be
/// reached, the last transport error is returned instead of
/// [`Error::NoCompatibleReaderFound`].
fn probe<C: CardConnector>(
    connector: &C,
    aid: &Bytes,
    only: Option<&str>,
) -> Result<(String, CardExecutor<C::Transport>)> {
    let readers = match only {
        Some(reader) => vec![reader.to_string()],
        None => connector.list_readers()?,
    };
    debug!(state = %SessionState::Connecting, readers = readers.len(), "Probing readers");

    let select = SelectCommand::with_aid(aid.clone());
    let mut last_error = None;
    for reader in readers {
        match connect_and_select(connector, &reader, &select) {
            Ok((SessionState::Connected { secure_element_detected: true }, executor)) => {
                debug!(%reader, "Secure element found");
                return Ok((reader, executor));
            }
            Ok((state, mut executor)) => {
                debug!(%reader, %state, "Application not present");
                if let Err(e) = executor.disconnect() {
                    warn!(%reader, error = %e, "Failed to disconnect reader");
                }
            }
            Err(e) => {
                warn!(%reader, error = %e, "Skipping reader");
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or(Error::NoCompatibleReaderFound))
}

/// Connect to `reader` and select the application
///
/// The returned state is `Connected`, recording whether SELECT succeeded.
/// On error the reader has already been released.
fn connect_and_select<C: CardConnector>(
    connector: &C,
    reader: &str,
    select: &SelectCommand,
) -> Result<(SessionState, CardExecutor<C::Transport>)> {
    let mut executor = CardExecutor::new(connector.connect(reader)?);

    let secure_element_detected = match executor.execute(select) {
        Ok(SelectResponse::Success { .. }) => true,
        Ok(SelectResponse::Rejected { status }) => {
            debug!(%reader, %status, "SELECT rejected");
            false
        }
        Err(e) => {
            if let Err(e) = executor.disconnect() {
                debug!(%reader, error = %e, "Failed to disconnect reader");
            }
            return Err(e);
        }
    };

    Ok((
        SessionState::Connected {
            secure_element_detected,
        },
        executor,
    ))
}

/// Name of the first reader hosting the application `aid`
///
/// The reader is disconnected again before returning.
#[instrument(level = "debug", skip(connector, aid))]
pub fn find_reader<C: CardConnector>(
    connector: &C,
    aid: &Bytes,
    only: Option<&str>,
) -> Result<String> {
    let (reader, mut executor) = probe(connector, aid, only)?;
    executor.disconnect()?;
    Ok(reader)
}

impl<T: CardTransport> Drop for DeviceSession<T> {
    fn drop(&mut self) {
        if let Err(e) = self.disconnect() {
            debug!(error = %e, "Failed to disconnect on drop");
        }
    }
}

/// Sign one invoice record from start to finish
///
/// The record is encoded before any reader is touched, so encoding errors
/// never reach the device. The session is disconnected on every path; a
/// failed disconnect after signing is logged and the signature returned.
pub fn sign_invoice<C>(
    connector: &C,
    config: SessionConfig,
    record: &InvoiceRecord,
) -> Result<SignedInvoice>
where
    C: CardConnector,
{
    let payload = record.encode()?;

    let mut session = DeviceSession::open(connector, config)?;
    session.verify_pin()?;
    let signed = session.sign_encoded(payload)?;
    if let Err(e) = session.close() {
        warn!(error = %e, "Failed to disconnect after signing");
    }

    Ok(signed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use esdc_apdu_core::TransportError;
    use hex_literal::hex;
    use rust_decimal_macros::dec;

    /// Transport that answers every command with the same status word
    #[derive(Debug)]
    struct FixedTransport {
        response: Bytes,
        sent: Vec<Bytes>,
        connected: bool,
    }

    impl CardTransport for FixedTransport {
        fn do_transmit_raw(&mut self, command: &[u8]) -> std::result::Result<Bytes, TransportError> {
            if !self.connected {
                return Err(TransportError::NotConnected);
            }
            self.sent.push(Bytes::copy_from_slice(command));
            Ok(self.response.clone())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn reset(&mut self) -> std::result::Result<(), TransportError> {
            Ok(())
        }

        fn disconnect(&mut self) -> std::result::Result<(), TransportError> {
            self.connected = false;
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FixedConnector(Bytes);

    impl CardConnector for FixedConnector {
        type Transport = FixedTransport;

        fn list_readers(&self) -> std::result::Result<Vec<String>, TransportError> {
            Ok(vec!["Reader 0".into()])
        }

        fn connect(&self, _reader: &str) -> std::result::Result<FixedTransport, TransportError> {
            Ok(FixedTransport {
                response: self.0.clone(),
                sent: Vec::new(),
                connected: true,
            })
        }
    }

    fn open_ok() -> DeviceSession<FixedTransport> {
        let connector = FixedConnector(Bytes::copy_from_slice(&hex!("9000")));
        DeviceSession::open(&connector, SessionConfig::new("1234".parse().unwrap())).unwrap()
    }

    #[test]
    fn test_open_selects_application() {
        let session = open_ok();
        assert_eq!(session.state(), SessionState::ApplicationSelected);
        assert_eq!(session.reader_name(), "Reader 0");
        assert_eq!(
            session.transport().sent[0].as_ref(),
            hex!("00A4040010A000000748464A492D546178436F726500")
        );
    }

    #[test]
    fn test_sign_requires_pin() {
        let mut session = open_ok();
        let record = InvoiceRecord::new(0, "1".parse().unwrap(), dec!(1));
        let err = session.sign_invoice(&record).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                actual: SessionState::ApplicationSelected,
                ..
            }
        ));
        assert_eq!(session.transport().sent.len(), 1);
    }

    #[test]
    fn test_pin_and_sign() {
        let mut session = open_ok();
        session.verify_pin().unwrap();
        assert_eq!(session.state(), SessionState::PinVerified);

        // PIN can only be presented once per session
        assert!(matches!(
            session.verify_pin(),
            Err(Error::InvalidState { .. })
        ));

        let record = InvoiceRecord::new(0, "1".parse().unwrap(), dec!(1));
        session.sign_invoice(&record).unwrap();
        assert_eq!(session.state(), SessionState::InvoiceSigned);
        assert_eq!(session.transport().sent.len(), 3);

        session.close().unwrap();
    }

    #[test]
    fn test_close_disconnects() {
        let mut session = open_ok();
        session.disconnect().unwrap();
        assert!(!session.transport().is_connected());
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_connect_and_select_records_detection() {
        let select = SelectCommand::for_esdc();

        let connector = FixedConnector(Bytes::copy_from_slice(&hex!("9000")));
        let (state, _) = connect_and_select(&connector, "Reader 0", &select).unwrap();
        assert_eq!(
            state,
            SessionState::Connected {
                secure_element_detected: true
            }
        );

        let connector = FixedConnector(Bytes::copy_from_slice(&hex!("6A82")));
        let (state, executor) = connect_and_select(&connector, "Reader 0", &select).unwrap();
        assert_eq!(
            state,
            SessionState::Connected {
                secure_element_detected: false
            }
        );
        assert!(executor.transport().is_connected());
    }

    #[test]
    fn test_state_display() {
        let state = SessionState::Failed {
            command: CommandKind::VerifyPin,
            status: StatusWord::new(0x63, 0xC0),
        };
        assert_eq!(state.to_string(), "failed (VERIFY PIN returned 63 C0)");
        assert_eq!(
            SessionState::Connected {
                secure_element_detected: true
            }
            .to_string(),
            "connected (secure element detected: true)"
        );
    }
}
