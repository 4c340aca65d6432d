//! Device manager for PC/SC operations

use esdc_apdu_core::{CardConnector, TransportError};
use pcsc::{Context, Scope};
use tracing::{debug, instrument};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::reader::PcscReader;
use crate::transport::PcscTransport;

/// Manager for PC/SC device operations
///
/// As a [`CardConnector`], every connection uses the manager's
/// [`PcscConfig`].
pub struct PcscDeviceManager {
    /// PC/SC context
    context: Context,
    /// Configuration applied to connections opened through `CardConnector`
    config: PcscConfig,
}

impl std::fmt::Debug for PcscDeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcscDeviceManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl PcscDeviceManager {
    /// Create a new PC/SC device manager
    pub fn new() -> Result<Self, PcscError> {
        Self::with_config(PcscConfig::default())
    }

    /// Create a new PC/SC device manager with a connection configuration
    pub fn with_config(config: PcscConfig) -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context, config })
    }

    /// The configuration used for connections
    pub const fn config(&self) -> &PcscConfig {
        &self.config
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<PcscReader>, PcscError> {
        let readers = match self.context.list_readers_owned() {
            Ok(readers) if !readers.is_empty() => readers,
            Ok(_) | Err(pcsc::Error::NoReadersAvailable) => {
                return Err(PcscError::NoReadersAvailable);
            }
            Err(e) => return Err(e.into()),
        };

        // For each reader, check if a card is present
        let mut result = Vec::with_capacity(readers.len());

        for reader_name in readers {
            let mut reader_states = vec![pcsc::ReaderState::new(
                reader_name.as_c_str(),
                pcsc::State::UNAWARE,
            )];

            match self.context.get_status_change(None, &mut reader_states) {
                Ok(()) => result.push(PcscReader::from_reader_state(&reader_states[0])),
                Err(_) => result.push(PcscReader::empty(
                    reader_name.to_string_lossy().into_owned(),
                )),
            }
        }

        Ok(result)
    }

    /// Open a connection to a specific reader
    pub fn open_reader(&self, reader_name: &str) -> Result<PcscTransport, PcscError> {
        self.open_reader_with_config(reader_name, self.config)
    }

    /// Open a connection to a specific reader with custom configuration
    pub fn open_reader_with_config(
        &self,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<PcscTransport, PcscError> {
        // Clone the context to provide ownership to the transport
        PcscTransport::connect(self.context.clone(), reader_name, config)
    }
}

impl CardConnector for PcscDeviceManager {
    type Transport = PcscTransport;

    fn list_readers(&self) -> Result<Vec<String>, TransportError> {
        match self.context.list_readers_owned() {
            Ok(readers) => Ok(readers
                .into_iter()
                .map(|name| name.to_string_lossy().into_owned())
                .collect()),
            Err(pcsc::Error::NoReadersAvailable) => Ok(Vec::new()),
            Err(e) => Err(PcscError::from(e).into()),
        }
    }

    #[instrument(level = "debug", skip(self))]
    fn connect(&self, reader: &str) -> Result<Self::Transport, TransportError> {
        let transport = self.open_reader(reader)?;
        debug!(share_mode = ?self.config.share_mode, "Connected to card");
        Ok(transport)
    }
}
