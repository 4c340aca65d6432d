//! Card executor implementation
//!
//! This module provides the CardExecutor implementation, which owns a card
//! transport and runs APDU commands over it.

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::command::{ApduCommand, Command, decode_short_le};
use crate::error::{Error, ResultExt};
use crate::executor::Executor;
use crate::transport::CardTransport;

/// SW1 asking for the command again with Le = SW2
const WRONG_LENGTH: u8 = 0x6C;

/// SW1 announcing SW2 more bytes to fetch with GET RESPONSE
const MORE_DATA: u8 = 0x61;

const GET_RESPONSE: u8 = 0xC0;

/// Upper bound on chained GET RESPONSE exchanges for one command
const MAX_GET_RESPONSE_ROUNDS: usize = 256;

const fn status_bytes(response: &[u8]) -> Option<(u8, u8)> {
    match response {
        [.., sw1, sw2] => Some((*sw1, *sw2)),
        _ => None,
    }
}

/// Card executor implementation owning a transport
#[derive(Debug)]
pub struct CardExecutor<T>
where
    T: CardTransport,
{
    /// The transport used for communication
    transport: T,
    /// The last response received
    last_response: Option<Bytes>,
}

impl<T> CardExecutor<T>
where
    T: CardTransport,
{
    /// Create a new card executor with the given transport
    pub const fn new(transport: T) -> Self {
        Self {
            transport,
            last_response: None,
        }
    }

    /// Get the last response received
    pub const fn last_response(&self) -> Option<&Bytes> {
        self.last_response.as_ref()
    }

    /// Release the card connection held by the transport
    pub fn disconnect(&mut self) -> Result<(), Error> {
        self.last_response = None;
        self.transport
            .disconnect()
            .context("Failed to disconnect transport")
    }

    fn exchange(&mut self, command: &[u8]) -> Result<Bytes, Error> {
        self.transport
            .transmit_raw(command)
            .context("Transport error")
    }

    /// Consume the executor and return the transport
    pub fn into_transport(self) -> T {
        self.transport
    }
}

impl<T> Executor for CardExecutor<T>
where
    T: CardTransport,
{
    type Transport = T;

    fn transport(&self) -> &T {
        &self.transport
    }

    fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Exchange a frame, completing `6C XX` and `61 XX` answers
    ///
    /// `6C XX` resends the command with Le = XX. `61 XX` is followed by
    /// GET RESPONSE until the card stops reporting more data; the payloads
    /// are joined in order.
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error> {
        let mut response = self.exchange(command)?;

        if let Some((WRONG_LENGTH, le)) = status_bytes(&response) {
            let retry = Command::from_bytes(command)?.with_le(decode_short_le(le));
            debug!(le, "Resending command with corrected Le");
            response = self.exchange(&retry.to_bytes())?;
        }

        let mut payload = BytesMut::new();
        let mut rounds = 0;
        while let Some((MORE_DATA, remaining)) = status_bytes(&response) {
            if rounds == MAX_GET_RESPONSE_ROUNDS {
                return Err(Error::message("Card kept reporting more data"));
            }
            rounds += 1;

            payload.extend_from_slice(&response[..response.len() - 2]);
            let get_response =
                Command::new_with_le(0x00, GET_RESPONSE, 0x00, 0x00, decode_short_le(remaining));
            trace!(remaining, "Fetching remaining response data");
            response = self.exchange(&get_response.to_bytes())?;
        }

        if !payload.is_empty() {
            payload.extend_from_slice(&response);
            response = payload.freeze();
        }

        self.last_response = Some(response.clone());
        Ok(response)
    }

    fn reset(&mut self) -> Result<(), Error> {
        self.transport
            .reset()
            .context("Failed to reset transport")?;
        self.last_response = None;
        Ok(())
    }
}
