//! Executor for APDU command execution
//!
//! This module provides the executor trait. The card executor implementation
//! is in the `card` module.

use std::fmt;

use bytes::Bytes;
use tracing::{debug, instrument, trace};

use crate::command::{ApduCommand, Command};
use crate::error::Error;
use crate::{CardTransport, Response};

/// Trait for APDU command execution
///
/// Every method takes `&mut self`, so at most one command is outstanding on
/// an executor at any time.
pub trait Executor: Send + fmt::Debug {
    /// The transport type used by this executor
    type Transport: CardTransport;

    /// Get a reference to the underlying transport
    fn transport(&self) -> &Self::Transport;

    /// Get a mutable reference to the underlying transport
    fn transport_mut(&mut self) -> &mut Self::Transport;

    /// Transmit a raw APDU command
    ///
    /// This is the lowest level public transmission method.
    #[instrument(level = "trace", skip(self, command), fields(executor = std::any::type_name::<Self>()))]
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error> {
        let response = self.do_transmit_raw(command);
        if let Err(err) = &response {
            debug!(error = %err, "Error during raw transmission");
        }
        response
    }

    /// Internal implementation of transmit_raw
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Error>;

    /// Transmit a generic Command and return a Response
    fn transmit(&mut self, command: &Command) -> Result<Response, Error> {
        trace!(command = ?command, "Transmitting command");
        command.validate()?;
        let response_bytes = self.transmit_raw(&command.to_bytes())?;
        let response = Response::from_bytes(&response_bytes)
            .map_err(|e| Error::from(e).with_context("Failed to parse response bytes"))?;
        trace!(response = ?response, "Received response");
        Ok(response)
    }

    /// Execute a typed APDU command and return the command's success type
    ///
    /// The command is validated before anything is sent, so a command that
    /// cannot be framed never reaches the card.
    fn execute<C>(&mut self, command: &C) -> Result<C::Success, C::Error>
    where
        C: ApduCommand,
    {
        command
            .validate()
            .map_err(|e| C::convert_error(e.into()))?;
        let response_bytes = self
            .transmit_raw(&command.to_bytes())
            .map_err(C::convert_error)?;
        let response = Response::from_bytes(&response_bytes).map_err(|e| {
            C::convert_error(Error::from(e).with_context("Failed to parse response bytes"))
        })?;
        C::parse_response(response)
    }

    /// Reset the executor, including the transport
    fn reset(&mut self) -> Result<(), Error>;
}
