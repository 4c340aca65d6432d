//! Scripted reader connector for session tests
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use esdc_apdu_core::{CardConnector, CardTransport, TransportError};

/// Something that happened on a mock reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(String),
    Transmit(String, Bytes),
    Disconnect(String),
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Connector whose readers answer from a fixed script
#[derive(Debug, Default)]
pub struct MockConnector {
    readers: Vec<String>,
    scripts: HashMap<String, Vec<Bytes>>,
    unreachable: Vec<String>,
    failing_disconnect: Vec<String>,
    log: EventLog,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reader answering commands with `responses` in order
    pub fn with_reader(mut self, name: &str, responses: &[&[u8]]) -> Self {
        self.readers.push(name.to_string());
        self.scripts.insert(
            name.to_string(),
            responses.iter().map(|r| Bytes::copy_from_slice(r)).collect(),
        );
        self
    }

    /// Add a reader that fails to connect
    pub fn with_unreachable_reader(mut self, name: &str) -> Self {
        self.readers.push(name.to_string());
        self.unreachable.push(name.to_string());
        self
    }

    /// Make disconnecting from `name` report a lost card
    pub fn with_failing_disconnect(mut self, name: &str) -> Self {
        self.failing_disconnect.push(name.to_string());
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    /// Commands sent to any reader, in order
    pub fn commands(&self) -> Vec<Bytes> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Transmit(_, command) => Some(command),
                _ => None,
            })
            .collect()
    }

    /// Instructions sent to any reader, in order
    pub fn instructions(&self) -> Vec<u8> {
        self.commands().iter().map(|command| command[1]).collect()
    }

    /// Readers that were connected and later disconnected
    pub fn all_disconnected(&self) -> bool {
        let events = self.events();
        events
            .iter()
            .filter_map(|event| match event {
                Event::Connect(reader) => Some(reader),
                _ => None,
            })
            .all(|reader| events.contains(&Event::Disconnect(reader.clone())))
    }
}

impl CardConnector for MockConnector {
    type Transport = MockTransport;

    fn list_readers(&self) -> Result<Vec<String>, TransportError> {
        Ok(self.readers.clone())
    }

    fn connect(&self, reader: &str) -> Result<MockTransport, TransportError> {
        if self.unreachable.iter().any(|r| r == reader) {
            return Err(TransportError::NoCard(reader.to_string()));
        }
        let responses = self
            .scripts
            .get(reader)
            .ok_or_else(|| TransportError::ReaderNotFound(reader.to_string()))?;

        self.log
            .lock()
            .unwrap()
            .push(Event::Connect(reader.to_string()));
        Ok(MockTransport {
            reader: reader.to_string(),
            responses: responses.iter().cloned().collect(),
            connected: true,
            fail_disconnect: self.failing_disconnect.iter().any(|r| r == reader),
            log: Arc::clone(&self.log),
        })
    }
}

/// Connection to a scripted reader
#[derive(Debug)]
pub struct MockTransport {
    reader: String,
    responses: VecDeque<Bytes>,
    connected: bool,
    fail_disconnect: bool,
    log: EventLog,
}

impl CardTransport for MockTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.log.lock().unwrap().push(Event::Transmit(
            self.reader.clone(),
            Bytes::copy_from_slice(command),
        ));
        self.responses
            .pop_front()
            .ok_or(TransportError::Transmission)
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        if self.connected {
            self.connected = false;
            self.log
                .lock()
                .unwrap()
                .push(Event::Disconnect(self.reader.clone()));
            if self.fail_disconnect {
                return Err(TransportError::CardLost);
            }
        }
        Ok(())
    }
}
