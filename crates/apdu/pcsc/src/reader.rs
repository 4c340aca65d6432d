//! Attached PC/SC readers

use std::fmt;

use pcsc::{ReaderState, State};

/// A reader reported by the PC/SC service, with the state of its slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcscReader {
    name: String,
    atr: Option<Vec<u8>>,
}

impl PcscReader {
    /// A reader with an empty slot
    pub const fn empty(name: String) -> Self {
        Self { name, atr: None }
    }

    /// A reader holding a card that answered reset with `atr`
    pub const fn with_card(name: String, atr: Vec<u8>) -> Self {
        Self {
            name,
            atr: Some(atr),
        }
    }

    /// Name to pass to [`PcscDeviceManager::open_reader`](crate::PcscDeviceManager::open_reader)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a card sits in the slot
    pub const fn has_card(&self) -> bool {
        self.atr.is_some()
    }

    /// Answer To Reset of the inserted card
    pub fn atr(&self) -> Option<&[u8]> {
        self.atr.as_deref()
    }

    pub(crate) fn from_reader_state(state: &ReaderState) -> Self {
        let name = state.name().to_string_lossy().into_owned();
        let event = state.event_state();

        if event.contains(State::PRESENT) && !event.contains(State::EMPTY) {
            Self::with_card(name, state.atr().to_vec())
        } else {
            Self::empty(name)
        }
    }
}

impl fmt::Display for PcscReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.atr {
            Some(atr) => write!(f, "{} (card present, ATR {})", self.name, hex::encode_upper(atr)),
            None => write!(f, "{} (no card)", self.name),
        }
    }
}
