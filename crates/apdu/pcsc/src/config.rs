//! Configuration options for PC/SC transport

use pcsc::{Protocols as PcscProtocols, ShareMode as PcscShareMode};

/// Sharing mode for card connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareMode {
    /// Exclusive access to the card
    Exclusive,
    /// Shared access to the card (default)
    #[default]
    Shared,
    /// Direct connection to the reader
    Direct,
}

impl From<ShareMode> for PcscShareMode {
    fn from(mode: ShareMode) -> Self {
        match mode {
            ShareMode::Exclusive => Self::Exclusive,
            ShareMode::Shared => Self::Shared,
            ShareMode::Direct => Self::Direct,
        }
    }
}

/// Configuration options for PC/SC transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcscConfig {
    /// Sharing mode for card connections
    pub share_mode: ShareMode,

    /// Protocols the card may negotiate
    pub protocols: PcscProtocols,

    /// Automatically reconnect once if the card is reset mid-exchange
    pub auto_reconnect: bool,
}

impl Default for PcscConfig {
    /// Shared access, T=0 or T=1, no automatic reconnect
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Shared,
            protocols: PcscProtocols::T0 | PcscProtocols::T1,
            auto_reconnect: false,
        }
    }
}

impl PcscConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the preferred protocols
    pub const fn with_protocols(mut self, protocols: PcscProtocols) -> Self {
        self.protocols = protocols;
        self
    }

    /// Set whether to automatically reconnect
    pub const fn with_auto_reconnect(mut self, auto_reconnect: bool) -> Self {
        self.auto_reconnect = auto_reconnect;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_shared_dual_protocol() {
        let config = PcscConfig::default();
        assert_eq!(config.share_mode, ShareMode::Shared);
        assert!(config.protocols.contains(PcscProtocols::T0));
        assert!(config.protocols.contains(PcscProtocols::T1));
        assert!(!config.auto_reconnect);
    }

    #[test]
    fn test_builders() {
        let config = PcscConfig::new()
            .with_share_mode(ShareMode::Exclusive)
            .with_protocols(PcscProtocols::T1)
            .with_auto_reconnect(true);
        assert_eq!(config.share_mode, ShareMode::Exclusive);
        assert_eq!(config.protocols, PcscProtocols::T1);
        assert!(config.auto_reconnect);
    }
}
