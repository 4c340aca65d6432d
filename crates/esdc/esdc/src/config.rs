//! Session configuration

use bytes::Bytes;
use serde::{Deserialize, Deserializer, de};

use crate::constants::ESDC_AID;
use crate::fields::Pin;

/// Configuration passed to [`DeviceSession::open`](crate::DeviceSession::open)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// PIN presented to the secure element
    pub pin: Pin,

    /// Application identifier to select, as hex in configuration files
    #[serde(default = "default_aid", deserialize_with = "deserialize_aid")]
    pub aid: Bytes,

    /// Only probe this reader instead of every attached reader
    #[serde(default)]
    pub reader: Option<String>,
}

impl SessionConfig {
    /// Create a configuration that probes every reader for the fiscal application
    pub fn new(pin: Pin) -> Self {
        Self {
            pin,
            aid: default_aid(),
            reader: None,
        }
    }

    /// Select a different application identifier
    pub fn with_aid(mut self, aid: impl Into<Bytes>) -> Self {
        self.aid = aid.into();
        self
    }

    /// Only probe the named reader
    pub fn with_reader(mut self, reader: impl Into<String>) -> Self {
        self.reader = Some(reader.into());
        self
    }
}

const fn default_aid() -> Bytes {
    Bytes::from_static(ESDC_AID)
}

fn deserialize_aid<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes, D::Error> {
    let aid = String::deserialize(deserializer)?;
    hex::decode(aid.trim())
        .map(Bytes::from)
        .map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_defaults() {
        let config: SessionConfig = toml::from_str("pin = \"1234\"").unwrap();
        assert_eq!(config.pin.digits(), &[1, 2, 3, 4]);
        assert_eq!(config.aid.as_ref(), ESDC_AID);
        assert_eq!(config.reader, None);
        assert_eq!(config, SessionConfig::new("1234".parse().unwrap()));
    }

    #[test]
    fn test_overrides() {
        let config: SessionConfig = toml::from_str(
            r#"
            pin = "0000"
            aid = "A0000000030000"
            reader = "ACS ACR39U 00 00"
            "#,
        )
        .unwrap();
        assert_eq!(config.pin.digits(), &[0, 0, 0, 0]);
        assert_eq!(config.aid.as_ref(), hex!("A0000000030000"));
        assert_eq!(config.reader.as_deref(), Some("ACS ACR39U 00 00"));
    }

    #[test]
    fn test_invalid_aid() {
        assert!(toml::from_str::<SessionConfig>("pin = \"1\"\naid = \"XYZ\"").is_err());
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::new("1".parse().unwrap())
            .with_aid(vec![0xA0, 0x01])
            .with_reader("Reader 1");
        assert_eq!(config.aid.as_ref(), &[0xA0, 0x01]);
        assert_eq!(config.reader.as_deref(), Some("Reader 1"));
    }
}
