//! CLI settings
//!
//! Settings come from a TOML file, then `ESDC_` environment variables, then
//! command-line flags, each overriding the previous one.

use std::path::Path;

use esdc::{Pin, SessionConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

/// Environment variable holding the PIN, read verbatim
const PIN_ENV: &str = "ESDC_PIN";

/// Settings shared by the subcommands
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Settings {
    /// PIN of the secure element
    #[serde(default)]
    pub(crate) pin: Option<Pin>,

    /// Application identifier as hex, if not the fiscal applet's
    #[serde(default)]
    pub(crate) aid: Option<String>,

    /// Reader to use instead of probing all of them
    #[serde(default)]
    pub(crate) reader: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Default, Serialize)]
pub(crate) struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reader: Option<String>,
}

impl Settings {
    /// Load settings from `path`, the environment and `overrides`
    ///
    /// A missing file is not an error.
    pub(crate) fn load(path: &Path, overrides: Overrides) -> eyre::Result<Self> {
        Self::figment(path, overrides).extract().map_err(Into::into)
    }

    fn figment(path: &Path, overrides: Overrides) -> Figment {
        let mut figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ESDC_").ignore(&["pin"]));

        // `Env` would parse `0123` as an integer
        if let Ok(pin) = std::env::var(PIN_ENV) {
            figment = figment.merge(Serialized::default("pin", pin));
        }

        figment.merge(Serialized::defaults(overrides))
    }

    /// The application identifier to select
    pub(crate) fn aid(&self) -> eyre::Result<Vec<u8>> {
        match &self.aid {
            Some(aid) => Ok(hex::decode(aid.trim())?),
            None => Ok(esdc::ESDC_AID.to_vec()),
        }
    }

    /// Session configuration; requires a PIN
    pub(crate) fn session_config(&self) -> eyre::Result<SessionConfig> {
        let pin = self.pin.clone().ok_or_else(|| {
            eyre::eyre!("no PIN configured; set `pin` in the config file, ESDC_PIN or --pin")
        })?;

        let mut config = SessionConfig::new(pin).with_aid(self.aid()?);
        if let Some(reader) = &self.reader {
            config = config.with_reader(reader.clone());
        }
        Ok(config)
    }
}
