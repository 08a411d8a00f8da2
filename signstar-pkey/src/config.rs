//! Configuration of the command line interface.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{DsaKeySize, MIN_RSA_BIT_LENGTH, MessageDigest};

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A config loading error
    #[error("Config loading issue: {0}")]
    Load(#[source] confy::ConfyError),

    /// A config storing error
    #[error("Config storing issue: {0}")]
    Store(#[source] confy::ConfyError),
}

/// The defaults used when creating keys and signatures.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// The message digest used for signing and verification.
    pub digest: MessageDigest,

    /// The bit length of generated RSA keys.
    pub rsa_bits: usize,

    /// The size of generated DSA keys.
    pub dsa_key_size: DsaKeySize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            digest: MessageDigest::default(),
            rsa_bits: MIN_RSA_BIT_LENGTH,
            dsa_key_size: DsaKeySize::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from `path` or the default location
    ///
    /// The default location is `~/.config/signstar-pkey/config.toml` (on Linux).
    /// A default configuration file is created if none is found.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration can not be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        if let Some(path) = path {
            confy::load_path(path).map_err(Error::Load)
        } else {
            confy::load(env!("CARGO_PKG_NAME"), "config").map_err(Error::Load)
        }
    }

    /// Writes the configuration to `path` or the default location
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration can not be written to file.
    pub fn store(&self, path: Option<&Path>) -> Result<(), Error> {
        if let Some(path) = path {
            confy::store_path(path, self).map_err(Error::Store)
        } else {
            confy::store(env!("CARGO_PKG_NAME"), "config", self).map_err(Error::Store)
        }
    }
}
