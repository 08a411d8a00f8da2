//! Key material of the supported public key algorithms.

pub mod dh;
pub mod dsa;
pub mod rsa;

use std::fmt::Debug;

pub use self::dh::DhKey;
pub use self::dsa::{DsaKey, DsaKeySize};
pub use self::rsa::{MIN_RSA_BIT_LENGTH, RsaKey};

use crate::{Error, KeyAlgorithm};

/// The string used in place of private key material in debug output.
pub(crate) const REDACTED: &str = "[REDACTED]";

/// A borrowed public key usable for signature verification.
#[derive(Clone, Copy)]
pub enum PublicKeyHandle<'a> {
    /// An RSA public key.
    Rsa(&'a ::rsa::RsaPublicKey),

    /// A DSA verifying key.
    Dsa(&'a ::dsa::VerifyingKey),
}

impl PublicKeyHandle<'_> {
    /// Returns the [`KeyAlgorithm`] of the key.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Rsa(_) => KeyAlgorithm::Rsa,
            Self::Dsa(_) => KeyAlgorithm::Dsa,
        }
    }
}

impl Debug for PublicKeyHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PublicKeyHandle")
            .field(&self.algorithm().name())
            .finish()
    }
}

/// A borrowed private key usable for signing.
#[derive(Clone, Copy)]
pub enum PrivateKeyHandle<'a> {
    /// An RSA private key.
    Rsa(&'a ::rsa::RsaPrivateKey),

    /// A DSA signing key.
    Dsa(&'a ::dsa::SigningKey),
}

impl PrivateKeyHandle<'_> {
    /// Returns the [`KeyAlgorithm`] of the key.
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            Self::Rsa(_) => KeyAlgorithm::Rsa,
            Self::Dsa(_) => KeyAlgorithm::Dsa,
        }
    }
}

impl Debug for PrivateKeyHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrivateKeyHandle")
            .field(&self.algorithm().name())
            .field(&REDACTED)
            .finish()
    }
}

/// The capabilities of a key variant.
///
/// The provided methods describe a key without a specific algorithm: it has the algorithm
/// [`KeyAlgorithm::None`] and neither a public nor a private key handle.
/// Such a key can answer capability queries, but can not be used for signing or verification.
/// Key variants usable for signatures override these methods.
pub trait KeyMaterial {
    /// Returns the algorithm of the key.
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::None
    }

    /// Returns the public key handle, if one is present.
    fn public_key_handle(&self) -> Option<PublicKeyHandle<'_>> {
        None
    }

    /// Returns the private key handle, if one is present.
    fn private_key_handle(&self) -> Option<PrivateKeyHandle<'_>> {
        None
    }

    /// Returns whether the key currently holds usable private material.
    fn is_private(&self) -> bool;

    /// Returns whether the key currently holds public material.
    fn is_public(&self) -> bool;

    /// Returns the canonical ASN.1 DER encoding of the key.
    ///
    /// The encoding is a deterministic function of the key material.
    ///
    /// # Errors
    ///
    /// Returns an error if the key material can not be encoded.
    fn to_der(&self) -> Result<Vec<u8>, Error>;

    /// Returns the PEM encoding of the key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key material can not be encoded.
    fn to_pem(&self) -> Result<String, Error>;

    /// Returns a human-readable dump of the key components.
    fn to_text(&self) -> String;
}
