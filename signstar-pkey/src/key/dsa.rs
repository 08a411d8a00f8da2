//! DSA keys.

use std::fmt::Debug;

use dsa::{Components, KeySize, SigningKey, VerifyingKey};
use log::warn;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    KeyAlgorithm,
    key::{KeyMaterial, PrivateKeyHandle, PublicKeyHandle, REDACTED},
    text::write_component,
};

/// The size of a DSA key as bit lengths of the prime `p` and the subprime `q`.
///
/// See [FIPS 186-4](https://nvlpubs.nist.gov/nistpubs/FIPS/NIST.FIPS.186-4.pdf), section 4.2.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
pub enum DsaKeySize {
    /// A 1024 bit prime with a 160 bit subprime.
    ///
    /// Only suitable for verifying legacy signatures.
    #[serde(rename = "1024-160")]
    #[strum(serialize = "1024-160")]
    L1024N160,

    /// A 2048 bit prime with a 224 bit subprime.
    #[serde(rename = "2048-224")]
    #[strum(serialize = "2048-224")]
    L2048N224,

    /// A 2048 bit prime with a 256 bit subprime.
    #[default]
    #[serde(rename = "2048-256")]
    #[strum(serialize = "2048-256")]
    L2048N256,

    /// A 3072 bit prime with a 256 bit subprime.
    #[serde(rename = "3072-256")]
    #[strum(serialize = "3072-256")]
    L3072N256,
}

impl From<DsaKeySize> for KeySize {
    #[allow(deprecated)]
    fn from(value: DsaKeySize) -> Self {
        match value {
            DsaKeySize::L1024N160 => KeySize::DSA_1024_160,
            DsaKeySize::L2048N224 => KeySize::DSA_2048_224,
            DsaKeySize::L2048N256 => KeySize::DSA_2048_256,
            DsaKeySize::L3072N256 => KeySize::DSA_3072_256,
        }
    }
}

/// A DSA key.
///
/// Always holds a verifying key and optionally the matching signing key.
#[derive(Clone)]
pub struct DsaKey {
    public: VerifyingKey,
    private: Option<SigningKey>,
}

impl DsaKey {
    /// Generates new domain parameters of `size` and a key pair for them.
    ///
    /// Parameter generation for large sizes is slow.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R, size: DsaKeySize) -> Self {
        if size == DsaKeySize::L1024N160 {
            warn!("Generating a DSA key of legacy size {size}");
        }

        let components = Components::generate(&mut *rng, size.into());
        SigningKey::generate(&mut *rng, components).into()
    }

    /// Creates a [`DsaKey`] from ASN.1 DER encoded data.
    ///
    /// Accepts a PKCS#8 private key or an X.509 SubjectPublicKeyInfo.
    ///
    /// # Errors
    ///
    /// Returns an error if `der` is neither of the supported formats.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        if let Ok(private) = SigningKey::from_pkcs8_der(der) {
            return Ok(private.into());
        }
        VerifyingKey::from_public_key_der(der)
            .map(Self::from)
            .map_err(|_| Error::UnsupportedKeyFormat {
                context: "decoding a DSA key from DER",
            })
    }

    /// Creates a [`DsaKey`] from PEM encoded data.
    ///
    /// # Errors
    ///
    /// Returns an error if `pem` is neither a PKCS#8 private key nor a public key.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        if let Ok(private) = SigningKey::from_pkcs8_pem(pem) {
            return Ok(private.into());
        }
        VerifyingKey::from_public_key_pem(pem)
            .map(Self::from)
            .map_err(|_| Error::UnsupportedKeyFormat {
                context: "decoding a DSA key from PEM",
            })
    }

    /// Returns the verifying key.
    pub fn public(&self) -> &VerifyingKey {
        &self.public
    }

    /// Returns the signing key, if one is present.
    pub fn private(&self) -> Option<&SigningKey> {
        self.private.as_ref()
    }

    /// Returns a copy of the key, which only contains the verifying key.
    pub fn public_key(&self) -> Self {
        self.public.clone().into()
    }

    /// Returns the bit length of the prime `p`.
    pub fn bits(&self) -> usize {
        self.public.components().p().bits()
    }
}

impl Debug for DsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DsaKey")
            .field("bits", &self.bits())
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl From<SigningKey> for DsaKey {
    fn from(value: SigningKey) -> Self {
        Self {
            public: value.verifying_key().clone(),
            private: Some(value),
        }
    }
}

impl From<VerifyingKey> for DsaKey {
    fn from(value: VerifyingKey) -> Self {
        Self {
            public: value,
            private: None,
        }
    }
}

impl KeyMaterial for DsaKey {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Dsa
    }

    fn public_key_handle(&self) -> Option<PublicKeyHandle<'_>> {
        Some(PublicKeyHandle::Dsa(&self.public))
    }

    fn private_key_handle(&self) -> Option<PrivateKeyHandle<'_>> {
        self.private.as_ref().map(PrivateKeyHandle::Dsa)
    }

    fn is_private(&self) -> bool {
        self.private.is_some()
    }

    fn is_public(&self) -> bool {
        true
    }

    /// Returns a PKCS#8 `PrivateKeyInfo` if the signing key is present and an X.509
    /// SubjectPublicKeyInfo otherwise.
    fn to_der(&self) -> Result<Vec<u8>, Error> {
        if let Some(private) = self.private.as_ref() {
            private
                .to_pkcs8_der()
                .map(|der| der.as_bytes().to_vec())
                .map_err(|error| Error::Encoding {
                    context: "encoding a DSA private key as PKCS#8 DER",
                    source: Box::new(error),
                })
        } else {
            self.public
                .to_public_key_der()
                .map(|der| der.as_bytes().to_vec())
                .map_err(|error| Error::Encoding {
                    context: "encoding a DSA public key as DER",
                    source: Box::new(error),
                })
        }
    }

    fn to_pem(&self) -> Result<String, Error> {
        if let Some(private) = self.private.as_ref() {
            private
                .to_pkcs8_pem(LineEnding::LF)
                .map(|pem| String::from(pem.as_str()))
                .map_err(|error| Error::Encoding {
                    context: "encoding a DSA private key as PKCS#8 PEM",
                    source: Box::new(error),
                })
        } else {
            self.public
                .to_public_key_pem(LineEnding::LF)
                .map_err(|error| Error::Encoding {
                    context: "encoding a DSA public key as PEM",
                    source: Box::new(error),
                })
        }
    }

    fn to_text(&self) -> String {
        let components = self.public.components();
        let mut out = String::new();
        if let Some(private) = self.private.as_ref() {
            out.push_str(&format!("Private-Key: ({} bit)\n", self.bits()));
            write_component(&mut out, "priv", private.x());
        } else {
            out.push_str(&format!("Public-Key: ({} bit)\n", self.bits()));
        }
        write_component(&mut out, "pub", self.public.y());
        write_component(&mut out, "P", components.p());
        write_component(&mut out, "Q", components.q());
        write_component(&mut out, "G", components.g());
        out
    }
}
