//! RSA keys.

use std::fmt::Debug;

use log::warn;
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rand::{CryptoRng, RngCore};
use rsa::{
    BigUint,
    RsaPrivateKey,
    RsaPublicKey,
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey},
    traits::{PrivateKeyParts, PublicKeyParts},
};

use crate::{
    Error,
    KeyAlgorithm,
    key::{KeyMaterial, PrivateKeyHandle, PublicKeyHandle, REDACTED},
    text::{write_component, write_integer},
};

/// The minimum recommended bit length for an RSA key
///
/// This follows recommendations from [NIST Special Publication 800-57 Part 3 Revision 1](https://nvlpubs.nist.gov/nistpubs/SpecialPublications/NIST.SP.800-57Pt3r1.pdf) (January 2015).
pub const MIN_RSA_BIT_LENGTH: usize = 2048;

/// An RSA key.
///
/// Always holds a public key and optionally the matching private key.
#[derive(Clone)]
pub struct RsaKey {
    public: RsaPublicKey,
    private: Option<RsaPrivateKey>,
}

impl RsaKey {
    /// Generates a new RSA key pair with a modulus of `bits` bits.
    ///
    /// Emits a warning if `bits` is shorter than [`MIN_RSA_BIT_LENGTH`].
    ///
    /// # Errors
    ///
    /// Returns an error if no key can be generated for `bits`.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> Result<Self, Error> {
        if bits < MIN_RSA_BIT_LENGTH {
            warn!(
                "Generating an RSA key of {bits} bits, which is shorter than the recommended {MIN_RSA_BIT_LENGTH} bits"
            );
        }

        let private =
            RsaPrivateKey::new(&mut *rng, bits).map_err(|error| Error::InvalidParameters {
                context: format!("generating a {bits} bit RSA key failed: {error}"),
            })?;
        Ok(private.into())
    }

    /// Creates an [`RsaKey`] from ASN.1 DER encoded data.
    ///
    /// Accepts (in this order) a PKCS#1 private key, a PKCS#8 private key, an X.509
    /// SubjectPublicKeyInfo or a PKCS#1 public key.
    ///
    /// # Errors
    ///
    /// Returns an error if `der` is none of the supported formats.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        if let Some(key) = Self::from_distinct_der(der) {
            return Ok(key);
        }
        RsaPublicKey::from_pkcs1_der(der)
            .map(Self::from)
            .map_err(|_| Error::UnsupportedKeyFormat {
                context: "decoding an RSA key from DER",
            })
    }

    /// Decodes the DER formats, which can not be mistaken for another key type.
    ///
    /// A PKCS#1 `RSAPublicKey` has the same structure as a PKCS#3 `DHParameter` and is therefore
    /// not considered.
    pub(crate) fn from_distinct_der(der: &[u8]) -> Option<Self> {
        if let Ok(private) = RsaPrivateKey::from_pkcs1_der(der) {
            return Some(private.into());
        }
        if let Ok(private) = RsaPrivateKey::from_pkcs8_der(der) {
            return Some(private.into());
        }
        RsaPublicKey::from_public_key_der(der).ok().map(Self::from)
    }

    /// Creates an [`RsaKey`] from PEM encoded data.
    ///
    /// Accepts the same formats as [`RsaKey::from_der`].
    ///
    /// # Errors
    ///
    /// Returns an error if `pem` is none of the supported formats.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        if let Ok(private) = RsaPrivateKey::from_pkcs1_pem(pem) {
            return Ok(private.into());
        }
        if let Ok(private) = RsaPrivateKey::from_pkcs8_pem(pem) {
            return Ok(private.into());
        }
        if let Ok(public) = RsaPublicKey::from_public_key_pem(pem) {
            return Ok(public.into());
        }
        RsaPublicKey::from_pkcs1_pem(pem)
            .map(Self::from)
            .map_err(|_| Error::UnsupportedKeyFormat {
                context: "decoding an RSA key from PEM",
            })
    }

    /// Returns the public key.
    pub fn public(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Returns the private key, if one is present.
    pub fn private(&self) -> Option<&RsaPrivateKey> {
        self.private.as_ref()
    }

    /// Returns a copy of the key, which only contains the public key.
    pub fn public_key(&self) -> Self {
        self.public.clone().into()
    }

    /// Returns the bit length of the modulus.
    pub fn bits(&self) -> usize {
        self.public.n().bits()
    }

    fn write_private_components(out: &mut String, private: &RsaPrivateKey) {
        write_component(out, "privateExponent", private.d());

        let [p, q, ..] = private.primes() else {
            return;
        };
        let one = BigUint::from(1u32);
        let two = BigUint::from(2u32);
        write_component(out, "prime1", p);
        write_component(out, "prime2", q);
        write_component(out, "exponent1", &(private.d() % &(p - &one)));
        write_component(out, "exponent2", &(private.d() % &(q - &one)));
        // p is prime, so q^(p - 2) is the inverse of q modulo p
        write_component(out, "coefficient", &q.modpow(&(p - &two), p));
    }
}

impl Debug for RsaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaKey")
            .field("bits", &self.bits())
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl From<RsaPrivateKey> for RsaKey {
    fn from(value: RsaPrivateKey) -> Self {
        Self {
            public: value.to_public_key(),
            private: Some(value),
        }
    }
}

impl From<RsaPublicKey> for RsaKey {
    fn from(value: RsaPublicKey) -> Self {
        Self {
            public: value,
            private: None,
        }
    }
}

impl KeyMaterial for RsaKey {
    fn algorithm(&self) -> KeyAlgorithm {
        KeyAlgorithm::Rsa
    }

    fn public_key_handle(&self) -> Option<PublicKeyHandle<'_>> {
        Some(PublicKeyHandle::Rsa(&self.public))
    }

    fn private_key_handle(&self) -> Option<PrivateKeyHandle<'_>> {
        self.private.as_ref().map(PrivateKeyHandle::Rsa)
    }

    fn is_private(&self) -> bool {
        self.private.is_some()
    }

    fn is_public(&self) -> bool {
        true
    }

    /// Returns a PKCS#1 `RSAPrivateKey` if the private key is present and an X.509
    /// SubjectPublicKeyInfo otherwise.
    fn to_der(&self) -> Result<Vec<u8>, Error> {
        if let Some(private) = self.private.as_ref() {
            private
                .to_pkcs1_der()
                .map(|der| der.as_bytes().to_vec())
                .map_err(|error| Error::Encoding {
                    context: "encoding an RSA private key as PKCS#1 DER",
                    source: Box::new(error),
                })
        } else {
            self.public
                .to_public_key_der()
                .map(|der| der.as_bytes().to_vec())
                .map_err(|error| Error::Encoding {
                    context: "encoding an RSA public key as DER",
                    source: Box::new(error),
                })
        }
    }

    fn to_pem(&self) -> Result<String, Error> {
        if let Some(private) = self.private.as_ref() {
            private
                .to_pkcs1_pem(LineEnding::LF)
                .map(|pem| String::from(pem.as_str()))
                .map_err(|error| Error::Encoding {
                    context: "encoding an RSA private key as PKCS#1 PEM",
                    source: Box::new(error),
                })
        } else {
            self.public
                .to_public_key_pem(LineEnding::LF)
                .map_err(|error| Error::Encoding {
                    context: "encoding an RSA public key as PEM",
                    source: Box::new(error),
                })
        }
    }

    fn to_text(&self) -> String {
        let mut out = String::new();
        if let Some(private) = self.private.as_ref() {
            out.push_str(&format!("Private-Key: ({} bit)\n", self.bits()));
            write_component(&mut out, "modulus", self.public.n());
            write_integer(&mut out, "publicExponent", self.public.e());
            Self::write_private_components(&mut out, private);
        } else {
            out.push_str(&format!("Public-Key: ({} bit)\n", self.bits()));
            write_component(&mut out, "Modulus", self.public.n());
            write_integer(&mut out, "Exponent", self.public.e());
        }
        out
    }
}
