//! Diffie-Hellman keys.
//!
//! Diffie-Hellman keys are used for key agreement only.
//! They have no signature algorithm, so signing and verification with them is unavailable.

use std::fmt::Debug;

use der::{
    Decode,
    DecodePem,
    Encode,
    EncodePem,
    Sequence,
    asn1::Uint,
    pem::{LineEnding, PemLabel},
};
use rand::{CryptoRng, RngCore};
use rsa::BigUint;

use crate::{
    Error,
    key::{KeyMaterial, REDACTED},
    text::{write_component, write_integer},
};

/// The PKCS#3 `DHParameter` structure.
///
/// ```text
/// DHParameter ::= SEQUENCE {
///   prime INTEGER, -- p
///   base INTEGER, -- g
///   privateValueLength INTEGER OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct DhParameter {
    prime: Uint,
    base: Uint,
    #[asn1(optional = "true")]
    private_value_length: Option<u32>,
}

impl PemLabel for DhParameter {
    const PEM_LABEL: &'static str = "DH PARAMETERS";
}

/// A Diffie-Hellman key.
///
/// Consists of the domain parameters `p` (prime) and `g` (generator), an optional public value
/// and an optional private value.
#[derive(Clone)]
pub struct DhKey {
    prime: BigUint,
    generator: BigUint,
    public: Option<BigUint>,
    private: Option<BigUint>,
}

impl DhKey {
    /// Creates a [`DhKey`] from the domain parameters `prime` and `generator`.
    ///
    /// The key holds neither a public nor a private value.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters fail [`DhKey::check_params`].
    ///
    /// # Examples
    ///
    /// ```
    /// use rsa::BigUint;
    /// use signstar_pkey::{DhKey, KeyMaterial};
    ///
    /// # fn main() -> testresult::TestResult {
    /// let key = DhKey::new(BigUint::from(23u32), BigUint::from(5u32))?;
    /// assert!(!key.is_private());
    /// assert!(!key.is_public());
    ///
    /// assert!(DhKey::new(BigUint::from(24u32), BigUint::from(5u32)).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(prime: BigUint, generator: BigUint) -> Result<Self, Error> {
        let key = Self {
            prime,
            generator,
            public: None,
            private: None,
        };
        key.check_params()?;
        Ok(key)
    }

    /// Generates a fresh key pair for the domain parameters of `params`.
    ///
    /// The private value is chosen from `[2, p - 2]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters of `params` fail [`DhKey::check_params`].
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R, params: &DhKey) -> Result<Self, Error> {
        params.check_params()?;

        // sample twice the size of p to keep the modulo bias negligible
        let mut bytes = vec![0; params.prime.bits().div_ceil(8) * 2];
        rng.fill_bytes(&mut bytes);
        let two = BigUint::from(2u32);
        let range = &params.prime - BigUint::from(3u32);
        let private = BigUint::from_bytes_be(&bytes) % &range + &two;
        let public = params.generator.modpow(&private, &params.prime);

        Ok(Self {
            prime: params.prime.clone(),
            generator: params.generator.clone(),
            public: Some(public),
            private: Some(private),
        })
    }

    /// Creates a [`DhKey`] from ASN.1 DER encoded PKCS#3 `DHParameter`.
    ///
    /// # Errors
    ///
    /// Returns an error if `der` is no `DHParameter` or the parameters are invalid.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let params = DhParameter::from_der(der).map_err(|_| Error::UnsupportedKeyFormat {
            context: "decoding Diffie-Hellman parameters from DER",
        })?;
        Self::from_parameter(params)
    }

    /// Creates a [`DhKey`] from PEM encoded PKCS#3 `DHParameter`.
    ///
    /// # Errors
    ///
    /// Returns an error if `pem` is no `DHParameter` or the parameters are invalid.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        let params = DhParameter::from_pem(pem).map_err(|_| Error::UnsupportedKeyFormat {
            context: "decoding Diffie-Hellman parameters from PEM",
        })?;
        Self::from_parameter(params)
    }

    fn from_parameter(params: DhParameter) -> Result<Self, Error> {
        Self::new(
            BigUint::from_bytes_be(params.prime.as_bytes()),
            BigUint::from_bytes_be(params.base.as_bytes()),
        )
    }

    fn to_parameter(&self) -> Result<DhParameter, Error> {
        let encode = |value: &BigUint| {
            Uint::new(&value.to_bytes_be()).map_err(|error| Error::Encoding {
                context: "encoding Diffie-Hellman parameters",
                source: Box::new(error),
            })
        };

        Ok(DhParameter {
            prime: encode(&self.prime)?,
            base: encode(&self.generator)?,
            private_value_length: None,
        })
    }

    /// Checks the domain parameters.
    ///
    /// The prime must be odd and larger than 3, the generator must lie in `(1, p - 1)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid.
    pub fn check_params(&self) -> Result<(), Error> {
        let one = BigUint::from(1u32);
        let two = BigUint::from(2u32);
        if self.prime <= BigUint::from(3u32) || &self.prime % &two != one {
            return Err(Error::InvalidParameters {
                context: "the Diffie-Hellman prime must be odd and larger than 3".to_string(),
            });
        }
        if self.generator <= one || self.generator >= &self.prime - &one {
            return Err(Error::InvalidParameters {
                context: "the Diffie-Hellman generator must lie in (1, p - 1)".to_string(),
            });
        }
        Ok(())
    }

    /// Computes the shared secret with the public value of a peer.
    ///
    /// The secret is returned as big-endian bytes without leading zeros.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - the key has no private value,
    /// - or `peer_public` does not lie in `(1, p - 1)`.
    pub fn compute_key(&self, peer_public: &BigUint) -> Result<Vec<u8>, Error> {
        let private = self.private.as_ref().ok_or(Error::PrivateKeyRequired)?;

        let one = BigUint::from(1u32);
        if peer_public <= &one || peer_public >= &(&self.prime - &one) {
            return Err(Error::InvalidKey {
                message: "the peer public value must lie in (1, p - 1)".to_string(),
            });
        }

        Ok(peer_public.modpow(private, &self.prime).to_bytes_be())
    }

    /// Returns the prime `p`.
    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    /// Returns the generator `g`.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// Returns the public value, if one is present.
    pub fn public(&self) -> Option<&BigUint> {
        self.public.as_ref()
    }

    /// Returns a copy of the key, which only contains the domain parameters and the public value.
    pub fn public_key(&self) -> Self {
        Self {
            prime: self.prime.clone(),
            generator: self.generator.clone(),
            public: self.public.clone(),
            private: None,
        }
    }

    /// Returns the bit length of the prime.
    pub fn bits(&self) -> usize {
        self.prime.bits()
    }
}

impl Debug for DhKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhKey")
            .field("bits", &self.bits())
            .field("generator", &self.generator)
            .field("public", &self.public)
            .field("private", &self.private.as_ref().map(|_| REDACTED))
            .finish()
    }
}

impl KeyMaterial for DhKey {
    fn is_private(&self) -> bool {
        self.private.is_some()
    }

    fn is_public(&self) -> bool {
        self.public.is_some()
    }

    /// Returns the PKCS#3 `DHParameter` of the key.
    ///
    /// Public and private values are not part of the encoding.
    fn to_der(&self) -> Result<Vec<u8>, Error> {
        self.to_parameter()?
            .to_der()
            .map_err(|error| Error::Encoding {
                context: "encoding Diffie-Hellman parameters as DER",
                source: Box::new(error),
            })
    }

    fn to_pem(&self) -> Result<String, Error> {
        self.to_parameter()?
            .to_pem(LineEnding::LF)
            .map_err(|error| Error::Encoding {
                context: "encoding Diffie-Hellman parameters as PEM",
                source: Box::new(error),
            })
    }

    fn to_text(&self) -> String {
        let mut out = format!("DH Parameters: ({} bit)\n", self.bits());
        write_component(&mut out, "prime", &self.prime);
        write_integer(&mut out, "generator", &self.generator);
        if let Some(public) = self.public.as_ref() {
            write_component(&mut out, "public-key", public);
        }
        if let Some(private) = self.private.as_ref() {
            write_component(&mut out, "private-key", private);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use rstest::{fixture, rstest};
    use testresult::TestResult;

    use super::*;
    use crate::KeyAlgorithm;

    /// Parameters with the Mersenne prime 2^127 - 1.
    #[fixture]
    fn params() -> DhKey {
        let prime = (BigUint::from(1u32) << 127usize) - BigUint::from(1u32);
        DhKey::new(prime, BigUint::from(3u32)).expect("valid parameters")
    }

    #[rstest]
    #[case(23, 5)]
    #[case(7, 2)]
    fn valid_parameters(#[case] prime: u32, #[case] generator: u32) {
        assert!(DhKey::new(BigUint::from(prime), BigUint::from(generator)).is_ok());
    }

    #[rstest]
    #[case::even_prime(24, 5)]
    #[case::tiny_prime(3, 2)]
    #[case::generator_one(23, 1)]
    #[case::generator_p_minus_one(23, 22)]
    #[case::generator_too_large(23, 30)]
    fn invalid_parameters(#[case] prime: u32, #[case] generator: u32) {
        assert!(matches!(
            DhKey::new(BigUint::from(prime), BigUint::from(generator)),
            Err(Error::InvalidParameters { .. })
        ));
    }

    #[rstest]
    fn shared_secret_agrees(params: DhKey) -> TestResult {
        let alice = DhKey::generate(&mut OsRng, &params)?;
        let bob = DhKey::generate(&mut OsRng, &params)?;
        let alice_public = alice.public().ok_or("public value missing")?;
        let bob_public = bob.public().ok_or("public value missing")?;

        assert_eq!(alice.compute_key(bob_public)?, bob.compute_key(alice_public)?);
        Ok(())
    }

    #[rstest]
    fn compute_key_requires_private_value(params: DhKey) -> TestResult {
        let key = DhKey::generate(&mut OsRng, &params)?;
        let public_key = key.public_key();
        assert!(public_key.is_public());
        assert!(!public_key.is_private());

        let peer = BigUint::from(5u32);
        assert!(matches!(
            public_key.compute_key(&peer),
            Err(Error::PrivateKeyRequired)
        ));
        Ok(())
    }

    #[rstest]
    #[case::zero(BigUint::from(0u32))]
    #[case::one(BigUint::from(1u32))]
    #[case::p_minus_one((BigUint::from(1u32) << 127usize) - BigUint::from(2u32))]
    fn compute_key_rejects_peer(params: DhKey, #[case] peer: BigUint) -> TestResult {
        let key = DhKey::generate(&mut OsRng, &params)?;
        assert!(matches!(
            key.compute_key(&peer),
            Err(Error::InvalidKey { .. })
        ));
        Ok(())
    }

    #[rstest]
    fn has_no_signature_algorithm(params: DhKey) -> TestResult {
        let key = DhKey::generate(&mut OsRng, &params)?;
        assert_eq!(key.algorithm(), KeyAlgorithm::None);
        assert_eq!(key.algorithm().name(), "NONE");
        assert!(key.public_key_handle().is_none());
        assert!(key.private_key_handle().is_none());
        Ok(())
    }

    #[rstest]
    fn der_contains_parameters_only(params: DhKey) -> TestResult {
        let key = DhKey::generate(&mut OsRng, &params)?;
        let der = key.to_der()?;
        assert_eq!(der, params.to_der()?);

        let decoded = DhKey::from_der(&der)?;
        assert_eq!(decoded.prime(), params.prime());
        assert_eq!(decoded.generator(), params.generator());
        assert!(!decoded.is_public());
        assert!(!decoded.is_private());
        Ok(())
    }

    #[test]
    fn der_of_small_parameters() -> TestResult {
        let key = DhKey::new(BigUint::from(23u32), BigUint::from(5u32))?;
        assert_eq!(key.to_der()?, [0x30, 0x06, 0x02, 0x01, 0x17, 0x02, 0x01, 0x05]);
        Ok(())
    }

    #[rstest]
    fn pem_decodes(params: DhKey) -> TestResult {
        let pem = params.to_pem()?;
        assert!(pem.starts_with("-----BEGIN DH PARAMETERS-----"));
        assert_eq!(DhKey::from_pem(&pem)?.to_der()?, params.to_der()?);
        Ok(())
    }

    #[rstest]
    fn text_lists_values(params: DhKey) -> TestResult {
        let key = DhKey::generate(&mut OsRng, &params)?;
        let text = key.to_text();
        assert!(text.starts_with("DH Parameters: (127 bit)\nprime:\n    7f:ff:"));
        assert!(text.contains("generator: 3 (0x3)\n"));
        assert!(text.contains("public-key:\n"));
        assert!(text.contains("private-key:\n"));
        assert!(!key.public_key().to_text().contains("private-key:"));
        Ok(())
    }
}
