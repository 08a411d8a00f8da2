//! Signature engines backed by the RustCrypto primitives.
//!
//! A [`SignatureEngine`] is resolved from a signature algorithm identifier (e.g.
//! `SHA256WITHRSA`), initialized for signing or verification with a key handle, fed with data and
//! finally used to create or verify a signature.
//! Engines are never shared: every signing or verification creates its own.

use std::str::FromStr;

use log::debug;
use rsa::{
    BigUint,
    Pkcs1v15Sign,
    RsaPrivateKey,
    RsaPublicKey,
    traits::PublicKeyParts,
};
use signature::{DigestSigner, DigestVerifier, SignatureEncoding};

use crate::{
    KeyAlgorithm,
    MessageDigest,
    key::{PrivateKeyHandle, PublicKeyHandle},
    message_digest::Hasher,
};

/// An error that may occur when using a [`SignatureEngine`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No implementation exists for a signature algorithm
    #[error("{algorithm} Signature not available")]
    NoSuchAlgorithm {
        /// The requested signature algorithm identifier.
        algorithm: String,
    },

    /// A key is missing or not suitable for the signature algorithm
    #[error("{0}")]
    InvalidKey(String),

    /// Signature creation or verification failed mechanically
    #[error("{0}")]
    Signature(String),
}

/// The state of a [`SignatureEngine`].
#[derive(Debug)]
enum State<'k> {
    Uninitialized,
    Sign(PrivateKeyHandle<'k>),
    Verify(PublicKeyHandle<'k>),
}

/// An engine creating or verifying signatures of a specific signature algorithm.
#[derive(Debug)]
pub struct SignatureEngine<'k> {
    algorithm: String,
    key_algorithm: KeyAlgorithm,
    hasher: Hasher,
    state: State<'k>,
}

impl<'k> SignatureEngine<'k> {
    /// Resolves a signature algorithm identifier to a new [`SignatureEngine`].
    ///
    /// Identifiers have the form `<DIGEST>WITH<KEY>`.
    /// The supported identifiers are `MD5`, `SHA1`, `SHA224`, `SHA256`, `SHA384` and `SHA512` with
    /// `RSA` (PKCS#1 v1.5) and `SHA1`, `SHA224`, `SHA256`, `SHA384` and `SHA512` with `DSA`.
    ///
    /// # Errors
    ///
    /// Returns an error if no implementation exists for `algorithm`.
    ///
    /// # Examples
    ///
    /// ```
    /// use signstar_pkey::provider::SignatureEngine;
    ///
    /// assert!(SignatureEngine::new("SHA256WITHRSA").is_ok());
    /// assert!(SignatureEngine::new("MD5WITHDSA").is_err());
    /// assert!(SignatureEngine::new("SHA256WITHNONE").is_err());
    /// ```
    pub fn new(algorithm: &str) -> Result<Self, Error> {
        let no_such_algorithm = || Error::NoSuchAlgorithm {
            algorithm: algorithm.to_string(),
        };

        let (digest, key_algorithm) = algorithm.split_once("WITH").ok_or_else(no_such_algorithm)?;
        let digest = MessageDigest::from_str(digest).map_err(|_| no_such_algorithm())?;
        let key_algorithm = match KeyAlgorithm::from_str(key_algorithm) {
            Ok(KeyAlgorithm::Rsa) => KeyAlgorithm::Rsa,
            Ok(KeyAlgorithm::Dsa) if digest != MessageDigest::Md5 => KeyAlgorithm::Dsa,
            _ => return Err(no_such_algorithm()),
        };
        debug!("Resolved signature algorithm {algorithm}");

        Ok(Self {
            algorithm: algorithm.to_string(),
            key_algorithm,
            hasher: Hasher::new(digest),
            state: State::Uninitialized,
        })
    }

    /// Returns the signature algorithm identifier of the engine.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Initializes the engine for signing with a private key.
    ///
    /// Any data fed to the engine so far is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is [`None`], does not match the key algorithm of the engine or is
    /// too short for the signature algorithm.
    pub fn init_sign(&mut self, key: Option<PrivateKeyHandle<'k>>) -> Result<(), Error> {
        let key = key.ok_or_else(|| Error::InvalidKey("no private key present".to_string()))?;
        if key.algorithm() != self.key_algorithm {
            return Err(Error::InvalidKey(format!(
                "a {} private key can not be used with {}",
                key.algorithm(),
                self.algorithm
            )));
        }
        if let PrivateKeyHandle::Rsa(key) = key {
            check_rsa_key_size(key.size(), self.hasher.message_digest())?;
        }
        self.reset();
        self.state = State::Sign(key);
        Ok(())
    }

    /// Initializes the engine for verification with a public key.
    ///
    /// Any data fed to the engine so far is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` is [`None`], does not match the key algorithm of the engine or is
    /// too short for the signature algorithm.
    pub fn init_verify(&mut self, key: Option<PublicKeyHandle<'k>>) -> Result<(), Error> {
        let key = key.ok_or_else(|| Error::InvalidKey("no public key present".to_string()))?;
        if key.algorithm() != self.key_algorithm {
            return Err(Error::InvalidKey(format!(
                "a {} public key can not be used with {}",
                key.algorithm(),
                self.algorithm
            )));
        }
        if let PublicKeyHandle::Rsa(key) = key {
            check_rsa_key_size(key.size(), self.hasher.message_digest())?;
        }
        self.reset();
        self.state = State::Verify(key);
        Ok(())
    }

    /// Feeds `data` to the engine.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Creates a signature over all data fed to the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - the engine is not initialized for signing,
    /// - or the signature can not be created (e.g. because the key is too short for the digest).
    pub fn sign(self) -> Result<Vec<u8>, Error> {
        let State::Sign(key) = self.state else {
            return Err(Error::Signature(
                "signature engine is not initialized for signing".to_string(),
            ));
        };

        match key {
            PrivateKeyHandle::Rsa(key) => rsa_sign(key, self.hasher),
            PrivateKeyHandle::Dsa(key) => dsa_sign(key, self.hasher),
        }
    }

    /// Verifies `signature` over all data fed to the engine.
    ///
    /// Returns `true` if the signature is valid and `false` if a structurally valid signature does
    /// not match the data.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - the engine is not initialized for verification,
    /// - or `signature` is malformed.
    pub fn verify(self, signature: &[u8]) -> Result<bool, Error> {
        let State::Verify(key) = self.state else {
            return Err(Error::Signature(
                "signature engine is not initialized for verification".to_string(),
            ));
        };

        match key {
            PublicKeyHandle::Rsa(key) => rsa_verify(key, self.hasher, signature),
            PublicKeyHandle::Dsa(key) => dsa_verify(key, self.hasher, signature),
        }
    }

    fn reset(&mut self) {
        self.hasher = Hasher::new(self.hasher.message_digest());
    }
}

/// Returns the PKCS#1 v1.5 signature scheme for `digest`.
fn pkcs1v15_scheme(digest: MessageDigest) -> Pkcs1v15Sign {
    match digest {
        MessageDigest::Md5 => Pkcs1v15Sign::new::<md5::Md5>(),
        MessageDigest::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        MessageDigest::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
        MessageDigest::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        MessageDigest::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        MessageDigest::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
    }
}

/// Ensures that an RSA modulus of `modulus_len` bytes can hold the PKCS#1 v1.5 encoding of a
/// `digest`.
///
/// The encoding needs at least eleven bytes besides the DigestInfo (`00 01`, eight `FF` and `00`).
fn check_rsa_key_size(modulus_len: usize, digest: MessageDigest) -> Result<(), Error> {
    let encoded_len = pkcs1v15_scheme(digest).prefix.len() + digest.output_size() + 11;
    if modulus_len < encoded_len {
        return Err(Error::InvalidKey(
            "Key is too short for this signature algorithm".to_string(),
        ));
    }
    Ok(())
}

fn rsa_sign(key: &RsaPrivateKey, hasher: Hasher) -> Result<Vec<u8>, Error> {
    let scheme = pkcs1v15_scheme(hasher.message_digest());
    key.sign(scheme, &hasher.finalize())
        .map_err(|error| Error::Signature(error.to_string()))
}

fn rsa_verify(key: &RsaPublicKey, hasher: Hasher, signature: &[u8]) -> Result<bool, Error> {
    if signature.len() != key.size() {
        return Err(Error::Signature(format!(
            "signature length {} does not match key size {}",
            signature.len(),
            key.size()
        )));
    }

    let digest = hasher.message_digest();
    let hashed = hasher.finalize();
    match key.verify(pkcs1v15_scheme(digest), &hashed, signature) {
        Ok(()) => Ok(true),
        Err(rsa::Error::Verification) => {
            let prefix = pkcs1v15_scheme(digest).prefix;
            rsa_encoding_is_intact(key, &prefix, hashed.len(), signature).map(|_| false)
        }
        Err(error) => Err(Error::Signature(error.to_string())),
    }
}

/// Ensures that a failed RSA verification is caused by a digest mismatch.
///
/// Recovers the encoded message of `signature` and checks that it is a well-formed PKCS#1 v1.5
/// encoding (`00 01 FF .. FF 00 || prefix || digest`) with a digest of `digest_len` bytes.
///
/// # Errors
///
/// Returns an error if the signature representative is not smaller than the modulus or the
/// encoded message is malformed.
fn rsa_encoding_is_intact(
    key: &RsaPublicKey,
    prefix: &[u8],
    digest_len: usize,
    signature: &[u8],
) -> Result<(), Error> {
    let representative = BigUint::from_bytes_be(signature);
    if &representative >= key.n() {
        return Err(Error::Signature(
            "signature representative out of range".to_string(),
        ));
    }

    let recovered = representative.modpow(key.e(), key.n()).to_bytes_be();
    let mut encoded = vec![0; key.size().saturating_sub(recovered.len())];
    encoded.extend_from_slice(&recovered);

    let malformed = || Error::Signature("invalid PKCS#1 v1.5 signature encoding".to_string());
    let padding = encoded
        .strip_prefix(&[0x00, 0x01])
        .ok_or_else(malformed)?;
    let separator = padding
        .iter()
        .position(|byte| *byte != 0xff)
        .ok_or_else(malformed)?;
    if separator < 8 || padding[separator] != 0x00 {
        return Err(malformed());
    }
    let digest_info = &padding[separator + 1..];
    if !digest_info.starts_with(prefix) || digest_info.len() != prefix.len() + digest_len {
        return Err(malformed());
    }

    Ok(())
}

fn dsa_sign(key: &dsa::SigningKey, hasher: Hasher) -> Result<Vec<u8>, Error> {
    let signature: Result<dsa::Signature, signature::Error> = match hasher {
        Hasher::Sha1(hasher) => key.try_sign_digest(hasher),
        Hasher::Sha224(hasher) => key.try_sign_digest(hasher),
        Hasher::Sha256(hasher) => key.try_sign_digest(hasher),
        Hasher::Sha384(hasher) => key.try_sign_digest(hasher),
        Hasher::Sha512(hasher) => key.try_sign_digest(hasher),
        Hasher::Md5(_) => {
            return Err(Error::Signature(
                "MD5 can not be used with DSA".to_string(),
            ));
        }
    };

    signature
        .map(|signature| signature.to_vec())
        .map_err(|error| Error::Signature(error.to_string()))
}

fn dsa_verify(key: &dsa::VerifyingKey, hasher: Hasher, signature: &[u8]) -> Result<bool, Error> {
    let signature = dsa::Signature::try_from(signature)
        .map_err(|_| Error::Signature("unable to decode DSA signature".to_string()))?;

    let zero = BigUint::from(0u32);
    let q = key.components().q();
    let r: &BigUint = signature.r();
    let s: &BigUint = signature.s();
    if r == &zero || s == &zero || r >= q || s >= q {
        return Err(Error::Signature(
            "DSA signature values out of range".to_string(),
        ));
    }

    let verified = match hasher {
        Hasher::Sha1(hasher) => key.verify_digest(hasher, &signature),
        Hasher::Sha224(hasher) => key.verify_digest(hasher, &signature),
        Hasher::Sha256(hasher) => key.verify_digest(hasher, &signature),
        Hasher::Sha384(hasher) => key.verify_digest(hasher, &signature),
        Hasher::Sha512(hasher) => key.verify_digest(hasher, &signature),
        Hasher::Md5(_) => {
            return Err(Error::Signature(
                "MD5 can not be used with DSA".to_string(),
            ));
        }
    };

    Ok(verified.is_ok())
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use rstest::rstest;
    use testresult::TestResult;

    use super::*;

    #[rstest]
    #[case("MD5WITHRSA")]
    #[case("SHA1WITHRSA")]
    #[case("SHA224WITHRSA")]
    #[case("SHA256WITHRSA")]
    #[case("SHA384WITHRSA")]
    #[case("SHA512WITHRSA")]
    #[case("SHA1WITHDSA")]
    #[case("SHA224WITHDSA")]
    #[case("SHA256WITHDSA")]
    #[case("SHA384WITHDSA")]
    #[case("SHA512WITHDSA")]
    fn supported_algorithms(#[case] algorithm: &str) -> TestResult {
        let engine = SignatureEngine::new(algorithm)?;
        assert_eq!(engine.algorithm(), algorithm);
        Ok(())
    }

    #[rstest]
    #[case("MD5WITHDSA")]
    #[case("SHA256WITHNONE")]
    #[case("SHA256WITHDH")]
    #[case("RIPEMD160WITHRSA")]
    #[case("SHA256")]
    #[case("")]
    fn unsupported_algorithms(#[case] algorithm: &str) {
        match SignatureEngine::new(algorithm) {
            Err(Error::NoSuchAlgorithm { algorithm: name }) => assert_eq!(name, algorithm),
            other => panic!("Expected NoSuchAlgorithm, got {other:?}"),
        }
    }

    #[test]
    fn missing_key_is_invalid() -> TestResult {
        let mut engine = SignatureEngine::new("SHA256WITHRSA")?;
        assert!(matches!(engine.init_sign(None), Err(Error::InvalidKey(_))));
        assert!(matches!(engine.init_verify(None), Err(Error::InvalidKey(_))));
        Ok(())
    }

    #[test]
    fn uninitialized_engine_fails() -> TestResult {
        let engine = SignatureEngine::new("SHA256WITHRSA")?;
        assert!(matches!(engine.sign(), Err(Error::Signature(_))));
        let engine = SignatureEngine::new("SHA256WITHRSA")?;
        assert!(matches!(engine.verify(&[]), Err(Error::Signature(_))));
        Ok(())
    }

    #[test]
    fn rsa_sign_and_verify() -> TestResult {
        let private = RsaPrivateKey::new(&mut OsRng, 1024)?;
        let public = private.to_public_key();

        let mut engine = SignatureEngine::new("SHA256WITHRSA")?;
        engine.init_sign(Some(PrivateKeyHandle::Rsa(&private)))?;
        engine.update(b"Hello ");
        engine.update(b"World!");
        let signature = engine.sign()?;
        assert_eq!(signature.len(), public.size());

        let mut engine = SignatureEngine::new("SHA256WITHRSA")?;
        engine.init_verify(Some(PublicKeyHandle::Rsa(&public)))?;
        engine.update(b"Hello World!");
        assert!(engine.verify(&signature)?);

        let mut engine = SignatureEngine::new("SHA256WITHRSA")?;
        engine.init_verify(Some(PublicKeyHandle::Rsa(&public)))?;
        engine.update(b"Hello World?");
        assert!(!engine.verify(&signature)?);

        // the digest algorithm is part of the encoded message
        let mut engine = SignatureEngine::new("SHA512WITHRSA")?;
        engine.init_verify(Some(PublicKeyHandle::Rsa(&public)))?;
        engine.update(b"Hello World!");
        assert!(matches!(engine.verify(&signature), Err(Error::Signature(_))));

        let mut engine = SignatureEngine::new("SHA256WITHRSA")?;
        engine.init_verify(Some(PublicKeyHandle::Rsa(&public)))?;
        engine.update(b"Hello World!");
        assert!(matches!(
            engine.verify(&signature[1..]),
            Err(Error::Signature(_))
        ));

        Ok(())
    }

    #[test]
    fn reinitialization_discards_data() -> TestResult {
        let private = RsaPrivateKey::new(&mut OsRng, 1024)?;
        let public = private.to_public_key();

        let mut engine = SignatureEngine::new("SHA1WITHRSA")?;
        engine.update(b"garbage");
        engine.init_sign(Some(PrivateKeyHandle::Rsa(&private)))?;
        engine.update(b"data");
        let signature = engine.sign()?;

        let mut engine = SignatureEngine::new("SHA1WITHRSA")?;
        engine.init_verify(Some(PublicKeyHandle::Rsa(&public)))?;
        engine.update(b"data");
        assert!(engine.verify(&signature)?);
        Ok(())
    }

    #[rstest]
    #[case("SHA512WITHRSA", 512, false)]
    #[case("SHA384WITHRSA", 512, false)]
    #[case("SHA256WITHRSA", 512, true)]
    #[case("SHA512WITHRSA", 1024, true)]
    fn rsa_key_must_fit_digest(
        #[case] algorithm: &str,
        #[case] bits: usize,
        #[case] fits: bool,
    ) -> TestResult {
        let private = RsaPrivateKey::new(&mut OsRng, bits)?;
        let public = private.to_public_key();

        let mut engine = SignatureEngine::new(algorithm)?;
        let signing = engine.init_sign(Some(PrivateKeyHandle::Rsa(&private)));
        let verifying = engine.init_verify(Some(PublicKeyHandle::Rsa(&public)));
        if fits {
            assert!(signing.is_ok());
            assert!(verifying.is_ok());
        } else {
            assert!(matches!(
                signing,
                Err(Error::InvalidKey(message))
                    if message == "Key is too short for this signature algorithm"
            ));
            assert!(matches!(verifying, Err(Error::InvalidKey(_))));
        }
        Ok(())
    }

    #[test]
    fn key_algorithm_must_match() -> TestResult {
        let private = RsaPrivateKey::new(&mut OsRng, 1024)?;
        let public = private.to_public_key();

        let mut engine = SignatureEngine::new("SHA256WITHDSA")?;
        assert!(matches!(
            engine.init_sign(Some(PrivateKeyHandle::Rsa(&private))),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            engine.init_verify(Some(PublicKeyHandle::Rsa(&public))),
            Err(Error::InvalidKey(_))
        ));
        Ok(())
    }
}
