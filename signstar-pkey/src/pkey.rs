//! The unified public key and its signature operations.

use log::debug;

use crate::{
    Error,
    KeyAlgorithm,
    MessageDigest,
    key::{DhKey, DsaKey, KeyMaterial, PrivateKeyHandle, PublicKeyHandle, RsaKey},
    provider::SignatureEngine,
    signature_algorithm,
    value::{Argument, Value},
};

/// A public key of one of the supported key types.
///
/// Every key type is used through the same capabilities of [`KeyMaterial`] and [`KeySignature`].
///
/// # Examples
///
/// ```
/// use rand::rngs::OsRng;
/// use signstar_pkey::{KeySignature, MessageDigest, PKey, RsaKey};
///
/// # fn main() -> testresult::TestResult {
/// let key = PKey::from(RsaKey::generate(&mut OsRng, 1024)?);
/// let signature = key.sign(MessageDigest::Sha256, b"hello")?;
///
/// let public_key = key.public_key();
/// assert!(public_key.verify(MessageDigest::Sha256, &signature, b"hello")?);
/// assert!(!public_key.verify(MessageDigest::Sha256, &signature, b"hellp")?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub enum PKey {
    /// An RSA key.
    Rsa(RsaKey),

    /// A DSA key.
    Dsa(DsaKey),

    /// A Diffie-Hellman key.
    Dh(DhKey),
}

impl PKey {
    /// Creates a [`PKey`] from ASN.1 DER encoded data.
    ///
    /// RSA, DSA and Diffie-Hellman encodings are tried in this order.
    /// A sequence of two integers is decoded as Diffie-Hellman parameters, even though it is also a
    /// valid PKCS#1 `RSAPublicKey` (use [`RsaKey::from_der`] for the latter).
    ///
    /// # Errors
    ///
    /// Returns an error if `der` is no supported key encoding.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        if let Some(key) = RsaKey::from_distinct_der(der) {
            return Ok(key.into());
        }
        if let Ok(key) = DsaKey::from_der(der) {
            return Ok(key.into());
        }
        if let Ok(key) = DhKey::from_der(der) {
            return Ok(key.into());
        }
        RsaKey::from_der(der)
            .map(Self::from)
            .map_err(|_| Error::UnsupportedKeyFormat {
                context: "decoding a key from DER",
            })
    }

    /// Creates a [`PKey`] from PEM encoded data.
    ///
    /// RSA, DSA and Diffie-Hellman encodings are tried in this order.
    ///
    /// # Errors
    ///
    /// Returns an error if `pem` is no supported key encoding.
    pub fn from_pem(pem: &str) -> Result<Self, Error> {
        if let Ok(key) = RsaKey::from_pem(pem) {
            return Ok(key.into());
        }
        if let Ok(key) = DsaKey::from_pem(pem) {
            return Ok(key.into());
        }
        DhKey::from_pem(pem)
            .map(Self::from)
            .map_err(|_| Error::UnsupportedKeyFormat {
                context: "decoding a key from PEM",
            })
    }

    /// Returns a copy of the key without private material.
    pub fn public_key(&self) -> Self {
        match self {
            Self::Rsa(key) => Self::Rsa(key.public_key()),
            Self::Dsa(key) => Self::Dsa(key.public_key()),
            Self::Dh(key) => Self::Dh(key.public_key()),
        }
    }

    /// Returns the bit length of the key.
    pub fn bits(&self) -> usize {
        match self {
            Self::Rsa(key) => key.bits(),
            Self::Dsa(key) => key.bits(),
            Self::Dh(key) => key.bits(),
        }
    }

    fn material(&self) -> &dyn KeyMaterial {
        match self {
            Self::Rsa(key) => key,
            Self::Dsa(key) => key,
            Self::Dh(key) => key,
        }
    }
}

impl From<RsaKey> for PKey {
    fn from(value: RsaKey) -> Self {
        Self::Rsa(value)
    }
}

impl From<DsaKey> for PKey {
    fn from(value: DsaKey) -> Self {
        Self::Dsa(value)
    }
}

impl From<DhKey> for PKey {
    fn from(value: DhKey) -> Self {
        Self::Dh(value)
    }
}

impl KeyMaterial for PKey {
    fn algorithm(&self) -> KeyAlgorithm {
        self.material().algorithm()
    }

    fn public_key_handle(&self) -> Option<PublicKeyHandle<'_>> {
        self.material().public_key_handle()
    }

    fn private_key_handle(&self) -> Option<PrivateKeyHandle<'_>> {
        self.material().private_key_handle()
    }

    fn is_private(&self) -> bool {
        self.material().is_private()
    }

    fn is_public(&self) -> bool {
        self.material().is_public()
    }

    fn to_der(&self) -> Result<Vec<u8>, Error> {
        self.material().to_der()
    }

    fn to_pem(&self) -> Result<String, Error> {
        self.material().to_pem()
    }

    fn to_text(&self) -> String {
        self.material().to_text()
    }
}

/// Signature creation and verification for any [`KeyMaterial`].
///
/// The signature algorithm is derived from the short name of the digest and the algorithm of the
/// key (e.g. `SHA256WITHRSA`).
/// Every call resolves its own signature engine, so a key can be used from several threads at
/// the same time.
pub trait KeySignature: KeyMaterial {
    /// Signs `data` using `digest`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - the key has no private material ([`ErrorKind::PreconditionViolation`]),
    /// - no signature algorithm exists for the digest and the key algorithm
    ///   ([`ErrorKind::AlgorithmUnavailable`]),
    /// - the key is rejected, e.g. because it is too short for the digest
    ///   ([`ErrorKind::InvalidKeyMaterial`]),
    /// - or signing fails.
    ///
    /// [`ErrorKind::PreconditionViolation`]: crate::ErrorKind::PreconditionViolation
    /// [`ErrorKind::AlgorithmUnavailable`]: crate::ErrorKind::AlgorithmUnavailable
    /// [`ErrorKind::InvalidKeyMaterial`]: crate::ErrorKind::InvalidKeyMaterial
    fn sign(&self, digest: MessageDigest, data: &[u8]) -> Result<Vec<u8>, Error> {
        if !self.is_private() {
            return Err(Error::PrivateKeyRequired);
        }

        let algorithm = signature_algorithm(digest.short_name(), self.algorithm().name());
        let mut engine = SignatureEngine::new(&algorithm)?;
        engine.init_sign(self.private_key_handle())?;
        engine.update(data);
        let signature = engine.sign()?;
        debug!("Created {algorithm} signature of {} bytes", signature.len());

        Ok(signature)
    }

    /// Verifies `signature` over `data` using `digest`.
    ///
    /// Returns `true` if the signature is valid and `false` if it is well-formed but does not match
    /// `data`.
    ///
    /// A mismatch is not always reported as `false`.
    /// For RSA keys the signature is only well-formed if it decrypts to a PKCS#1 v1.5 encoding of
    /// `digest`. A signature created by another RSA key, or over another digest, is malformed and
    /// yields an [`ErrorKind::InvalidSignatureMaterial`] error. For DSA keys any DER encoded
    /// signature with values in range is well-formed, so a signature of another DSA key yields
    /// `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - no signature algorithm exists for the digest and the key algorithm,
    /// - the key has no public material usable for verification,
    /// - the key is too short for the signature algorithm,
    /// - or `signature` is malformed.
    ///
    /// [`ErrorKind::InvalidSignatureMaterial`]: crate::ErrorKind::InvalidSignatureMaterial
    fn verify(&self, digest: MessageDigest, signature: &[u8], data: &[u8]) -> Result<bool, Error> {
        let algorithm = signature_algorithm(digest.short_name(), self.algorithm().name());
        let mut engine = SignatureEngine::new(&algorithm)?;
        engine.init_verify(self.public_key_handle())?;
        engine.update(data);
        let verified = engine.verify(signature)?;
        debug!("Verified {algorithm} signature: {verified}");

        Ok(verified)
    }

    /// Signs host provided `data` using the host provided `digest`.
    ///
    /// The private key precondition is checked first, then `digest` must be a digest handle and
    /// `data` must be a string.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - the key has no private material,
    /// - an argument has an unexpected shape ([`ErrorKind::MalformedArgument`]),
    /// - or [`KeySignature::sign`] fails.
    ///
    /// [`ErrorKind::MalformedArgument`]: crate::ErrorKind::MalformedArgument
    fn sign_value(&self, digest: &Value, data: &Value) -> Result<Vec<u8>, Error> {
        if !self.is_private() {
            return Err(Error::PrivateKeyRequired);
        }
        let digest = digest.as_digest().ok_or(Error::MalformedArgument {
            argument: Argument::Digest,
        })?;
        let data = data.as_bytes().ok_or(Error::MalformedArgument {
            argument: Argument::Data,
        })?;

        self.sign(digest, data)
    }

    /// Verifies a host provided `signature` over host provided `data`.
    ///
    /// `digest` must be a digest handle, `signature` and `data` must be strings.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// - an argument has an unexpected shape,
    /// - or [`KeySignature::verify`] fails.
    fn verify_value(&self, digest: &Value, signature: &Value, data: &Value) -> Result<bool, Error> {
        let digest = digest.as_digest().ok_or(Error::MalformedArgument {
            argument: Argument::Digest,
        })?;
        let signature = signature.as_bytes().ok_or(Error::MalformedArgument {
            argument: Argument::Signature,
        })?;
        let data = data.as_bytes().ok_or(Error::MalformedArgument {
            argument: Argument::Data,
        })?;

        self.verify(digest, signature, data)
    }
}

impl<K: KeyMaterial + ?Sized> KeySignature for K {}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use rsa::BigUint;
    use rstest::{fixture, rstest};
    use testresult::TestResult;

    use super::*;
    use crate::{DsaKeySize, ErrorKind};

    #[fixture]
    #[once]
    fn rsa_key() -> PKey {
        PKey::from(RsaKey::generate(&mut OsRng, 1024).expect("RSA key generation failed"))
    }

    #[fixture]
    #[once]
    fn dsa_key() -> PKey {
        PKey::from(DsaKey::generate(&mut OsRng, DsaKeySize::L1024N160))
    }

    #[fixture]
    fn dh_key() -> PKey {
        let prime = (BigUint::from(1u32) << 127usize) - BigUint::from(1u32);
        let params = DhKey::new(prime, BigUint::from(3u32)).expect("valid parameters");
        PKey::from(DhKey::generate(&mut OsRng, &params).expect("DH key generation failed"))
    }

    #[rstest]
    fn algorithms(rsa_key: &PKey, dsa_key: &PKey, dh_key: PKey) {
        assert_eq!(rsa_key.algorithm().name(), "RSA");
        assert_eq!(dsa_key.algorithm().name(), "DSA");
        assert_eq!(dh_key.algorithm().name(), "NONE");
    }

    #[rstest]
    fn der_is_auto_detected(rsa_key: &PKey, dsa_key: &PKey, dh_key: PKey) -> TestResult {
        let keys = [
            rsa_key.clone(),
            rsa_key.public_key(),
            dsa_key.clone(),
            dsa_key.public_key(),
            dh_key,
        ];
        for key in keys {
            let der = key.to_der()?;
            let decoded = PKey::from_der(&der)?;
            assert_eq!(decoded.algorithm(), key.algorithm());
            assert_eq!(decoded.to_der()?, der);
        }
        Ok(())
    }

    #[rstest]
    fn pem_is_auto_detected(rsa_key: &PKey, dsa_key: &PKey, dh_key: PKey) -> TestResult {
        for key in [rsa_key.public_key(), dsa_key.clone(), dh_key] {
            let pem = key.to_pem()?;
            let decoded = PKey::from_pem(&pem)?;
            assert_eq!(decoded.algorithm(), key.algorithm());
            assert_eq!(decoded.to_der()?, key.to_der()?);
        }
        Ok(())
    }

    #[test]
    fn unsupported_encoding() {
        assert!(matches!(
            PKey::from_der(&[0x04, 0x01, 0x00]),
            Err(Error::UnsupportedKeyFormat { .. })
        ));
        assert!(matches!(
            PKey::from_pem("-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----\n"),
            Err(Error::UnsupportedKeyFormat { .. })
        ));
    }

    #[rstest]
    fn public_key_drops_private_material(rsa_key: &PKey, dsa_key: &PKey, dh_key: PKey) {
        for key in [rsa_key.clone(), dsa_key.clone(), dh_key] {
            assert!(key.is_private());
            let public_key = key.public_key();
            assert!(!public_key.is_private());
            assert!(public_key.is_public());
        }
    }

    #[rstest]
    fn sign_checks_precondition_before_algorithm(rsa_key: &PKey, dh_key: PKey) {
        let error = rsa_key.public_key().sign(MessageDigest::Sha256, b"").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PreconditionViolation);

        let error = dh_key.public_key().sign(MessageDigest::Sha256, b"data").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PreconditionViolation);

        let error = dh_key.sign(MessageDigest::Sha256, b"data").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlgorithmUnavailable);
        assert_eq!(error.reason(), "SHA256WITHNONE Signature not available");
    }

    #[rstest]
    fn verify_without_algorithm(dh_key: PKey) {
        let error = dh_key
            .verify(MessageDigest::Sha256, b"signature", b"data")
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlgorithmUnavailable);
    }

    #[rstest]
    fn md5_with_dsa_is_unavailable(dsa_key: &PKey) {
        let error = dsa_key.sign(MessageDigest::Md5, b"data").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AlgorithmUnavailable);
    }

    #[rstest]
    #[case::digest_is_string(Value::from("SHA256"), Value::from("data"), Argument::Digest)]
    #[case::digest_is_nil(Value::Nil, Value::from("data"), Argument::Digest)]
    #[case::data_is_integer(Value::from(MessageDigest::Sha256), Value::from(42), Argument::Data)]
    #[case::data_is_nil(Value::from(MessageDigest::Sha256), Value::Nil, Argument::Data)]
    fn sign_value_rejects_malformed_arguments(
        rsa_key: &PKey,
        #[case] digest: Value,
        #[case] data: Value,
        #[case] argument: Argument,
    ) {
        match rsa_key.sign_value(&digest, &data) {
            Err(Error::MalformedArgument { argument: actual }) => assert_eq!(actual, argument),
            other => panic!("Expected a malformed {argument}, got {other:?}"),
        }
    }

    #[rstest]
    fn sign_value_checks_precondition_first(rsa_key: &PKey) {
        let error = rsa_key
            .public_key()
            .sign_value(&Value::Nil, &Value::Nil)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::PreconditionViolation);
    }

    #[rstest]
    #[case::digest(Value::from(true), Value::from("sig"), Value::from("data"), Argument::Digest)]
    #[case::signature(
        Value::from(MessageDigest::Sha1),
        Value::from(7),
        Value::from("data"),
        Argument::Signature
    )]
    #[case::data(Value::from(MessageDigest::Sha1), Value::from("sig"), Value::Nil, Argument::Data)]
    fn verify_value_rejects_malformed_arguments(
        rsa_key: &PKey,
        #[case] digest: Value,
        #[case] signature: Value,
        #[case] data: Value,
        #[case] argument: Argument,
    ) {
        match rsa_key.verify_value(&digest, &signature, &data) {
            Err(Error::MalformedArgument { argument: actual }) => assert_eq!(actual, argument),
            other => panic!("Expected a malformed {argument}, got {other:?}"),
        }
    }

    #[rstest]
    fn values_sign_and_verify(rsa_key: &PKey, dsa_key: &PKey) -> TestResult {
        for key in [rsa_key, dsa_key] {
            let digest = Value::from(MessageDigest::Sha256);
            let data = Value::from("message");
            let signature = Value::from(key.sign_value(&digest, &data)?);

            assert!(key.verify_value(&digest, &signature, &data)?);
            assert!(!key.verify_value(&digest, &signature, &Value::from("massage"))?);
        }
        Ok(())
    }

    #[rstest]
    fn text_is_delegated(rsa_key: &PKey, dh_key: PKey) {
        assert!(rsa_key.to_text().starts_with("Private-Key: (1024 bit)\n"));
        assert!(dh_key.to_text().starts_with("DH Parameters: (127 bit)\n"));
    }
}
