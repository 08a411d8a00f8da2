//! Message digest algorithms.

use std::fmt::Debug;

use digest::Digest;
use serde::{Deserialize, Serialize};

/// A message digest algorithm.
///
/// Acts as the digest handle for signing and verification: it is identified by a short canonical
/// name (e.g. `SHA256`), which is bound to a key algorithm to form a signature algorithm.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
///
/// use signstar_pkey::MessageDigest;
///
/// # fn main() -> testresult::TestResult {
/// let digest = MessageDigest::from_str("sha-256")?;
/// assert_eq!(digest, MessageDigest::Sha256);
/// assert_eq!(digest.short_name(), "SHA256");
/// assert_eq!(digest.output_size(), 32);
/// # Ok(())
/// # }
/// ```
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
pub enum MessageDigest {
    /// MD5 (RFC 1321)
    #[strum(to_string = "MD5", serialize = "MD-5")]
    Md5,

    /// SHA-1 (FIPS 180-4)
    #[strum(to_string = "SHA1", serialize = "SHA-1")]
    Sha1,

    /// SHA-224 (FIPS 180-4)
    #[strum(to_string = "SHA224", serialize = "SHA-224")]
    Sha224,

    /// SHA-256 (FIPS 180-4)
    #[default]
    #[strum(to_string = "SHA256", serialize = "SHA-256")]
    Sha256,

    /// SHA-384 (FIPS 180-4)
    #[strum(to_string = "SHA384", serialize = "SHA-384")]
    Sha384,

    /// SHA-512 (FIPS 180-4)
    #[strum(to_string = "SHA512", serialize = "SHA-512")]
    Sha512,
}

impl MessageDigest {
    /// Returns the short canonical name of the digest algorithm.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA1",
            Self::Sha224 => "SHA224",
            Self::Sha256 => "SHA256",
            Self::Sha384 => "SHA384",
            Self::Sha512 => "SHA512",
        }
    }

    /// Returns the size of the digest output in bytes.
    pub fn output_size(&self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Calculates the digest of `data`.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Hasher::new(*self);
        hasher.update(data);
        hasher.finalize()
    }

    /// Calculates the digest of `data` and returns it as lowercase hexadecimal string.
    pub fn hexdigest(&self, data: &[u8]) -> String {
        hex::encode(self.digest(data))
    }
}

/// Incremental hashing state for a [`MessageDigest`].
#[derive(Clone)]
pub(crate) enum Hasher {
    Md5(md5::Md5),
    Sha1(sha1::Sha1),
    Sha224(sha2::Sha224),
    Sha256(sha2::Sha256),
    Sha384(sha2::Sha384),
    Sha512(sha2::Sha512),
}

impl Hasher {
    /// Creates a new [`Hasher`] for `digest`.
    pub(crate) fn new(digest: MessageDigest) -> Self {
        match digest {
            MessageDigest::Md5 => Self::Md5(md5::Md5::new()),
            MessageDigest::Sha1 => Self::Sha1(sha1::Sha1::new()),
            MessageDigest::Sha224 => Self::Sha224(sha2::Sha224::new()),
            MessageDigest::Sha256 => Self::Sha256(sha2::Sha256::new()),
            MessageDigest::Sha384 => Self::Sha384(sha2::Sha384::new()),
            MessageDigest::Sha512 => Self::Sha512(sha2::Sha512::new()),
        }
    }

    /// Returns the [`MessageDigest`] the hasher is calculating.
    pub(crate) fn message_digest(&self) -> MessageDigest {
        match self {
            Self::Md5(_) => MessageDigest::Md5,
            Self::Sha1(_) => MessageDigest::Sha1,
            Self::Sha224(_) => MessageDigest::Sha224,
            Self::Sha256(_) => MessageDigest::Sha256,
            Self::Sha384(_) => MessageDigest::Sha384,
            Self::Sha512(_) => MessageDigest::Sha512,
        }
    }

    /// Feeds `data` into the hasher.
    pub(crate) fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(hasher) => Digest::update(hasher, data),
            Self::Sha1(hasher) => Digest::update(hasher, data),
            Self::Sha224(hasher) => Digest::update(hasher, data),
            Self::Sha256(hasher) => Digest::update(hasher, data),
            Self::Sha384(hasher) => Digest::update(hasher, data),
            Self::Sha512(hasher) => Digest::update(hasher, data),
        }
    }

    /// Consumes the hasher and returns the digest.
    pub(crate) fn finalize(self) -> Vec<u8> {
        match self {
            Self::Md5(hasher) => hasher.finalize().to_vec(),
            Self::Sha1(hasher) => hasher.finalize().to_vec(),
            Self::Sha224(hasher) => hasher.finalize().to_vec(),
            Self::Sha256(hasher) => hasher.finalize().to_vec(),
            Self::Sha384(hasher) => hasher.finalize().to_vec(),
            Self::Sha512(hasher) => hasher.finalize().to_vec(),
        }
    }
}

impl Debug for Hasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Hasher")
            .field(&self.message_digest().short_name())
            .finish()
    }
}
