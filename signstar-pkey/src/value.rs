//! Dynamically typed values passed in by a scripting host.

use crate::MessageDigest;

/// An argument of a signature operation.
#[derive(Clone, Copy, Debug, strum::Display, Eq, Hash, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Argument {
    /// The message digest.
    Digest,

    /// The signature.
    Signature,

    /// The signed data.
    Data,
}

/// A dynamically typed value as handed over by a scripting host.
///
/// The shape of such values is only known at runtime and is validated by
/// [`KeySignature::sign_value`][`crate::KeySignature::sign_value`] and
/// [`KeySignature::verify_value`][`crate::KeySignature::verify_value`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Nil,

    /// A boolean.
    Boolean(bool),

    /// An integer.
    Integer(i64),

    /// A (binary) string.
    String(Vec<u8>),

    /// A message digest handle.
    Digest(MessageDigest),
}

impl Value {
    /// Returns the [`MessageDigest`] if the value is a digest handle.
    pub fn as_digest(&self) -> Option<MessageDigest> {
        match self {
            Self::Digest(digest) => Some(*digest),
            _ => None,
        }
    }

    /// Returns the bytes if the value is a string.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::String(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<MessageDigest> for Value {
    fn from(value: MessageDigest) -> Self {
        Self::Digest(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::String(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.as_bytes().to_vec())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}
