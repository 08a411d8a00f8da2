#![doc = include_str!("../README.md")]

mod algorithm;
#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod config;
mod error;
pub mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod message_digest;
mod pkey;
pub mod provider;
pub mod text;
mod value;

pub use algorithm::{KeyAlgorithm, signature_algorithm, signature_algorithm_for};
pub use error::{Error, ErrorKind};
pub use key::{
    DhKey,
    DsaKey,
    DsaKeySize,
    KeyMaterial,
    MIN_RSA_BIT_LENGTH,
    PrivateKeyHandle,
    PublicKeyHandle,
    RsaKey,
};
pub use message_digest::MessageDigest;
pub use pkey::{KeySignature, PKey};
pub use value::{Argument, Value};
