//! Error handling.

use crate::{provider, value::Argument};

/// The kind of an [`Error`].
///
/// All failures of public key operations are surfaced as a single key [`Error`].
/// The kind is the sub-reason, which allows callers to tell the failures apart for diagnostics.
#[derive(
    Clone,
    Copy,
    Debug,
    strum::Display,
    strum::EnumIter,
    strum::IntoStaticStr,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// Signing is attempted without usable private key material.
    PreconditionViolation,

    /// An argument does not have the expected shape.
    MalformedArgument,

    /// A combination of digest and key algorithm has no backing implementation.
    AlgorithmUnavailable,

    /// Signature bytes can not be parsed or verified mechanically.
    InvalidSignatureMaterial,

    /// A key is rejected (wrong role, corrupted or incompatible).
    InvalidKeyMaterial,

    /// Key material can not be encoded or decoded.
    Encoding,

    /// Key parameters are invalid.
    InvalidParameters,
}

/// An error that may occur when working with public keys.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A private key is needed, but none is present
    #[error("Private key is needed")]
    PrivateKeyRequired,

    /// An argument does not have the expected shape
    #[error("Invalid {argument}")]
    MalformedArgument {
        /// The argument that is malformed.
        argument: Argument,
    },

    /// A signature algorithm is not supported
    #[error("Unsupported algorithm {algorithm}: {message}")]
    UnsupportedAlgorithm {
        /// The identifier of the signature algorithm.
        algorithm: String,
        /// The message of the underlying provider.
        message: String,
    },

    /// Signature material is invalid
    #[error("Invalid signature: {message}")]
    InvalidSignature {
        /// The message of the underlying provider.
        message: String,
    },

    /// Key material is invalid
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// The message of the underlying provider.
        message: String,
    },

    /// Key material can not be encoded or decoded
    #[error("Encoding failed while {context}: {source}")]
    Encoding {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Encoding failed while ".
        context: &'static str,
        /// The source error.
        source: Box<dyn std::error::Error + 'static + Send + Sync>,
    },

    /// Data does not contain a supported key format
    #[error("No supported key format found while {context}")]
    UnsupportedKeyFormat {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "No supported key format found while ".
        context: &'static str,
    },

    /// Key parameters are invalid
    #[error("Invalid key parameters: {context}")]
    InvalidParameters {
        /// A description of the invalid parameters.
        context: String,
    },
}

impl Error {
    /// Returns the [`ErrorKind`] of the error.
    ///
    /// # Examples
    ///
    /// ```
    /// use signstar_pkey::{Error, ErrorKind};
    ///
    /// assert_eq!(Error::PrivateKeyRequired.kind(), ErrorKind::PreconditionViolation);
    /// assert_eq!(
    ///     Error::PrivateKeyRequired.kind().to_string(),
    ///     "precondition-violation"
    /// );
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PrivateKeyRequired => ErrorKind::PreconditionViolation,
            Self::MalformedArgument { .. } => ErrorKind::MalformedArgument,
            Self::UnsupportedAlgorithm { .. } => ErrorKind::AlgorithmUnavailable,
            Self::InvalidSignature { .. } => ErrorKind::InvalidSignatureMaterial,
            Self::InvalidKey { .. } => ErrorKind::InvalidKeyMaterial,
            Self::Encoding { .. } | Self::UnsupportedKeyFormat { .. } => ErrorKind::Encoding,
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
        }
    }

    /// Returns the diagnostic reason of the error.
    ///
    /// Errors raised by the signature provider carry the provider's own message.
    pub fn reason(&self) -> String {
        match self {
            Self::UnsupportedAlgorithm { message, .. }
            | Self::InvalidSignature { message }
            | Self::InvalidKey { message } => message.clone(),
            _ => self.to_string(),
        }
    }
}

impl From<provider::Error> for Error {
    /// Maps an error of the signature provider to a key [`Error`].
    ///
    /// The message of the provider is preserved.
    fn from(value: provider::Error) -> Self {
        let message = value.to_string();
        match value {
            provider::Error::NoSuchAlgorithm { algorithm } => {
                Self::UnsupportedAlgorithm { algorithm, message }
            }
            provider::Error::Signature(_) => Self::InvalidSignature { message },
            provider::Error::InvalidKey(_) => Self::InvalidKey { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(
        provider::Error::NoSuchAlgorithm { algorithm: "SHA256WITHNONE".to_string() },
        ErrorKind::AlgorithmUnavailable,
        "Unsupported algorithm SHA256WITHNONE: SHA256WITHNONE Signature not available",
    )]
    #[case(
        provider::Error::Signature("signature length 3 does not match key size 128".to_string()),
        ErrorKind::InvalidSignatureMaterial,
        "Invalid signature: signature length 3 does not match key size 128",
    )]
    #[case(
        provider::Error::InvalidKey("no public key present".to_string()),
        ErrorKind::InvalidKeyMaterial,
        "Invalid key: no public key present",
    )]
    fn provider_error_is_mapped(
        #[case] error: provider::Error,
        #[case] kind: ErrorKind,
        #[case] message: &str,
    ) {
        let reason = error.to_string();
        let error = Error::from(error);
        assert_eq!(error.kind(), kind);
        assert_eq!(error.to_string(), message);
        assert_eq!(error.reason(), reason);
    }

    #[rstest]
    #[case(ErrorKind::PreconditionViolation, "precondition-violation")]
    #[case(ErrorKind::MalformedArgument, "malformed-argument")]
    #[case(ErrorKind::AlgorithmUnavailable, "algorithm-unavailable")]
    #[case(ErrorKind::InvalidSignatureMaterial, "invalid-signature-material")]
    #[case(ErrorKind::InvalidKeyMaterial, "invalid-key-material")]
    fn error_kind_display(#[case] kind: ErrorKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
    }

    #[test]
    fn malformed_argument_message() {
        let error = Error::MalformedArgument {
            argument: Argument::Digest,
        };
        assert_eq!(error.to_string(), "Invalid digest");
        assert_eq!(error.kind(), ErrorKind::MalformedArgument);
    }
}
