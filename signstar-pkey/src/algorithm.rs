//! Binding of digest and key algorithms to signature algorithm identifiers.

use crate::MessageDigest;

/// The algorithm of a public key, as used in signature algorithm identifiers.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[strum(ascii_case_insensitive, serialize_all = "UPPERCASE")]
pub enum KeyAlgorithm {
    /// No specific algorithm.
    ///
    /// Keys with this algorithm can not be used for signing or verification.
    #[default]
    None,

    /// The Digital Signature Algorithm (DSA)
    Dsa,

    /// The Rivest–Shamir–Adleman (RSA) algorithm
    Rsa,
}

impl KeyAlgorithm {
    /// Returns the fixed name of the key algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Dsa => "DSA",
            Self::Rsa => "RSA",
        }
    }
}

/// Builds a signature algorithm identifier from a digest name and a key algorithm name.
///
/// No validation is done here: unsupported combinations are reported when the identifier is
/// resolved by the [`SignatureEngine`][`crate::provider::SignatureEngine`].
///
/// # Examples
///
/// ```
/// use signstar_pkey::signature_algorithm;
///
/// assert_eq!(signature_algorithm("SHA256", "RSA"), "SHA256WITHRSA");
/// assert_eq!(signature_algorithm("SHA1", "NONE"), "SHA1WITHNONE");
/// ```
pub fn signature_algorithm(digest_name: &str, key_algorithm: &str) -> String {
    format!("{digest_name}WITH{key_algorithm}")
}

/// Builds a signature algorithm identifier from a [`MessageDigest`] and a [`KeyAlgorithm`].
pub fn signature_algorithm_for(digest: MessageDigest, key_algorithm: KeyAlgorithm) -> String {
    signature_algorithm(digest.short_name(), key_algorithm.name())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use testresult::TestResult;

    use super::*;

    #[rstest]
    #[case(MessageDigest::Sha256, KeyAlgorithm::Rsa, "SHA256WITHRSA")]
    #[case(MessageDigest::Md5, KeyAlgorithm::Rsa, "MD5WITHRSA")]
    #[case(MessageDigest::Sha1, KeyAlgorithm::Dsa, "SHA1WITHDSA")]
    #[case(MessageDigest::Sha512, KeyAlgorithm::None, "SHA512WITHNONE")]
    fn binds_digest_and_key_algorithm(
        #[case] digest: MessageDigest,
        #[case] key_algorithm: KeyAlgorithm,
        #[case] expected: &str,
    ) {
        assert_eq!(signature_algorithm_for(digest, key_algorithm), expected);
    }

    #[test]
    fn does_not_validate() {
        assert_eq!(signature_algorithm("FOO", "BAR"), "FOOWITHBAR");
    }

    #[rstest]
    #[case("rsa", Some(KeyAlgorithm::Rsa))]
    #[case("DSA", Some(KeyAlgorithm::Dsa))]
    #[case("none", Some(KeyAlgorithm::None))]
    #[case("dh", None)]
    fn keyalgorithm_fromstr(
        #[case] input: &str,
        #[case] expected: Option<KeyAlgorithm>,
    ) -> TestResult {
        if let Some(expected) = expected {
            let algorithm = KeyAlgorithm::from_str(input)?;
            assert_eq!(algorithm, expected);
            assert_eq!(algorithm.to_string(), algorithm.name());
        } else {
            assert!(KeyAlgorithm::from_str(input).is_err());
        }
        Ok(())
    }
}
