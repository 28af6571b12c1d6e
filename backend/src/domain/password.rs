//! Salted password digests.
//!
//! Stored form: `sha256$<salt-hex>$<digest-hex>` where the digest is
//! `SHA-256(salt || password)`.

use std::fmt;

use sha2::{Digest, Sha256};

use super::user::Password;

const SCHEME: &str = "sha256";
const SALT_BYTES: usize = 16;

/// Failures parsing a stored digest.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordDigestError {
    /// The value does not have three `$`-separated parts.
    #[error("password digest must have the form scheme$salt$digest")]
    Malformed,
    /// Only `sha256` digests are understood.
    #[error("unsupported password digest scheme: {0}")]
    UnsupportedScheme(String),
    /// Salt or digest is not valid hex of the expected length.
    #[error("password digest contains invalid hex")]
    InvalidHex,
}

/// Salted SHA-256 digest of a password.
///
/// # Examples
/// ```
/// use user_service::domain::{Password, PasswordDigest};
///
/// let password = Password::new("hunter22").expect("non-empty");
/// let digest = PasswordDigest::digest(&password);
/// assert!(digest.verify(&password));
/// assert!(digest.as_str().starts_with("sha256$"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest {
    salt: [u8; SALT_BYTES],
    hash: [u8; 32],
    encoded: String,
}

impl PasswordDigest {
    /// Digest `password` with a fresh random salt.
    #[must_use]
    pub fn digest(password: &Password) -> Self {
        Self::with_salt(rand::random(), password)
    }

    fn with_salt(salt: [u8; SALT_BYTES], password: &Password) -> Self {
        let hash = hash(&salt, password);
        let encoded = format!("{SCHEME}${}${}", hex::encode(salt), hex::encode(hash));
        Self {
            salt,
            hash,
            encoded,
        }
    }

    /// Parse a stored digest.
    ///
    /// # Errors
    /// Returns [`PasswordDigestError`] when `value` is not a digest produced
    /// by [`PasswordDigest::digest`].
    pub fn parse(value: &str) -> Result<Self, PasswordDigestError> {
        let mut parts = value.split('$');
        let (Some(scheme), Some(salt_hex), Some(hash_hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(PasswordDigestError::Malformed);
        };
        if scheme != SCHEME {
            return Err(PasswordDigestError::UnsupportedScheme(scheme.to_owned()));
        }

        let mut salt = [0_u8; SALT_BYTES];
        hex::decode_to_slice(salt_hex, &mut salt).map_err(|_| PasswordDigestError::InvalidHex)?;
        let mut hash = [0_u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash).map_err(|_| PasswordDigestError::InvalidHex)?;

        Ok(Self {
            salt,
            hash,
            encoded: value.to_owned(),
        })
    }

    /// Check whether `password` produced this digest.
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        let candidate = hash(&self.salt, password);
        candidate
            .iter()
            .zip(self.hash.iter())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// Encoded form for storage.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.encoded.as_str()
    }
}

fn hash(salt: &[u8], password: &Password) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.expose().as_bytes());
    hasher.finalize().into()
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn password() -> Password {
        Password::new("correct horse").expect("non-empty password")
    }

    #[rstest]
    fn verifies_matching_password(password: Password) {
        let digest = PasswordDigest::digest(&password);
        assert!(digest.verify(&password));
    }

    #[rstest]
    fn rejects_other_password(password: Password) {
        let digest = PasswordDigest::digest(&password);
        let other = Password::new("battery staple").expect("non-empty password");
        assert!(!digest.verify(&other));
    }

    #[rstest]
    fn salts_differ_between_digests(password: Password) {
        let first = PasswordDigest::digest(&password);
        let second = PasswordDigest::digest(&password);
        assert_ne!(first.as_str(), second.as_str());
    }

    #[rstest]
    fn known_salt_produces_stable_encoding(password: Password) {
        let digest = PasswordDigest::with_salt([0_u8; SALT_BYTES], &password);
        let encoded = digest.as_str();
        assert!(encoded.starts_with("sha256$00000000000000000000000000000000$"));
        assert_eq!(encoded.len(), "sha256$".len() + 32 + 1 + 64);
    }

    #[rstest]
    fn parse_restores_stored_digest(password: Password) {
        let digest = PasswordDigest::digest(&password);
        let parsed = PasswordDigest::parse(digest.as_str()).expect("stored digest parses");
        assert!(parsed.verify(&password));
        assert_eq!(parsed, digest);
    }

    #[rstest]
    #[case("plain", PasswordDigestError::Malformed)]
    #[case("sha256$aa$bb$cc", PasswordDigestError::Malformed)]
    #[case("md5$00$00", PasswordDigestError::UnsupportedScheme("md5".to_owned()))]
    #[case("sha256$zz$00", PasswordDigestError::InvalidHex)]
    fn parse_rejects_bad_values(#[case] value: &str, #[case] expected: PasswordDigestError) {
        assert_eq!(PasswordDigest::parse(value), Err(expected));
    }

    #[rstest]
    fn debug_hides_material(password: Password) {
        let digest = PasswordDigest::digest(&password);
        assert_eq!(format!("{digest:?}"), "PasswordDigest(***)");
    }
}
