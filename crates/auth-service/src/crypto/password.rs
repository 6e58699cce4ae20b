//! One-way salted password hashing for credential storage and verification.
//!
//! PBKDF2 with an HMAC-SHA-512 PRF via [`ring::pbkdf2`]. Each stored hash
//! carries its own iteration count, so raising the configured count does not
//! invalidate historical hashes. Verification goes through
//! [`ring::pbkdf2::verify`], which compares in constant time.

use base64::{engine::general_purpose, Engine as _};
use ring::digest::SHA512_OUTPUT_LEN;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::fmt;
use std::num::NonZeroU32;
use thiserror::Error;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA512;

/// Salt length in bytes. Per-account, generated from a CSPRNG.
pub const SALT_LEN: usize = 16;

const SCHEME: &str = "pbkdf2-sha512";

#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("System randomness unavailable")]
    Entropy,

    #[error("Unsupported password hash scheme")]
    UnsupportedScheme,

    #[error("Malformed password hash")]
    Malformed,
}

/// A stored password digest together with the iteration count that
/// produced it.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash {
    iterations: NonZeroU32,
    digest: Vec<u8>,
}

impl PasswordHash {
    pub fn iterations(&self) -> NonZeroU32 {
        self.iterations
    }

    /// Stable storage form: `pbkdf2-sha512$<iterations>$<base64 digest>`.
    pub fn to_storage_string(&self) -> String {
        format!(
            "{}${}${}",
            SCHEME,
            self.iterations,
            general_purpose::STANDARD.encode(&self.digest)
        )
    }

    /// Parse the storage form. Malformed stored material is a hard failure
    /// at load time, never at verify time.
    pub fn from_storage_string(s: &str) -> Result<Self, PasswordHashError> {
        let mut parts = s.splitn(3, '$');
        let scheme = parts.next().ok_or(PasswordHashError::Malformed)?;
        if scheme != SCHEME {
            return Err(PasswordHashError::UnsupportedScheme);
        }

        let iterations: u32 = parts
            .next()
            .ok_or(PasswordHashError::Malformed)?
            .parse()
            .map_err(|_| PasswordHashError::Malformed)?;
        let iterations = NonZeroU32::new(iterations).ok_or(PasswordHashError::Malformed)?;

        let digest = general_purpose::STANDARD
            .decode(parts.next().ok_or(PasswordHashError::Malformed)?)
            .map_err(|_| PasswordHashError::Malformed)?;
        if digest.len() != SHA512_OUTPUT_LEN {
            return Err(PasswordHashError::Malformed);
        }

        Ok(Self { iterations, digest })
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHash")
            .field("iterations", &self.iterations)
            .field("digest", &"[REDACTED]")
            .finish()
    }
}

/// Generate a per-account salt from the system CSPRNG.
pub fn generate_salt() -> Result<[u8; SALT_LEN], PasswordHashError> {
    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| PasswordHashError::Entropy)?;
    Ok(salt)
}

/// Derive a digest from a password and salt at the given iteration count.
pub fn hash(password: &[u8], salt: &[u8], iterations: NonZeroU32) -> PasswordHash {
    let mut digest = [0u8; SHA512_OUTPUT_LEN];
    pbkdf2::derive(ALGORITHM, iterations, salt, password, &mut digest);
    PasswordHash {
        iterations,
        digest: digest.to_vec(),
    }
}

/// Verify a password against a stored digest.
///
/// A mismatch is not an error, it is `false`. The comparison runs in
/// constant time with respect to the digest bytes.
pub fn verify(password: &[u8], salt: &[u8], expected: &PasswordHash) -> bool {
    pbkdf2::verify(
        ALGORITHM,
        expected.iterations,
        salt,
        password,
        &expected.digest,
    )
    .is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn test_iterations() -> NonZeroU32 {
        NonZeroU32::new(1_000).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let salt = generate_salt().unwrap();
        let stored = hash(b"correct horse battery staple", &salt, test_iterations());

        assert!(verify(b"correct horse battery staple", &salt, &stored));
        assert!(!verify(b"wrong password", &salt, &stored));
    }

    #[test]
    fn test_wrong_salt_does_not_verify() {
        let salt = generate_salt().unwrap();
        let other_salt = generate_salt().unwrap();
        let stored = hash(b"hunter2", &salt, test_iterations());

        assert!(!verify(b"hunter2", &other_salt, &stored));
    }

    #[test]
    fn test_empty_password_hashes() {
        let salt = generate_salt().unwrap();
        let stored = hash(b"", &salt, test_iterations());

        assert!(verify(b"", &salt, &stored));
        assert!(!verify(b"not-empty", &salt, &stored));
    }

    #[test]
    fn test_storage_round_trip() {
        let salt = generate_salt().unwrap();
        let stored = hash(b"hunter2", &salt, test_iterations());

        let encoded = stored.to_storage_string();
        let parsed = PasswordHash::from_storage_string(&encoded).unwrap();

        assert_eq!(parsed, stored);
        assert!(verify(b"hunter2", &salt, &parsed));
    }

    #[test]
    fn test_storage_form_carries_iteration_count() {
        let salt = generate_salt().unwrap();
        let stored = hash(b"hunter2", &salt, test_iterations());

        // Hashes stored at an older count stay verifiable after the
        // configured count changes.
        let encoded = stored.to_storage_string();
        assert!(encoded.starts_with("pbkdf2-sha512$1000$"));

        let parsed = PasswordHash::from_storage_string(&encoded).unwrap();
        assert_eq!(parsed.iterations().get(), 1_000);
    }

    #[test]
    fn test_malformed_storage_forms_rejected() {
        assert!(matches!(
            PasswordHash::from_storage_string("bcrypt$12$abc"),
            Err(PasswordHashError::UnsupportedScheme)
        ));
        assert!(matches!(
            PasswordHash::from_storage_string("pbkdf2-sha512$zero$abc"),
            Err(PasswordHashError::Malformed)
        ));
        assert!(matches!(
            PasswordHash::from_storage_string("pbkdf2-sha512$1000$!!!"),
            Err(PasswordHashError::Malformed)
        ));
        assert!(matches!(
            PasswordHash::from_storage_string("pbkdf2-sha512$1000"),
            Err(PasswordHashError::Malformed)
        ));
        // Truncated digest
        assert!(matches!(
            PasswordHash::from_storage_string("pbkdf2-sha512$1000$dGVzdA=="),
            Err(PasswordHashError::Malformed)
        ));
    }

    #[test]
    fn test_salts_are_unique() {
        let a = generate_salt().unwrap();
        let b = generate_salt().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_debug_redacts_digest() {
        let salt = generate_salt().unwrap();
        let stored = hash(b"hunter2", &salt, test_iterations());
        let debug_str = format!("{:?}", stored);

        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains(&general_purpose::STANDARD.encode(&stored.digest)));
    }
}
