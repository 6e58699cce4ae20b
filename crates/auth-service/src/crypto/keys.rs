//! Signing keypair loading.
//!
//! The Ed25519 keypair is loaded once at process start from a secrets
//! collaborator and is immutable for the process lifetime. Missing or
//! malformed key material is a fatal configuration error, never a
//! per-request error.

use crate::config::ConfigError;
use base64::{engine::general_purpose, Engine as _};
use jsonwebtoken::{DecodingKey, EncodingKey};
use ring::signature::{Ed25519KeyPair, KeyPair};
use secrecy::{ExposeSecret, SecretBox};
use std::env;

/// Secrets collaborator. Consulted exactly once, at startup.
pub trait SecretStore: Send + Sync {
    /// The active Ed25519 private key as a PKCS#8 v1 document.
    fn signing_private_key(&self) -> Result<SecretBox<Vec<u8>>, ConfigError>;
}

/// Secret store backed by the process environment: the signing key is a
/// base64-encoded PKCS#8 document in `AUTH_SIGNING_KEY`.
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub const SIGNING_KEY_VAR: &'static str = "AUTH_SIGNING_KEY";
}

impl SecretStore for EnvSecretStore {
    fn signing_private_key(&self) -> Result<SecretBox<Vec<u8>>, ConfigError> {
        let encoded = env::var(Self::SIGNING_KEY_VAR)
            .map_err(|_| ConfigError::MissingEnvVar(Self::SIGNING_KEY_VAR.to_string()))?;
        let bytes = general_purpose::STANDARD.decode(encoded)?;
        Ok(SecretBox::new(Box::new(bytes)))
    }
}

/// The active signing keypair: private key for signing, public key for
/// verification.
pub struct SigningKeyProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeyProvider {
    /// Load and validate the keypair from the secrets collaborator.
    pub fn from_secret_store(store: &dyn SecretStore) -> Result<Self, ConfigError> {
        let pkcs8 = store.signing_private_key()?;
        Self::from_pkcs8(pkcs8.expose_secret())
    }

    /// Build the keypair from a PKCS#8 v1 Ed25519 document, failing fast on
    /// malformed material.
    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<Self, ConfigError> {
        let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8)
            .map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?;

        let encoding = EncodingKey::from_ed_der(pkcs8);
        let decoding = DecodingKey::from_ed_der(key_pair.public_key().as_ref());

        Ok(Self { encoding, decoding })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}
