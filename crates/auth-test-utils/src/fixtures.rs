//! Crypto and account fixtures for reproducible tests.
//!
//! Password hashes use a deliberately low iteration count so suites stay
//! fast; the production floor only applies to configuration loaded through
//! `Config::from_vars`.

use auth_service::config::Config;
use auth_service::crypto::password;
use auth_service::crypto::{SigningKeyProvider, TokenCodec};
use auth_service::models::{Account, Role};
use auth_service::repositories::InMemoryAccountStore;
use auth_service::routes::build_router;
use auth_service::AppState;
use axum::Router;
use chrono::Duration;
use ring::rand::SystemRandom;
use ring::signature::Ed25519KeyPair;
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

/// Password shared by all fixture accounts.
pub const TEST_PASSWORD: &str = "correct horse battery staple";

/// Fast PBKDF2 iteration count for fixtures.
pub const TEST_ITERATIONS: u32 = 1_000;

/// Generate a fresh Ed25519 signing key as a PKCS#8 document.
pub fn test_signing_key() -> Vec<u8> {
    let rng = SystemRandom::new();
    Ed25519KeyPair::generate_pkcs8(&rng)
        .expect("test keypair generation")
        .as_ref()
        .to_vec()
}

/// Service configuration for tests: fast hashing, one-hour API tokens,
/// five-minute stream tokens.
pub fn test_config() -> Config {
    Config {
        pbkdf2_iterations: NonZeroU32::new(TEST_ITERATIONS).expect("nonzero"),
        api_token_ttl: Duration::hours(1),
        sse_token_ttl: Duration::minutes(5),
    }
}

/// Build an account with a freshly salted hash of [`TEST_PASSWORD`].
pub fn test_account(email: &str, role: Role, locale: &str, time_zone: &str) -> Account {
    let salt = password::generate_salt().expect("salt generation");
    Account {
        account_id: Uuid::new_v4(),
        email_address: email.to_string(),
        role,
        password_hash: password::hash(
            TEST_PASSWORD.as_bytes(),
            &salt,
            NonZeroU32::new(TEST_ITERATIONS).expect("nonzero"),
        ),
        password_salt: salt.to_vec(),
        locale: locale.to_string(),
        time_zone: time_zone.to_string(),
    }
}

pub fn admin_account() -> Account {
    test_account("admin@example.com", Role::Administrator, "de", "Europe/Berlin")
}

pub fn employee_account() -> Account {
    test_account("employee@example.com", Role::Employee, "en", "UTC")
}

pub fn customer_account() -> Account {
    test_account("customer@example.com", Role::Customer, "fr", "Europe/Paris")
}

/// A fully wired application over an in-memory store, plus a codec sharing
/// the same keypair for minting and inspecting tokens out of band.
pub struct AuthFixture {
    pub state: Arc<AppState>,
    pub codec: TokenCodec,
    pub accounts: Vec<Account>,
}

impl AuthFixture {
    pub fn new(accounts: Vec<Account>) -> Self {
        let pkcs8 = test_signing_key();
        let store = Arc::new(InMemoryAccountStore::new(accounts.clone()));
        let state = Arc::new(AppState::new(
            &test_config(),
            SigningKeyProvider::from_pkcs8(&pkcs8).expect("fixture signing key"),
            store,
        ));
        let codec = TokenCodec::new(
            SigningKeyProvider::from_pkcs8(&pkcs8).expect("fixture signing key"),
        );
        Self {
            state,
            codec,
            accounts,
        }
    }

    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    pub fn account(&self, email: &str) -> &Account {
        self.accounts
            .iter()
            .find(|a| a.email_address == email)
            .unwrap_or_else(|| panic!("no fixture account with email {}", email))
    }
}
