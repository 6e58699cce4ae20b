//! Credential verification and token minting.

use crate::config::Config;
use crate::crypto::password::{self, PasswordHash, SALT_LEN};
use crate::crypto::TokenCodec;
use crate::errors::AuthError;
use crate::models::{AccessToken, Account, Audience, Scope};
use crate::repositories::AccountStore;
use chrono::{Duration, SubsecRound, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

/// Fixed salt for the dummy credential verified when the email address is
/// unknown, so both outcomes pay the same PBKDF2 cost.
const DUMMY_SALT: &[u8; SALT_LEN] = b"unknown-account!";

pub struct AuthenticationService {
    accounts: Arc<dyn AccountStore>,
    codec: Arc<TokenCodec>,
    api_token_ttl: Duration,
    sse_token_ttl: Duration,
    dummy_hash: PasswordHash,
}

impl AuthenticationService {
    pub fn new(accounts: Arc<dyn AccountStore>, codec: Arc<TokenCodec>, config: &Config) -> Self {
        Self {
            accounts,
            codec,
            api_token_ttl: config.api_token_ttl,
            sse_token_ttl: config.sse_token_ttl,
            dummy_hash: dummy_credential(config.pbkdf2_iterations),
        }
    }

    /// Verify an email/password pair and mint a general-purpose API token.
    ///
    /// Failure is opaque: the same error and a comparable latency whether
    /// the account does not exist or the password does not verify. Exactly
    /// one PBKDF2 verification runs per call; unknown emails verify against
    /// a fixed dummy credential of equivalent cost.
    pub async fn authenticate(
        &self,
        email_address: &str,
        password: &SecretString,
    ) -> Result<(String, Account), AuthError> {
        let account = self.accounts.find_by_email(email_address).await;

        let (salt, stored) = match &account {
            Some(account) => (account.password_salt.clone(), account.password_hash.clone()),
            None => (DUMMY_SALT.to_vec(), self.dummy_hash.clone()),
        };

        // PBKDF2 is CPU-bound by design; keep it off the I/O workers.
        let candidate = password.clone();
        let verified = tokio::task::spawn_blocking(move || {
            password::verify(candidate.expose_secret().as_bytes(), &salt, &stored)
        })
        .await
        .map_err(|e| {
            tracing::warn!(target: "auth", error = %e, "Password verification task failed");
            AuthError::AuthenticationFailed
        })?;

        match account {
            Some(account) if verified => {
                let token = self.mint(
                    account.account_id,
                    Audience::Api,
                    BTreeSet::new(),
                    self.api_token_ttl,
                )?;
                tracing::info!(target: "auth", account_id = %account.account_id, "Login succeeded");
                Ok((token, account))
            }
            _ => {
                tracing::debug!(target: "auth", "Login failed");
                Err(AuthError::AuthenticationFailed)
            }
        }
    }

    /// Mint a short-lived event-stream handshake token for an already
    /// authenticated caller. It travels as a query parameter, so the short
    /// lifetime and single audience/scope bound the damage if it leaks via
    /// URL logging or referrer headers.
    pub fn issue_stream_token(&self, account: &Account) -> Result<String, AuthError> {
        let token = self.mint(
            account.account_id,
            Audience::Sse,
            BTreeSet::from([Scope::SseHandshake]),
            self.sse_token_ttl,
        )?;
        tracing::debug!(target: "auth", account_id = %account.account_id, "Issued event-stream token");
        Ok(token)
    }

    fn mint(
        &self,
        account_id: Uuid,
        audience: Audience,
        scopes: BTreeSet<Scope>,
        ttl: Duration,
    ) -> Result<String, AuthError> {
        // Millisecond precision so the instants round-trip the wire form
        // exactly.
        let issued_at = Utc::now().trunc_subsecs(3);
        let token = AccessToken {
            account_id,
            issued_at,
            expires_at: issued_at + ttl,
            audience,
            scopes,
        };
        self.codec.encode(&token)
    }
}

fn dummy_credential(iterations: NonZeroU32) -> PasswordHash {
    password::hash(b"dummy-credential-for-unknown-accounts", DUMMY_SALT, iterations)
}
