//! Builder patterns for test token construction, plus tamper helpers for
//! negative-path tests.

use auth_service::crypto::TokenCodec;
use auth_service::models::{AccessToken, Audience, Scope};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Builder for test access tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new(account_id)
///     .audience(Audience::Sse)
///     .with_scope(Scope::SseHandshake)
///     .expires_in(Duration::minutes(5))
///     .encode(&codec);
/// ```
pub struct TestTokenBuilder {
    account_id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    audience: Audience,
    scopes: BTreeSet<Scope>,
}

impl TestTokenBuilder {
    /// Defaults: API audience, no scopes, issued now, one hour lifetime.
    pub fn new(account_id: Uuid) -> Self {
        let issued_at = Utc::now().trunc_subsecs(3);
        Self {
            account_id,
            issued_at,
            expires_at: issued_at + Duration::hours(1),
            audience: Audience::Api,
            scopes: BTreeSet::new(),
        }
    }

    pub fn audience(mut self, audience: Audience) -> Self {
        self.audience = audience;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scopes.insert(scope);
        self
    }

    pub fn issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = issued_at;
        self
    }

    /// Set the lifetime relative to the issuance instant.
    pub fn expires_in(mut self, lifetime: Duration) -> Self {
        self.expires_at = self.issued_at + lifetime;
        self
    }

    /// Shift the token wholly into the past so that it expired `ago`
    /// before now.
    pub fn expired_since(mut self, ago: Duration) -> Self {
        self.expires_at = Utc::now().trunc_subsecs(3) - ago;
        self.issued_at = self.expires_at - Duration::hours(1);
        self
    }

    pub fn build(self) -> AccessToken {
        AccessToken {
            account_id: self.account_id,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            audience: self.audience,
            scopes: self.scopes,
        }
    }

    pub fn encode(self, codec: &TokenCodec) -> String {
        let token = self.build();
        codec.encode(&token).expect("test token encoding")
    }
}

/// Flip one byte inside the payload segment. The signature no longer
/// matches the mutated bytes.
pub fn tamper_with_payload(token: &str) -> String {
    flip_byte_in_segment(token, 1)
}

/// Flip one byte inside the signature segment.
pub fn tamper_with_signature(token: &str) -> String {
    flip_byte_in_segment(token, 2)
}

fn flip_byte_in_segment(token: &str, segment: usize) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    assert_eq!(parts.len(), 3, "expected a three-segment token");

    let mut bytes = URL_SAFE_NO_PAD
        .decode(&parts[segment])
        .expect("segment base64");
    bytes[0] ^= 0x01;
    parts[segment] = URL_SAFE_NO_PAD.encode(&bytes);

    parts.join(".")
}
