//! Custom test assertions for expressive tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

/// Token header structure
#[derive(Debug, Deserialize)]
struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

/// Token claims structure
#[derive(Debug, Deserialize)]
struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub scope: String,
}

/// Custom assertions for encoded access tokens.
///
/// # Example
/// ```rust,ignore
/// token
///     .assert_valid_jwt()
///     .assert_audience("sse")
///     .assert_has_scope("sse:handshake");
/// ```
pub trait TokenAssertions {
    /// Assert the three-segment wire format with an EdDSA header.
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the declared audience.
    fn assert_audience(&self, audience: &str) -> &Self;

    /// Assert that the token carries the given scope.
    fn assert_has_scope(&self, scope: &str) -> &Self;

    /// Assert the token's subject.
    fn assert_for_account(&self, account_id: Uuid) -> &Self;

    /// Assert `exp - iat` in milliseconds.
    fn assert_lifetime_millis(&self, lifetime_millis: i64) -> &Self;
}

fn claims_of(token: &str) -> TokenClaims {
    let parts: Vec<&str> = token.split('.').collect();
    assert_eq!(parts.len(), 3, "token must have 3 segments");
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .expect("payload must be base64url");
    serde_json::from_slice(&payload).expect("claims must parse")
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<&str> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "token must have 3 segments (header.payload.signature), got {}",
            parts.len()
        );

        let header_bytes = URL_SAFE_NO_PAD
            .decode(parts[0])
            .expect("header must be base64url");
        let header: TokenHeader =
            serde_json::from_slice(&header_bytes).expect("header must parse");
        assert_eq!(header.alg, "EdDSA", "expected EdDSA algorithm");
        assert_eq!(header.typ, "JWT", "expected JWT type");

        // The payload must parse as well-formed claims.
        let _ = claims_of(self);

        self
    }

    fn assert_audience(&self, audience: &str) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.aud, audience,
            "token audience is '{}', expected '{}'",
            claims.aud, audience
        );
        self
    }

    fn assert_has_scope(&self, scope: &str) -> &Self {
        let claims = claims_of(self);
        let scopes: Vec<&str> = claims.scope.split_whitespace().collect();
        assert!(
            scopes.contains(&scope),
            "token does not carry scope '{}'. Available scopes: '{}'",
            scope,
            claims.scope
        );
        self
    }

    fn assert_for_account(&self, account_id: Uuid) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.sub,
            account_id.to_string(),
            "token subject does not match"
        );
        self
    }

    fn assert_lifetime_millis(&self, lifetime_millis: i64) -> &Self {
        let claims = claims_of(self);
        assert_eq!(
            claims.exp - claims.iat,
            lifetime_millis,
            "unexpected token lifetime"
        );
        self
    }
}
