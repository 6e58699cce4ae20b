//! Access-token codec: serialize, sign, verify, deserialize.
//!
//! Produces the compact three-part wire form
//! `base64url(header).base64url(payload).base64url(signature)` with an
//! Ed25519 signature over the first two parts. Only EdDSA is ever accepted
//! on decode; there is no algorithm negotiation.
//!
//! Decoding rejects malformed structure, bad signatures, and ill-typed or
//! missing fields as [`AuthError::TokenInvalid`]. It does NOT check expiry;
//! expiry is an explicit check the authorization enforcer performs against
//! `expires_at`.

use crate::crypto::keys::SigningKeyProvider;
use crate::errors::AuthError;
use crate::models::{AccessToken, Audience, Scope};
use chrono::DateTime;
use jsonwebtoken::{Algorithm, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum accepted token size in bytes. Oversized tokens are rejected
/// before any base64 decoding or signature work.
pub const MAX_TOKEN_SIZE_BYTES: usize = 4096;

/// Claims as they appear on the wire. Instants are epoch milliseconds so
/// sub-second precision survives the round trip.
#[derive(Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    iat: i64,
    exp: i64,
    aud: String,
    scope: String,
}

impl fmt::Debug for WireClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireClaims")
            .field("sub", &"[REDACTED]")
            .field("iat", &self.iat)
            .field("exp", &self.exp)
            .field("aud", &self.aud)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Stateless, lock-free codec over the process signing keypair.
pub struct TokenCodec {
    keys: SigningKeyProvider,
}

impl TokenCodec {
    pub fn new(keys: SigningKeyProvider) -> Self {
        Self { keys }
    }

    pub fn encode(&self, token: &AccessToken) -> Result<String, AuthError> {
        let claims = WireClaims {
            sub: token.account_id.to_string(),
            iat: token.issued_at.timestamp_millis(),
            exp: token.expires_at.timestamp_millis(),
            aud: token.audience.as_str().to_string(),
            scope: token
                .scopes
                .iter()
                .map(Scope::as_str)
                .collect::<Vec<_>>()
                .join(" "),
        };

        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());

        jsonwebtoken::encode(&header, &claims, self.keys.encoding_key()).map_err(|e| {
            tracing::debug!(target: "crypto", error = %e, "Token signing failed");
            AuthError::TokenInvalid
        })
    }

    pub fn decode(&self, token: &str) -> Result<AccessToken, AuthError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(
                target: "crypto",
                token_size = token.len(),
                max_size = MAX_TOKEN_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(AuthError::TokenInvalid);
        }

        // Expiry and audience are this core's explicit checks; the library
        // only verifies structure and signature here.
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<WireClaims>(token, self.keys.decoding_key(), &validation)
            .map_err(|e| {
                tracing::debug!(target: "crypto", error = %e, "Token verification failed");
                AuthError::TokenInvalid
            })?;

        Self::from_claims(data.claims)
    }

    fn from_claims(claims: WireClaims) -> Result<AccessToken, AuthError> {
        let account_id = Uuid::parse_str(&claims.sub).map_err(|e| {
            tracing::debug!(target: "crypto", error = %e, "Token rejected: malformed subject");
            AuthError::TokenInvalid
        })?;

        let issued_at =
            DateTime::from_timestamp_millis(claims.iat).ok_or(AuthError::TokenInvalid)?;
        let expires_at =
            DateTime::from_timestamp_millis(claims.exp).ok_or(AuthError::TokenInvalid)?;
        if expires_at <= issued_at {
            tracing::debug!(target: "crypto", "Token rejected: expiry not after issuance");
            return Err(AuthError::TokenInvalid);
        }

        let audience: Audience = claims.aud.parse().map_err(|_| {
            tracing::debug!(target: "crypto", aud = %claims.aud, "Token rejected: unknown audience");
            AuthError::TokenInvalid
        })?;

        let scopes = claims
            .scope
            .split_whitespace()
            .map(str::parse::<Scope>)
            .collect::<Result<_, _>>()
            .map_err(|_| {
                tracing::debug!(target: "crypto", "Token rejected: unknown scope");
                AuthError::TokenInvalid
            })?;

        Ok(AccessToken {
            account_id,
            issued_at,
            expires_at,
            audience,
            scopes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::{Duration, SubsecRound, Utc};
    use ring::rand::SystemRandom;
    use ring::signature::Ed25519KeyPair;
    use std::collections::BTreeSet;

    fn test_codec() -> TokenCodec {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        TokenCodec::new(SigningKeyProvider::from_pkcs8(pkcs8.as_ref()).unwrap())
    }

    fn api_token() -> AccessToken {
        let issued_at = Utc::now().trunc_subsecs(3);
        AccessToken {
            account_id: Uuid::new_v4(),
            issued_at,
            expires_at: issued_at + Duration::hours(1),
            audience: Audience::Api,
            scopes: BTreeSet::new(),
        }
    }

    #[test]
    fn test_round_trip_preserves_all_fields() {
        let codec = test_codec();
        let token = api_token();

        let encoded = codec.encode(&token).unwrap();
        let decoded = codec.decode(&encoded).unwrap();

        assert_eq!(decoded, token);
    }

    #[test]
    fn test_round_trip_preserves_sub_second_precision() {
        let codec = test_codec();
        let issued_at = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let token = AccessToken {
            account_id: Uuid::new_v4(),
            issued_at,
            expires_at: issued_at + Duration::milliseconds(90_500),
            audience: Audience::Sse,
            scopes: BTreeSet::from([Scope::SseHandshake]),
        };

        let decoded = codec.decode(&codec.encode(&token).unwrap()).unwrap();

        assert_eq!(decoded.issued_at.timestamp_millis(), 1_700_000_000_123);
        assert_eq!(decoded.expires_at.timestamp_millis(), 1_700_000_090_623);
    }

    #[test]
    fn test_decode_does_not_reject_expired_tokens() {
        let codec = test_codec();
        let issued_at = Utc::now().trunc_subsecs(3) - Duration::hours(2);
        let token = AccessToken {
            issued_at,
            expires_at: issued_at + Duration::hours(1),
            ..api_token()
        };

        // Expiry is the enforcer's explicit check, not the codec's.
        let decoded = codec.decode(&codec.encode(&token).unwrap()).unwrap();
        assert!(decoded.is_expired_at(Utc::now()));
    }

    #[test]
    fn test_wire_format_has_three_segments_and_eddsa_header() {
        let codec = test_codec();
        let encoded = codec.encode(&api_token()).unwrap();

        let parts: Vec<&str> = encoded.split('.').collect();
        assert_eq!(parts.len(), 3);

        let header_bytes = URL_SAFE_NO_PAD.decode(parts[0]).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header_bytes).unwrap();
        assert_eq!(header["alg"], "EdDSA");
        assert_eq!(header["typ"], "JWT");
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = test_codec();
        let encoded = codec.encode(&api_token()).unwrap();

        let parts: Vec<&str> = encoded.split('.').collect();
        let sig = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        for i in 0..sig.len() {
            let mut tampered_sig = sig.clone();
            tampered_sig[i] ^= 0x01;
            let tampered = format!(
                "{}.{}.{}",
                parts[0],
                parts[1],
                URL_SAFE_NO_PAD.encode(&tampered_sig)
            );
            assert!(
                matches!(codec.decode(&tampered), Err(AuthError::TokenInvalid)),
                "flipping signature byte {} must invalidate the token",
                i
            );
        }
        // The untouched token still decodes.
        assert!(codec.decode(&encoded).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = test_codec();
        let encoded = codec.encode(&api_token()).unwrap();

        let parts: Vec<&str> = encoded.split('.').collect();
        let mut payload = URL_SAFE_NO_PAD.decode(parts[1]).unwrap();
        payload[0] ^= 0x01;
        let tampered = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(&payload),
            parts[2]
        );

        assert!(matches!(codec.decode(&tampered), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let codec = test_codec();
        let other_codec = test_codec();

        let encoded = codec.encode(&api_token()).unwrap();
        assert!(matches!(
            other_codec.decode(&encoded),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = test_codec();

        for garbage in ["", "not-a-token", "a.b", "a.b.c.d", "!!.!!.!!"] {
            assert!(
                matches!(codec.decode(garbage), Err(AuthError::TokenInvalid)),
                "{:?} must be rejected",
                garbage
            );
        }
    }

    #[test]
    fn test_oversized_token_rejected_before_parsing() {
        let codec = test_codec();
        let oversized = "a".repeat(MAX_TOKEN_SIZE_BYTES + 1);
        assert!(matches!(codec.decode(&oversized), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_expiry_not_after_issuance_rejected() {
        let codec = test_codec();
        let instant = Utc::now().trunc_subsecs(3);
        let token = AccessToken {
            account_id: Uuid::new_v4(),
            issued_at: instant,
            expires_at: instant,
            audience: Audience::Api,
            scopes: BTreeSet::new(),
        };

        let encoded = codec.encode(&token).unwrap();
        assert!(matches!(codec.decode(&encoded), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_unknown_audience_and_scope_rejected() {
        let codec = test_codec();
        let token = api_token();

        // Re-sign claims with fields the model does not know.
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());

        let bad_aud = WireClaims {
            sub: token.account_id.to_string(),
            iat: token.issued_at.timestamp_millis(),
            exp: token.expires_at.timestamp_millis(),
            aud: "admin".to_string(),
            scope: String::new(),
        };
        let encoded =
            jsonwebtoken::encode(&header, &bad_aud, codec.keys.encoding_key()).unwrap();
        assert!(matches!(codec.decode(&encoded), Err(AuthError::TokenInvalid)));

        let bad_scope = WireClaims {
            sub: token.account_id.to_string(),
            iat: token.issued_at.timestamp_millis(),
            exp: token.expires_at.timestamp_millis(),
            aud: "api".to_string(),
            scope: "toys:write".to_string(),
        };
        let encoded =
            jsonwebtoken::encode(&header, &bad_scope, codec.keys.encoding_key()).unwrap();
        assert!(matches!(codec.decode(&encoded), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_missing_fields_rejected() {
        let codec = test_codec();
        let mut header = Header::new(Algorithm::EdDSA);
        header.typ = Some("JWT".to_string());

        #[derive(Serialize)]
        struct PartialClaims {
            sub: String,
            iat: i64,
        }

        let claims = PartialClaims {
            sub: Uuid::new_v4().to_string(),
            iat: Utc::now().timestamp_millis(),
        };
        let encoded = jsonwebtoken::encode(&header, &claims, codec.keys.encoding_key()).unwrap();

        assert!(matches!(codec.decode(&encoded), Err(AuthError::TokenInvalid)));
    }

    #[test]
    fn test_wire_claims_debug_redacts_subject() {
        let claims = WireClaims {
            sub: "b0a2f8d0-0000-0000-0000-000000000000".to_string(),
            iat: 0,
            exp: 1,
            aud: "api".to_string(),
            scope: String::new(),
        };

        let debug_str = format!("{:?}", claims);
        assert!(debug_str.contains("[REDACTED]"));
        assert!(!debug_str.contains("b0a2f8d0"));
    }
}
