//! Policy evaluation for protected endpoints.
//!
//! Each protected endpoint registers an [`AuthPolicy`]; one shared
//! enforcer evaluates it against the presented token. Checks run in a
//! fixed order and the first failure wins, reported as its own distinct
//! condition: presence, signature, expiry, audience, scope, role.

use crate::crypto::TokenCodec;
use crate::errors::AuthError;
use crate::models::{Account, Audience, Role, Scope};
use crate::repositories::AccountStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Role requirement of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolePolicy {
    /// Any authenticated account; only presence, signature, expiry,
    /// audience, and scope are checked.
    AnyAuthenticated,
    /// The account's role must be one of the listed roles.
    OneOf(&'static [Role]),
}

/// Access requirements attached to an endpoint's registration.
#[derive(Debug, Clone, Copy)]
pub struct AuthPolicy {
    pub audience: Audience,
    pub scopes: &'static [Scope],
    pub roles: RolePolicy,
}

pub struct AuthorizationEnforcer {
    accounts: Arc<dyn AccountStore>,
    codec: Arc<TokenCodec>,
}

impl AuthorizationEnforcer {
    pub fn new(accounts: Arc<dyn AccountStore>, codec: Arc<TokenCodec>) -> Self {
        Self { accounts, codec }
    }

    /// Evaluate `policy` against the presented token and resolve the
    /// account on success.
    pub async fn authorize(
        &self,
        token: Option<&str>,
        policy: &AuthPolicy,
    ) -> Result<Account, AuthError> {
        self.authorize_at(token, policy, Utc::now()).await
    }

    /// Deterministic variant of [`authorize`](Self::authorize) against an
    /// explicit `now`, so expiry boundaries can be tested without
    /// wall-clock dependence.
    pub async fn authorize_at(
        &self,
        token: Option<&str>,
        policy: &AuthPolicy,
        now: DateTime<Utc>,
    ) -> Result<Account, AuthError> {
        let raw = token.ok_or(AuthError::Unauthenticated)?;

        let token = self.codec.decode(raw)?;

        if token.is_expired_at(now) {
            tracing::debug!(target: "auth", expires_at = %token.expires_at, "Token rejected: expired");
            return Err(AuthError::TokenExpired);
        }

        if token.audience != policy.audience {
            tracing::debug!(
                target: "auth",
                presented = token.audience.as_str(),
                required = policy.audience.as_str(),
                "Token rejected: wrong audience"
            );
            return Err(AuthError::WrongAudience);
        }

        for scope in policy.scopes {
            if !token.has_scope(*scope) {
                return Err(AuthError::InsufficientScope {
                    required: scope.as_str(),
                });
            }
        }

        // The token asserts an identity that must still exist; a vanished
        // subject is indistinguishable from tampering to the caller.
        let account = self
            .accounts
            .find_by_id(token.account_id)
            .await
            .ok_or_else(|| {
                tracing::debug!(target: "auth", "Token rejected: subject no longer resolves");
                AuthError::TokenInvalid
            })?;

        if let RolePolicy::OneOf(roles) = policy.roles {
            if !roles.contains(&account.role) {
                tracing::debug!(
                    target: "auth",
                    account_id = %account.account_id,
                    role = account.role.as_str(),
                    "Access denied: role not permitted"
                );
                return Err(AuthError::Forbidden);
            }
        }

        Ok(account)
    }
}
