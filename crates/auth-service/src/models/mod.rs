use crate::crypto::password::PasswordHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Permission tier assigned to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Employee,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Employee => "employee",
            Role::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "administrator" => Ok(Role::Administrator),
            "employee" => Ok(Role::Employee),
            "customer" => Ok(Role::Customer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Declared purpose of a token. A token is only accepted by endpoints that
/// require its audience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Audience {
    /// General bearer use over the `Authorization` header.
    Api,
    /// Event-stream handshake only, carried in a query parameter.
    Sse,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Api => "api",
            Audience::Sse => "sse",
        }
    }
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(Audience::Api),
            "sse" => Ok(Audience::Sse),
            _ => Err(format!("Invalid audience: {}", s)),
        }
    }
}

/// Narrow capability grant carried by a token, checked in addition to
/// role-based policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scope {
    SseHandshake,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::SseHandshake => "sse:handshake",
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sse:handshake" => Ok(Scope::SseHandshake),
            _ => Err(format!("Invalid scope: {}", s)),
        }
    }
}

/// Signed, time-bounded credential asserting account identity, audience,
/// and scopes. Immutable once constructed; the signature produced by the
/// token codec covers every field, so any mutation invalidates it.
///
/// Instants carry millisecond precision and round-trip exactly through the
/// wire encoding. Never persisted server-side; expiry is the only
/// invalidation mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub account_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub audience: Audience,
    pub scopes: BTreeSet<Scope>,
}

impl AccessToken {
    /// Expiry is strict: a token is still valid at the instant it expires.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scopes.contains(&scope)
    }
}

/// An account as read from the store. Owned by the persistence layer;
/// read-only here.
///
/// Not `Serialize`: responses use [`AccountResponse`], which omits the
/// credential material.
#[derive(Clone)]
pub struct Account {
    pub account_id: Uuid,
    pub email_address: String,
    pub role: Role,
    pub password_hash: PasswordHash,
    pub password_salt: Vec<u8>,
    pub locale: String,
    pub time_zone: String,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("account_id", &self.account_id)
            .field("email_address", &self.email_address)
            .field("role", &self.role)
            .field("password_hash", &"[REDACTED]")
            .field("password_salt", &"[REDACTED]")
            .field("locale", &self.locale)
            .field("time_zone", &self.time_zone)
            .finish()
    }
}

/// Client-facing view of an account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub account_id: Uuid,
    pub email_address: String,
    pub role: Role,
    pub locale: String,
    pub time_zone: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.account_id,
            email_address: account.email_address.clone(),
            role: account.role,
            locale: account.locale.clone(),
            time_zone: account.time_zone.clone(),
        }
    }
}

/// Response to a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub authentication_token: String,
    pub account: AccountResponse,
}

/// Response to an event-stream token request.
#[derive(Debug, Clone, Serialize)]
pub struct StreamTokenResponse {
    pub access_token: String,
}

/// Event published by the store and fanned out to subscribed event-stream
/// connections.
#[derive(Debug, Clone, Serialize)]
pub struct StoreEvent {
    pub topic: String,
    pub body: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}
