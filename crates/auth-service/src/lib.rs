//! Authentication and authorization core for the Toybox store.
//!
//! Issues, signs, and verifies compact bearer tokens, enforces role-based
//! access control, and propagates per-request locale/timezone context,
//! including to long-lived event-stream connections.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `context` - Ambient per-request context
//! - `crypto` - Password hashing, signing keys, token codec
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authorization and context middleware
//! - `models` - Data models
//! - `repositories` - Collaborator interfaces (account lookup)
//! - `routes` - Route registration
//! - `services` - Authentication service and authorization enforcer
//!
//! The crate is wired by the host process: load [`config::Config`], build a
//! [`crypto::SigningKeyProvider`] from the secrets collaborator (fatal on
//! failure), construct an [`AppState`] over the account store, and mount
//! [`routes::build_router`].

pub mod config;
pub mod context;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

use crate::config::Config;
use crate::crypto::{SigningKeyProvider, TokenCodec};
use crate::models::StoreEvent;
use crate::repositories::AccountStore;
use crate::services::{AuthenticationService, AuthorizationEnforcer};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Buffered events per subscriber before a slow connection starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Application state shared across handlers and middleware.
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub codec: Arc<TokenCodec>,
    pub authentication: AuthenticationService,
    pub enforcer: AuthorizationEnforcer,
    pub events: broadcast::Sender<StoreEvent>,
}

impl AppState {
    pub fn new(config: &Config, keys: SigningKeyProvider, accounts: Arc<dyn AccountStore>) -> Self {
        let codec = Arc::new(TokenCodec::new(keys));
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            authentication: AuthenticationService::new(
                Arc::clone(&accounts),
                Arc::clone(&codec),
                config,
            ),
            enforcer: AuthorizationEnforcer::new(Arc::clone(&accounts), Arc::clone(&codec)),
            accounts,
            codec,
            events,
        }
    }

    /// Fan an event out to all subscribed event-stream connections.
    pub fn publish(&self, event: StoreEvent) {
        // Err only means there are no live subscribers.
        let _ = self.events.send(event);
    }
}
