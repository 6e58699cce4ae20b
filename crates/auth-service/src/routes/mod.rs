//! Route registration.
//!
//! Each protected endpoint declares its [`AuthPolicy`] here; the shared
//! authorization middleware evaluates it before the endpoint body runs.
//! Public endpoints run under the public-context middleware instead.

use crate::handlers;
use crate::middleware::{establish_public_context, require_auth};
use crate::models::{Audience, Role, Scope};
use crate::services::{AuthPolicy, RolePolicy};
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Event-stream token minting requires an administrator's API token.
/// Event-stream access is administrator-only; general toy browsing stays
/// public.
const STREAM_TOKEN_POLICY: AuthPolicy = AuthPolicy {
    audience: Audience::Api,
    scopes: &[],
    roles: RolePolicy::OneOf(&[Role::Administrator]),
};

/// The handshake itself accepts only the narrow SSE token.
const SSE_SUBSCRIBE_POLICY: AuthPolicy = AuthPolicy {
    audience: Audience::Sse,
    scopes: &[Scope::SseHandshake],
    roles: RolePolicy::OneOf(&[Role::Administrator]),
};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Authentication endpoints
        .route(
            "/api/v1/auth/login",
            post(handlers::auth::login).route_layer(middleware::from_fn(establish_public_context)),
        )
        .route(
            "/api/v1/auth/stream-token",
            post(handlers::auth::stream_token)
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
                .route_layer(Extension(STREAM_TOKEN_POLICY)),
        )
        // Event-stream handshake
        .route(
            "/api/v1/events",
            get(handlers::events::subscribe)
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
                .route_layer(Extension(SSE_SUBSCRIBE_POLICY)),
        )
        // Health check
        .route("/health", get(health_check))
        // Tracing middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
