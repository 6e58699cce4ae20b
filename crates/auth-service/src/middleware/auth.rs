//! Request-level enforcement and context establishment.
//!
//! Protected routes attach an [`AuthPolicy`] to their registration; the
//! shared [`require_auth`] middleware evaluates it before the endpoint
//! body runs, then executes the handler inside the authenticated request
//! context. Public routes run under [`establish_public_context`] instead,
//! so downstream reads of the ambient context never find it unset.

use crate::context::{self, RequestContext, DEFAULT_LOCALE, DEFAULT_TIME_ZONE};
use crate::errors::AuthError;
use crate::models::Audience;
use crate::services::AuthPolicy;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, Uri},
    middleware::Next,
    response::Response,
    Extension,
};
use std::sync::Arc;

/// Query parameter carrying the handshake token for event-stream requests,
/// which cannot set custom headers.
pub const SSE_TOKEN_QUERY_PARAM: &str = "sse-access-token";

/// Shared authorization middleware for protected routes.
///
/// On success the resolved account is placed in the request extensions and
/// the inner handler runs inside an authenticated [`RequestContext`].
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    Extension(policy): Extension<AuthPolicy>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = extract_token(req.headers(), req.uri(), &policy);

    let account = state.enforcer.authorize(token.as_deref(), &policy).await?;

    let ctx = RequestContext::authenticated(account.clone());
    req.extensions_mut().insert(account);

    Ok(context::with_context(ctx, next.run(req)).await)
}

/// Context establishment for public routes: no account, locale and time
/// zone resolved from request headers or defaults.
pub async fn establish_public_context(req: Request, next: Next) -> Response {
    let ctx = RequestContext::anonymous(
        locale_from_headers(req.headers()),
        time_zone_from_headers(req.headers()),
    );
    context::with_context(ctx, next.run(req)).await
}

fn extract_token(headers: &HeaderMap, uri: &Uri, policy: &AuthPolicy) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }
    if policy.audience == Audience::Sse {
        return query_token(uri);
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

fn query_token(uri: &Uri) -> Option<String> {
    // Token characters are URL-safe base64 plus '.', so no percent-decoding
    // is involved.
    uri.query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SSE_TOKEN_QUERY_PARAM)
        .map(|(_, value)| value.to_string())
}

fn locale_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("accept-language")
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.split(',').next())
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty() && *tag != "*")
        .unwrap_or(DEFAULT_LOCALE)
        .to_string()
}

fn time_zone_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-time-zone")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|tz| !tz.is_empty())
        .unwrap_or(DEFAULT_TIME_ZONE)
        .to_string()
}
