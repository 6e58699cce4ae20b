//! Ambient per-request context.
//!
//! Carries the authenticated account (if any) and the effective locale and
//! time zone for the lifetime of one request, readable from arbitrarily
//! deep call chains without parameter threading. Task-local storage keeps
//! each unit of work's context invisible to every other concurrent unit.
//!
//! Long-lived event-stream connections capture the context established at
//! handshake time and re-enter it for each asynchronous push, because the
//! originating request's scope has already ended by the time a push occurs.

use crate::models::Account;
use std::future::Future;

/// Fallback locale for unauthenticated requests with no usable
/// `Accept-Language` header.
pub const DEFAULT_LOCALE: &str = "en";

/// Fallback time zone for unauthenticated requests.
pub const DEFAULT_TIME_ZONE: &str = "UTC";

tokio::task_local! {
    static CURRENT: RequestContext;
}

/// Immutable per-request state: resolved account, locale, time zone.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub account: Option<Account>,
    pub locale: String,
    pub time_zone: String,
}

impl RequestContext {
    /// Context for an authenticated request; locale and time zone come from
    /// the account's preferences.
    pub fn authenticated(account: Account) -> Self {
        Self {
            locale: account.locale.clone(),
            time_zone: account.time_zone.clone(),
            account: Some(account),
        }
    }

    /// Context for a public request, resolved from request headers or
    /// defaults.
    pub fn anonymous(locale: String, time_zone: String) -> Self {
        Self {
            account: None,
            locale,
            time_zone,
        }
    }
}

/// Run a unit of work inside `ctx`. The context is visible to everything
/// the future awaits and to nothing outside it.
pub async fn with_context<F>(ctx: RequestContext, f: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, f).await
}

/// Re-enter a captured context for a synchronous piece of work, e.g.
/// formatting an event-stream payload on a connection whose handshake
/// request has long completed.
pub fn with_context_sync<T>(ctx: RequestContext, f: impl FnOnce() -> T) -> T {
    CURRENT.sync_scope(ctx, f)
}

/// The current request's context, if one has been established.
pub fn try_current() -> Option<RequestContext> {
    CURRENT.try_with(Clone::clone).ok()
}

/// The current request's context.
///
/// # Panics
///
/// Panics when no context has been established. That is a bug in request
/// wiring (the authorization middleware or the public-context middleware
/// must run before any downstream read), not a recoverable condition.
#[allow(clippy::expect_used)]
pub fn current() -> RequestContext {
    try_current().expect(
        "request context accessed before being established; \
         authorization or public-context middleware must run first",
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_visible_inside_scope() {
        let ctx = RequestContext::anonymous("fr".to_string(), "Europe/Paris".to_string());

        with_context(ctx, async {
            let current = current();
            assert_eq!(current.locale, "fr");
            assert_eq!(current.time_zone, "Europe/Paris");
            assert!(current.account.is_none());
        })
        .await;
    }

    #[tokio::test]
    async fn test_no_context_outside_scope() {
        assert!(try_current().is_none());

        let ctx = RequestContext::anonymous("fr".to_string(), "Europe/Paris".to_string());
        with_context(ctx, async {}).await;

        // The scope does not leak past its unit of work.
        assert!(try_current().is_none());
    }

    #[tokio::test]
    async fn test_no_leakage_across_concurrent_tasks() {
        let a = tokio::spawn(with_context(
            RequestContext::anonymous("de".to_string(), "Europe/Berlin".to_string()),
            async {
                tokio::task::yield_now().await;
                current().locale
            },
        ));
        let b = tokio::spawn(with_context(
            RequestContext::anonymous("ja".to_string(), "Asia/Tokyo".to_string()),
            async {
                tokio::task::yield_now().await;
                current().locale
            },
        ));

        assert_eq!(a.await.unwrap(), "de");
        assert_eq!(b.await.unwrap(), "ja");
    }

    #[tokio::test]
    async fn test_sync_scope_restores_captured_context() {
        let captured = with_context(
            RequestContext::anonymous("pt".to_string(), "America/Sao_Paulo".to_string()),
            async { current() },
        )
        .await;

        // The originating scope has ended; re-entering the captured context
        // makes it readable again.
        assert!(try_current().is_none());
        let locale = with_context_sync(captured, || current().locale);
        assert_eq!(locale, "pt");
    }

    #[tokio::test]
    #[should_panic(expected = "request context accessed before being established")]
    async fn test_read_without_context_panics() {
        let _ = current();
    }
}
