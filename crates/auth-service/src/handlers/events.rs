//! Event-stream delivery.
//!
//! The handshake runs under the authorization middleware, so the ambient
//! request context is established when the handler executes. The handler
//! captures that context into the connection's stream state; every later
//! push re-enters it to format its payload, because the originating
//! request's scope has ended by the time a push occurs.

use crate::context::{self, RequestContext};
use crate::models::StoreEvent;
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

/// Event-stream handshake.
///
/// GET /api/v1/events?sse-access-token=<token>
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Captured once at handshake completion; owned by this connection for
    // its whole lifetime.
    let ctx = context::current();
    let rx = state.events.subscribe();

    tracing::debug!(target: "events", locale = %ctx.locale, "Event-stream subscription opened");

    let stream = BroadcastStream::new(rx).filter_map(move |item| match item {
        Ok(event) => context::with_context_sync(ctx.clone(), || render(&event)),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(target: "events", skipped, "Subscriber lagged, events dropped");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Format one push. Runs inside the connection's captured context so the
/// payload envelope reflects the subscriber's locale and time zone.
fn render(event: &StoreEvent) -> Option<Result<Event, Infallible>> {
    let ctx: RequestContext = context::current();
    let envelope = serde_json::json!({
        "topic": event.topic,
        "body": event.body,
        "occurred_at": event.occurred_at,
        "locale": ctx.locale,
        "time_zone": ctx.time_zone,
    });

    match Event::default().event(&event.topic).json_data(envelope) {
        Ok(rendered) => Some(Ok(rendered)),
        Err(e) => {
            tracing::warn!(target: "events", error = %e, "Failed to serialize event payload");
            None
        }
    }
}
