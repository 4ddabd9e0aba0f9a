//! Server-Sent Events support

use crate::controller::SessionEvent;
use crate::session::SessionView;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream
pub fn sse_stream(
    init: SessionView,
    broadcast_rx: tokio::sync::broadcast::Receiver<SessionEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // Start with the current view so late subscribers render immediately
    let init = futures::stream::once(async move { Ok(to_sse("init", &init_payload(&init))) });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(session_event_to_sse(&event))),
        Err(_) => None, // Skip lagged messages
    });

    Sse::new(init.chain(broadcasts)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn init_payload(view: &SessionView) -> serde_json::Value {
    json!({ "type": "init", "session": view })
}

fn event_payload(event: &SessionEvent) -> (&'static str, serde_json::Value) {
    match event {
        SessionEvent::Updated(view) => ("session", json!({ "type": "session", "session": view })),
        SessionEvent::Notice(notice) => ("notice", json!({ "type": "notice", "notice": notice })),
    }
}

fn session_event_to_sse(event: &SessionEvent) -> Event {
    let (event_type, data) = event_payload(event);
    to_sse(event_type, &data)
}

fn to_sse(event_type: &str, data: &serde_json::Value) -> Event {
    Event::default().event(event_type).data(data.to_string())
}
