//! Server-Sent Events (SSE) for lineup notifications
//!
//! Forwards every `LineupEvent` on the bus to connected clients, including
//! transient `OperationFailed` notifications. `?event=<id>` narrows the
//! stream to one music event.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use lineup_common::events::LineupEvent;

use crate::AppState;

/// Keep-alive interval for idle streams
pub const KEEP_ALIVE_SECS: u64 = 15;

#[derive(Debug, Default, Deserialize)]
pub struct StreamFilter {
    pub event: Option<Uuid>,
}

fn to_sse(event: &LineupEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => {
            debug!("Broadcasting SSE event: {}", event.event_type());
            Some(Event::default().event(event.event_type()).data(json))
        }
        Err(e) => {
            warn!("Failed to serialize event: {}", e);
            None
        }
    }
}

/// GET /api/events/stream
pub async fn event_stream(
    State(state): State<AppState>,
    Query(filter): Query<StreamFilter>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected (filter: {:?})", filter.event);

    let rx = state.event_bus.subscribe();
    let only = filter.event;

    let stream = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(event) => {
                if only.is_some_and(|id| id != event.event_id()) {
                    return None;
                }
                to_sse(&event).map(Ok)
            }
            Err(e) => {
                // Lagged receivers skip ahead
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_event_name_is_variant() {
        let event = LineupEvent::LineupReordered {
            event_id: Uuid::new_v4(),
            stage_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        };

        assert!(to_sse(&event).is_some());
    }
}
