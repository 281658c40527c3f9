//! Server-Sent Events (SSE) utilities
//!
//! Bridges the EventBus to axum SSE responses so any connected UI can follow
//! live vote activity.

use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::events::EventBus;

/// Create an SSE stream that forwards LabEvents to the client
///
/// Sends an initial `ConnectionStatus: connected` event, then one SSE event
/// per bus event (event name = LabEvent type tag, data = JSON payload).
/// Lagged subscribers skip the missed events and keep going; live tallies
/// self-correct on the next page load from the authoritative store.
pub fn create_event_sse_stream(
    service_name: &'static str,
    bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);
    let mut rx = bus.subscribe();

    let stream = async_stream::stream! {
        info!("SSE: {} event stream started", service_name);

        // Send initial connected status
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let name = event.event_type().to_string();
                    match serde_json::to_string(&event) {
                        Ok(json) => {
                            debug!("SSE: forwarding {}", name);
                            yield Ok(Event::default().event(name).data(json));
                        }
                        Err(e) => warn!("SSE: failed to serialize {}: {}", name, e),
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!("SSE: subscriber lagged, skipped {} events", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    info!("SSE: {} event stream closed", service_name);
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
