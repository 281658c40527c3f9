//! Live event stream endpoint

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures::stream::Stream;
use std::convert::Infallible;

use crate::AppState;

/// GET /api/events
///
/// SSE stream of lab events (vote inserts, session resets) for live tally
/// updates. Closing the connection drops the bus subscription.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    htl_common::sse::create_event_sse_stream("htl-ui", &state.bus)
}
