//! htl-ui library - Human Taste Lab service
//!
//! Hosts the visitor session (shuffling, voting, reveal, results) behind a
//! small HTTP/SSE surface. The domain core lives in [`shuffle`],
//! [`consensus`], [`session`], [`report`], and [`profile`]; the `api`
//! modules are a thin layer that drives it.

use std::sync::Arc;

use axum::Router;
use tokio::sync::{Mutex, RwLock};

use htl_common::db::VoteStore;
use htl_common::events::EventBus;
use htl_common::identity::IdentityStore;
use htl_common::rounds::Round;

pub mod api;
pub mod consensus;
pub mod profile;
pub mod report;
pub mod session;
pub mod shuffle;

use consensus::TallyBoard;
use session::RoundSession;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Vote persistence and insert-event feed
    pub store: VoteStore,
    /// Application event bus (vote inserts, resets)
    pub bus: EventBus,
    /// Live per-round tallies, replaced atomically on each merge
    pub tallies: Arc<RwLock<TallyBoard>>,
    /// The local visitor's session
    pub session: Arc<Mutex<RoundSession>>,
    /// Persisted identity (device id, visitor id, session counter)
    pub identity: Arc<IdentityStore>,
    /// The fixed round catalog
    pub rounds: &'static [Round],
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route("/health", get(api::health_check))
        .route("/api/rounds", get(api::get_rounds))
        .route("/api/state", get(api::get_state))
        .route("/api/select", post(api::post_select))
        .route("/api/confirm", post(api::post_confirm))
        .route("/api/advance", post(api::post_advance))
        .route("/api/reset", post(api::post_reset))
        .route("/api/report/:round_id", get(api::get_report))
        .route("/api/results", get(api::get_results))
        .route("/api/events", get(api::event_stream))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
