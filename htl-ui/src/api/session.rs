//! Session progression endpoints
//!
//! These handlers drive the round-session state machine. Confirmation is
//! the only one with moving parts: it dispatches the vote write and the
//! cosmetic reveal timer as independent tasks, so a slow or failing store
//! never holds up the reveal.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use htl_common::db::VisitorMeta;
use htl_common::events::LabEvent;

use crate::consensus::ConsensusResult;
use crate::session::{SessionSnapshot, REVEAL_STAGE_ONE, REVEAL_STAGE_TWO};
use crate::AppState;

use super::ApiError;

/// Session snapshot plus the live consensus of every round
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub session: SessionSnapshot,
    pub consensus: BTreeMap<String, ConsensusResult>,
}

async fn state_response(state: &AppState) -> StateResponse {
    let session = state.session.lock().await.snapshot();
    let board = state.tallies.read().await;
    let consensus = state
        .rounds
        .iter()
        .map(|round| (round.id.to_string(), board.consensus(round.id)))
        .collect();
    StateResponse { session, consensus }
}

/// GET /api/state
pub async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    Json(state_response(&state).await)
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub item_id: String,
}

/// POST /api/select
///
/// Stage a pick in the current round (no vote is written yet).
pub async fn post_select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    state.session.lock().await.select(&request.item_id)?;
    Ok(Json(state_response(&state).await))
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmRequest {
    /// Opaque client-supplied metadata recorded with the vote
    #[serde(default)]
    pub meta: VisitorMeta,
}

/// POST /api/confirm
///
/// Lock in the staged pick. The vote write is fire-and-forget; its outcome
/// lands back in the session asynchronously (duplicates are benign, other
/// failures raise the warning flag). The reveal happens after the fixed
/// two-stage delay regardless of the write.
pub async fn post_confirm(
    State(state): State<AppState>,
    request: Option<Json<ConfirmRequest>>,
) -> Result<Json<StateResponse>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    let vote = {
        let mut session = state.session.lock().await;
        let round_id = session
            .current_round()
            .map(|r| r.id.to_string())
            .unwrap_or_default();
        let tally = state.tallies.read().await.tally(&round_id);
        session.confirm(&tally, request.meta)?
    };

    if let Some(vote) = vote {
        // Vote write, fire-and-forget
        let store = state.store.clone();
        let session = state.session.clone();
        tokio::spawn(async move {
            let outcome = store.insert(&vote).await;
            session.lock().await.vote_write_finished(outcome);
        });

        // Cosmetic reveal timer, independent of the write
        let session = state.session.clone();
        tokio::spawn(async move {
            tokio::time::sleep(REVEAL_STAGE_ONE).await;
            debug!("Reveal stage one elapsed");
            tokio::time::sleep(REVEAL_STAGE_TWO).await;
            // A racing reset makes this a no-op; nothing to recover
            if let Err(e) = session.lock().await.reveal() {
                debug!("Reveal skipped: {}", e);
            }
        });
    }

    Ok(Json(state_response(&state).await))
}

/// POST /api/advance
///
/// Move past a revealed round, or finish the session after the last one.
pub async fn post_advance(
    State(state): State<AppState>,
) -> Result<Json<StateResponse>, ApiError> {
    state.session.lock().await.advance()?;
    Ok(Json(state_response(&state).await))
}

/// POST /api/reset
///
/// Restart the experiment: rotate the visitor identity (device id stays,
/// session number increments) and return to the first round.
pub async fn post_reset(State(state): State<AppState>) -> Result<Json<StateResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let rotated = state.identity.rotate(session.identity()).await?;
    session.reset(rotated)?;

    state.bus.emit_lossy(LabEvent::SessionReset {
        visitor_id: rotated.visitor_id,
        session_number: rotated.session_number,
        timestamp: chrono::Utc::now(),
    });

    drop(session);
    Ok(Json(state_response(&state).await))
}
