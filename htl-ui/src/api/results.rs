//! Report card and end-of-session results endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use htl_common::rounds::round_by_id;
use htl_common::Error;

use crate::profile::{self, SessionStats, TasteProfile, TasteType};
use crate::report::{self, ReportCard};
use crate::AppState;

use super::ApiError;

/// One round's reveal card, with the AI's stated rationale
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub round_id: String,
    pub card: ReportCard,
    pub ai_model: &'static str,
    pub ai_reasoning: &'static str,
}

/// GET /api/report/{round_id}
///
/// Meaningful once the visitor has voted in the round; before that there is
/// no pick to compare.
pub async fn get_report(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    let round = round_by_id(&round_id)
        .ok_or_else(|| Error::NotFound(format!("round '{}'", round_id)))?;

    let session = state.session.lock().await;
    let pick = session
        .selections()
        .get(round.id)
        .cloned()
        .ok_or_else(|| Error::NotFound(format!("no vote recorded for '{}'", round_id)))?;
    let order = session.display_order(round);

    let consensus = state.tallies.read().await.consensus(round.id);
    let card = report::report_card(round, &pick, &consensus, &order);

    Ok(Json(ReportResponse {
        round_id,
        card,
        ai_model: round.ai_model,
        ai_reasoning: round.ai_reasoning,
    }))
}

/// One line per round on the results page
#[derive(Debug, Serialize)]
pub struct RoundSummary {
    pub round_id: &'static str,
    pub number: u32,
    pub story: String,
    /// Visitor's pick was the sole crowd favorite
    pub matched_crowd: bool,
    /// AI's pick was among the leaders (tie-inclusive)
    pub ai_was_right: bool,
    /// Visitor and AI picked the same photo
    pub agreed_with_ai: bool,
}

/// The end-of-session results page payload
#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub stats: SessionStats,
    pub taste_type: TasteType,
    pub profile: TasteProfile,
    pub ai_scorecard: &'static str,
    pub share_text: String,
    pub rounds: Vec<RoundSummary>,
}

/// GET /api/results
///
/// Stats, taste profile, and per-round stories. Computable at any point
/// (missing rounds simply don't count), but meant for the completed
/// session.
pub async fn get_results(State(state): State<AppState>) -> Json<ResultsResponse> {
    let session = state.session.lock().await;
    let board = state.tallies.read().await;

    let stats = profile::session_stats(state.rounds, session.selections(), &board);
    let taste_type = profile::classify(stats.crowd_matches, stats.ai_matches);
    let taste_profile = profile::profile_for(taste_type, stats.crowd_matches);
    let share_text = profile::share_text(&taste_profile, &stats, state.rounds.len());

    let rounds = state
        .rounds
        .iter()
        .map(|round| {
            let consensus = board.consensus(round.id);
            let pick = session.selections().get(round.id).cloned().unwrap_or_default();
            let order = session.display_order(round);
            RoundSummary {
                round_id: round.id,
                number: round.number,
                story: report::round_story(round, &pick, &consensus, &order),
                matched_crowd: consensus.crowd_favorite.as_deref() == Some(pick.as_str())
                    && !pick.is_empty(),
                ai_was_right: consensus.leaders.iter().any(|id| id == round.ai_pick),
                agreed_with_ai: pick == round.ai_pick,
            }
        })
        .collect();

    Json(ResultsResponse {
        stats,
        taste_type,
        profile: taste_profile,
        ai_scorecard: profile::ai_scorecard(stats.ai_accuracy),
        share_text,
        rounds,
    })
}
