//! Round catalog endpoint

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

/// One photo as displayed to this visitor
#[derive(Debug, Serialize)]
pub struct DisplayPhoto {
    pub item_id: &'static str,
    pub src: &'static str,
    /// Position in this visitor's shuffled order, 0-based
    pub position: usize,
    /// Display letter at that position
    pub letter: char,
}

/// One round as displayed to this visitor
///
/// Deliberately excludes the AI pick and rationale: the prediction is only
/// disclosed through the report endpoints after the visitor locks in.
#[derive(Debug, Serialize)]
pub struct DisplayRound {
    pub round_id: &'static str,
    pub number: u32,
    pub title: &'static str,
    pub photos: Vec<DisplayPhoto>,
}

/// GET /api/rounds
///
/// The catalog in play order, each round's photos in this visitor's stable
/// shuffled order.
pub async fn get_rounds(State(state): State<AppState>) -> Json<Vec<DisplayRound>> {
    let session = state.session.lock().await;

    let rounds = state
        .rounds
        .iter()
        .map(|round| {
            let order = session.display_order(round);
            let photos = order
                .iter()
                .enumerate()
                .map(|(position, &item_id)| DisplayPhoto {
                    item_id,
                    src: round
                        .photos
                        .iter()
                        .find(|p| p.id == item_id)
                        .map(|p| p.src)
                        .unwrap_or(""),
                    position,
                    letter: crate::shuffle::DISPLAY_LETTERS
                        .get(position)
                        .copied()
                        .unwrap_or('?'),
                })
                .collect();
            DisplayRound {
                round_id: round.id,
                number: round.number,
                title: round.title,
                photos,
            }
        })
        .collect();

    Json(rounds)
}
