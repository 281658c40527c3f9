//! The round-session state machine
//!
//! Drives one visitor through the fixed round sequence:
//! `Loading` → `InRound(index, Selecting → Confirmed → Revealed)` →
//! `Complete`, with resume placement from previously recorded votes and a
//! full reset that rotates the visitor identity.
//!
//! The vote write is optimistic and fire-and-forget: confirmation advances
//! the local state immediately, the store write happens elsewhere, and a
//! failed write (other than the benign duplicate rejection) only raises a
//! dismissible warning flag; local state is never rolled back. At most one
//! write is ever issued per (visitor, round): the phase transition consumes
//! the staged pick, and a confirm that arrives while a write is still in
//! flight is ignored.

use crate::consensus::Tally;
use crate::shuffle;
use htl_common::db::votes::InsertOutcome;
use htl_common::db::{NewVote, VisitorMeta, VoteRow};
use htl_common::rounds::Round;
use htl_common::{Error, Result, SessionIdentity};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// First cosmetic reveal stage ("Counting votes...")
pub const REVEAL_STAGE_ONE: Duration = Duration::from_millis(1000);
/// Second cosmetic reveal stage ("Checking AI's prediction...")
pub const REVEAL_STAGE_TWO: Duration = Duration::from_millis(1200);

/// Phase within a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RoundPhase {
    /// Browsing; a pick may be staged but nothing is locked in
    Selecting,
    /// Pick locked in; vote write dispatched, reveal timer running
    Confirmed,
    /// Tallies and the AI prediction are on screen
    Revealed,
}

/// Where the visitor is in the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state")]
pub enum SessionState {
    /// Stored votes not yet loaded
    Loading,
    /// Playing round `index` (0-based)
    InRound { index: usize, phase: RoundPhase },
    /// Every round has a recorded vote
    Complete,
}

/// Serializable session snapshot for the HTTP surface
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub visitor_id: String,
    pub device_id: String,
    pub session_number: i64,
    pub state: SessionState,
    pub round_count: usize,
    /// round id → chosen item id, for every confirmed round
    pub selections: HashMap<String, String>,
    /// Staged but unconfirmed pick in the current round
    pub staged: Option<String>,
    /// Non-fatal warning: the last vote write failed and may not have saved
    pub vote_error: bool,
}

/// One visitor's trip through the rounds
pub struct RoundSession {
    rounds: &'static [Round],
    identity: SessionIdentity,
    state: SessionState,
    selections: HashMap<String, String>,
    staged: Option<String>,
    write_in_flight: bool,
    vote_error: bool,
    round_entered_at: Instant,
}

impl RoundSession {
    /// New session in `Loading`; call [`resume`](Self::resume) next
    pub fn new(rounds: &'static [Round], identity: SessionIdentity) -> Self {
        Self {
            rounds,
            identity,
            state: SessionState::Loading,
            selections: HashMap::new(),
            staged: None,
            write_in_flight: false,
            vote_error: false,
            round_entered_at: Instant::now(),
        }
    }

    /// Place the session from this visitor's stored votes
    ///
    /// The resume index is the number of rounds already voted; a full set
    /// goes straight to `Complete`. Votes for rounds not in the catalog are
    /// ignored.
    pub fn resume(&mut self, my_votes: &[VoteRow]) {
        self.selections = my_votes
            .iter()
            .filter(|row| self.rounds.iter().any(|r| r.id == row.round_id))
            .map(|row| (row.round_id.clone(), row.item_id.clone()))
            .collect();

        let voted = self.selections.len();
        self.state = if voted >= self.rounds.len() {
            info!("Session resumed complete ({} votes)", voted);
            SessionState::Complete
        } else {
            info!("Session resumed at round {}", voted + 1);
            SessionState::InRound {
                index: voted,
                phase: RoundPhase::Selecting,
            }
        };
        self.round_entered_at = Instant::now();
    }

    pub fn identity(&self) -> SessionIdentity {
        self.identity
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selections(&self) -> &HashMap<String, String> {
        &self.selections
    }

    pub fn vote_error(&self) -> bool {
        self.vote_error
    }

    /// The round being played, None while loading or complete
    pub fn current_round(&self) -> Option<&'static Round> {
        match self.state {
            SessionState::InRound { index, .. } => self.rounds.get(index),
            _ => None,
        }
    }

    /// The visitor's shuffled display order for a round
    pub fn display_order(&self, round: &Round) -> Vec<&'static str> {
        let item_ids: Vec<&'static str> = round.item_ids().collect();
        shuffle::display_order(&item_ids, &self.identity.visitor_id.to_string(), round.id)
    }

    /// Stage a pick in the current round
    ///
    /// Re-staging a different item before confirmation is allowed; staging
    /// after confirmation is rejected.
    pub fn select(&mut self, item_id: &str) -> Result<()> {
        let round = self
            .current_round()
            .ok_or_else(|| Error::InvalidInput("no round in progress".to_string()))?;
        let SessionState::InRound { phase, .. } = self.state else {
            unreachable!("current_round implies InRound");
        };
        if phase != RoundPhase::Selecting {
            return Err(Error::InvalidInput(
                "selection is locked for this round".to_string(),
            ));
        }
        if !round.has_item(item_id) {
            return Err(Error::InvalidInput(format!(
                "item '{}' is not part of {}",
                item_id, round.id
            )));
        }
        self.staged = Some(item_id.to_string());
        Ok(())
    }

    /// Lock in the staged pick
    ///
    /// Moves the round to `Confirmed`, records the selection locally, and
    /// returns the vote to write. Returns `Ok(None)` when a prior write is
    /// still in flight (the attempt is ignored, not an error). `tally` is
    /// the live tally the visitor was looking at; it is frozen into the
    /// vote as context.
    pub fn confirm(&mut self, tally: &Tally, meta: VisitorMeta) -> Result<Option<NewVote>> {
        if self.write_in_flight {
            warn!("Confirm ignored: vote write still in flight");
            return Ok(None);
        }
        let round = self
            .current_round()
            .ok_or_else(|| Error::InvalidInput("no round in progress".to_string()))?;
        let SessionState::InRound { index, phase } = self.state else {
            unreachable!("current_round implies InRound");
        };
        if phase != RoundPhase::Selecting {
            return Err(Error::InvalidInput(
                "this round is already confirmed".to_string(),
            ));
        }
        let item_id = self
            .staged
            .clone()
            .ok_or_else(|| Error::InvalidInput("nothing selected yet".to_string()))?;

        let order = self.display_order(round);
        let display_position = order.iter().position(|id| *id == item_id).unwrap_or(0);
        let decision_time_ms = self.round_entered_at.elapsed().as_millis() as u64;

        // Optimistic local commit before the write lands
        self.selections.insert(round.id.to_string(), item_id.clone());
        self.state = SessionState::InRound {
            index,
            phase: RoundPhase::Confirmed,
        };
        self.write_in_flight = true;
        self.vote_error = false;

        Ok(Some(NewVote {
            visitor_id: self.identity.visitor_id,
            device_id: self.identity.device_id,
            round_id: round.id.to_string(),
            item_id,
            display_position,
            session_number: self.identity.session_number,
            tally_snapshot: tally.clone(),
            display_order: order.into_iter().map(String::from).collect(),
            decision_time_ms,
            meta,
        }))
    }

    /// Record the outcome of the dispatched vote write
    ///
    /// Duplicate rejection counts as success. Any other failure raises the
    /// non-fatal warning flag; the local selection stands either way.
    pub fn vote_write_finished(&mut self, outcome: std::result::Result<InsertOutcome, Error>) {
        self.write_in_flight = false;
        match outcome {
            Ok(InsertOutcome::Recorded(seq)) => {
                info!("Vote write landed (seq {})", seq);
            }
            Ok(InsertOutcome::Duplicate) => {
                info!("Vote write was a duplicate; already recorded");
            }
            Err(e) => {
                warn!("Vote write failed (keeping local selection): {}", e);
                self.vote_error = true;
            }
        }
    }

    /// Show the results for the confirmed round
    ///
    /// Driven by the caller after the cosmetic delay stages; independent of
    /// whether the vote write has finished.
    pub fn reveal(&mut self) -> Result<()> {
        match self.state {
            SessionState::InRound {
                index,
                phase: RoundPhase::Confirmed,
            } => {
                self.state = SessionState::InRound {
                    index,
                    phase: RoundPhase::Revealed,
                };
                Ok(())
            }
            _ => Err(Error::InvalidInput(
                "nothing confirmed to reveal".to_string(),
            )),
        }
    }

    /// Move on from a revealed round
    pub fn advance(&mut self) -> Result<()> {
        match self.state {
            SessionState::InRound {
                index,
                phase: RoundPhase::Revealed,
            } => {
                self.staged = None;
                if index + 1 < self.rounds.len() {
                    self.state = SessionState::InRound {
                        index: index + 1,
                        phase: RoundPhase::Selecting,
                    };
                    self.round_entered_at = Instant::now();
                } else {
                    info!("Session complete");
                    self.state = SessionState::Complete;
                }
                Ok(())
            }
            _ => Err(Error::InvalidInput(
                "current round is not revealed yet".to_string(),
            )),
        }
    }

    /// Restart the experiment under a freshly rotated identity
    ///
    /// Only valid from `Complete`. The caller rotates the identity (new
    /// visitor id, same device id, incremented session number) and passes
    /// the result in.
    pub fn reset(&mut self, rotated: SessionIdentity) -> Result<()> {
        if self.state != SessionState::Complete {
            return Err(Error::InvalidInput(
                "session is not complete yet".to_string(),
            ));
        }
        debug_assert_eq!(rotated.device_id, self.identity.device_id);
        self.identity = rotated;
        self.selections.clear();
        self.staged = None;
        self.write_in_flight = false;
        self.vote_error = false;
        self.state = SessionState::InRound {
            index: 0,
            phase: RoundPhase::Selecting,
        };
        self.round_entered_at = Instant::now();
        info!(
            "Session reset: visitor {} session {}",
            rotated.visitor_id, rotated.session_number
        );
        Ok(())
    }

    /// Snapshot for the HTTP surface
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            visitor_id: self.identity.visitor_id.to_string(),
            device_id: self.identity.device_id.to_string(),
            session_number: self.identity.session_number,
            state: self.state,
            round_count: self.rounds.len(),
            selections: self.selections.clone(),
            staged: self.staged.clone(),
            vote_error: self.vote_error,
        }
    }
}
