//! Vote aggregation and consensus
//!
//! Tallies are derived state: always recomputable from the vote store, and
//! kept live by merging insert events into a cached board. All the
//! per-tally queries (leaders, ties, crowd favorite, percentages) are total
//! functions: empty or all-zero data yields neutral defaults, never an
//! error.

use htl_common::db::VoteRow;
use htl_common::rounds::Round;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Per-round vote counts, item id → count
///
/// Zero-filled from the round's declared items, so every candidate appears
/// even before its first vote.
pub type Tally = BTreeMap<String, u64>;

/// A zeroed tally for the round's declared items
pub fn empty_tally(round: &Round) -> Tally {
    round.item_ids().map(|id| (id.to_string(), 0)).collect()
}

/// Total votes cast in a tally
pub fn total_votes(tally: &Tally) -> u64 {
    tally.values().sum()
}

/// Items attaining the maximum count, restricted to counts > 0
///
/// Id-sorted (the BTreeMap order). Empty when nobody has voted.
pub fn leaders(tally: &Tally) -> Vec<&str> {
    let max = tally.values().copied().max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }
    tally
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(id, _)| id.as_str())
        .collect()
}

/// Whether the lead is shared
pub fn is_tie(tally: &Tally) -> bool {
    leaders(tally).len() > 1
}

/// The sole leader, or None when there is no leader or several
pub fn crowd_favorite(tally: &Tally) -> Option<&str> {
    let leaders = leaders(tally);
    if leaders.len() == 1 {
        Some(leaders[0])
    } else {
        None
    }
}

/// Rounded share of the vote for an item, 0..=100
///
/// 0 when the tally is empty; unknown items count as 0 votes.
pub fn percentage(item_id: &str, tally: &Tally) -> u8 {
    let total = total_votes(tally);
    if total == 0 {
        return 0;
    }
    let count = tally.get(item_id).copied().unwrap_or(0);
    ((count as f64 / total as f64) * 100.0).round() as u8
}

/// Consensus snapshot of one round, ready for narrative rendering
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusResult {
    /// Max-count items with votes, id-sorted; empty before any votes
    pub leaders: Vec<String>,
    /// The sole leader, None when zero or several
    pub crowd_favorite: Option<String>,
    pub tied: bool,
    pub total_votes: u64,
    /// Item id → rounded percentage
    pub percentages: BTreeMap<String, u8>,
}

impl ConsensusResult {
    pub fn from_tally(tally: &Tally) -> Self {
        let leader_ids: Vec<String> = leaders(tally).into_iter().map(String::from).collect();
        Self {
            crowd_favorite: crowd_favorite(tally).map(String::from),
            tied: leader_ids.len() > 1,
            total_votes: total_votes(tally),
            percentages: tally
                .keys()
                .map(|id| (id.clone(), percentage(id, tally)))
                .collect(),
            leaders: leader_ids,
        }
    }
}

/// Live tally cache for every round
///
/// Built once from an authoritative full read, then kept current by merging
/// insert events. The merge is a commutative per-item +1 and is idempotent
/// under replay: events at or below the baseline sequence of the full read
/// are already counted and get dropped, and sequences above it are applied
/// at most once. Full load plus any interleaving or repetition of the
/// event stream converges to the same counts as one full recomputation.
#[derive(Debug, Clone)]
pub struct TallyBoard {
    tallies: HashMap<String, Tally>,
    /// Highest vote sequence reflected by the initial full load
    baseline_seq: i64,
    /// Sequences above the baseline that have been merged
    applied: HashSet<i64>,
}

impl TallyBoard {
    /// Build the board from a full vote read
    ///
    /// Runs in time proportional to the number of vote rows. Rows for
    /// rounds missing from the catalog are ignored (stale data from a
    /// retired deployment); rows for unknown items within a known round
    /// still count, mirroring a plain recount of the store.
    pub fn load(rounds: &[Round], rows: &[VoteRow], baseline_seq: i64) -> Self {
        let mut tallies: HashMap<String, Tally> = rounds
            .iter()
            .map(|round| (round.id.to_string(), empty_tally(round)))
            .collect();

        for row in rows {
            if let Some(tally) = tallies.get_mut(&row.round_id) {
                *tally.entry(row.item_id.clone()).or_insert(0) += 1;
            }
        }

        Self {
            tallies,
            baseline_seq,
            applied: HashSet::new(),
        }
    }

    /// Merge one observed insert event, O(1)
    ///
    /// Returns true when the event changed the board, false when it was
    /// already counted (baseline overlap or replayed delivery) or concerns
    /// an unknown round.
    pub fn apply(&mut self, seq: i64, round_id: &str, item_id: &str) -> bool {
        if seq <= self.baseline_seq || !self.applied.insert(seq) {
            return false;
        }
        match self.tallies.get_mut(round_id) {
            Some(tally) => {
                *tally.entry(item_id.to_string()).or_insert(0) += 1;
                true
            }
            None => false,
        }
    }

    /// The cached tally for a round; empty map when the round is unknown
    pub fn tally(&self, round_id: &str) -> Tally {
        self.tallies.get(round_id).cloned().unwrap_or_default()
    }

    /// Consensus view of a round's cached tally
    pub fn consensus(&self, round_id: &str) -> ConsensusResult {
        ConsensusResult::from_tally(&self.tally(round_id))
    }
}
