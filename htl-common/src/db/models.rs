//! Database models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Opaque visitor/device metadata attached to a vote
///
/// Produced entirely by the caller (browser hints, upstream geo headers,
/// referrer); the service records it verbatim and never derives it itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorMeta {
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
    pub timezone: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub referrer: Option<String>,
}

/// A vote ready to be inserted
#[derive(Debug, Clone)]
pub struct NewVote {
    pub visitor_id: Uuid,
    pub device_id: Uuid,
    pub round_id: String,
    pub item_id: String,
    /// Index of the chosen item in the shuffled display order at vote time
    pub display_position: usize,
    pub session_number: i64,
    /// The live tally the visitor saw when confirming, item id → count
    pub tally_snapshot: BTreeMap<String, u64>,
    /// The full shuffled order shown to the visitor
    pub display_order: Vec<String>,
    /// Milliseconds from round entry to confirmation
    pub decision_time_ms: u64,
    pub meta: VisitorMeta,
}

/// Minimal vote projection for tally building and session resume
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VoteRow {
    pub round_id: String,
    pub item_id: String,
    pub visitor_id: String,
}
