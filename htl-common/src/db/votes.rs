//! The vote store
//!
//! Append-only vote facts over SQLite, plus the insert-event feed other
//! components subscribe to. The store is the single authority: the tally
//! cache is always rebuilt from `query_all` and then kept current from the
//! `VoteRecorded` events this store emits.

use crate::db::models::{NewVote, VoteRow};
use crate::events::{EventBus, LabEvent};
use crate::{Error, Result};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of a vote insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Vote recorded; carries the monotonic vote sequence (votes.id)
    Recorded(i64),
    /// A vote for this (visitor, round) already existed; nothing written
    Duplicate,
}

/// Vote persistence and insert-event fan-out
#[derive(Clone)]
pub struct VoteStore {
    pool: SqlitePool,
    bus: EventBus,
}

impl VoteStore {
    pub fn new(pool: SqlitePool, bus: EventBus) -> Self {
        Self { pool, bus }
    }

    /// Insert a vote
    ///
    /// At most one vote per (visitor, round) ever lands: a second insert is
    /// rejected by the unique constraint and reported as
    /// `InsertOutcome::Duplicate`, which callers treat as success. A
    /// `VoteRecorded` event is emitted only for an actual insert, so every
    /// recorded vote produces exactly one event.
    pub async fn insert(&self, vote: &NewVote) -> Result<InsertOutcome> {
        let tally_snapshot = serde_json::to_string(&vote.tally_snapshot)
            .map_err(|e| Error::Internal(format!("serialize tally snapshot: {}", e)))?;
        let display_order = serde_json::to_string(&vote.display_order)
            .map_err(|e| Error::Internal(format!("serialize display order: {}", e)))?;

        let insert = sqlx::query(
            r#"
            INSERT INTO votes (
                visitor_id, device_id, round_id, item_id,
                display_position, session_number,
                tally_snapshot, display_order, decision_time_ms,
                device_type, user_agent, timezone, country, region, referrer
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(vote.visitor_id.to_string())
        .bind(vote.device_id.to_string())
        .bind(&vote.round_id)
        .bind(&vote.item_id)
        .bind(vote.display_position as i64)
        .bind(vote.session_number)
        .bind(tally_snapshot)
        .bind(display_order)
        .bind(vote.decision_time_ms as i64)
        .bind(&vote.meta.device_type)
        .bind(&vote.meta.user_agent)
        .bind(&vote.meta.timezone)
        .bind(&vote.meta.country)
        .bind(&vote.meta.region)
        .bind(&vote.meta.referrer)
        .execute(&self.pool)
        .await;

        match insert {
            Ok(result) => {
                let seq = result.last_insert_rowid();
                debug!(
                    "Recorded vote seq={} round={} item={}",
                    seq, vote.round_id, vote.item_id
                );
                self.bus.emit_lossy(LabEvent::VoteRecorded {
                    seq,
                    round_id: vote.round_id.clone(),
                    item_id: vote.item_id.clone(),
                    visitor_id: vote.visitor_id,
                    timestamp: chrono::Utc::now(),
                });
                Ok(InsertOutcome::Recorded(seq))
            }
            Err(e) => match Error::from(e) {
                Error::DuplicateVote => {
                    info!(
                        "Duplicate vote ignored: visitor={} round={}",
                        vote.visitor_id, vote.round_id
                    );
                    Ok(InsertOutcome::Duplicate)
                }
                other => Err(other),
            },
        }
    }

    /// All votes, minimal projection, plus the current high-water sequence
    ///
    /// The returned sequence is the baseline for event merging: every event
    /// with `seq` at or below it is already reflected in these rows.
    pub async fn query_all(&self) -> Result<(Vec<VoteRow>, i64)> {
        let rows: Vec<VoteRow> =
            sqlx::query_as("SELECT round_id, item_id, visitor_id FROM votes")
                .fetch_all(&self.pool)
                .await?;

        let max_seq: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM votes")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, max_seq.unwrap_or(0)))
    }

    /// This visitor's votes in round-catalog insertion order, for resume
    pub async fn votes_for_visitor(&self, visitor_id: Uuid) -> Result<Vec<VoteRow>> {
        let rows: Vec<VoteRow> = sqlx::query_as(
            "SELECT round_id, item_id, visitor_id FROM votes WHERE visitor_id = ? ORDER BY id",
        )
        .bind(visitor_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Subscribe to insert events
    ///
    /// Dropping the receiver cancels the subscription. Subscribe before
    /// calling `query_all` and merge with the returned baseline sequence to
    /// avoid losing or double-counting races.
    pub fn subscribe_inserts(&self) -> broadcast::Receiver<LabEvent> {
        self.bus.subscribe()
    }
}
