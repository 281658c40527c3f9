//! Vote store integration tests
//!
//! Exercises duplicate-insert semantics, the event feed, and the baseline
//! sequence returned by the full read.

use htl_common::db::votes::InsertOutcome;
use htl_common::db::{NewVote, VisitorMeta, VoteStore};
use htl_common::events::{EventBus, LabEvent};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use uuid::Uuid;

async fn setup_store() -> (VoteStore, EventBus) {
    // Single connection: each :memory: connection is its own database
    let pool: SqlitePool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    htl_common::db::init::create_votes_table(&pool).await.unwrap();
    let bus = EventBus::new(64);
    (VoteStore::new(pool, bus.clone()), bus)
}

fn vote(visitor_id: Uuid, round_id: &str, item_id: &str) -> NewVote {
    NewVote {
        visitor_id,
        device_id: Uuid::new_v4(),
        round_id: round_id.to_string(),
        item_id: item_id.to_string(),
        display_position: 0,
        session_number: 1,
        tally_snapshot: BTreeMap::new(),
        display_order: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        decision_time_ms: 1500,
        meta: VisitorMeta::default(),
    }
}

#[tokio::test]
async fn test_insert_records_and_emits_once() {
    let (store, _bus) = setup_store().await;
    let mut rx = store.subscribe_inserts();

    let visitor = Uuid::new_v4();
    let outcome = store.insert(&vote(visitor, "round-1", "a")).await.unwrap();
    let seq = match outcome {
        InsertOutcome::Recorded(seq) => seq,
        InsertOutcome::Duplicate => panic!("first insert must record"),
    };
    assert!(seq > 0);

    match rx.try_recv().expect("one event for the insert") {
        LabEvent::VoteRecorded { seq: event_seq, round_id, item_id, .. } => {
            assert_eq!(event_seq, seq);
            assert_eq!(round_id, "round-1");
            assert_eq!(item_id, "a");
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(rx.try_recv().is_err(), "exactly one event per insert");
}

#[tokio::test]
async fn test_duplicate_insert_is_noop_without_event() {
    let (store, _bus) = setup_store().await;

    let visitor = Uuid::new_v4();
    store.insert(&vote(visitor, "round-1", "a")).await.unwrap();

    let mut rx = store.subscribe_inserts();
    // Same (visitor, round), even with a different item: rejected, benign
    let outcome = store.insert(&vote(visitor, "round-1", "b")).await.unwrap();
    assert_eq!(outcome, InsertOutcome::Duplicate);
    assert!(rx.try_recv().is_err(), "duplicates must not emit events");

    // Tally source still shows exactly one vote
    let (rows, _) = store.query_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].item_id, "a", "the original vote stands");
}

#[tokio::test]
async fn test_query_all_baseline_covers_prior_inserts() {
    let (store, _bus) = setup_store().await;

    let mut last_seq = 0;
    for i in 0..3 {
        let outcome = store
            .insert(&vote(Uuid::new_v4(), "round-1", ["a", "b", "a"][i]))
            .await
            .unwrap();
        if let InsertOutcome::Recorded(seq) = outcome {
            last_seq = seq;
        }
    }

    let (rows, baseline) = store.query_all().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(baseline, last_seq, "baseline is the max recorded sequence");
}

#[tokio::test]
async fn test_votes_for_visitor_orders_by_insert() {
    let (store, _bus) = setup_store().await;
    let visitor = Uuid::new_v4();

    store.insert(&vote(visitor, "round-1", "c")).await.unwrap();
    store.insert(&vote(visitor, "round-2", "d")).await.unwrap();
    // Someone else's vote must not show up
    store.insert(&vote(Uuid::new_v4(), "round-1", "a")).await.unwrap();

    let mine = store.votes_for_visitor(visitor).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].round_id, "round-1");
    assert_eq!(mine[1].round_id, "round-2");
}
