//! End-to-end session flow over a real (tempdir) SQLite database
//!
//! Exercises the wiring the HTTP layer relies on: resume from stored votes,
//! the single-write guarantee through the store, and convergence of the
//! live tally board with a full recomputation under replayed events.

use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::RwLock;
use uuid::Uuid;

use htl_common::db::votes::InsertOutcome;
use htl_common::db::{init_database, VisitorMeta, VoteStore};
use htl_common::events::{EventBus, LabEvent};
use htl_common::identity::IdentityStore;
use htl_common::rounds::ROUNDS;

use htl_ui::consensus::{crowd_favorite, Tally, TallyBoard};
use htl_ui::profile;
use htl_ui::session::{RoundPhase, RoundSession, SessionState};

async fn setup() -> (TempDir, VoteStore, IdentityStore, EventBus) {
    let dir = TempDir::new().expect("tempdir");
    let pool = init_database(&dir.path().join("htl.db")).await.expect("init db");
    let bus = EventBus::new(256);
    (
        dir,
        VoteStore::new(pool.clone(), bus.clone()),
        IdentityStore::new(pool),
        bus,
    )
}

/// Play one full session, returning the visitor's selections
async fn play_session(
    store: &VoteStore,
    session: &mut RoundSession,
    picks: &[&str],
) -> HashMap<String, String> {
    for pick in picks {
        session.select(pick).expect("select");
        let round_id = session.current_round().unwrap().id.to_string();
        let vote = session
            .confirm(&Tally::new(), VisitorMeta::default())
            .expect("confirm")
            .expect("vote issued");
        assert_eq!(vote.round_id, round_id);

        let outcome = store.insert(&vote).await;
        session.vote_write_finished(outcome);
        assert!(!session.vote_error(), "write should succeed in test");

        session.reveal().expect("reveal");
        session.advance().expect("advance");
    }
    session.selections().clone()
}

#[tokio::test]
async fn full_session_records_one_vote_per_round() {
    let (_dir, store, identity_store, _bus) = setup().await;
    let identity = identity_store.load_or_create().await.unwrap();

    let mut session = RoundSession::new(&ROUNDS, identity);
    session.resume(&store.votes_for_visitor(identity.visitor_id).await.unwrap());

    play_session(&store, &mut session, &["a", "b", "c"]).await;
    assert_eq!(session.state(), SessionState::Complete);

    let (rows, _) = store.query_all().await.unwrap();
    assert_eq!(rows.len(), ROUNDS.len(), "exactly one vote per round");
}

#[tokio::test]
async fn restart_resumes_where_the_visitor_left_off() {
    let (_dir, store, identity_store, _bus) = setup().await;
    let identity = identity_store.load_or_create().await.unwrap();

    // Vote in the first round only, then "restart the process"
    let mut session = RoundSession::new(&ROUNDS, identity);
    session.resume(&[]);
    play_session(&store, &mut session, &["d"]).await;

    let identity_again = identity_store.load_or_create().await.unwrap();
    assert_eq!(identity_again, identity, "identity survives restarts");

    let mut resumed = RoundSession::new(&ROUNDS, identity_again);
    resumed.resume(&store.votes_for_visitor(identity_again.visitor_id).await.unwrap());
    assert_eq!(
        resumed.state(),
        SessionState::InRound { index: 1, phase: RoundPhase::Selecting }
    );
    assert_eq!(resumed.selections()["round-1"], "d");
}

#[tokio::test]
async fn duplicate_store_write_is_benign() {
    let (_dir, store, identity_store, _bus) = setup().await;
    let identity = identity_store.load_or_create().await.unwrap();

    let mut session = RoundSession::new(&ROUNDS, identity);
    session.resume(&[]);
    session.select("b").unwrap();
    let vote = session
        .confirm(&Tally::new(), VisitorMeta::default())
        .unwrap()
        .unwrap();

    assert!(matches!(
        store.insert(&vote).await.unwrap(),
        InsertOutcome::Recorded(_)
    ));
    // A retry of the same write (e.g. after a dropped response) is a no-op
    assert_eq!(store.insert(&vote).await.unwrap(), InsertOutcome::Duplicate);

    session.vote_write_finished(Ok(InsertOutcome::Duplicate));
    assert!(!session.vote_error());

    let (rows, _) = store.query_all().await.unwrap();
    assert_eq!(rows.len(), 1, "retried write counted once");
}

#[tokio::test]
async fn streamed_tallies_converge_with_full_recomputation() {
    let (_dir, store, identity_store, _bus) = setup().await;
    let identity = identity_store.load_or_create().await.unwrap();

    // Two other visitors voted before we subscribed
    for (visitor, pick) in [(Uuid::new_v4(), "a"), (Uuid::new_v4(), "b")] {
        let mut other = RoundSession::new(
            &ROUNDS,
            htl_common::SessionIdentity {
                device_id: Uuid::new_v4(),
                visitor_id: visitor,
                session_number: 1,
            },
        );
        other.resume(&[]);
        play_session(&store, &mut other, &[pick, pick, pick]).await;
    }

    // Subscribe before the authoritative read, as the service does
    let mut events = store.subscribe_inserts();
    let (rows, baseline) = store.query_all().await.unwrap();
    let board = Arc::new(RwLock::new(TallyBoard::load(&ROUNDS, &rows, baseline)));

    // The local visitor votes while we're live
    let mut session = RoundSession::new(&ROUNDS, identity);
    session.resume(&[]);
    let selections = play_session(&store, &mut session, &["a", "a", "c"]).await;

    // Drain the event feed, applying each event twice to prove the merge is
    // idempotent under replay
    while let Ok(event) = events.try_recv() {
        if let LabEvent::VoteRecorded { seq, round_id, item_id, .. } = event {
            let mut board = board.write().await;
            assert!(board.apply(seq, &round_id, &item_id));
            assert!(!board.apply(seq, &round_id, &item_id), "replay must not count");
        }
    }

    // The merged board equals a from-scratch recomputation
    let (all_rows, final_seq) = store.query_all().await.unwrap();
    let recomputed = TallyBoard::load(&ROUNDS, &all_rows, final_seq);
    let board = board.read().await;
    for round in ROUNDS.iter() {
        assert_eq!(
            board.tally(round.id),
            recomputed.tally(round.id),
            "converged tally differs for {}",
            round.id
        );
    }

    // With 2/3 votes on "a" in round-1, the favorite is unambiguous
    let round1 = board.tally("round-1");
    assert_eq!(crowd_favorite(&round1), Some("a"));

    // And the stats derived from the live board classify sensibly
    let stats = profile::session_stats(&ROUNDS, &selections, &board);
    assert_eq!(stats.crowd_matches, 2, "rounds 1 and 2 matched the favorite");
}

#[tokio::test]
async fn reset_rotates_identity_and_allows_fresh_votes() {
    let (_dir, store, identity_store, _bus) = setup().await;
    let identity = identity_store.load_or_create().await.unwrap();

    let mut session = RoundSession::new(&ROUNDS, identity);
    session.resume(&[]);
    play_session(&store, &mut session, &["a", "b", "c"]).await;
    assert_eq!(session.state(), SessionState::Complete);

    let rotated = identity_store.rotate(session.identity()).await.unwrap();
    session.reset(rotated).unwrap();

    // The fresh visitor can vote in round one again without tripping the
    // uniqueness constraint
    session.select("d").unwrap();
    let vote = session
        .confirm(&Tally::new(), VisitorMeta::default())
        .unwrap()
        .unwrap();
    assert_eq!(vote.session_number, 2);
    assert!(matches!(
        store.insert(&vote).await.unwrap(),
        InsertOutcome::Recorded(_)
    ));

    let (rows, _) = store.query_all().await.unwrap();
    assert_eq!(rows.len(), ROUNDS.len() + 1);
}
