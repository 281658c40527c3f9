//! htl-ui - Human Taste Lab service
//!
//! Serves the four-photos-per-round voting experience: deterministic
//! per-visitor display order, live crowd tallies fed by an insert-event
//! stream, per-round report cards against a fixed AI prediction, and the
//! end-of-session taste profile.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use htl_common::config::{RootFolderInitializer, RootFolderResolver};
use htl_common::db::{init_database, VoteStore};
use htl_common::events::{EventBus, LabEvent};
use htl_common::identity::IdentityStore;
use htl_common::rounds::ROUNDS;

use htl_ui::consensus::TallyBoard;
use htl_ui::session::RoundSession;
use htl_ui::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "htl-ui", about = "Human Taste Lab service")]
struct Args {
    /// Root folder holding htl.db (overrides HTL_ROOT and config.toml)
    #[arg(long)]
    root_folder: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Human Taste Lab (htl-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    // Zero-config startup with 4-tier root folder resolution
    let resolver = RootFolderResolver::new("htl-ui").with_cli_arg(args.root_folder);
    let root_folder = resolver.resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;
    info!("✓ Connected to database");

    let bus = EventBus::new(1000);
    let store = VoteStore::new(pool.clone(), bus.clone());
    let identity_store = IdentityStore::new(pool);

    // Load (or mint) the local identity and place the session from any
    // votes this visitor already recorded
    let identity = identity_store.load_or_create().await?;
    info!(
        "Visitor {} on device {} (session {})",
        identity.visitor_id, identity.device_id, identity.session_number
    );
    let mut session = RoundSession::new(&ROUNDS, identity);
    session.resume(&store.votes_for_visitor(identity.visitor_id).await?);

    // Live tallies: subscribe BEFORE the authoritative full read, then
    // merge only events past the read's baseline sequence. Events that
    // race in between are already in the read and get dropped by the merge.
    let mut insert_events = store.subscribe_inserts();
    let (rows, baseline_seq) = store.query_all().await?;
    info!("Loaded {} votes (baseline seq {})", rows.len(), baseline_seq);
    let tallies = Arc::new(RwLock::new(TallyBoard::load(&ROUNDS, &rows, baseline_seq)));

    let merge_board = tallies.clone();
    tokio::spawn(async move {
        loop {
            match insert_events.recv().await {
                Ok(LabEvent::VoteRecorded { seq, round_id, item_id, .. }) => {
                    merge_board.write().await.apply(seq, &round_id, &item_id);
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    // Dropped events leave the cache undercounting until the
                    // next full load
                    warn!("Tally merge lagged, {} events lost", n);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let state = AppState {
        store,
        bus,
        tallies,
        session: Arc::new(Mutex::new(session)),
        identity: Arc::new(identity_store),
        rounds: &ROUNDS,
    };
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:5750").await?;
    info!("htl-ui listening on http://127.0.0.1:5750");
    info!("Health check: http://127.0.0.1:5750/health");

    axum::serve(listener, app).await?;

    Ok(())
}
