//! Database initialization
//!
//! Creates the database on first run so the service starts with zero
//! configuration; table creation is idempotent and safe to repeat.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use sqlite options to create database if it doesn't exist
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode: concurrent readers with one writer, so SSE fan-out and vote
    // writes don't contend
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Set busy timeout
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    // Run migrations (idempotent - safe to call multiple times)
    create_votes_table(&pool).await?;
    create_settings_table(&pool).await?;

    Ok(pool)
}

/// Create the votes table
///
/// Append-only vote facts. `id` is the monotonic sequence used for
/// replay-safe tally merging; UNIQUE(visitor_id, round_id) enforces at most
/// one vote per visitor per round at the storage layer.
pub async fn create_votes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS votes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            visitor_id TEXT NOT NULL,
            device_id TEXT NOT NULL,
            round_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            display_position INTEGER NOT NULL,
            session_number INTEGER NOT NULL DEFAULT 1,
            tally_snapshot TEXT,
            display_order TEXT,
            decision_time_ms INTEGER,
            device_type TEXT,
            user_agent TEXT,
            timezone TEXT,
            country TEXT,
            region TEXT,
            referrer TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(visitor_id, round_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_votes_round ON votes(round_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores application configuration key-value pairs, including the local
/// session identity (device id, visitor id, session number).
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
