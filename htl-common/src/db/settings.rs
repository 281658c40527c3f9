//! Typed access to the settings key-value table

use crate::{Error, Result};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Generic setting getter
///
/// Returns None if key doesn't exist in database.
/// Parses value from string using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &SqlitePool, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        // Single connection: each :memory: connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init::create_settings_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_get_setting_missing_returns_none() {
        let pool = setup_test_db().await;
        let value: Option<i64> = get_setting(&pool, "no_such_key").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let pool = setup_test_db().await;
        set_setting(&pool, "session_number", 3i64).await.unwrap();
        let value: Option<i64> = get_setting(&pool, "session_number").await.unwrap();
        assert_eq!(value, Some(3));
    }

    #[tokio::test]
    async fn test_set_overwrites_existing() {
        let pool = setup_test_db().await;
        set_setting(&pool, "session_number", 1i64).await.unwrap();
        set_setting(&pool, "session_number", 2i64).await.unwrap();
        let value: Option<i64> = get_setting(&pool, "session_number").await.unwrap();
        assert_eq!(value, Some(2));
    }

    #[tokio::test]
    async fn test_get_setting_parse_failure_is_config_error() {
        let pool = setup_test_db().await;
        set_setting(&pool, "session_number", "not-a-number").await.unwrap();
        let result: Result<Option<i64>> = get_setting(&pool, "session_number").await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
