//! Database operations for the `channels` table.
//!
//! Each live channel's durable state (playlist, options — whatever the session
//! layer puts in the document) is stored as one JSONB row keyed by channel
//! name. The save sweep upserts; opening a channel reads the row back.

use sqlx::PgPool;

use crate::DbError;

/// Upsert a channel's state document, stamping `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn save_channel_state(
    pool: &PgPool,
    name: &str,
    state: &serde_json::Value,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO channels (name, state, updated_at) VALUES ($1, $2, NOW()) \
         ON CONFLICT (name) DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()",
    )
    .bind(name)
    .bind(state)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load a channel's persisted state document, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn load_channel_state(
    pool: &PgPool,
    name: &str,
) -> Result<Option<serde_json::Value>, DbError> {
    let state = sqlx::query_scalar::<_, serde_json::Value>(
        "SELECT state FROM channels WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;
    Ok(state)
}
