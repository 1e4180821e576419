//! Database operations for the `stats` table.
//!
//! One row per sample: a point-in-time snapshot of how many channels were
//! live, how many users they held in total, and the server's resident memory.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `stats` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatPointRow {
    pub time: DateTime<Utc>,
    pub usercount: i32,
    pub chancount: i32,
    pub mem: i64,
}

/// Record one stat point.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn add_stat_point(
    pool: &PgPool,
    time: DateTime<Utc>,
    usercount: i32,
    chancount: i32,
    mem: i64,
) -> Result<(), DbError> {
    sqlx::query("INSERT INTO stats (time, usercount, chancount, mem) VALUES ($1, $2, $3, $4)")
        .bind(time)
        .bind(usercount)
        .bind(chancount)
        .bind(mem)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete all stat points sampled strictly before `cutoff`.
///
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn prune_stats(pool: &PgPool, cutoff: DateTime<Utc>) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM stats WHERE time < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// List stat points sampled at or after `since`, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stats_since(
    pool: &PgPool,
    since: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<StatPointRow>, DbError> {
    let rows = sqlx::query_as::<_, StatPointRow>(
        "SELECT time, usercount, chancount, mem FROM stats \
         WHERE time >= $1 ORDER BY time ASC LIMIT $2",
    )
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
