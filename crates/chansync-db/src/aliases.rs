//! Database operations for the `aliases` table.
//!
//! Aliases map an IP address to the nicknames it has been seen under. The
//! session layer appends rows as users connect; the background alias-cleanup
//! job is the only writer that ever removes them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Delete all alias records seen strictly before `cutoff`.
///
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_aliases_older_than(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM aliases WHERE time < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
