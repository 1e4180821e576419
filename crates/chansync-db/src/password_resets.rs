//! Database operations for the `password_resets` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// Delete password-reset records whose expiry passed strictly before `cutoff`.
///
/// Returns the number of rows deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_expired_password_resets(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM password_resets WHERE expire < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
