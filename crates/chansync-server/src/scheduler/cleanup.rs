//! Expiry sweeps: stale aliases and dead password-reset records.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Password-reset purges run on a fixed schedule, unlike the alias sweep.
pub(super) const PASSWORD_RESET_PURGE_INTERVAL: Duration = Duration::from_secs(8 * 60 * 60);

/// Reset records are kept for a day past their expiry before being purged.
const PASSWORD_RESET_GRACE_HOURS: i64 = 24;

pub(super) async fn register_alias_cleanup_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    period: Duration,
    max_age: chrono::Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(period, move |_uuid, _lock| {
        let pool = pool.clone();

        Box::pin(async move {
            run_alias_cleanup(&pool, max_age).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

pub(super) async fn register_password_reset_cleanup_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(PASSWORD_RESET_PURGE_INTERVAL, move |_uuid, _lock| {
        let pool = pool.clone();

        Box::pin(async move {
            run_password_reset_cleanup(&pool).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Delete alias records older than the configured retention window.
pub(crate) async fn run_alias_cleanup(pool: &PgPool, max_age: chrono::Duration) {
    match chansync_db::delete_aliases_older_than(pool, Utc::now() - max_age).await {
        Ok(deleted) => tracing::info!(deleted, "cleaned old aliases"),
        Err(e) => tracing::error!(error = %e, "alias cleanup failed"),
    }
}

/// Delete password-reset records whose expiry passed more than a day ago.
pub(crate) async fn run_password_reset_cleanup(pool: &PgPool) {
    let cutoff = Utc::now() - chrono::Duration::hours(PASSWORD_RESET_GRACE_HOURS);
    match chansync_db::delete_expired_password_resets(pool, cutoff).await {
        Ok(deleted) if deleted > 0 => {
            tracing::debug!(deleted, "purged stale password resets");
        }
        Ok(_) => {}
        Err(e) => tracing::error!(error = %e, "password reset cleanup failed"),
    }
}
