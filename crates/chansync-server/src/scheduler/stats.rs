//! Stat sampling job: one point-in-time snapshot of server load per tick.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::channel::ChannelMap;

pub(super) async fn register_stats_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    channels: ChannelMap,
    period: Duration,
    max_age: chrono::Duration,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_repeated_async(period, move |_uuid, _lock| {
        let pool = pool.clone();
        let channels = channels.clone();

        Box::pin(async move {
            run_stats_sample(&pool, &channels, max_age).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Record one stat point, then prune points older than the retention window.
///
/// Pruning only runs after a successful insert, and nothing ties the two
/// together transactionally: a failed prune leaves the fresh point in place
/// and the backlog is retried implicitly on the next tick. Either failure is
/// logged and never stops future ticks.
pub(crate) async fn run_stats_sample(
    pool: &PgPool,
    channels: &ChannelMap,
    max_age: chrono::Duration,
) {
    let (chancount, usercount) = live_counts(channels);
    let mem = resident_memory_bytes();
    let now = Utc::now();

    match chansync_db::add_stat_point(pool, now, usercount, chancount, mem).await {
        Ok(()) => match chansync_db::prune_stats(pool, now - max_age).await {
            Ok(pruned) if pruned > 0 => {
                tracing::debug!(pruned, "pruned expired stat points");
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "failed to prune stat points"),
        },
        Err(e) => tracing::error!(error = %e, "failed to record stat point"),
    }
}

/// Current live-channel and total-user counts, clamped into the stat columns.
pub(crate) fn live_counts(channels: &ChannelMap) -> (i32, i32) {
    let chancount = i32::try_from(channels.len()).unwrap_or(i32::MAX);
    let usercount = i32::try_from(channels.total_users()).unwrap_or(i32::MAX);
    (chancount, usercount)
}

/// Resident set size of this process in bytes, or 0 where unavailable.
fn resident_memory_bytes() -> i64 {
    #[cfg(target_os = "linux")]
    if let Ok(statm) = std::fs::read_to_string("/proc/self/statm") {
        if let Some(rss_pages) = statm.split_whitespace().nth(1) {
            if let Ok(pages) = rss_pages.parse::<i64>() {
                return pages.saturating_mul(4096);
            }
        }
    }

    0
}
