//! Channel save sweep: persist every live channel once per cycle, spreading
//! the writes evenly across the cycle window.
//!
//! With thousands of live channels, saving them all at the instant the timer
//! fires would hammer the database in one burst. Instead each cycle snapshots
//! the channel list, divides the cycle period by the snapshot size, and sleeps
//! that long before every step, so the last save lands roughly at the end of
//! the window no matter how many channels there are. Dead or empty channels
//! still consume their delay slot (keeping the spacing uniform for the rest)
//! but are not saved. One channel's failed save never stops the sweep.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::channel::{Channel, ChannelMap};

pub(super) async fn register_channel_save_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    channels: ChannelMap,
    period: Duration,
) -> Result<(), JobSchedulerError> {
    let in_flight = Arc::new(AtomicBool::new(false));

    let job = Job::new_repeated_async(period, move |_uuid, _lock| {
        let pool = pool.clone();
        let channels = channels.clone();
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            run_guarded_sweep(&channels, period, &in_flight, |chan| {
                let pool = pool.clone();
                async move { chan.save_state(&pool).await }
            })
            .await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Clears the in-flight flag when the sweep ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Run one sweep cycle unless the previous cycle is still draining.
///
/// A cycle whose total step time exceeds its nominal period would otherwise
/// overlap the next tick and interleave two sweeps over the same channels;
/// the overlapping tick is skipped with a warning instead.
pub(crate) async fn run_guarded_sweep<F, Fut, E>(
    channels: &ChannelMap,
    period: Duration,
    in_flight: &Arc<AtomicBool>,
    save: F,
) where
    F: FnMut(Arc<Channel>) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    if channels.is_empty() {
        return;
    }

    if in_flight.swap(true, Ordering::SeqCst) {
        tracing::warn!("previous channel save sweep still running; skipping this cycle");
        return;
    }
    let _guard = InFlightGuard(Arc::clone(in_flight));

    run_save_sweep(channels.snapshot(), period, save).await;
}

/// One sweep cycle over a snapshot of the live channel list.
///
/// Steps run strictly in snapshot order, one at a time: sleep `period / n`,
/// re-check eligibility, then save. The delay comes before every step,
/// including the first, so the work covers the whole window instead of
/// front-loading it. Channels that joined after the snapshot wait for the
/// next cycle; channels torn down after the snapshot are caught by the
/// `dead` re-check.
pub(crate) async fn run_save_sweep<F, Fut, E>(
    snapshot: Vec<Arc<Channel>>,
    period: Duration,
    mut save: F,
) where
    F: FnMut(Arc<Channel>) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    if snapshot.is_empty() {
        return;
    }

    let step = period / u32::try_from(snapshot.len()).unwrap_or(u32::MAX);
    tracing::info!(
        channels = snapshot.len(),
        step_delay_ms = u64::try_from(step.as_millis()).unwrap_or(u64::MAX),
        "starting channel save sweep"
    );

    for chan in snapshot {
        tokio::time::sleep(step).await;

        // Eligibility is checked at step time, not snapshot time: a channel
        // torn down mid-cycle must not be saved, and an empty one has nothing
        // worth persisting. Skipped channels keep their delay slot.
        if chan.is_dead() || chan.user_count() == 0 {
            continue;
        }

        match save(Arc::clone(&chan)).await {
            Ok(()) => tracing::info!(channel = %chan.name(), "saved channel state"),
            Err(e) => {
                tracing::error!(channel = %chan.name(), error = %e, "failed to save channel state");
            }
        }
    }
}
