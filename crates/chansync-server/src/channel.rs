//! In-memory registry of live channels.
//!
//! A [`Channel`] is the unit of live server state: a set of connected users
//! plus a JSON state document that the save sweep persists. The [`ChannelMap`]
//! holds the ordered collection of live channels and is mutated by the session
//! layer (joins, leaves, teardowns) concurrently with the background jobs that
//! read it. Readers never hold the registry lock across an await: they copy
//! `Arc`s out via [`ChannelMap::snapshot`] and re-check each channel's `dead`
//! flag before acting on it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use sqlx::PgPool;

use chansync_db::DbError;

/// A live channel: connected users plus persistable state.
pub struct Channel {
    name: String,
    users: RwLock<HashSet<String>>,
    state: RwLock<serde_json::Value>,
    dead: AtomicBool,
}

impl Channel {
    fn new(name: String, state: serde_json::Value) -> Self {
        Self {
            name,
            users: RwLock::new(HashSet::new()),
            state: RwLock::new(state),
            dead: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Add a user; returns `false` if the nick was already present.
    pub fn add_user(&self, nick: &str) -> bool {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(nick.to_string())
    }

    /// Remove a user; returns `false` if the nick was not present.
    pub fn remove_user(&self, nick: &str) -> bool {
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(nick)
    }

    /// True once the channel has been torn down. A dead channel may still be
    /// referenced by an in-flight sweep snapshot; it is never saved again.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead.load(Ordering::SeqCst)
    }

    pub fn mark_dead(&self) {
        self.dead.store(true, Ordering::SeqCst);
    }

    /// Replace the channel's state document.
    pub fn set_state(&self, state: serde_json::Value) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }

    #[must_use]
    pub fn state_snapshot(&self) -> serde_json::Value {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist the channel's current state document.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the upsert fails. Callers in the background jobs
    /// log and continue; a failed save never tears the channel down.
    pub async fn save_state(&self, pool: &PgPool) -> Result<(), DbError> {
        let state = self.state_snapshot();
        chansync_db::save_channel_state(pool, &self.name, &state).await
    }
}

/// Shared handle over the ordered collection of live channels.
///
/// Cloning is cheap; all clones observe the same registry. The handle also
/// owns the background-job initialization flag, so re-running the scheduler
/// driver against the same handle can be detected and refused.
#[derive(Clone)]
pub struct ChannelMap {
    inner: Arc<MapInner>,
}

struct MapInner {
    channels: RwLock<Vec<Arc<Channel>>>,
    jobs_started: AtomicBool,
}

impl ChannelMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MapInner {
                channels: RwLock::new(Vec::new()),
                jobs_started: AtomicBool::new(false),
            }),
        }
    }

    /// Copy out the current ordered channel list.
    ///
    /// The copy is taken under the lock, but the lock is released before the
    /// caller does anything with it — channels may join or die while the
    /// snapshot is being walked, which is why per-channel liveness is
    /// re-checked at the point of use.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Channel>> {
        self.read().clone()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Channel>> {
        self.read().iter().find(|c| c.name() == name).cloned()
    }

    /// Fetch a live channel, opening it if absent.
    ///
    /// A newly opened channel restores its persisted state document (or starts
    /// from an empty object). If two callers race to open the same name, the
    /// second finds the first's entry and no duplicate is registered.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if loading the persisted state fails.
    pub async fn get_or_open(&self, pool: &PgPool, name: &str) -> Result<Arc<Channel>, DbError> {
        if let Some(existing) = self.get(name) {
            return Ok(existing);
        }

        let state = chansync_db::load_channel_state(pool, name)
            .await?
            .unwrap_or_else(|| serde_json::json!({}));

        let mut channels = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock: another task may have opened it
        // between our read above and now.
        if let Some(existing) = channels.iter().find(|c| c.name() == name) {
            return Ok(Arc::clone(existing));
        }
        let channel = Arc::new(Channel::new(name.to_string(), state));
        channels.push(Arc::clone(&channel));
        Ok(channel)
    }

    /// Tear a channel down: mark it dead and unlink it from the registry.
    ///
    /// Returns the removed channel so the caller can perform a final save.
    /// An in-flight sweep snapshot may still hold the `Arc`; the dead flag is
    /// what keeps it from being saved again.
    pub fn remove(&self, name: &str) -> Option<Arc<Channel>> {
        let mut channels = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let index = channels.iter().position(|c| c.name() == name)?;
        let channel = channels.remove(index);
        channel.mark_dead();
        Some(channel)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Total connected users summed across all live channels.
    #[must_use]
    pub fn total_users(&self) -> usize {
        self.read().iter().map(|c| c.user_count()).sum()
    }

    /// Flip the background-job flag; returns `true` exactly once per handle.
    pub(crate) fn try_mark_jobs_started(&self) -> bool {
        !self.inner.jobs_started.swap(true, Ordering::SeqCst)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Arc<Channel>>> {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{channel_with_users, register};
    use super::*;

    #[test]
    fn users_join_and_leave() {
        let chan = Channel::new("lobby".to_string(), serde_json::json!({}));
        assert_eq!(chan.user_count(), 0);

        assert!(chan.add_user("alice"));
        assert!(chan.add_user("bob"));
        assert!(!chan.add_user("alice"), "duplicate join is a no-op");
        assert_eq!(chan.user_count(), 2);

        assert!(chan.remove_user("alice"));
        assert!(!chan.remove_user("alice"), "double leave is a no-op");
        assert_eq!(chan.user_count(), 1);
    }

    #[test]
    fn remove_marks_the_channel_dead_but_snapshots_keep_the_arc() {
        let map = ChannelMap::new();
        register(&map, channel_with_users("lobby", 1));

        let snapshot = map.snapshot();
        assert_eq!(snapshot.len(), 1);

        let removed = map.remove("lobby").expect("channel was registered");
        assert!(removed.is_dead());
        assert!(map.is_empty());

        // The earlier snapshot still holds the channel; its dead flag is the
        // only thing protecting a sweep that took the snapshot before removal.
        assert!(snapshot[0].is_dead());
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let map = ChannelMap::new();
        for name in ["a", "b", "c"] {
            register(&map, channel_with_users(name, 0));
        }

        let snapshot = map.snapshot();
        let names: Vec<&str> = snapshot.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn total_users_sums_across_channels() {
        let map = ChannelMap::new();
        register(&map, channel_with_users("a", 2));
        register(&map, channel_with_users("b", 1));

        assert_eq!(map.len(), 2);
        assert_eq!(map.total_users(), 3);
    }

    #[test]
    fn jobs_started_flag_flips_exactly_once_per_handle() {
        let map = ChannelMap::new();
        let clone = map.clone();
        assert!(map.try_mark_jobs_started());
        assert!(!clone.try_mark_jobs_started(), "clones share the flag");

        let other = ChannelMap::new();
        assert!(other.try_mark_jobs_started(), "a fresh handle has its own flag");
    }
}
