//! # TTL Cache
//!
//! Concurrent key/value store where every value carries an absolute expiry
//! instant. A background task owned by the cache wakes every sweep interval
//! and reclaims the entries whose expiry has passed.
//!
//! Expiry is enforced lazily: [`TtlCache::get`] and [`TtlCache::has_key`]
//! never consult the clock, so an entry that expired at `t` can still be
//! observed until the next sweep runs (at most one sweep interval later).

use dashmap::DashMap;
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Upper bound applied to TTLs so `now + ttl` never overflows.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expire_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expire_at: Instant::now() + ttl.min(MAX_TTL),
        }
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expire_at
    }
}

struct Sweeper {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Key/value cache with per-entry TTL.
///
/// Share it between collaborators with an `Arc`; every instance is
/// independent and owns exactly one sweep task.
pub struct TtlCache<K, V> {
    entries: Arc<DashMap<K, CacheEntry<V>>>,
    sweep_interval: Duration,
    sweeper: Mutex<Option<Sweeper>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates the cache and spawns its sweep task.
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime.
    pub fn new(sweep_interval: Duration) -> Self {
        let sweep_interval = sweep_interval.max(MIN_SWEEP_INTERVAL);
        let entries = Arc::new(DashMap::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(run_sweeper(
            Arc::clone(&entries),
            sweep_interval,
            shutdown_rx,
        ));

        Self {
            entries,
            sweep_interval,
            sweeper: Mutex::new(Some(Sweeper { shutdown_tx, task })),
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set(&self, key: K, value: V, ttl: Duration) {
        self.entries.insert(key, CacheEntry::new(value, ttl));
    }

    /// Returns the stored value unless it was removed, cleared or swept.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn has_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn remove<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.remove(key);
    }

    /// Drops every entry whose key matches `predicate`.
    pub fn remove_matching<F>(&self, predicate: F)
    where
        F: Fn(&K) -> bool,
    {
        self.entries.retain(|key, _| !predicate(key));
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stops the sweep task.
    ///
    /// Single-use: the cache cannot be reopened. Calls already in flight are
    /// unaffected and this never waits for the task to finish. A second call
    /// only logs a warning.
    pub fn close(&self) {
        let Some(sweeper) = self.sweeper.lock().take() else {
            warn!("TTL cache closed more than once");
            return;
        };

        if sweeper.shutdown_tx.send(()).is_err() && !sweeper.task.is_finished() {
            warn!("TTL cache sweeper stopped before close was requested");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sweeper.lock().is_none()
    }
}

impl<K: Eq + Hash, V> std::fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.entries.len())
            .field("sweep_interval", &self.sweep_interval)
            .finish()
    }
}

// Dropping the cache drops the shutdown sender, which also ends the sweeper.
async fn run_sweeper<K, V>(
    entries: Arc<DashMap<K, CacheEntry<V>>>,
    period: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) where
    K: Eq + Hash + Clone,
{
    let mut tick = tokio::time::interval_at(Instant::now() + period, period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => {
                debug!("TTL cache sweeper shutting down");
                break;
            }
            _ = tick.tick() => {
                sweep_expired(&entries, Instant::now());
            }
        }
    }
}

fn sweep_expired<K, V>(entries: &DashMap<K, CacheEntry<V>>, now: Instant) -> usize
where
    K: Eq + Hash + Clone,
{
    let expired: Vec<K> = entries
        .iter()
        .filter(|entry| entry.value().is_expired_at(now))
        .map(|entry| entry.key().clone())
        .collect();

    let mut removed = 0usize;
    for key in &expired {
        // A key re-set with a fresh expiry since the scan must survive.
        if entries
            .remove_if(key, |_, entry| entry.is_expired_at(now))
            .is_some()
        {
            removed += 1;
        }
    }

    if removed > 0 {
        debug!(removed, "Swept expired cache entries");
        metrics::counter!("ttl_cache_swept_entries_total").increment(removed as u64);
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_expiry_is_strict() {
        let entry = CacheEntry::new("value", Duration::from_secs(1));
        assert!(!entry.is_expired_at(entry.expire_at));
        assert!(entry.is_expired_at(entry.expire_at + Duration::from_nanos(1)));
    }

    #[test]
    fn test_entry_ttl_is_clamped() {
        let entry = CacheEntry::new(1u8, Duration::MAX);
        assert!(entry.expire_at > Instant::now() + Duration::from_secs(60));
    }

    #[test]
    fn test_sweep_expired_removes_only_past_entries() {
        let entries: DashMap<String, CacheEntry<u32>> = DashMap::new();
        entries.insert("short".to_string(), CacheEntry::new(1, Duration::from_millis(10)));
        entries.insert("long".to_string(), CacheEntry::new(2, Duration::from_secs(3600)));

        let later = Instant::now() + Duration::from_secs(1);
        let removed = sweep_expired(&entries, later);

        assert_eq!(removed, 1);
        assert!(!entries.contains_key("short"));
        assert!(entries.contains_key("long"));
    }

    #[test]
    fn test_sweep_expired_on_empty_map() {
        let entries: DashMap<String, CacheEntry<u32>> = DashMap::new();
        assert_eq!(sweep_expired(&entries, Instant::now()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_sweep_interval_is_clamped() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::ZERO);
        assert_eq!(cache.sweep_interval(), MIN_SWEEP_INTERVAL);
        cache.close();
    }

    #[tokio::test(start_paused = true)]
    async fn test_debug_reports_entry_count() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(1));
        cache.set("a".to_string(), 1, Duration::from_secs(60));
        cache.set("b".to_string(), 2, Duration::from_secs(60));

        let debug = format!("{cache:?}");
        assert!(debug.contains("entries: 2"));
        cache.close();
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_twice_is_harmless() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(1));
        assert!(!cache.is_closed());

        cache.close();
        cache.close();

        assert!(cache.is_closed());
    }
}
