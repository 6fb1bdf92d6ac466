//! In-memory fetch cache with per-call TTLs.
//!
//! Sits in front of the content service so repeated page reads don't each
//! hit the network. Entries are stored in a moka map together with the time
//! they were fetched; freshness is decided per call against the TTL the
//! caller passes.
//!
//! There is no single-flight guarantee: callers that miss concurrently each
//! run their own fetcher, and the last write wins.
//!
//! ## TTL Guidelines
//!
//! | Data Type | TTL | Examples |
//! |-----------|-----|----------|
//! | Page index | default | `pages:index` |
//! | Page body | default | `page:{slug}` |
//! | Previews after edits | invalidate | `POST /api/cache/invalidate` |

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default cache capacity (number of entries).
pub const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Default TTL for cached entries, and the sweep interval.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Which age limit the periodic sweep applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepPolicy {
    /// Evict entries older than the cache's default TTL, whatever TTL they
    /// were stored with. Entries fetched with a longer TTL can be dropped
    /// early; ones with a shorter TTL linger until read.
    #[default]
    DefaultTtl,
    /// Evict entries older than the TTL they were stored with.
    EntryTtl,
}

impl FromStr for SweepPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default-ttl" => Ok(Self::DefaultTtl),
            "entry-ttl" => Ok(Self::EntryTtl),
            other => Err(format!(
                "unknown sweep policy '{other}' (expected 'default-ttl' or 'entry-ttl')"
            )),
        }
    }
}

/// Cached value with the metadata needed for freshness decisions.
#[derive(Clone, Debug)]
pub struct CacheEntry<V> {
    pub value: V,
    /// When the fetcher produced this value.
    pub stored_at: Instant,
    /// TTL the entry was stored with.
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_older_than(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

/// Explicitly constructed key/value cache with expiry.
///
/// Cloning is cheap; clones share the same entries.
#[derive(Clone)]
pub struct FetchCache<V> {
    entries: Cache<String, CacheEntry<V>>,
    default_ttl: Duration,
    sweep_policy: SweepPolicy,
}

impl<V> FetchCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache. `default_ttl` must be non-zero; it is also the sweep interval.
    pub fn new(default_ttl: Duration, sweep_policy: SweepPolicy) -> Self {
        let entries = Cache::builder()
            .max_capacity(DEFAULT_CACHE_CAPACITY)
            .build();

        Self {
            entries,
            default_ttl,
            sweep_policy,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get a fresh cached value or fetch and cache it.
    ///
    /// 1. If an entry for `key` is younger than `ttl`, returns it without
    ///    calling `fetcher`
    /// 2. Otherwise awaits `fetcher`, stores its value with the current time
    ///    and returns it
    /// 3. A fetcher error is returned unchanged and nothing is stored
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetcher: F, ttl: Duration) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(entry) = self.entries.get(key).await {
            if !entry.is_older_than(ttl, Instant::now()) {
                tracing::debug!(key = %key, "cache hit");
                return Ok(entry.value);
            }
            tracing::debug!(key = %key, "cache entry stale");
        }

        tracing::debug!(key = %key, "cache miss, fetching");
        let value = fetcher().await?;

        let entry = CacheEntry {
            value: value.clone(),
            stored_at: Instant::now(),
            ttl,
        };
        self.entries.insert(key.to_string(), entry).await;

        Ok(value)
    }

    /// [`get_or_fetch`](Self::get_or_fetch) with the default TTL.
    pub async fn get_or_fetch_default<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        self.get_or_fetch(key, fetcher, self.default_ttl).await
    }

    /// Whether an entry (fresh or stale) is present for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove one entry.
    pub async fn invalidate(&self, key: &str) {
        self.entries.invalidate(key).await;
        tracing::debug!(key = %key, "cache entry invalidated");
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries.invalidate_all();
        tracing::debug!("cache cleared");
    }

    /// Remove entries past the sweep policy's age limit.
    ///
    /// Returns the number of entries removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();

        let expired: Vec<Arc<String>> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                let limit = match self.sweep_policy {
                    SweepPolicy::DefaultTtl => self.default_ttl,
                    SweepPolicy::EntryTtl => entry.ttl,
                };
                entry.is_older_than(limit, now)
            })
            .map(|(key, _)| key)
            .collect();

        for key in &expired {
            self.entries.invalidate(key.as_str()).await;
        }

        expired.len()
    }

    /// Run [`sweep`](Self::sweep) every default-TTL interval in the background.
    ///
    /// The task stops when the returned handle is dropped.
    pub fn spawn_sweeper(&self) -> SweeperHandle {
        let cache = self.clone();
        let period = self.default_ttl;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = cache.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "cache sweep evicted entries");
                }
            }
        });

        tracing::info!(
            interval_secs = period.as_secs(),
            policy = ?self.sweep_policy,
            "cache sweeper started"
        );

        SweeperHandle(task)
    }
}

/// Owns the background sweep task; aborts it on drop.
pub struct SweeperHandle(JoinHandle<()>);

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn new_cache() -> FetchCache<i32> {
        FetchCache::new(TTL, SweepPolicy::DefaultTtl)
    }

    async fn counted(cache: &FetchCache<i32>, key: &str, calls: &AtomicUsize, ttl: Duration) -> i32 {
        cache
            .get_or_fetch(
                key,
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(42)
                },
                ttl,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_cache_hit() {
        let cache = new_cache();

        let result: Result<i32, String> = cache.get_or_fetch_default("k", || async { Ok(42) }).await;
        assert_eq!(result, Ok(42));

        let result: Result<i32, String> = cache
            .get_or_fetch_default("k", || async {
                panic!("fetcher should not be called on cache hit")
            })
            .await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_at_most_once_within_ttl() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        let a = counted(&cache, "k", &calls, TTL).await;
        tokio::time::advance(Duration::from_secs(30)).await;
        let b = counted(&cache, "k", &calls, TTL).await;

        assert_eq!(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetches_after_ttl() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        counted(&cache, "k", &calls, TTL).await;
        tokio::time::advance(TTL + Duration::from_secs(1)).await;
        counted(&cache, "k", &calls, TTL).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_is_per_call() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        counted(&cache, "k", &calls, TTL).await;
        tokio::time::advance(Duration::from_secs(10)).await;
        // A caller with a tighter freshness bound sees the entry as stale.
        counted(&cache, "k", &calls, Duration::from_secs(5)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_error_is_not_cached() {
        let cache = new_cache();

        let result: Result<i32, String> = cache
            .get_or_fetch_default("k", || async { Err("boom".to_string()) })
            .await;
        assert_eq!(result, Err("boom".to_string()));
        assert!(!cache.contains("k"));

        let result: Result<i32, String> = cache.get_or_fetch_default("k", || async { Ok(7) }).await;
        assert_eq!(result, Ok(7));
    }

    #[tokio::test]
    async fn test_no_single_flight() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok::<_, String>(1)
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch_default("k", fetch),
            cache.get_or_fetch_default("k", fetch),
        );

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        counted(&cache, "a", &calls, TTL).await;
        counted(&cache, "b", &calls, TTL).await;

        cache.invalidate("a").await;
        counted(&cache, "a", &calls, TTL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cache.clear();
        counted(&cache, "a", &calls, TTL).await;
        counted(&cache, "b", &calls, TTL).await;
        assert_eq!(calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_default_ttl_ignores_entry_ttl() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);

        counted(&cache, "long", &calls, TTL * 10).await;
        counted(&cache, "short", &calls, Duration::from_secs(1)).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.sweep().await, 0);
        assert!(cache.contains("short"));

        tokio::time::advance(TTL).await;
        assert_eq!(cache.sweep().await, 2);
        assert!(!cache.contains("long"));
        assert!(!cache.contains("short"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_entry_ttl() {
        let cache = FetchCache::new(TTL, SweepPolicy::EntryTtl);
        let calls = AtomicUsize::new(0);

        counted(&cache, "long", &calls, TTL * 10).await;
        counted(&cache, "short", &calls, Duration::from_secs(1)).await;

        tokio::time::advance(TTL * 2).await;
        assert_eq!(cache.sweep().await, 1);
        assert!(cache.contains("long"));
        assert!(!cache.contains("short"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_sweeper_evicts() {
        let cache = new_cache();
        let calls = AtomicUsize::new(0);
        let _sweeper = cache.spawn_sweeper();

        counted(&cache, "k", &calls, TTL).await;
        assert!(cache.contains("k"));

        tokio::time::sleep(TTL * 3).await;
        assert!(!cache.contains("k"));
    }

    #[test]
    fn test_sweep_policy_parse() {
        assert_eq!("default-ttl".parse(), Ok(SweepPolicy::DefaultTtl));
        assert_eq!(" entry-ttl ".parse(), Ok(SweepPolicy::EntryTtl));
        assert!("lru".parse::<SweepPolicy>().is_err());
    }
}
