//! TTL cache with single-flight computation.
//!
//! Owned by the composition root and injected into consumers; not a
//! module-level singleton. `clear` exists for test harnesses.
//!
//! Correctness invariant: the cache check, the in-flight check, and the
//! registration of a new computation all happen under one lock acquisition
//! with no await point in between. A suspension there would let two callers
//! both miss and both compute.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::error::{ConfigError, Result};

struct Entry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> Entry<T> {
    /// Strict `age > ttl`: an entry read exactly at the boundary is still
    /// fresh. Documented so the boundary behavior stays consistent.
    fn is_expired(&self, now: Instant, ttl_override: Option<Duration>) -> bool {
        let ttl = ttl_override.unwrap_or(self.ttl);
        now.duration_since(self.inserted_at) > ttl
    }
}

type FlightResult<T> = Option<Result<T>>;

struct Inner<T> {
    entries: HashMap<String, Entry<T>>,
    in_flight: HashMap<String, watch::Receiver<FlightResult<T>>>,
}

enum Claim<T> {
    Wait(watch::Receiver<FlightResult<T>>),
    Run(watch::Sender<FlightResult<T>>),
}

pub struct TtlCache<T> {
    inner: Mutex<Inner<T>>,
    default_ttl: Duration,
}

impl<T: Clone + Send + 'static> TtlCache<T> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
            }),
            default_ttl,
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.get_inner(key, None)
    }

    /// Lookup with a call-site TTL override; the entry's stored ttl is
    /// ignored for this read only.
    pub fn get_with_ttl(&self, key: &str, ttl: Duration) -> Option<T> {
        self.get_inner(key, Some(ttl))
    }

    fn get_inner(&self, key: &str, ttl_override: Option<Duration>) -> Option<T> {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        match inner.entries.get(key) {
            Some(entry) if !entry.is_expired(now, ttl_override) => Some(entry.value.clone()),
            Some(_) => {
                // Lazy expiry: drop the stale entry on read.
                inner.entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn set(&self, key: &str, value: T, ttl: Option<Duration>) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.remove(key).is_some()
    }

    /// Invalidate by pattern: `"X*"` removes keys with prefix X, `"*X"` keys
    /// with suffix X, any other pattern removes keys containing it, and
    /// `None` clears everything.
    pub fn invalidate(&self, pattern: Option<&str>) -> usize {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let Some(pattern) = pattern else {
            let removed = inner.entries.len();
            inner.entries.clear();
            return removed;
        };

        let matches: Box<dyn Fn(&str) -> bool> =
            if let Some(prefix) = pattern.strip_suffix('*') {
                let prefix = prefix.to_string();
                Box::new(move |key: &str| key.starts_with(&prefix))
            } else if let Some(suffix) = pattern.strip_prefix('*') {
                let suffix = suffix.to_string();
                Box::new(move |key: &str| key.ends_with(&suffix))
            } else {
                let needle = pattern.to_string();
                Box::new(move |key: &str| key.contains(&needle))
            };

        let doomed: Vec<String> = inner
            .entries
            .keys()
            .filter(|key| matches(key))
            .cloned()
            .collect();
        for key in &doomed {
            inner.entries.remove(key);
        }
        doomed.len()
    }

    /// Clear all entries. In-flight computations are left to finish; their
    /// results land in the (now empty) cache as usual.
    pub fn clear(&self) {
        self.invalidate(None);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry. Lazy expiry already guarantees stale
    /// values are never returned; the sweep bounds memory when keys stop
    /// being read.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let doomed: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, None))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            inner.entries.remove(key);
        }
        doomed.len()
    }

    /// Background sweeper at a fixed interval. Optional; lazy expiry is the
    /// primary mechanism.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()>
    where
        T: Sync,
    {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tick.tick().await;
                let removed = cache.sweep();
                if removed > 0 {
                    log::debug!("config cache sweep removed {removed} expired entries");
                }
            }
        })
    }

    /// Cached read or deduplicated compute.
    ///
    /// At most one `compute` runs per key per cache gap; concurrent callers
    /// for the same key await the in-flight result and all receive the same
    /// value (or the same error). The in-flight entry is removed on both
    /// success and failure so a later call can retry after a failure.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        compute: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let claim = {
            let now = Instant::now();
            let mut inner = self.inner.lock().expect("cache mutex poisoned");
            if let Some(entry) = inner.entries.get(key) {
                if !entry.is_expired(now, None) {
                    return Ok(entry.value.clone());
                }
                inner.entries.remove(key);
            }
            if let Some(rx) = inner.in_flight.get(key) {
                Claim::Wait(rx.clone())
            } else {
                let (tx, rx) = watch::channel(None);
                inner.in_flight.insert(key.to_string(), rx);
                Claim::Run(tx)
            }
        };

        match claim {
            Claim::Wait(mut rx) => loop {
                if let Some(result) = rx.borrow().clone() {
                    return result;
                }
                if rx.changed().await.is_err() {
                    // The computing task died without publishing. Drop the
                    // dead in-flight entry so the next caller can retry.
                    let mut inner = self.inner.lock().expect("cache mutex poisoned");
                    if inner
                        .in_flight
                        .get(key)
                        .is_some_and(|stored| stored.has_changed().is_err())
                    {
                        inner.in_flight.remove(key);
                    }
                    return Err(ConfigError::ResolutionAborted {
                        key: key.to_string(),
                    });
                }
            },
            Claim::Run(tx) => {
                let result = compute().await;
                {
                    let mut inner = self.inner.lock().expect("cache mutex poisoned");
                    inner.in_flight.remove(key);
                    if let Ok(value) = &result {
                        inner.entries.insert(
                            key.to_string(),
                            Entry {
                                value: value.clone(),
                                inserted_at: Instant::now(),
                                ttl: ttl.unwrap_or(self.default_ttl),
                            },
                        );
                    }
                }
                let _ = tx.send(Some(result.clone()));
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn value_returned_before_ttl_and_absent_after() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_millis(40));
        cache.set("key", "value".to_string(), None);
        assert_eq!(cache.get("key").as_deref(), Some("value"));

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get("key"), None);
        // Lazy expiry removed the entry.
        assert!(cache.is_empty());
    }

    #[test]
    fn call_site_ttl_overrides_stored_ttl() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(3600));
        cache.set("key", 7, None);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("key"), Some(7));
        assert_eq!(cache.get_with_ttl("key", Duration::from_millis(1)), None);
    }

    #[test]
    fn invalidate_supports_prefix_suffix_substring_and_clear() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("provider:openai", 1, None);
        cache.set("provider:google", 2, None);
        cache.set("selection:priority", 3, None);

        assert_eq!(cache.invalidate(Some("provider:*")), 2);
        assert_eq!(cache.get("selection:priority"), Some(3));

        cache.set("provider:openai", 1, None);
        assert_eq!(cache.invalidate(Some("*openai")), 1);

        cache.set("a-priority-b", 4, None);
        assert_eq!(cache.invalidate(Some("priority")), 2);

        cache.set("x", 5, None);
        assert_eq!(cache.invalidate(None), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_secs(60));
        cache.set("fresh", 1, None);
        cache.set("stale", 2, Some(Duration::from_millis(5)));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get("fresh"), Some(1));
    }

    #[tokio::test]
    async fn concurrent_get_or_compute_runs_resolver_once() {
        let cache: Arc<TtlCache<String>> = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("key", None, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(25)).await;
                        Ok("resolved".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            let value = handle.await.expect("join").expect("resolve");
            assert_eq!(value, "resolved");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_compute_is_not_cached_and_retries() {
        let cache: TtlCache<String> = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        let first = cache
            .get_or_compute("key", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ConfigError::missing_required(
                    crate::provider::Provider::OpenAi,
                    "model",
                    vec!["OPENAI_MODEL".to_string()],
                ))
            })
            .await;
        assert!(first.is_err());

        let second = cache
            .get_or_compute("key", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("recovered".to_string())
            })
            .await;
        assert_eq!(second.expect("second resolve"), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entry_triggers_recompute() {
        let cache: TtlCache<u32> = TtlCache::new(Duration::from_millis(10));
        let first = cache
            .get_or_compute("key", None, || async { Ok(1) })
            .await
            .expect("first");
        assert_eq!(first, 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = cache
            .get_or_compute("key", None, || async { Ok(2) })
            .await
            .expect("second");
        assert_eq!(second, 2);
    }
}
