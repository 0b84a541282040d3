//! Single-flight response cache (`withCache`). At most one
//! refresh per key is in flight; arrivals during that window receive
//! either the fresh bytes or the pre-existing stale bytes, never a torn
//! response.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

#[derive(Clone)]
struct CacheEntry {
    bytes: Arc<Vec<u8>>,
    created_at: Instant,
}

/// State for one key's in-flight refresh: a notifier fired once the
/// refresh completes, so waiters don't spin.
struct Refreshing {
    notify: Arc<Notify>,
}

struct Inner {
    entries: HashMap<String, CacheEntry>,
    refreshing: HashMap<String, Refreshing>,
}

/// A concurrency-safe response cache keyed by request URL.
#[derive(Clone)]
pub struct CacheMap {
    inner: Arc<Mutex<Inner>>,
}

impl Default for CacheMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheMap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                refreshing: HashMap::new(),
            })),
        }
    }

    /// Fetches `key`, building it with `build` on a miss or when stale.
    /// `build` is only ever run by one caller at a time per key; concurrent
    /// callers either get the fresh bytes it produces or — if it takes
    /// longer than `update_timeout` — the previous stale bytes, with the
    /// build left to finish in the background.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        update_timeout: Duration,
        build: F,
    ) -> Arc<Vec<u8>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Vec<u8>> + Send + 'static,
    {
        let (stale, is_fresh) = {
            let guard = self.inner.lock().await;
            match guard.entries.get(key) {
                Some(entry) if entry.created_at.elapsed() < ttl => {
                    return Arc::clone(&entry.bytes);
                }
                Some(entry) => (Some(Arc::clone(&entry.bytes)), false),
                None => (None, false),
            }
        };
        let _ = is_fresh;

        let notify = {
            let mut guard = self.inner.lock().await;
            if let Some(existing) = guard.refreshing.get(key) {
                Arc::clone(&existing.notify)
            } else {
                let notify = Arc::new(Notify::new());
                guard.refreshing.insert(
                    key.to_string(),
                    Refreshing {
                        notify: Arc::clone(&notify),
                    },
                );
                let this = self.clone();
                let key_owned = key.to_string();
                let notify_spawned = Arc::clone(&notify);
                tokio::spawn(async move {
                    let bytes = build().await;
                    let mut guard = this.inner.lock().await;
                    guard.entries.insert(
                        key_owned.clone(),
                        CacheEntry {
                            bytes: Arc::new(bytes),
                            created_at: Instant::now(),
                        },
                    );
                    guard.refreshing.remove(&key_owned);
                    drop(guard);
                    notify_spawned.notify_waiters();
                });
                notify
            }
        };

        match tokio::time::timeout(update_timeout, notify.notified()).await {
            Ok(()) => {
                let guard = self.inner.lock().await;
                guard
                    .entries
                    .get(key)
                    .map(|e| Arc::clone(&e.bytes))
                    .unwrap_or_else(|| stale.unwrap_or_default())
            }
            Err(_) => stale.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn miss_builds_and_caches() {
        let cache = CacheMap::new();
        let bytes = cache
            .get_or_refresh(
                "/local",
                Duration::from_secs(60),
                Duration::from_secs(5),
                || async { b"hello".to_vec() },
            )
            .await;
        assert_eq!(&*bytes, b"hello");
    }

    #[tokio::test]
    async fn fresh_entry_is_returned_without_rebuilding() {
        let cache = CacheMap::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            cache
                .get_or_refresh(
                    "/local",
                    Duration::from_secs(60),
                    Duration::from_secs(5),
                    move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        async { b"v".to_vec() }
                    },
                )
                .await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_timeout_returns_prior_bytes() {
        let cache = CacheMap::new();
        cache
            .get_or_refresh(
                "/local",
                Duration::from_millis(0),
                Duration::from_secs(5),
                || async { b"first".to_vec() },
            )
            .await;

        tokio::time::sleep(Duration::from_millis(5)).await;

        let bytes = cache
            .get_or_refresh(
                "/local",
                Duration::from_millis(0),
                Duration::from_millis(20),
                || async {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    b"second".to_vec()
                },
            )
            .await;

        assert_eq!(&*bytes, b"first");
    }
}
