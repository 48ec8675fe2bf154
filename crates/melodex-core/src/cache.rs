// ── Status cache ──
//
// Process-wide map from relationship key to last-known status plus the
// in-flight fetch for that key. Entries never expire; only explicit
// `set`/`invalidate` calls change them.
//
// Every fetch is tagged with a ticket. A fetch writes its result only if
// its ticket is still the entry's in-flight ticket, so a `set` or an
// invalidation that lands mid-fetch always wins over the older response.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tracing::{debug, trace};

use melodex_api::RelationshipKind;

use crate::error::CoreError;
use crate::model::RelationshipKey;

type SharedFetch = Shared<BoxFuture<'static, Result<bool, CoreError>>>;

struct InFlight {
    ticket: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheEntry {
    status: Option<bool>,
    in_flight: Option<InFlight>,
}

struct CacheInner {
    entries: DashMap<RelationshipKey, CacheEntry>,
    next_ticket: AtomicU64,
}

enum Lookup {
    Hit(bool),
    Pending(SharedFetch),
}

/// Deduplicating relationship-status cache. Cheap to clone.
#[derive(Clone)]
pub struct StatusCache {
    inner: Arc<CacheInner>,
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: DashMap::new(),
                next_ticket: AtomicU64::new(0),
            }),
        }
    }

    /// Last-known status, without I/O.
    pub fn get(&self, key: &RelationshipKey) -> Option<bool> {
        self.inner.entries.get(key).and_then(|entry| entry.status)
    }

    /// Cached status, or the result of `fetcher`.
    ///
    /// Concurrent callers for the same key share one fetch. The fetch runs
    /// on its own task and completes even if every caller goes away.
    /// `fetcher` is called at most once and must not touch the cache.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &RelationshipKey,
        fetcher: F,
    ) -> Result<bool, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, CoreError>> + Send + 'static,
    {
        match self.lookup(key, fetcher, false) {
            Lookup::Hit(status) => Ok(status),
            Lookup::Pending(fetch) => self.settle(key, fetch).await,
        }
    }

    /// Fetch again even if a status is cached, joining a fetch already in
    /// flight for `key`.
    pub async fn refetch<F, Fut>(&self, key: &RelationshipKey, fetcher: F) -> Result<bool, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, CoreError>> + Send + 'static,
    {
        match self.lookup(key, fetcher, true) {
            Lookup::Hit(status) => Ok(status),
            Lookup::Pending(fetch) => self.settle(key, fetch).await,
        }
    }

    /// Record a known status. Any fetch in flight for `key` is orphaned.
    pub fn set(&self, key: &RelationshipKey, status: bool) {
        let mut entry = self.inner.entries.entry(key.clone()).or_default();
        entry.status = Some(status);
        entry.in_flight = None;
        trace!(key = %key, status, "cache set");
    }

    /// Forget `key`. Any fetch in flight for it is orphaned.
    pub fn invalidate(&self, key: &RelationshipKey) {
        if self.inner.entries.remove(key).is_some() {
            trace!(key = %key, "cache invalidated");
        }
    }

    /// Forget every entry of `kind`, or every entry when `kind` is `None`.
    pub fn invalidate_all(&self, kind: Option<RelationshipKind>) {
        match kind {
            Some(kind) => self.inner.entries.retain(|key, _| key.kind != kind),
            None => self.inner.entries.clear(),
        }
        debug!(kind = ?kind, remaining = self.len(), "cache invalidated");
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    /// Number of keys with a known status or a fetch in flight.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// `true` while a fetch for `key` is outstanding.
    pub fn is_fetching(&self, key: &RelationshipKey) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Check-and-insert under the entry guard. The guard is released
    /// before the caller awaits anything.
    fn lookup<F, Fut>(&self, key: &RelationshipKey, fetcher: F, force: bool) -> Lookup
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<bool, CoreError>> + Send + 'static,
    {
        let mut entry = self.inner.entries.entry(key.clone()).or_default();

        if !force {
            if let Some(status) = entry.status {
                trace!(key = %key, status, "cache hit");
                return Lookup::Hit(status);
            }
        }

        if let Some(in_flight) = &entry.in_flight {
            debug!(key = %key, "joining in-flight status fetch");
            return Lookup::Pending(in_flight.fetch.clone());
        }

        let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, ticket, "starting status fetch");

        let request = fetcher();
        let cache = self.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = request.await;
            cache.complete(&task_key, ticket, &result);
            result
        });

        let fetch = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(CoreError::Internal(format!("status fetch task failed: {e}"))))
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            ticket,
            fetch: fetch.clone(),
        });
        Lookup::Pending(fetch)
    }

    /// Await a shared fetch, then prefer whatever the cache holds now.
    async fn settle(&self, key: &RelationshipKey, fetch: SharedFetch) -> Result<bool, CoreError> {
        let fetched = fetch.await?;
        Ok(self.get(key).unwrap_or(fetched))
    }

    /// Store a finished fetch, unless it was superseded.
    fn complete(&self, key: &RelationshipKey, ticket: u64, result: &Result<bool, CoreError>) {
        let Some(mut entry) = self.inner.entries.get_mut(key) else {
            trace!(key = %key, ticket, "fetch finished after invalidation; discarded");
            return;
        };

        if entry.in_flight.as_ref().is_none_or(|f| f.ticket != ticket) {
            trace!(key = %key, ticket, "fetch superseded; discarded");
            return;
        }

        entry.in_flight = None;
        if let Ok(status) = result {
            entry.status = Some(*status);
        }
        let empty = entry.status.is_none();
        drop(entry);

        // A failed first fetch leaves nothing worth keeping.
        if empty {
            self.inner
                .entries
                .remove_if(key, |_, e| e.status.is_none() && e.in_flight.is_none());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_fetcher(
        calls: &Arc<AtomicUsize>,
        status: bool,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<bool, CoreError>> + use<> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(status)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_fetch() {
        let cache = StatusCache::new();
        let key = RelationshipKey::favorite(42_u64);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_fetch(&key, counting_fetcher(&calls, true)),
            cache.get_or_fetch(&key, counting_fetcher(&calls, true)),
        );

        assert!(a.unwrap());
        assert!(b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&key), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn hit_skips_fetcher() {
        let cache = StatusCache::new();
        let key = RelationshipKey::like(9_u64);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.set(&key, false);

        let status = cache
            .get_or_fetch(&key, counting_fetcher(&calls, true))
            .await
            .unwrap();

        assert!(!status);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn set_during_fetch_wins() {
        let cache = StatusCache::new();
        let key = RelationshipKey::follow(3_u64);
        let calls = Arc::new(AtomicUsize::new(0));

        let pending = {
            let cache = cache.clone();
            let key = key.clone();
            let fetcher = counting_fetcher(&calls, false);
            tokio::spawn(async move { cache.get_or_fetch(&key, fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.set(&key, true);

        assert!(pending.await.unwrap().unwrap());
        assert_eq!(cache.get(&key), Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn invalidated_fetch_does_not_write() {
        let cache = StatusCache::new();
        let key = RelationshipKey::favorite(1_u64);
        let calls = Arc::new(AtomicUsize::new(0));

        let pending = {
            let cache = cache.clone();
            let key = key.clone();
            let fetcher = counting_fetcher(&calls, true);
            tokio::spawn(async move { cache.get_or_fetch(&key, fetcher).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate(&key);

        assert!(pending.await.unwrap().unwrap());
        assert_eq!(cache.get(&key), None);
    }

    #[tokio::test(start_paused = true)]
    async fn refetch_ignores_cached_status() {
        let cache = StatusCache::new();
        let key = RelationshipKey::like(5_u64);
        let calls = Arc::new(AtomicUsize::new(0));
        cache.set(&key, true);

        let status = cache
            .refetch(&key, counting_fetcher(&calls, false))
            .await
            .unwrap();

        assert!(!status);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&key), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_leaves_no_entry() {
        let cache = StatusCache::new();
        let key = RelationshipKey::favorite(8_u64);

        let result = cache
            .get_or_fetch(&key, || async { Err(CoreError::Timeout) })
            .await;

        assert_eq!(result, Err(CoreError::Timeout));
        assert!(cache.is_empty());
        assert!(!cache.is_fetching(&key));
    }

    #[test]
    fn invalidate_all_by_kind() {
        let cache = StatusCache::new();
        cache.set(&RelationshipKey::favorite(1_u64), true);
        cache.set(&RelationshipKey::follow(1_u64), true);
        cache.set(&RelationshipKey::like(1_u64), false);

        cache.invalidate_all(Some(RelationshipKind::Follow));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&RelationshipKey::follow(1_u64)), None);

        cache.invalidate_all(None);
        assert!(cache.is_empty());
    }
}
