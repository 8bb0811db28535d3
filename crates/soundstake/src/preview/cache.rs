//! Preview byte cache
//!
//! Holds at most one cached preview, keyed by the current track's URL, and
//! de-duplicates concurrent fetches for the same URL. The cache is pure
//! bookkeeping; the owning controller performs the actual fetch for any
//! `FetchPlan::Fetch` it receives and reports back via `complete`.

use std::sync::Arc;

struct CacheEntry {
    url: String,
    bytes: Arc<[u8]>,
}

/// What the caller should do for a requested URL
#[derive(Debug, Clone)]
pub enum FetchPlan {
    /// Bytes are cached — use them directly
    Ready(Arc<[u8]>),
    /// A fetch for this URL is already in flight — wait for its completion
    Pending,
    /// No entry and no in-flight fetch — the caller must start exactly one
    Fetch,
}

/// Single-entry preview cache with in-flight de-duplication
#[derive(Default)]
pub struct PreviewCache {
    entry: Option<CacheEntry>,
    in_flight: Option<String>,
}

impl PreviewCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bytes for `url`, if present
    pub fn lookup(&self, url: &str) -> Option<Arc<[u8]>> {
        self.entry
            .as_ref()
            .filter(|e| e.url == url)
            .map(|e| e.bytes.clone())
    }

    /// Whether a fetch for `url` is currently marked in flight
    pub fn is_fetching(&self, url: &str) -> bool {
        self.in_flight.as_deref() == Some(url)
    }

    /// Decide how to satisfy a request for `url`. Returning
    /// `FetchPlan::Fetch` marks the URL in flight, so a second call for the
    /// same URL observes `Pending` instead of starting another fetch.
    pub fn plan(&mut self, url: &str) -> FetchPlan {
        if let Some(bytes) = self.lookup(url) {
            return FetchPlan::Ready(bytes);
        }
        if self.is_fetching(url) {
            return FetchPlan::Pending;
        }
        self.in_flight = Some(url.to_string());
        FetchPlan::Fetch
    }

    /// Record a fetch completion. Returns `true` when the completion matched
    /// the in-flight URL and was applied; superseded completions (URL no
    /// longer in flight after an invalidation or track change) are discarded.
    /// On success the bytes replace any previous entry; on failure (`None`)
    /// nothing is cached. Either way the in-flight mark is cleared.
    pub fn complete(&mut self, url: &str, bytes: Option<Arc<[u8]>>) -> bool {
        if !self.is_fetching(url) {
            return false;
        }
        self.in_flight = None;
        if let Some(bytes) = bytes {
            self.entry = Some(CacheEntry {
                url: url.to_string(),
                bytes,
            });
        }
        true
    }

    /// Drop the cached entry and any in-flight mark. Called whenever the
    /// active track's URL changes.
    pub fn invalidate(&mut self) {
        self.entry = None;
        self.in_flight = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(n: u8) -> Arc<[u8]> {
        Arc::from(vec![n; 8].as_slice())
    }

    #[test]
    fn empty_cache_plans_a_fetch() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
    }

    #[test]
    fn concurrent_requests_fetch_once() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        // Second and third requests for the same URL must not start a fetch
        assert!(matches!(cache.plan("http://a"), FetchPlan::Pending));
        assert!(matches!(cache.plan("http://a"), FetchPlan::Pending));
    }

    #[test]
    fn completion_caches_and_serves() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        assert!(cache.complete("http://a", Some(bytes(1))));

        match cache.plan("http://a") {
            FetchPlan::Ready(b) => assert_eq!(b.as_ref(), bytes(1).as_ref()),
            other => panic!("expected Ready, got {:?}", other),
        }
        assert!(!cache.is_fetching("http://a"));
    }

    #[test]
    fn failed_completion_caches_nothing() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        assert!(cache.complete("http://a", None));

        assert!(cache.lookup("http://a").is_none());
        // The in-flight mark is cleared, so a retry starts a fresh fetch
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        cache.invalidate();

        // The old fetch finishes after the track changed
        assert!(!cache.complete("http://a", Some(bytes(1))));
        assert!(cache.lookup("http://a").is_none());
    }

    #[test]
    fn completion_for_unrelated_url_is_discarded() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        assert!(!cache.complete("http://b", Some(bytes(2))));
        assert!(cache.lookup("http://b").is_none());
        // The fetch for http://a is still pending
        assert!(cache.is_fetching("http://a"));
    }

    #[test]
    fn invalidate_drops_entry_and_in_flight() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        assert!(cache.complete("http://a", Some(bytes(1))));
        assert!(matches!(cache.plan("http://b"), FetchPlan::Fetch));

        cache.invalidate();
        assert!(cache.lookup("http://a").is_none());
        assert!(!cache.is_fetching("http://b"));
    }

    #[test]
    fn new_entry_supersedes_old() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        assert!(cache.complete("http://a", Some(bytes(1))));

        assert!(matches!(cache.plan("http://b"), FetchPlan::Fetch));
        assert!(cache.complete("http://b", Some(bytes(2))));

        // One live entry at a time: the old URL no longer hits
        assert!(cache.lookup("http://a").is_none());
        assert!(cache.lookup("http://b").is_some());
    }

    #[test]
    fn lookup_does_not_mark_in_flight() {
        let cache = PreviewCache::new();
        assert!(cache.lookup("http://a").is_none());
        assert!(!cache.is_fetching("http://a"));
    }

    #[test]
    fn replay_shares_the_same_buffer() {
        let mut cache = PreviewCache::new();
        assert!(matches!(cache.plan("http://a"), FetchPlan::Fetch));
        assert!(cache.complete("http://a", Some(bytes(7))));

        let first = cache.lookup("http://a").unwrap();
        let second = cache.lookup("http://a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
