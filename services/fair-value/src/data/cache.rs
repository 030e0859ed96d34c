//! Facts cache.
//!
//! Wraps any [`FactsProvider`] with an in-memory TTL cache so repeated
//! evaluations of the same ticker (e.g. while a user adjusts parameters) do
//! not hit the source again. Keys combine the upper-cased ticker with a time
//! bucket, so an entry is never served across a bucket boundary even if its
//! TTL has not run out. Inserting prunes expired entries and older buckets,
//! which keeps a long-running service at one entry per ticker.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::debug;

use super::provider::{FactsProvider, ProviderError};
use super::snapshot::{FactDefaults, MarketSnapshot};
use crate::valuation::FinancialFacts;

/// Cache entry with TTL
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    bucket: i64,
    expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    fn new(data: T, bucket: i64, ttl_secs: i64) -> Self {
        Self {
            data,
            bucket,
            expires_at: Utc::now() + Duration::seconds(ttl_secs),
        }
    }

    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Caching decorator over a facts provider.
pub struct CachedFactsProvider<P> {
    inner: P,
    /// key = "TICKER:bucket"
    entries: RwLock<HashMap<String, CacheEntry<FinancialFacts>>>,
    ttl_secs: i64,
    bucket_secs: i64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<P: FactsProvider> CachedFactsProvider<P> {
    /// Wrap with a one hour TTL and one hour buckets.
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, 3600, 3600)
    }

    pub fn with_ttl(inner: P, ttl_secs: i64, bucket_secs: i64) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
            ttl_secs,
            bucket_secs: bucket_secs.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn bucket(&self, now: DateTime<Utc>) -> i64 {
        now.timestamp().div_euclid(self.bucket_secs)
    }

    fn cache_key(&self, ticker: &str, bucket: i64) -> String {
        format!("{}:{}", ticker.trim().to_ascii_uppercase(), bucket)
    }

    fn get(&self, key: &str) -> Option<FinancialFacts> {
        let cache = self.entries.read().ok()?;
        cache
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.data.clone())
    }

    fn set(&self, key: String, bucket: i64, facts: FinancialFacts) {
        let entry = CacheEntry::new(facts, bucket, self.ttl_secs);
        if let Ok(mut cache) = self.entries.write() {
            cache.retain(|_, e| !e.is_expired() && e.bucket >= bucket);
            cache.insert(key, entry);
        }
    }

    /// Drop every cached bucket for a ticker.
    pub fn invalidate(&self, ticker: &str) {
        let prefix = format!("{}:", ticker.trim().to_ascii_uppercase());
        if let Ok(mut cache) = self.entries.write() {
            cache.retain(|k, _| !k.starts_with(&prefix));
        }
    }

    /// Clear all expired entries
    pub fn clear_expired(&self) {
        if let Ok(mut cache) = self.entries.write() {
            cache.retain(|_, entry| !entry.is_expired());
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let (total, expired) = self
            .entries
            .read()
            .map(|c| (c.len(), c.values().filter(|e| e.is_expired()).count()))
            .unwrap_or((0, 0));

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<P: FactsProvider> FactsProvider for CachedFactsProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    /// Snapshots pass straight through; only normalized facts are cached.
    async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, ProviderError> {
        self.inner.fetch_snapshot(ticker).await
    }

    fn fact_defaults(&self) -> FactDefaults {
        self.inner.fact_defaults()
    }

    async fn fetch_facts(&self, ticker: &str) -> Result<FinancialFacts, ProviderError> {
        let bucket = self.bucket(Utc::now());
        let key = self.cache_key(ticker, bucket);

        if let Some(facts) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Facts cache hit");
            return Ok(facts);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let facts = self.inner.fetch_facts(ticker).await?;
        debug!(key = %key, provider = self.inner.name(), "Facts cached");
        self.set(key, bucket, facts.clone());
        Ok(facts)
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl FactsProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch_snapshot(&self, ticker: &str) -> Result<MarketSnapshot, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker.eq_ignore_ascii_case("missing") {
                return Err(ProviderError::NotFound(ticker.to_string()));
            }
            Ok(MarketSnapshot::new(ticker.to_ascii_uppercase()))
        }
    }

    fn make_cache(ttl: i64) -> (CachedFactsProvider<CountingProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
        };
        (CachedFactsProvider::with_ttl(provider, ttl, 3600), calls)
    }

    #[tokio::test]
    async fn test_second_fetch_is_cached() {
        let (cache, calls) = make_cache(60);

        cache.fetch_facts("acme").await.unwrap();
        cache.fetch_facts("ACME").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let (cache, calls) = make_cache(60);

        cache.fetch_facts("ACME").await.unwrap();
        cache.invalidate("acme");
        cache.fetch_facts("ACME").await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let (cache, calls) = make_cache(60);

        assert!(cache.fetch_facts("missing").await.is_err());
        assert!(cache.fetch_facts("missing").await.is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.stats().total_entries, 0);
    }

    #[tokio::test]
    async fn test_zero_ttl_expires() {
        let (cache, calls) = make_cache(0);

        cache.fetch_facts("ACME").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(cache.stats().expired_entries, 1);

        cache.clear_expired();
        assert_eq!(cache.stats().total_entries, 0);

        cache.fetch_facts("ACME").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_key_includes_bucket() {
        let (cache, _) = make_cache(60);
        let t0 = DateTime::from_timestamp(7_200, 0).unwrap();
        let t1 = DateTime::from_timestamp(7_199, 0).unwrap();

        assert_eq!(cache.cache_key(" acme ", cache.bucket(t0)), "ACME:2");
        assert_eq!(cache.cache_key("ACME", cache.bucket(t1)), "ACME:1");
    }

    #[test]
    fn test_new_bucket_replaces_old_entries() {
        let (cache, _) = make_cache(3600);

        for bucket in 1..=3 {
            let facts = FinancialFacts::new("ACME");
            cache.set(cache.cache_key("ACME", bucket), bucket, facts);
        }
        cache.set(cache.cache_key("MSFT", 3), 3, FinancialFacts::new("MSFT"));

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert!(cache.get("ACME:3").is_some());
        assert!(cache.get("ACME:1").is_none());
    }

    #[tokio::test]
    async fn test_entries_stay_bounded_across_buckets() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
        };
        let cache = CachedFactsProvider::with_ttl(provider, 3600, 1);

        cache.fetch_facts("ACME").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        cache.fetch_facts("ACME").await.unwrap();

        let stats = cache.stats();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
