//! Per-issuer key-set cache.
//!
//! Readers take a snapshot of the whole map; a refresh builds a new map and
//! swaps it in atomically. A key set is never mutated after it was fetched,
//! so in-flight verifications keep reading the snapshot they started with.
//!
//! At most `max_issuers` issuers are held; the oldest entry makes room for a
//! new one. A failed fetch is remembered for `failure_ttl` so that repeated
//! tokens naming an unreachable issuer do not each cause a request.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use authorizer_sdk::{KeySetError, KeySetFetcher};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use tokio::time::Instant;

use crate::config::KeySetConfig;

/// Key set of one issuer as fetched at `fetched_at`.
#[derive(Debug)]
pub struct CachedKeySet {
    keys: JwkSet,
    fetched_at: Instant,
}

impl CachedKeySet {
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .keys
            .iter()
            .find(|key| key.common.key_id.as_deref() == Some(kid))
    }

    #[must_use]
    pub fn age(&self) -> Duration {
        self.fetched_at.elapsed()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.keys.is_empty()
    }
}

#[derive(Debug)]
struct FailedFetch {
    error: KeySetError,
    at: Instant,
}

pub struct KeySetCache {
    fetcher: Arc<dyn KeySetFetcher>,
    entries: ArcSwap<HashMap<String, Arc<CachedKeySet>>>,
    failures: ArcSwap<HashMap<String, Arc<FailedFetch>>>,
    ttl: Duration,
    fetch_timeout: Duration,
    min_refresh_interval: Duration,
    failure_ttl: Duration,
    max_issuers: usize,
}

impl KeySetCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn KeySetFetcher>, cfg: &KeySetConfig) -> Self {
        Self {
            fetcher,
            entries: ArcSwap::from_pointee(HashMap::new()),
            failures: ArcSwap::from_pointee(HashMap::new()),
            ttl: cfg.cache_ttl(),
            fetch_timeout: cfg.fetch_timeout(),
            min_refresh_interval: cfg.min_refresh_interval(),
            failure_ttl: cfg.failure_ttl(),
            max_issuers: cfg.max_issuers.max(1),
        }
    }

    /// Number of issuers whose key set is currently held.
    #[must_use]
    pub fn cached_issuers(&self) -> usize {
        self.entries.load().len()
    }

    /// Cached key set of `issuer`, fetched when absent or older than the TTL.
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError`] when a needed fetch fails. A stale entry is
    /// never served in place of a failed fetch.
    pub async fn get(&self, issuer: &str) -> Result<Arc<CachedKeySet>, KeySetError> {
        if let Some(entry) = self.entries.load().get(issuer)
            && entry.age() < self.ttl
        {
            return Ok(Arc::clone(entry));
        }
        self.refresh(issuer).await
    }

    /// Verification key `kid` of `issuer`.
    ///
    /// An unknown key id triggers at most one refresh, and only when the
    /// cached copy is older than the minimum refresh interval. Returns
    /// `Ok(None)` when the key is still unknown.
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError`] when a fetch fails.
    pub async fn key(&self, issuer: &str, kid: &str) -> Result<Option<Jwk>, KeySetError> {
        let current = self.get(issuer).await?;
        if let Some(jwk) = current.find(kid) {
            return Ok(Some(jwk.clone()));
        }
        if current.age() < self.min_refresh_interval {
            return Ok(None);
        }

        tracing::debug!(issuer, kid, "key id not in cached key set, refreshing");
        let refreshed = self.refresh(issuer).await?;
        Ok(refreshed.find(kid).cloned())
    }

    async fn refresh(&self, issuer: &str) -> Result<Arc<CachedKeySet>, KeySetError> {
        let recent_failure = self
            .failures
            .load()
            .get(issuer)
            .filter(|failed| failed.at.elapsed() < self.failure_ttl)
            .map(|failed| failed.error.clone());
        if let Some(error) = recent_failure {
            return Err(error);
        }

        match self.fetch(issuer).await {
            Ok(entry) => {
                tracing::debug!(issuer, keys = entry.len(), "key set refreshed");
                self.entries.rcu(|current| {
                    bounded_insert(current, issuer, Arc::clone(&entry), self.max_issuers, |e| {
                        e.fetched_at
                    })
                });
                if self.failures.load().contains_key(issuer) {
                    self.failures.rcu(|current| {
                        let mut next = HashMap::clone(current);
                        next.remove(issuer);
                        next
                    });
                }
                Ok(entry)
            }
            Err(error) => {
                if !self.failure_ttl.is_zero() {
                    let failed = Arc::new(FailedFetch {
                        error: error.clone(),
                        at: Instant::now(),
                    });
                    self.failures.rcu(|current| {
                        bounded_insert(current, issuer, Arc::clone(&failed), self.max_issuers, |f| {
                            f.at
                        })
                    });
                }
                Err(error)
            }
        }
    }

    async fn fetch(&self, issuer: &str) -> Result<Arc<CachedKeySet>, KeySetError> {
        let document = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(issuer))
            .await
            .map_err(|_| KeySetError::Timeout)??;
        let keys: JwkSet = serde_json::from_value(document)
            .map_err(|e| KeySetError::InvalidDocument(e.to_string()))?;

        Ok(Arc::new(CachedKeySet {
            keys,
            fetched_at: Instant::now(),
        }))
    }
}

/// Copy of `map` with `value` stored under `issuer`. When a new issuer would
/// exceed `cap`, the entry with the oldest `stamp` is dropped first.
fn bounded_insert<V>(
    map: &HashMap<String, Arc<V>>,
    issuer: &str,
    value: Arc<V>,
    cap: usize,
    stamp: impl Fn(&V) -> Instant,
) -> HashMap<String, Arc<V>> {
    let mut next = HashMap::clone(map);
    if !next.contains_key(issuer) && next.len() >= cap {
        let oldest = next
            .iter()
            .min_by_key(|(_, v)| stamp(v.as_ref()))
            .map(|(k, _)| k.clone());
        if let Some(oldest) = oldest {
            next.remove(&oldest);
        }
    }
    next.insert(issuer.to_owned(), value);
    next
}
