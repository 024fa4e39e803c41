//! # Cache-aside
//! Read-through-on-miss caching over the [`KvStore`], with a longer-lived
//! stale copy that is served only when the upstream fetch fails.
//!
//! Values are stored as JSON. Entries are never edited in place; every
//! write replaces the whole key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::ingest::types::{ExchangeRates, SourceError};
use crate::store::KvStore;

/// Slow-changing aggregated content (RSS digests).
pub const TTL_AGGREGATED: Duration = Duration::from_secs(120 * 60);
/// Moderately volatile data (prices, rates, DeFi stats).
pub const TTL_VOLATILE: Duration = Duration::from_secs(60 * 60);
/// Explicit command-level cache for ranking pages.
pub const TTL_COMMAND: Duration = Duration::from_secs(2 * 60 * 60);
/// How long the stale fallback copy outlives its primary entry.
pub const DEFAULT_STALE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub const STALE_PREFIX: &str = "stale:";

/// What a source does when the fetch fails and nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Degrade to the empty value.
    SoftEmpty,
    /// Propagate the upstream error.
    HardFail,
}

/// A cacheable payload. Empty values are never written.
pub trait CacheValue: Serialize + DeserializeOwned + Default + Send + Sync {
    fn is_empty_value(&self) -> bool;
}

impl<T> CacheValue for Vec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn is_empty_value(&self) -> bool {
        self.is_empty()
    }
}

impl CacheValue for String {
    fn is_empty_value(&self) -> bool {
        self.trim().is_empty()
    }
}

impl CacheValue for ExchangeRates {
    fn is_empty_value(&self) -> bool {
        self.rates.is_empty()
    }
}

pub fn stale_key(key: &str) -> String {
    format!("{STALE_PREFIX}{key}")
}

#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn KvStore>,
}

impl CacheAside {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Store or decode failures read as a miss.
    pub async fn read<T: CacheValue>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(v) => v?,
            Err(e) => {
                warn!(%key, error = %e, "cache read failed");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%key, error = %e, "cache entry undecodable, ignoring");
                None
            }
        }
    }

    /// Writes the primary entry and its stale copy. Failures are logged only.
    pub async fn write<T: CacheValue>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(%key, error = %e, "cache encode failed");
                return;
            }
        };
        if let Err(e) = self.store.put(key, &raw, ttl).await {
            warn!(%key, error = %e, "cache write failed");
            return;
        }
        let stale_ttl = DEFAULT_STALE_TTL.max(ttl);
        if let Err(e) = self.store.put(&stale_key(key), &raw, stale_ttl).await {
            warn!(%key, error = %e, "stale copy write failed");
        }
        debug!(%key, ttl_secs = ttl.as_secs(), "cache SET");
    }

    /// Return the cached value for `key`, or call `fetch` and cache a non-empty result.
    ///
    /// On fetch failure the key is read once more (a concurrent invocation may
    /// have filled it), then the stale copy. Only when both miss does `policy` apply.
    pub async fn get_or_fetch<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        policy: FailurePolicy,
        fetch: F,
    ) -> Result<T, SourceError>
    where
        T: CacheValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        if let Some(hit) = self.read::<T>(key).await {
            counter!("cache_hits_total").increment(1);
            debug!(%key, "cache hit");
            return Ok(hit);
        }
        counter!("cache_misses_total").increment(1);

        match fetch().await {
            Ok(value) => {
                if value.is_empty_value() {
                    debug!(%key, "empty fetch result, not caching");
                } else {
                    self.write(key, &value, ttl).await;
                }
                Ok(value)
            }
            Err(e) => {
                warn!(%key, error = %e, "fetch failed, trying cached fallback");
                if let Some(v) = self.read::<T>(key).await {
                    counter!("cache_fallback_total").increment(1);
                    return Ok(v);
                }
                if let Some(v) = self.read::<T>(&stale_key(key)).await {
                    counter!("cache_fallback_total").increment(1);
                    debug!(%key, "serving stale copy");
                    return Ok(v);
                }
                match policy {
                    FailurePolicy::SoftEmpty => Ok(T::default()),
                    FailurePolicy::HardFail => Err(e),
                }
            }
        }
    }
}
